use std::collections::HashMap;

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use common::prelude::{
    NewResource, Resource, ResourceContent, ResourceKind, Vote, VoteAction, VoteSets, VoteTally,
};
use common::resource::{FileAttachment, YoutubeLink};
use common::vote::next_vote;

use crate::database::types::{DText, DUuid};
use crate::database::Database;

const RESOURCE_COLUMNS: &str = r#"
    id, directory_id, owner_id, title, description, kind,
    file_url, file_bytes, file_mime, file_original_name,
    youtube_url, youtube_video_id, created_at
"#;

#[derive(Debug, Clone, FromRow)]
struct ResourceRow {
    id: DUuid,
    directory_id: DUuid,
    owner_id: String,
    title: String,
    description: Option<String>,
    kind: DText<ResourceKind>,
    file_url: Option<String>,
    file_bytes: Option<i64>,
    file_mime: Option<String>,
    file_original_name: Option<String>,
    youtube_url: Option<String>,
    youtube_video_id: Option<String>,
    created_at: OffsetDateTime,
}

impl ResourceRow {
    fn into_resource(self, votes: VoteSets) -> Resource {
        let content = match *self.kind {
            ResourceKind::File => ResourceContent::File {
                file: FileAttachment {
                    url: self.file_url.unwrap_or_default(),
                    bytes: self.file_bytes,
                    mime: self.file_mime,
                    original_name: self.file_original_name,
                },
            },
            ResourceKind::Youtube => ResourceContent::Youtube {
                youtube: YoutubeLink {
                    url: self.youtube_url.unwrap_or_default(),
                    video_id: self.youtube_video_id.unwrap_or_default(),
                },
            },
        };

        Resource {
            id: self.id.into_inner(),
            directory_id: self.directory_id.into_inner(),
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            content,
            votes,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct VoteRow {
    resource_id: DUuid,
    user_id: String,
    vote: DText<Vote>,
}

impl Database {
    pub async fn create_resource(&self, new: NewResource) -> Result<Resource, sqlx::Error> {
        let now = OffsetDateTime::now_utc();
        let (file, youtube) = match &new.content {
            ResourceContent::File { file } => (Some(file), None),
            ResourceContent::Youtube { youtube } => (None, Some(youtube)),
        };

        sqlx::query(
            r#"
            INSERT INTO resources (
                id, directory_id, owner_id, title, description, kind,
                file_url, file_bytes, file_mime, file_original_name,
                youtube_url, youtube_video_id, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(DUuid::from(new.id))
        .bind(DUuid::from(new.directory_id))
        .bind(&new.owner_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(DText(new.content.kind()))
        .bind(file.map(|f| f.url.clone()))
        .bind(file.and_then(|f| f.bytes))
        .bind(file.and_then(|f| f.mime.clone()))
        .bind(file.and_then(|f| f.original_name.clone()))
        .bind(youtube.map(|y| y.url.clone()))
        .bind(youtube.map(|y| y.video_id.clone()))
        .bind(now)
        .execute(&**self)
        .await?;

        Ok(Resource {
            id: new.id,
            directory_id: new.directory_id,
            owner_id: new.owner_id,
            title: new.title,
            description: new.description,
            content: new.content,
            votes: VoteSets::new(),
            created_at: now,
        })
    }

    pub async fn get_resource(&self, id: Uuid) -> Result<Option<Resource>, sqlx::Error> {
        let row = sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {} FROM resources WHERE id = ?1",
            RESOURCE_COLUMNS
        ))
        .bind(DUuid::from(id))
        .fetch_optional(&**self)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let votes = sqlx::query_as::<_, VoteRow>(
            "SELECT resource_id, user_id, vote FROM resource_votes WHERE resource_id = ?1",
        )
        .bind(DUuid::from(id))
        .fetch_all(&**self)
        .await?;

        let votes = VoteSets::from_votes(votes.into_iter().map(|v| (v.user_id, *v.vote)));
        Ok(Some(row.into_resource(votes)))
    }

    /// All resources in one directory with their vote sets, unordered.
    pub async fn list_directory_resources(
        &self,
        directory_id: Uuid,
    ) -> Result<Vec<Resource>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {} FROM resources WHERE directory_id = ?1",
            RESOURCE_COLUMNS
        ))
        .bind(DUuid::from(directory_id))
        .fetch_all(&**self)
        .await?;

        let vote_rows = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT v.resource_id, v.user_id, v.vote
            FROM resource_votes v
            JOIN resources r ON r.id = v.resource_id
            WHERE r.directory_id = ?1
            "#,
        )
        .bind(DUuid::from(directory_id))
        .fetch_all(&**self)
        .await?;

        let mut votes: HashMap<Uuid, Vec<(String, Vote)>> = HashMap::new();
        for row in vote_rows {
            votes
                .entry(row.resource_id.into_inner())
                .or_default()
                .push((row.user_id, row.vote.into_inner()));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let sets = VoteSets::from_votes(votes.remove(&*row.id).unwrap_or_default());
                row.into_resource(sets)
            })
            .collect())
    }

    /// Delete a resource and its votes. Returns whether the resource existed.
    pub async fn delete_resource(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let id = DUuid::from(id);
        let mut tx = self.begin_write().await?;

        sqlx::query("DELETE FROM resource_votes WHERE resource_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM resources WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(removed > 0)
    }

    /// Apply one user's vote action and return the resulting tally.
    ///
    /// The read of the previous vote and the write of the next one share a
    /// write transaction, so concurrent votes queue on the lock and repeated
    /// clicks from one user are applied in order.
    pub async fn apply_vote(
        &self,
        resource_id: Uuid,
        user_id: &str,
        action: VoteAction,
    ) -> Result<VoteTally, sqlx::Error> {
        let resource_id = DUuid::from(resource_id);
        let mut tx = self.begin_write().await?;

        let previous: Option<DText<Vote>> = sqlx::query_scalar(
            "SELECT vote FROM resource_votes WHERE resource_id = ?1 AND user_id = ?2",
        )
        .bind(resource_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let next = next_vote(previous.map(DText::into_inner), action);
        match next {
            Some(vote) => {
                sqlx::query(
                    r#"
                    INSERT INTO resource_votes (resource_id, user_id, vote, created_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(resource_id, user_id) DO UPDATE SET
                        vote = excluded.vote,
                        created_at = excluded.created_at
                    "#,
                )
                .bind(resource_id)
                .bind(user_id)
                .bind(DText(vote))
                .bind(OffsetDateTime::now_utc())
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM resource_votes WHERE resource_id = ?1 AND user_id = ?2")
                    .bind(resource_id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let (up, down): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN vote = 'up' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN vote = 'down' THEN 1 ELSE 0 END), 0)
            FROM resource_votes
            WHERE resource_id = ?1
            "#,
        )
        .bind(resource_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(VoteTally::new(up as u64, down as u64, next))
    }
}
