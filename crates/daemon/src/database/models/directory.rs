use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use common::directory::DirectoryPlan;
use common::prelude::{CourseCode, Directory, NewDirectory, SubdirectoryKind, Visibility};

use crate::database::types::{DText, DUuid};
use crate::database::{Database, DatabaseConnection};

const DIRECTORY_COLUMNS: &str = r#"
    id, course_code, title, owner_id, visibility,
    parent_directory_id, subdirectory_type, created_at, updated_at
"#;

#[derive(Debug, Clone, FromRow)]
struct DirectoryRow {
    id: DUuid,
    course_code: DText<CourseCode>,
    title: String,
    owner_id: String,
    visibility: Option<DText<Visibility>>,
    parent_directory_id: Option<DUuid>,
    subdirectory_type: Option<DText<SubdirectoryKind>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<DirectoryRow> for Directory {
    fn from(row: DirectoryRow) -> Self {
        Directory {
            id: row.id.into_inner(),
            course_code: row.course_code.into_inner(),
            title: row.title,
            owner_id: row.owner_id,
            visibility: row.visibility.map(DText::into_inner),
            parent_directory_id: row.parent_directory_id.map(DText::into_inner),
            subdirectory_type: row.subdirectory_type.map(DText::into_inner),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row counts removed by a cascading directory delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedCounts {
    pub directories: u64,
    pub resources: u64,
    pub votes: u64,
}

async fn insert_directory(
    new: NewDirectory,
    now: OffsetDateTime,
    conn: &mut DatabaseConnection,
) -> Result<Directory, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO directories (
            id, course_code, title, owner_id, visibility,
            parent_directory_id, subdirectory_type, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        "#,
    )
    .bind(DUuid::from(new.id))
    .bind(DText(new.course_code.clone()))
    .bind(&new.title)
    .bind(&new.owner_id)
    .bind(new.visibility.map(DText))
    .bind(new.parent_directory_id.map(DUuid::from))
    .bind(new.subdirectory_type.map(DText))
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(new.into_directory(now))
}

impl Database {
    /// Insert a root and its planned subdirectories atomically.
    pub async fn create_directories(
        &self,
        plan: DirectoryPlan,
    ) -> Result<(Directory, Vec<Directory>), sqlx::Error> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin_write().await?;

        let root = insert_directory(plan.root, now, &mut tx).await?;
        let mut subdirectories = Vec::with_capacity(plan.subdirectories.len());
        for sub in plan.subdirectories {
            subdirectories.push(insert_directory(sub, now, &mut tx).await?);
        }

        tx.commit().await?;
        Ok((root, subdirectories))
    }

    pub async fn create_subdirectory(&self, new: NewDirectory) -> Result<Directory, sqlx::Error> {
        let mut conn = self.acquire().await?;
        insert_directory(new, OffsetDateTime::now_utc(), &mut conn).await
    }

    pub async fn get_directory(&self, id: Uuid) -> Result<Option<Directory>, sqlx::Error> {
        let row = sqlx::query_as::<_, DirectoryRow>(&format!(
            "SELECT {} FROM directories WHERE id = ?1",
            DIRECTORY_COLUMNS
        ))
        .bind(DUuid::from(id))
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(Directory::from))
    }

    /// Fetch a directory together with its parent, when it has one.
    pub async fn get_directory_with_parent(
        &self,
        id: Uuid,
    ) -> Result<Option<(Directory, Option<Directory>)>, sqlx::Error> {
        let Some(directory) = self.get_directory(id).await? else {
            return Ok(None);
        };
        let parent = match directory.parent_directory_id {
            Some(parent_id) => self.get_directory(parent_id).await?,
            None => None,
        };
        Ok(Some((directory, parent)))
    }

    pub async fn list_subdirectories(&self, parent_id: Uuid) -> Result<Vec<Directory>, sqlx::Error> {
        let rows = sqlx::query_as::<_, DirectoryRow>(&format!(
            "SELECT {} FROM directories WHERE parent_directory_id = ?1 ORDER BY subdirectory_type DESC",
            DIRECTORY_COLUMNS
        ))
        .bind(DUuid::from(parent_id))
        .fetch_all(&**self)
        .await?;

        Ok(rows.into_iter().map(Directory::from).collect())
    }

    pub async fn has_subdirectories(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM directories WHERE parent_directory_id = ?1)",
        )
        .bind(DUuid::from(id))
        .fetch_one(&**self)
        .await?;
        Ok(exists)
    }

    pub async fn subdirectory_exists(
        &self,
        parent_id: Uuid,
        kind: SubdirectoryKind,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM directories
                WHERE parent_directory_id = ?1 AND subdirectory_type = ?2
            )
            "#,
        )
        .bind(DUuid::from(parent_id))
        .bind(DText(kind))
        .fetch_one(&**self)
        .await?;
        Ok(exists)
    }

    /// Root directories, optionally narrowed to one owner and one visibility.
    ///
    /// Access filtering happens in the caller.
    pub async fn list_root_directories(
        &self,
        owner_id: Option<&str>,
        visibility: Option<Visibility>,
    ) -> Result<Vec<Directory>, sqlx::Error> {
        let rows = sqlx::query_as::<_, DirectoryRow>(&format!(
            r#"
            SELECT {} FROM directories
            WHERE parent_directory_id IS NULL
              AND (?1 IS NULL OR owner_id = ?1)
              AND (?2 IS NULL OR visibility = ?2)
            "#,
            DIRECTORY_COLUMNS
        ))
        .bind(owner_id)
        .bind(visibility.map(DText))
        .fetch_all(&**self)
        .await?;

        Ok(rows.into_iter().map(Directory::from).collect())
    }

    /// Resources held by a directory and by its subdirectories.
    pub async fn count_directory_resources(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM resources
            WHERE directory_id = ?1
               OR directory_id IN (SELECT id FROM directories WHERE parent_directory_id = ?1)
            "#,
        )
        .bind(DUuid::from(id))
        .fetch_one(&**self)
        .await?;
        Ok(count as u64)
    }

    /// Whether `owner_id` already keeps a root for this course under the
    /// same title, compared case-insensitively.
    pub async fn root_directory_exists(
        &self,
        owner_id: &str,
        course_code: &CourseCode,
        title: &str,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM directories
                WHERE parent_directory_id IS NULL
                  AND owner_id = ?1
                  AND course_code = ?2
                  AND lower(title) = lower(?3)
            )
            "#,
        )
        .bind(owner_id)
        .bind(DText(course_code.clone()))
        .bind(title.trim())
        .fetch_one(&**self)
        .await?;
        Ok(exists)
    }

    /// Delete a directory, its subdirectories, their resources and votes.
    pub async fn delete_directory(&self, id: Uuid) -> Result<DeletedCounts, sqlx::Error> {
        let id = DUuid::from(id);
        let mut tx = self.begin_write().await?;

        let scope = r#"
            SELECT id FROM directories WHERE id = ?1 OR parent_directory_id = ?1
        "#;

        let votes = sqlx::query(&format!(
            r#"
            DELETE FROM resource_votes WHERE resource_id IN (
                SELECT id FROM resources WHERE directory_id IN ({})
            )
            "#,
            scope
        ))
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let resources = sqlx::query(&format!(
            "DELETE FROM resources WHERE directory_id IN ({})",
            scope
        ))
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let subdirectories = sqlx::query("DELETE FROM directories WHERE parent_directory_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let roots = sqlx::query("DELETE FROM directories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(DeletedCounts {
            directories: roots + subdirectories,
            resources,
            votes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::prelude::Course;

    async fn setup_test_db() -> Database {
        let db_url = url::Url::parse("sqlite::memory:").unwrap();
        Database::connect(&db_url).await.unwrap()
    }

    fn course(has_lab: bool) -> Course {
        Course {
            code: CourseCode::parse("CSE220").unwrap(),
            name: "Data Structures".to_string(),
            has_lab,
        }
    }

    #[tokio::test]
    async fn test_create_with_subdirectories() {
        let db = setup_test_db().await;
        let plan =
            NewDirectory::plan_root(&course(true), None, "alice", Visibility::Connections, true)
                .unwrap();

        let (root, subs) = db.create_directories(plan).await.unwrap();
        assert_eq!(subs.len(), 2);

        let stored = db.get_directory(root.id).await.unwrap().unwrap();
        assert_eq!(stored.visibility, Some(Visibility::Connections));
        assert_eq!(stored.course_code.as_str(), "CSE220");

        let listed = db.list_subdirectories(root.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|d| d.visibility.is_none()));
        assert!(db.has_subdirectories(root.id).await.unwrap());
        assert!(db
            .subdirectory_exists(root.id, SubdirectoryKind::Lab)
            .await
            .unwrap());

        let (lab, parent) = db
            .get_directory_with_parent(subs[1].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(parent.as_ref().map(|p| p.id), Some(root.id));
        assert_eq!(
            lab.effective_visibility(parent.as_ref()),
            Visibility::Connections
        );
    }

    #[tokio::test]
    async fn test_duplicate_subdirectory_type_is_rejected() {
        let db = setup_test_db().await;
        let plan =
            NewDirectory::plan_root(&course(true), None, "alice", Visibility::Public, true)
                .unwrap();
        let (root, _) = db.create_directories(plan).await.unwrap();

        let again =
            NewDirectory::plan_subdirectory(&root, SubdirectoryKind::Theory, None, "alice")
                .unwrap();
        let err = db.create_subdirectory(again).await.unwrap_err();
        assert!(err
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false));
    }

    #[tokio::test]
    async fn test_list_roots_filters() {
        let db = setup_test_db().await;
        for (owner, visibility) in [
            ("alice", Visibility::Public),
            ("alice", Visibility::Private),
            ("bob", Visibility::Public),
        ] {
            let plan = NewDirectory::plan_root(&course(true), None, owner, visibility, true)
                .unwrap();
            db.create_directories(plan).await.unwrap();
        }

        assert_eq!(db.list_root_directories(None, None).await.unwrap().len(), 3);
        assert_eq!(
            db.list_root_directories(Some("alice"), None)
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            db.list_root_directories(None, Some(Visibility::Public))
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_root_directory_exists_ignores_title_case() {
        let db = setup_test_db().await;
        let plan =
            NewDirectory::plan_root(&course(false), Some("Midterm Prep"), "alice", Visibility::Private, false)
                .unwrap();
        db.create_directories(plan).await.unwrap();

        let code = CourseCode::parse("cse220").unwrap();
        assert!(db
            .root_directory_exists("alice", &code, "midterm prep")
            .await
            .unwrap());
        assert!(!db
            .root_directory_exists("bob", &code, "midterm prep")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_subdirectories_resources_and_votes() {
        use common::prelude::{NewResource, ResourceContent, VoteAction};

        let db = setup_test_db().await;
        let plan =
            NewDirectory::plan_root(&course(true), None, "alice", Visibility::Public, true)
                .unwrap();
        let (root, subs) = db.create_directories(plan).await.unwrap();
        let lab = subs
            .iter()
            .find(|d| d.subdirectory_type == Some(SubdirectoryKind::Lab))
            .unwrap();

        let content =
            ResourceContent::from_parts(None, None, Some("https://youtu.be/abc123")).unwrap();
        let new = NewResource::new(lab.id, "alice", "Lab 1 walkthrough", None, content).unwrap();
        let resource = db.create_resource(new).await.unwrap();
        db.apply_vote(resource.id, "bob", VoteAction::Up).await.unwrap();

        let deleted = db.delete_directory(root.id).await.unwrap();
        assert_eq!(
            deleted,
            DeletedCounts {
                directories: 3,
                resources: 1,
                votes: 1,
            }
        );

        for table in ["directories", "resources", "resource_votes"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&*db)
                .await
                .unwrap();
            assert_eq!(count, 0, "{table} not empty");
        }
    }
}
