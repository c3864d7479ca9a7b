use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::database::types::{DText, DUuid};
use crate::database::Database;

pub const DEFAULT_ACTIVITY_LIMIT: u32 = 50;
pub const MAX_ACTIVITY_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    ResourceUploaded,
    ResourceDeleted,
    ResourceVoted,
    ConnectionAccepted,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("unknown activity action: {0}")]
pub struct UnknownActivityAction(pub String);

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::ResourceUploaded => "resource_uploaded",
            ActivityAction::ResourceDeleted => "resource_deleted",
            ActivityAction::ResourceVoted => "resource_voted",
            ActivityAction::ConnectionAccepted => "connection_accepted",
        }
    }
}

impl Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityAction {
    type Err = UnknownActivityAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resource_uploaded" => Ok(ActivityAction::ResourceUploaded),
            "resource_deleted" => Ok(ActivityAction::ResourceDeleted),
            "resource_voted" => Ok(ActivityAction::ResourceVoted),
            "connection_accepted" => Ok(ActivityAction::ConnectionAccepted),
            other => Err(UnknownActivityAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: DUuid,
    pub user_id: String,
    pub action: DText<ActivityAction>,
    pub subject_id: Option<String>,
    pub summary: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Activity {
    pub async fn record(
        user_id: &str,
        action: ActivityAction,
        subject_id: Option<&str>,
        summary: &str,
        db: &Database,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO activities (id, user_id, action, subject_id, summary, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(DUuid::from(Uuid::new_v4()))
        .bind(user_id)
        .bind(DText(action))
        .bind(subject_id)
        .bind(summary)
        .bind(OffsetDateTime::now_utc())
        .execute(&**db)
        .await?;
        Ok(())
    }

    /// Most recent activity of `user_id`, newest first.
    pub async fn list(user_id: &str, limit: u32, db: &Database) -> Result<Vec<Activity>, sqlx::Error> {
        let limit = limit.clamp(1, MAX_ACTIVITY_LIMIT);
        sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, user_id, action, subject_id, summary, created_at
            FROM activities
            WHERE user_id = ?1
            ORDER BY rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&**db)
        .await
    }
}

/// Record an activity without failing the surrounding request. The feed is
/// informational, so a write failure is only logged.
pub async fn log_activity(
    db: &Database,
    user_id: &str,
    action: ActivityAction,
    subject_id: Option<&str>,
    summary: &str,
) {
    if let Err(e) = Activity::record(user_id, action, subject_id, summary, db).await {
        tracing::warn!("failed to record {} activity for {}: {}", action, user_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> Database {
        let db_url = url::Url::parse("sqlite::memory:").unwrap();
        Database::connect(&db_url).await.unwrap()
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = setup_test_db().await;

        log_activity(&db, "alice", ActivityAction::ResourceUploaded, Some("r1"), "uploaded a").await;
        log_activity(&db, "alice", ActivityAction::ResourceVoted, Some("r1"), "voted up").await;
        log_activity(&db, "bob", ActivityAction::ConnectionAccepted, None, "accepted").await;

        let feed = Activity::list("alice", DEFAULT_ACTIVITY_LIMIT, &db)
            .await
            .unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(*feed[0].action, ActivityAction::ResourceVoted);
        assert_eq!(*feed[1].action, ActivityAction::ResourceUploaded);

        let limited = Activity::list("alice", 1, &db).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_action_round_trips_through_text() {
        for action in [
            ActivityAction::ResourceUploaded,
            ActivityAction::ResourceDeleted,
            ActivityAction::ResourceVoted,
            ActivityAction::ConnectionAccepted,
        ] {
            assert_eq!(action.as_str().parse::<ActivityAction>().unwrap(), action);
        }
        assert!("logged_in".parse::<ActivityAction>().is_err());
    }
}
