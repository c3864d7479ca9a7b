use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use common::connection::unordered_pair;
use common::prelude::{ConnectionGraph, ConnectionStatus};

use crate::database::models::user::{LegacyConnection, User};
use crate::database::types::{DText, DUuid};
use crate::database::{Database, DatabaseConnection};

const CONNECTION_COLUMNS: &str = r#"
    id, sender_id, receiver_id, status, created_at, updated_at
"#;

/// A connection request between two users. Accepted requests are edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Connection {
    pub id: DUuid,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: DText<ConnectionStatus>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Result of asking to connect with someone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A new pending request, or a rejected one reopened.
    Sent(Connection),
    /// A pending request already exists between the two users.
    AlreadyPending(Connection),
    /// The users are connected already, through an edge or the legacy lists.
    AlreadyConnected,
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionTransitionError {
    #[error("connection request not found")]
    NotFound,
    #[error("connection request is already {0}")]
    NotPending(ConnectionStatus),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

async fn get_between(
    a: &str,
    b: &str,
    conn: &mut DatabaseConnection,
) -> Result<Option<Connection>, sqlx::Error> {
    let (low, high) = unordered_pair(a, b);
    sqlx::query_as::<_, Connection>(&format!(
        "SELECT {} FROM connections WHERE user_low = ?1 AND user_high = ?2",
        CONNECTION_COLUMNS
    ))
    .bind(low)
    .bind(high)
    .fetch_optional(&mut *conn)
    .await
}

async fn get_by_id(
    id: Uuid,
    conn: &mut DatabaseConnection,
) -> Result<Option<Connection>, sqlx::Error> {
    sqlx::query_as::<_, Connection>(&format!(
        "SELECT {} FROM connections WHERE id = ?1",
        CONNECTION_COLUMNS
    ))
    .bind(DUuid::from(id))
    .fetch_optional(&mut *conn)
    .await
}

async fn insert_accepted(
    a: &str,
    b: &str,
    now: OffsetDateTime,
    conn: &mut DatabaseConnection,
) -> Result<(), sqlx::Error> {
    let (low, high) = unordered_pair(a, b);
    sqlx::query(
        r#"
        INSERT INTO connections (
            id, user_low, user_high, sender_id, receiver_id, status, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, 'accepted', ?6, ?6)
        ON CONFLICT(user_low, user_high) DO UPDATE SET
            status = 'accepted',
            updated_at = excluded.updated_at
        "#,
    )
    .bind(DUuid::from(Uuid::new_v4()))
    .bind(low)
    .bind(high)
    .bind(a)
    .bind(b)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

impl Connection {
    pub async fn get(id: Uuid, db: &Database) -> Result<Option<Connection>, sqlx::Error> {
        let mut conn = db.acquire().await?;
        get_by_id(id, &mut conn).await
    }

    /// Ask to connect `sender_id` with `receiver_id`.
    ///
    /// A rejected pair is reopened as pending with the new direction.
    pub async fn request(
        sender_id: &str,
        receiver_id: &str,
        db: &Database,
    ) -> Result<RequestOutcome, sqlx::Error> {
        if db.legacy_connected(sender_id, receiver_id).await? {
            return Ok(RequestOutcome::AlreadyConnected);
        }

        let now = OffsetDateTime::now_utc();
        let mut tx = db.begin_write().await?;

        let outcome = match get_between(sender_id, receiver_id, &mut tx).await? {
            Some(existing) => match *existing.status {
                ConnectionStatus::Accepted => RequestOutcome::AlreadyConnected,
                ConnectionStatus::Pending => RequestOutcome::AlreadyPending(existing),
                ConnectionStatus::Rejected => {
                    sqlx::query(
                        r#"
                        UPDATE connections
                        SET sender_id = ?2, receiver_id = ?3, status = 'pending', updated_at = ?4
                        WHERE id = ?1
                        "#,
                    )
                    .bind(existing.id)
                    .bind(sender_id)
                    .bind(receiver_id)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                    let reopened = get_by_id(*existing.id, &mut tx)
                        .await?
                        .ok_or(sqlx::Error::RowNotFound)?;
                    RequestOutcome::Sent(reopened)
                }
            },
            None => {
                let (low, high) = unordered_pair(sender_id, receiver_id);
                let id = Uuid::new_v4();
                sqlx::query(
                    r#"
                    INSERT INTO connections (
                        id, user_low, user_high, sender_id, receiver_id, status,
                        created_at, updated_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?6)
                    "#,
                )
                .bind(DUuid::from(id))
                .bind(low)
                .bind(high)
                .bind(sender_id)
                .bind(receiver_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                let created = get_by_id(id, &mut tx)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                RequestOutcome::Sent(created)
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Pending requests waiting on `receiver_id`, newest first.
    pub async fn incoming(receiver_id: &str, db: &Database) -> Result<Vec<Connection>, sqlx::Error> {
        sqlx::query_as::<_, Connection>(&format!(
            r#"
            SELECT {} FROM connections
            WHERE receiver_id = ?1 AND status = 'pending'
            ORDER BY rowid DESC
            "#,
            CONNECTION_COLUMNS
        ))
        .bind(receiver_id)
        .fetch_all(&**db)
        .await
    }

    /// Move a pending request addressed to `receiver_id` to `status`.
    ///
    /// Requests addressed to someone else are reported as not found.
    pub async fn respond(
        id: Uuid,
        receiver_id: &str,
        status: ConnectionStatus,
        db: &Database,
    ) -> Result<Connection, ConnectionTransitionError> {
        let mut tx = db.begin_write().await?;

        let existing = get_by_id(id, &mut tx)
            .await?
            .filter(|c| c.receiver_id == receiver_id)
            .ok_or(ConnectionTransitionError::NotFound)?;
        if *existing.status != ConnectionStatus::Pending {
            return Err(ConnectionTransitionError::NotPending(*existing.status));
        }

        sqlx::query("UPDATE connections SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(existing.id)
            .bind(DText(status))
            .bind(OffsetDateTime::now_utc())
            .execute(&mut *tx)
            .await?;
        let updated = get_by_id(id, &mut tx)
            .await?
            .ok_or(ConnectionTransitionError::NotFound)?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Withdraw a pending request sent by `sender_id`.
    pub async fn cancel(
        id: Uuid,
        sender_id: &str,
        db: &Database,
    ) -> Result<Connection, ConnectionTransitionError> {
        let mut tx = db.begin_write().await?;

        let existing = get_by_id(id, &mut tx)
            .await?
            .filter(|c| c.sender_id == sender_id)
            .ok_or(ConnectionTransitionError::NotFound)?;
        if *existing.status != ConnectionStatus::Pending {
            return Err(ConnectionTransitionError::NotPending(*existing.status));
        }

        sqlx::query("DELETE FROM connections WHERE id = ?1")
            .bind(existing.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(existing)
    }

    /// Users sharing an accepted edge with `user_id`.
    pub async fn connected_users(user_id: &str, db: &Database) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.name, u.avatar_url, u.created_at, u.updated_at
            FROM connections c
            JOIN users u ON u.id = CASE WHEN c.user_low = ?1 THEN c.user_high ELSE c.user_low END
            WHERE (c.user_low = ?1 OR c.user_high = ?1) AND c.status = 'accepted'
            ORDER BY u.name, u.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&**db)
        .await
    }

    /// Remove every trace of a connection between two users: the edge row
    /// and any mirrored legacy entries. Returns whether anything was removed.
    pub async fn disconnect(a: &str, b: &str, db: &Database) -> Result<bool, sqlx::Error> {
        let (low, high) = unordered_pair(a, b);
        let mut tx = db.begin_write().await?;

        let edges = sqlx::query(
            r#"
            DELETE FROM connections
            WHERE user_low = ?1 AND user_high = ?2 AND status = 'accepted'
            "#,
        )
        .bind(low)
        .bind(high)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        let legacy = LegacyConnection::remove_between(a, b, &mut tx).await?;

        tx.commit().await?;
        Ok(edges + legacy > 0)
    }
}

impl Database {
    /// Turn every legacy list entry that names a known user into an accepted
    /// edge, then drop it from the legacy table. Entries naming unknown
    /// emails are left in place. Returns the number of entries folded.
    pub async fn fold_legacy_connections(&self) -> Result<u64, sqlx::Error> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin_write().await?;

        let pairs: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT l.user_id, other.id, l.email
            FROM user_legacy_connections l
            JOIN users other ON other.email = l.email
            WHERE other.id != l.user_id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut folded = 0;
        for (user_id, other_id, email) in pairs {
            insert_accepted(&user_id, &other_id, now, &mut tx).await?;
            folded += sqlx::query(
                "DELETE FROM user_legacy_connections WHERE user_id = ?1 AND email = ?2",
            )
            .bind(&user_id)
            .bind(&email)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(folded)
    }
}

#[async_trait]
impl ConnectionGraph for Database {
    type Error = sqlx::Error;

    async fn has_edge(&self, a: &str, b: &str) -> Result<bool, Self::Error> {
        let (low, high) = unordered_pair(a, b);
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM connections
                WHERE user_low = ?1 AND user_high = ?2 AND status = 'accepted'
            )
            "#,
        )
        .bind(low)
        .bind(high)
        .fetch_one(&**self)
        .await
    }

    async fn legacy_connected(&self, a: &str, b: &str) -> Result<bool, Self::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM user_legacy_connections l
                JOIN users owner ON owner.id = l.user_id
                JOIN users other ON other.email = l.email
                WHERE (owner.id = ?1 AND other.id = ?2)
                   OR (owner.id = ?2 AND other.id = ?1)
            )
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&**self)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::user::UserProfile;

    async fn setup_test_db() -> Database {
        let db_url = url::Url::parse("sqlite::memory:").unwrap();
        let db = Database::connect(&db_url).await.unwrap();
        for id in ["alice", "bob", "carol"] {
            let profile = UserProfile {
                email: Some(format!("{}@uni.edu", id)),
                ..Default::default()
            };
            User::upsert(id, &profile, &db).await.unwrap();
        }
        db
    }

    fn sent(outcome: RequestOutcome) -> Connection {
        match outcome {
            RequestOutcome::Sent(c) => c,
            other => panic!("expected a sent request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_request_accept_makes_edge() {
        let db = setup_test_db().await;

        let request = sent(Connection::request("alice", "bob", &db).await.unwrap());
        assert_eq!(*request.status, ConnectionStatus::Pending);
        assert!(!db.are_connected("alice", "bob").await.unwrap());

        // asking again from either side returns the pending request
        assert!(matches!(
            Connection::request("bob", "alice", &db).await.unwrap(),
            RequestOutcome::AlreadyPending(_)
        ));

        let incoming = Connection::incoming("bob", &db).await.unwrap();
        assert_eq!(incoming.len(), 1);

        // only the receiver may respond
        assert!(matches!(
            Connection::respond(*request.id, "alice", ConnectionStatus::Accepted, &db).await,
            Err(ConnectionTransitionError::NotFound)
        ));

        let accepted = Connection::respond(*request.id, "bob", ConnectionStatus::Accepted, &db)
            .await
            .unwrap();
        assert_eq!(*accepted.status, ConnectionStatus::Accepted);
        assert!(db.has_edge("bob", "alice").await.unwrap());
        assert!(matches!(
            Connection::request("alice", "bob", &db).await.unwrap(),
            RequestOutcome::AlreadyConnected
        ));

        assert!(matches!(
            Connection::respond(*request.id, "bob", ConnectionStatus::Rejected, &db).await,
            Err(ConnectionTransitionError::NotPending(ConnectionStatus::Accepted))
        ));

        let friends = Connection::connected_users("alice", &db).await.unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].id, "bob");
    }

    #[tokio::test]
    async fn test_rejected_request_can_be_reopened() {
        let db = setup_test_db().await;

        let request = sent(Connection::request("alice", "carol", &db).await.unwrap());
        Connection::respond(*request.id, "carol", ConnectionStatus::Rejected, &db)
            .await
            .unwrap();

        let reopened = sent(Connection::request("carol", "alice", &db).await.unwrap());
        assert_eq!(reopened.id, request.id);
        assert_eq!(reopened.sender_id, "carol");
        assert_eq!(reopened.receiver_id, "alice");
        assert_eq!(*reopened.status, ConnectionStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancel_only_by_sender() {
        let db = setup_test_db().await;
        let request = sent(Connection::request("alice", "bob", &db).await.unwrap());

        assert!(matches!(
            Connection::cancel(*request.id, "bob", &db).await,
            Err(ConnectionTransitionError::NotFound)
        ));
        Connection::cancel(*request.id, "alice", &db).await.unwrap();
        assert!(Connection::get(*request.id, &db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disconnect_removes_edge_and_legacy() {
        let db = setup_test_db().await;
        let request = sent(Connection::request("alice", "bob", &db).await.unwrap());
        Connection::respond(*request.id, "bob", ConnectionStatus::Accepted, &db)
            .await
            .unwrap();
        LegacyConnection::add("alice", "bob@uni.edu", &db).await.unwrap();

        assert!(Connection::disconnect("bob", "alice", &db).await.unwrap());
        assert!(!db.are_connected("alice", "bob").await.unwrap());
        assert!(!Connection::disconnect("bob", "alice", &db).await.unwrap());
    }

    #[tokio::test]
    async fn test_fold_legacy_connections() {
        let db = setup_test_db().await;
        LegacyConnection::add("alice", "bob@uni.edu", &db).await.unwrap();
        LegacyConnection::add("bob", "alice@uni.edu", &db).await.unwrap();
        LegacyConnection::add("carol", "stranger@uni.edu", &db)
            .await
            .unwrap();

        assert!(db.legacy_connected("alice", "bob").await.unwrap());
        assert!(!db.has_edge("alice", "bob").await.unwrap());

        assert_eq!(db.fold_legacy_connections().await.unwrap(), 2);
        assert!(db.has_edge("alice", "bob").await.unwrap());
        assert!(!db.legacy_connected("alice", "bob").await.unwrap());

        // unknown emails stay behind
        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_legacy_connections")
            .fetch_one(&*db)
            .await
            .unwrap();
        assert_eq!(left, 1);
    }
}
