use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::database::{Database, DatabaseConnection};

/// Profile fields forwarded by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserProfile {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.avatar_url.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Insert or refresh a user record. Fields missing from `profile` keep
    /// their stored values.
    pub async fn upsert(id: &str, profile: &UserProfile, db: &Database) -> Result<User, sqlx::Error> {
        let now = OffsetDateTime::now_utc();
        let email = profile.email.as_deref().map(normalize_email);

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, avatar_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(id) DO UPDATE SET
                email = COALESCE(excluded.email, users.email),
                name = COALESCE(excluded.name, users.name),
                avatar_url = COALESCE(excluded.avatar_url, users.avatar_url),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(&profile.name)
        .bind(&profile.avatar_url)
        .bind(now)
        .execute(&**db)
        .await?;

        Self::get(id, db).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get(id: &str, db: &Database) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, avatar_url, created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&**db)
        .await
    }

    pub async fn find_by_email(email: &str, db: &Database) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, avatar_url, created_at, updated_at
            FROM users
            WHERE email = ?1
            LIMIT 1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&**db)
        .await
    }

    /// Users connected to `user_id` through the legacy email lists, in
    /// either direction.
    pub async fn legacy_connections_of(
        user_id: &str,
        db: &Database,
    ) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT DISTINCT u.id, u.email, u.name, u.avatar_url, u.created_at, u.updated_at
            FROM users u
            JOIN users me ON me.id = ?1
            WHERE u.id != me.id AND (
                EXISTS (
                    SELECT 1 FROM user_legacy_connections l
                    WHERE l.user_id = me.id AND l.email = u.email
                )
                OR EXISTS (
                    SELECT 1 FROM user_legacy_connections l
                    WHERE l.user_id = u.id AND l.email = me.email
                )
            )
            "#,
        )
        .bind(user_id)
        .fetch_all(&**db)
        .await
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// An entry of a user's legacy connection list.
pub struct LegacyConnection;

impl LegacyConnection {
    pub async fn add(user_id: &str, email: &str, db: &Database) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_legacy_connections (user_id, email)
            VALUES (?1, ?2)
            ON CONFLICT(user_id, email) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(normalize_email(email))
        .execute(&**db)
        .await?;
        Ok(())
    }

    /// Remove the mirrored entries linking two users. Returns the number of
    /// entries removed.
    pub async fn remove_between(
        a: &str,
        b: &str,
        conn: &mut DatabaseConnection,
    ) -> Result<u64, sqlx::Error> {
        let removed = sqlx::query(
            r#"
            DELETE FROM user_legacy_connections
            WHERE (user_id = ?1 AND email = (SELECT email FROM users WHERE id = ?2))
               OR (user_id = ?2 AND email = (SELECT email FROM users WHERE id = ?1))
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(&mut *conn)
        .await?
        .rows_affected();
        Ok(removed)
    }
}
