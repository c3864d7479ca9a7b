use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use super::DatabaseSetupError;

/// How long a writer waits on a locked file database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a pool for a `sqlite://` url.
///
/// `sqlite::memory:` gets a single connection that is never recycled, since
/// every new connection would see a fresh, empty database.
pub async fn connect_sqlite(url: &url::Url) -> Result<SqlitePool, DatabaseSetupError> {
    let in_memory = url.as_str().contains(":memory:");

    let options = SqliteConnectOptions::from_str(url.as_str())?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                options
                    .journal_mode(SqliteJournalMode::Wal)
                    .busy_timeout(BUSY_TIMEOUT),
            )
            .await?
    };

    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

pub async fn migrate_sqlite(pool: &SqlitePool) -> Result<(), DatabaseSetupError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
