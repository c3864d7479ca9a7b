use axum::extract::FromRef;
use url::Url;

use common::catalog::{CatalogFile, CatalogFileError};

use crate::database::{Database, DatabaseSetupError};
use crate::ServiceConfig;

/// Shared state handed to every request handler.
#[derive(Clone, Debug)]
pub struct State {
    database: Database,
}

impl State {
    pub async fn from_config(config: &ServiceConfig) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                // check that the path exists
                if !path.exists() {
                    return Err(StateSetupError::DatabasePathDoesNotExist);
                }
                // parse the path into a URL
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Import the course catalog
        if let Some(ref path) = config.course_catalog {
            let catalog = CatalogFile::load(path)?;
            let imported = database
                .import_courses(&catalog.courses)
                .await
                .map_err(StateSetupError::CatalogImport)?;
            tracing::info!("imported {} courses from {}", imported, path.display());
        }

        // 3. Fold legacy connection lists into edges
        let folded = database
            .fold_legacy_connections()
            .await
            .map_err(StateSetupError::LegacyFold)?;
        if folded > 0 {
            tracing::info!("folded {} legacy connection entries into edges", folded);
        }

        Ok(Self { database })
    }

    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        self.database()
    }
}

impl FromRef<State> for Database {
    fn from_ref(state: &State) -> Self {
        state.database.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database path does not exist")]
    DatabasePathDoesNotExist,
    #[error("Database setup error: {0}")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
    #[error("Course catalog error: {0}")]
    CatalogFile(#[from] CatalogFileError),
    #[error("Failed to import course catalog: {0}")]
    CatalogImport(sqlx::Error),
    #[error("Failed to fold legacy connections: {0}")]
    LegacyFold(sqlx::Error),
}
