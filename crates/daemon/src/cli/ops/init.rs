use std::path::PathBuf;

use clap::Args;

use varsity_daemon::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// API server port
    #[arg(long, default_value_t = 5001)]
    pub api_port: u16,

    /// TOML course catalog to import on every daemon start
    #[arg(long)]
    pub course_catalog: Option<PathBuf>,

    /// Default log filter, e.g. "info" or "varsity_daemon=debug"
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            api_port: self.api_port,
            course_catalog: self.course_catalog.clone(),
            log_level: self.log_level.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let catalog = match &state.config.course_catalog {
            Some(path) => path.display().to_string(),
            None => "none".to_string(),
        };

        Ok(format!(
            "Initialized varsity directory at: {}\n\
             - Database: {}\n\
             - Config: {}\n\
             - API port: {}\n\
             - Course catalog: {}",
            state.state_dir.display(),
            state.db_path.display(),
            state.config_path.display(),
            state.config.api_port,
            catalog
        ))
    }
}
