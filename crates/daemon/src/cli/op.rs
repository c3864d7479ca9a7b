use std::error::Error;
use std::path::PathBuf;

use url::Url;

use varsity_daemon::http_server::api::client::{ApiClient, ApiError};
use varsity_daemon::state::{AppConfig, AppState};

/// Resolve the remote URL for the API client.
///
/// Priority: explicit `--remote` flag > config file `api_port` > default port.
pub fn resolve_remote(
    explicit: Option<Url>,
    config_path: Option<PathBuf>,
) -> Result<Url, url::ParseError> {
    if let Some(url) = explicit {
        return Ok(url);
    }
    let api_port = AppState::load(config_path)
        .map(|state| state.config.api_port)
        .unwrap_or_else(|_| AppConfig::default().api_port);
    Url::parse(&format!("http://localhost:{}", api_port))
}

#[derive(Clone)]
pub struct OpContext {
    /// API client (always initialized with default or custom URL)
    pub client: ApiClient,
    /// Optional custom config path (defaults to ~/.varsity)
    pub config_path: Option<PathBuf>,
    /// Identity to act as on API calls
    pub user: Option<String>,
}

impl OpContext {
    /// Create context with custom remote URL and optional config path
    pub fn new(
        remote: Url,
        config_path: Option<PathBuf>,
        user: Option<String>,
    ) -> Result<Self, ApiError> {
        let mut client = ApiClient::new(&remote)?;
        if let Some(user) = &user {
            client = client.with_user(user.clone());
        }
        Ok(Self {
            client,
            config_path,
            user,
        })
    }

    /// The API client, or an error when no `--user` was given.
    pub fn user_client(&self) -> Result<&ApiClient, MissingUser> {
        self.user.as_ref().map(|_| &self.client).ok_or(MissingUser)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("this command needs --user (or VARSITY_USER)")]
pub struct MissingUser;

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
