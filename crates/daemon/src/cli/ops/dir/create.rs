use clap::Args;

use varsity_daemon::http_server::api::client::ApiError;
use varsity_daemon::http_server::api::v0::directories::create::CreateRequest;

use super::format_directory;
use crate::cli::op::MissingUser;

#[derive(Args, Debug, Clone)]
pub struct Create {
    #[command(flatten)]
    pub request: CreateRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum DirCreateError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error(transparent)]
    MissingUser(#[from] MissingUser),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Create {
    type Error = DirCreateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.user_client()?;
        let response = client.call(self.request.clone()).await?;

        let mut lines = vec![format!("Created {}", format_directory(&response.directory))];
        for sub in &response.subdirectories {
            lines.push(format!("  {}", format_directory(sub)));
        }
        Ok(lines.join("\n"))
    }
}
