use clap::Args;

use varsity_daemon::http_server::api::client::ApiError;
use varsity_daemon::http_server::api::v0::directories::list::ListRequest;

use super::format_directory;
use crate::cli::op::MissingUser;

#[derive(Args, Debug, Clone)]
pub struct Ls {
    #[command(flatten)]
    pub request: ListRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum DirLsError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error(transparent)]
    MissingUser(#[from] MissingUser),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = DirLsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.user_client()?;
        let response = client.call(self.request.clone()).await?;

        if response.items.is_empty() {
            return Ok("No directories found".to_string());
        }

        let mut lines: Vec<String> = response.items.iter().map(format_directory).collect();
        lines.push(format!(
            "page {}/{} ({} total)",
            response.page,
            response.total_pages.max(1),
            response.total
        ));
        Ok(lines.join("\n"))
    }
}
