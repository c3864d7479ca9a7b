use clap::Args;
use uuid::Uuid;

use varsity_daemon::http_server::api::client::ApiError;
use varsity_daemon::http_server::api::v0::directories::get::GetRequest;
use varsity_daemon::http_server::api::v0::directories::resources::ListResourcesRequest;

use super::format_directory;
use crate::cli::op::MissingUser;

#[derive(Args, Debug, Clone)]
pub struct Show {
    /// Directory to show
    #[arg(long)]
    pub directory_id: Uuid,

    /// Filter resources by prefix
    #[arg(long)]
    pub q: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DirShowError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error(transparent)]
    MissingUser(#[from] MissingUser),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Show {
    type Error = DirShowError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.user_client()?;

        let response = client
            .call(GetRequest {
                directory_id: self.directory_id,
            })
            .await?;

        let mut lines = vec![format_directory(&response.directory)];
        for sub in &response.subdirectories {
            lines.push(format!("  {}", format_directory(sub)));
        }

        let resources = client
            .call(ListResourcesRequest {
                directory_id: self.directory_id,
                q: self.q.clone(),
            })
            .await?;

        if resources.resources.is_empty() {
            lines.push("No resources".to_string());
        }
        for info in &resources.resources {
            let mine = match info.votes.user_vote {
                Some(vote) => format!(" you: {}", vote),
                None => String::new(),
            };
            lines.push(format!(
                "- {} {} [{}] +{} -{}{}",
                info.resource.id,
                info.resource.title,
                info.resource.content.kind(),
                info.votes.up,
                info.votes.down,
                mine
            ));
        }

        Ok(lines.join("\n"))
    }
}
