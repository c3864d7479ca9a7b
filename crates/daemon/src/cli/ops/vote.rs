use clap::Args;

use varsity_daemon::http_server::api::client::ApiError;
use varsity_daemon::http_server::api::v0::resources::vote::VoteRequest;

use crate::cli::op::MissingUser;

#[derive(Args, Debug, Clone)]
pub struct Vote {
    #[command(flatten)]
    pub request: VoteRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error(transparent)]
    MissingUser(#[from] MissingUser),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Vote {
    type Error = VoteError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.user_client()?;
        let response = client.call(self.request.clone()).await?;

        let current = match response.tally.user_vote {
            Some(vote) => vote.to_string(),
            None => "none".to_string(),
        };
        Ok(format!(
            "{}: up={} down={} (your vote: {})",
            response.resource_id, response.tally.up, response.tally.down, current
        ))
    }
}
