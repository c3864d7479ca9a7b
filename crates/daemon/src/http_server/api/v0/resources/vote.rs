use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::prelude::{VoteAction, VoteTally};

use crate::database::models::{log_activity, ActivityAction};
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::directories::load_viewable;
use crate::http_server::api::{error_response, internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct VoteRequest {
    /// Resource to vote on
    #[serde(skip)]
    #[arg(long)]
    pub resource_id: Uuid,

    /// up, down or clear. Repeating the current vote removes it.
    #[arg(long)]
    pub vote: VoteAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub resource_id: Uuid,
    #[serde(flatten)]
    pub tally: VoteTally,
}

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Path(id): Path<Uuid>,
    Json(req): Json<VoteRequest>,
) -> Result<impl IntoResponse, VoteError> {
    let db = state.database();

    let resource = db.get_resource(id).await?.ok_or(VoteError::NotFound(id))?;
    load_viewable(db, resource.directory_id, &requester.id)
        .await?
        .ok_or(VoteError::NotFound(id))?;

    let tally = db.apply_vote(id, &requester.id, req.vote).await?;
    tracing::info!(
        "{} voted {} on resource {}: up={} down={}",
        requester.id,
        req.vote,
        id,
        tally.up,
        tally.down
    );

    let summary = match tally.user_vote {
        Some(vote) => format!("Voted {} on \"{}\"", vote, resource.title),
        None => format!("Cleared vote on \"{}\"", resource.title),
    };
    log_activity(
        db,
        &requester.id,
        ActivityAction::ResourceVoted,
        Some(&id.to_string()),
        &summary,
    )
    .await;

    Ok((
        StatusCode::OK,
        Json(VoteResponse {
            resource_id: id,
            tally,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("resource not found: {0}")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for VoteError {
    fn into_response(self) -> Response {
        match self {
            VoteError::NotFound(_) => error_response(StatusCode::NOT_FOUND, self.to_string()),
            VoteError::Database(e) => internal_error("failed to apply vote", &e),
        }
    }
}

impl ApiRequest for VoteRequest {
    type Response = VoteResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join(&format!("/api/v0/resources/{}/vote", self.resource_id))?;
        Ok(client.post(full_url).json(&self))
    }
}
