use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::database::models::activity::DEFAULT_ACTIVITY_LIMIT;
use crate::database::models::Activity;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct ListRequest {
    /// Number of entries to return (at most 100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub activities: Vec<Activity>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Query(req): Query<ListRequest>,
) -> Result<impl IntoResponse, ListError> {
    let limit = req.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    let activities = Activity::list(&requester.id, limit, state.database()).await?;

    Ok((StatusCode::OK, Json(ListResponse { activities })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        match self {
            ListError::Database(e) => internal_error("failed to list activities", &e),
        }
    }
}

impl ApiRequest for ListRequest {
    type Response = ListResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/activities")?;
        Ok(client.get(full_url).query(&self))
    }
}
