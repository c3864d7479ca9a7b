use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::database::models::{Connection, User};
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRequest {
    pub request: Connection,
    /// Profile of the sender, when one has been synced
    pub sender: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingResponse {
    pub requests: Vec<PendingRequest>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
) -> Result<impl IntoResponse, IncomingError> {
    let db = state.database();

    let mut requests = Vec::new();
    for request in Connection::incoming(&requester.id, db).await? {
        let sender = User::get(&request.sender_id, db).await?;
        requests.push(PendingRequest { request, sender });
    }

    Ok((StatusCode::OK, Json(IncomingResponse { requests })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum IncomingError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for IncomingError {
    fn into_response(self) -> Response {
        match self {
            IncomingError::Database(e) => internal_error("failed to list connection requests", &e),
        }
    }
}

impl ApiRequest for IncomingRequest {
    type Response = IncomingResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/connections/requests")?;
        Ok(client.get(full_url))
    }
}
