use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::database::models::Connection;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{error_response, internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectResponse {
    pub user_id: String,
    pub disconnected: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, DisconnectError> {
    if user_id == requester.id {
        return Err(DisconnectError::SelfDisconnect);
    }

    if !Connection::disconnect(&requester.id, &user_id, state.database()).await? {
        return Err(DisconnectError::NotConnected(user_id));
    }
    tracing::info!("{} disconnected from {}", requester.id, user_id);

    Ok((
        StatusCode::OK,
        Json(DisconnectResponse {
            user_id,
            disconnected: true,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum DisconnectError {
    #[error("you cannot disconnect from yourself")]
    SelfDisconnect,
    #[error("you are not connected to {0}")]
    NotConnected(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for DisconnectError {
    fn into_response(self) -> Response {
        match self {
            DisconnectError::SelfDisconnect | DisconnectError::NotConnected(_) => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            DisconnectError::Database(e) => internal_error("failed to disconnect", &e),
        }
    }
}

impl ApiRequest for DisconnectRequest {
    type Response = DisconnectResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let mut full_url = base_url.join("/api/v0/connections/")?;
        full_url
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(&self.user_id);
        Ok(client.delete(full_url))
    }
}
