use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::database::models::{Connection, RequestOutcome, User};
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{error_response, internal_error, Requester};
use crate::ServiceState;

/// Ask another user to connect, naming them by id or by email.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
    Sent,
    AlreadyPending,
    AlreadyConnected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub status: SendStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Connection>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Json(req): Json<SendRequest>,
) -> Result<impl IntoResponse, SendError> {
    let db = state.database();

    let target = match (req.user_id.as_deref(), req.email.as_deref()) {
        (Some(user_id), _) => User::get(user_id.trim(), db).await?,
        (None, Some(email)) => User::find_by_email(email, db).await?,
        (None, None) => return Err(SendError::MissingTarget),
    }
    .ok_or(SendError::UnknownUser)?;

    if target.id == requester.id {
        return Err(SendError::SelfRequest);
    }

    let (status_code, response) = match Connection::request(&requester.id, &target.id, db).await? {
        RequestOutcome::Sent(request) => {
            tracing::info!("{} sent a connection request to {}", requester.id, target.id);
            (
                StatusCode::CREATED,
                SendResponse {
                    status: SendStatus::Sent,
                    request: Some(request),
                },
            )
        }
        RequestOutcome::AlreadyPending(request) => (
            StatusCode::OK,
            SendResponse {
                status: SendStatus::AlreadyPending,
                request: Some(request),
            },
        ),
        RequestOutcome::AlreadyConnected => (
            StatusCode::OK,
            SendResponse {
                status: SendStatus::AlreadyConnected,
                request: None,
            },
        ),
    };

    Ok((status_code, Json(response)).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("user_id or email is required")]
    MissingTarget,
    #[error("you cannot connect with yourself")]
    SelfRequest,
    #[error("user not found")]
    UnknownUser,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for SendError {
    fn into_response(self) -> Response {
        match self {
            SendError::MissingTarget | SendError::SelfRequest => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            SendError::UnknownUser => error_response(StatusCode::NOT_FOUND, self.to_string()),
            SendError::Database(e) => internal_error("failed to send connection request", &e),
        }
    }
}

impl ApiRequest for SendRequest {
    type Response = SendResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/connections/requests")?;
        Ok(client.post(full_url).json(&self))
    }
}
