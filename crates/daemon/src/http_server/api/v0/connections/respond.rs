use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::prelude::ConnectionStatus;

use crate::database::models::{
    log_activity, ActivityAction, Connection, ConnectionTransitionError, User,
};
use crate::database::Database;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{error_response, internal_error, Requester};
use crate::ServiceState;

/// Accept or reject a pending request addressed to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondRequest {
    pub request_id: Uuid,
    pub accept: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondResponse {
    pub request: Connection,
}

pub async fn accept_handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, RespondError> {
    let db = state.database();
    let request = Connection::respond(id, &requester.id, ConnectionStatus::Accepted, db).await?;
    tracing::info!(
        "{} accepted connection request {} from {}",
        requester.id,
        id,
        request.sender_id
    );

    log_accepted(db, &requester.id, &request.sender_id, &request).await;
    log_accepted(db, &request.sender_id, &requester.id, &request).await;

    Ok((StatusCode::OK, Json(RespondResponse { request })).into_response())
}

pub async fn reject_handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, RespondError> {
    let request = Connection::respond(
        id,
        &requester.id,
        ConnectionStatus::Rejected,
        state.database(),
    )
    .await?;
    tracing::info!(
        "{} rejected connection request {} from {}",
        requester.id,
        id,
        request.sender_id
    );

    Ok((StatusCode::OK, Json(RespondResponse { request })).into_response())
}

async fn log_accepted(db: &Database, user_id: &str, other_id: &str, request: &Connection) {
    let other_name = match User::get(other_id, db).await {
        Ok(Some(user)) => user.name.or(user.email).unwrap_or_else(|| other_id.to_string()),
        _ => other_id.to_string(),
    };
    log_activity(
        db,
        user_id,
        ActivityAction::ConnectionAccepted,
        Some(&request.id.to_string()),
        &format!("Connected with {}", other_name),
    )
    .await;
}

#[derive(Debug, thiserror::Error)]
pub enum RespondError {
    #[error("connection request not found")]
    NotFound,
    #[error("connection request is already {0}")]
    NotPending(ConnectionStatus),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ConnectionTransitionError> for RespondError {
    fn from(err: ConnectionTransitionError) -> Self {
        match err {
            ConnectionTransitionError::NotFound => RespondError::NotFound,
            ConnectionTransitionError::NotPending(status) => RespondError::NotPending(status),
            ConnectionTransitionError::Database(e) => RespondError::Database(e),
        }
    }
}

impl IntoResponse for RespondError {
    fn into_response(self) -> Response {
        match self {
            RespondError::NotFound => error_response(StatusCode::NOT_FOUND, self.to_string()),
            RespondError::NotPending(_) => error_response(StatusCode::CONFLICT, self.to_string()),
            RespondError::Database(e) => {
                internal_error("failed to respond to connection request", &e)
            }
        }
    }
}

impl ApiRequest for RespondRequest {
    type Response = RespondResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let action = if self.accept { "accept" } else { "reject" };
        let full_url = base_url.join(&format!(
            "/api/v0/connections/requests/{}/{}",
            self.request_id, action
        ))?;
        Ok(client.post(full_url))
    }
}
