use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::load_viewable;
use crate::database::models::DeletedCounts;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{error_response, internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub directory_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub directory_id: Uuid,
    pub deleted: DeletedCounts,
}

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, DeleteError> {
    let db = state.database();

    let (directory, _) = load_viewable(db, id, &requester.id)
        .await?
        .ok_or(DeleteError::NotFound(id))?;
    if directory.owner_id != requester.id {
        tracing::warn!(
            "{} tried to delete directory {} owned by {}",
            requester.id,
            id,
            directory.owner_id
        );
        return Err(DeleteError::NotOwner);
    }

    let deleted = db.delete_directory(id).await?;
    tracing::info!(
        "deleted directory {}: {} directories, {} resources, {} votes",
        id,
        deleted.directories,
        deleted.resources,
        deleted.votes
    );

    Ok((
        StatusCode::OK,
        Json(DeleteResponse {
            directory_id: id,
            deleted,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("directory not found: {0}")]
    NotFound(Uuid),
    #[error("only the owner can delete this directory")]
    NotOwner,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for DeleteError {
    fn into_response(self) -> Response {
        match self {
            DeleteError::NotFound(_) => error_response(StatusCode::NOT_FOUND, self.to_string()),
            DeleteError::NotOwner => error_response(StatusCode::FORBIDDEN, self.to_string()),
            DeleteError::Database(e) => internal_error("failed to delete directory", &e),
        }
    }
}

impl ApiRequest for DeleteRequest {
    type Response = DeleteResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join(&format!("/api/v0/directories/{}", self.directory_id))?;
        Ok(client.delete(full_url))
    }
}
