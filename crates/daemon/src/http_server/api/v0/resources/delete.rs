use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{log_activity, ActivityAction};
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::directories::load_viewable;
use crate::http_server::api::{error_response, internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub resource_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub resource_id: Uuid,
    pub deleted: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, DeleteError> {
    let db = state.database();

    let resource = db
        .get_resource(id)
        .await?
        .ok_or(DeleteError::NotFound(id))?;
    load_viewable(db, resource.directory_id, &requester.id)
        .await?
        .ok_or(DeleteError::NotFound(id))?;
    if resource.owner_id != requester.id {
        tracing::warn!(
            "{} tried to delete resource {} owned by {}",
            requester.id,
            id,
            resource.owner_id
        );
        return Err(DeleteError::NotOwner);
    }

    let deleted = db.delete_resource(id).await?;
    if deleted {
        tracing::info!("{} deleted resource {}", requester.id, id);
        log_activity(
            db,
            &requester.id,
            ActivityAction::ResourceDeleted,
            Some(&id.to_string()),
            &format!("Deleted \"{}\"", resource.title),
        )
        .await;
    }

    Ok((
        StatusCode::OK,
        Json(DeleteResponse {
            resource_id: id,
            deleted,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("resource not found: {0}")]
    NotFound(Uuid),
    #[error("only the owner can delete this resource")]
    NotOwner,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for DeleteError {
    fn into_response(self) -> Response {
        match self {
            DeleteError::NotFound(_) => error_response(StatusCode::NOT_FOUND, self.to_string()),
            DeleteError::NotOwner => error_response(StatusCode::FORBIDDEN, self.to_string()),
            DeleteError::Database(e) => internal_error("failed to delete resource", &e),
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
        let full_url = base_url.join(&format!("/api/v0/resources/{}", self.resource_id))?;
        Ok(client.delete(full_url))
    }
}
