use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{load_viewable, DirectoryInfo};
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{error_response, internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequest {
    pub directory_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponse {
    pub directory: DirectoryInfo,
    pub subdirectories: Vec<DirectoryInfo>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, GetError> {
    let db = state.database();

    let (directory, parent) = load_viewable(db, id, &requester.id)
        .await?
        .ok_or(GetError::NotFound(id))?;

    let mut subdirectories = Vec::new();
    if !directory.is_subdirectory() {
        for sub in db.list_subdirectories(directory.id).await? {
            let count = db.count_directory_resources(sub.id).await?;
            subdirectories.push(DirectoryInfo::new(sub, Some(&directory), count));
        }
    }

    let count = db.count_directory_resources(directory.id).await?;
    Ok((
        StatusCode::OK,
        Json(GetResponse {
            directory: DirectoryInfo::new(directory, parent.as_ref(), count),
            subdirectories,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error("directory not found: {0}")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for GetError {
    fn into_response(self) -> Response {
        match self {
            GetError::NotFound(_) => error_response(StatusCode::NOT_FOUND, self.to_string()),
            GetError::Database(e) => internal_error("failed to load directory", &e),
        }
    }
}

impl ApiRequest for GetRequest {
    type Response = GetResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join(&format!("/api/v0/directories/{}", self.directory_id))?;
        Ok(client.get(full_url))
    }
}
