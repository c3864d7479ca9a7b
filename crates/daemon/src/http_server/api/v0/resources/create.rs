use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::prelude::{NewResource, ResourceContent, ResourceError, ResourceKind, VisibilityResolver};
use common::resource::FileAttachment;

use super::ResourceInfo;
use crate::database::models::{log_activity, ActivityAction};
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{error_response, internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    pub directory_id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Inferred from the payload when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ResourceKind>,
    /// Metadata returned by object storage after an upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileAttachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
}

pub type CreateResponse = ResourceInfo;

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Json(req): Json<CreateRequest>,
) -> Result<impl IntoResponse, CreateError> {
    let db = state.database();
    let resolver = VisibilityResolver::new(db);

    let (directory, parent) = db
        .get_directory_with_parent(req.directory_id)
        .await?
        .ok_or(CreateError::DirectoryNotFound(req.directory_id))?;
    if !resolver
        .can_view(&directory, parent.as_ref(), &requester.id)
        .await?
    {
        return Err(CreateError::DirectoryNotFound(req.directory_id));
    }
    if !resolver.can_upload(&directory, parent.as_ref(), &requester.id) {
        tracing::warn!(
            "{} may not upload into directory {} owned by {}",
            requester.id,
            directory.id,
            directory.owner_id
        );
        return Err(CreateError::UploadDenied);
    }
    if !directory.is_subdirectory() && db.has_subdirectories(directory.id).await? {
        return Err(CreateError::HasSubdirectories);
    }

    let content = ResourceContent::from_parts(req.kind, req.file, req.youtube_url.as_deref())?;
    let new = NewResource::new(
        directory.id,
        &requester.id,
        &req.title,
        req.description.as_deref(),
        content,
    )?;

    let resource = db.create_resource(new).await?;
    tracing::info!(
        "{} uploaded {} resource {} into directory {}",
        requester.id,
        resource.content.kind(),
        resource.id,
        directory.id
    );
    log_activity(
        db,
        &requester.id,
        ActivityAction::ResourceUploaded,
        Some(&resource.id.to_string()),
        &format!("Uploaded \"{}\" to {}", resource.title, directory.course_code),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ResourceInfo::new(resource, &requester.id)),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("directory not found: {0}")]
    DirectoryNotFound(Uuid),
    #[error("only the owner can add resources to this directory")]
    UploadDenied,
    #[error("this directory has Theory and Lab subdirectories; upload into one of those")]
    HasSubdirectories,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for CreateError {
    fn into_response(self) -> Response {
        match self {
            CreateError::Resource(_) | CreateError::HasSubdirectories => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            CreateError::DirectoryNotFound(_) => {
                error_response(StatusCode::NOT_FOUND, self.to_string())
            }
            CreateError::UploadDenied => error_response(StatusCode::FORBIDDEN, self.to_string()),
            CreateError::Database(e) => internal_error("failed to create resource", &e),
        }
    }
}

impl ApiRequest for CreateRequest {
    type Response = CreateResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/resources")?;
        Ok(client.post(full_url).json(&self))
    }
}
