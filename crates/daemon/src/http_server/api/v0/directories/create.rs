use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::prelude::{
    CourseCatalog, CourseCode, DirectoryError, NewDirectory, SubdirectoryKind, Visibility,
};

use super::{load_viewable, DirectoryInfo};
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{error_response, internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct CreateRequest {
    /// Course code, e.g. CSE220. Ignored for subdirectories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub course_code: Option<String>,

    /// Title; defaults to the catalog's course name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub title: Option<String>,

    /// public, private or connections (roots only, defaults to private)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub visibility: Option<Visibility>,

    /// Also create Theory and Lab subdirectories when the course has a lab
    #[serde(default)]
    #[arg(long)]
    pub with_subdirectories: bool,

    /// Create a subdirectory under this root instead of a new root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub parent_directory_id: Option<Uuid>,

    /// theory or lab, required with --parent-directory-id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub subdirectory_type: Option<SubdirectoryKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResponse {
    pub directory: DirectoryInfo,
    pub subdirectories: Vec<DirectoryInfo>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Json(req): Json<CreateRequest>,
) -> Result<impl IntoResponse, CreateError> {
    let db = state.database();

    if let Some(parent_id) = req.parent_directory_id {
        if req.visibility.is_some() {
            return Err(DirectoryError::SubdirectoryVisibility.into());
        }
        let kind = req
            .subdirectory_type
            .ok_or(CreateError::MissingSubdirectoryType)?;
        let (parent, _) = load_viewable(db, parent_id, &requester.id)
            .await?
            .ok_or(CreateError::ParentNotFound(parent_id))?;

        let new = NewDirectory::plan_subdirectory(&parent, kind, req.title.as_deref(), &requester.id)?;
        if db.subdirectory_exists(parent_id, kind).await? {
            return Err(CreateError::DuplicateSubdirectory(kind));
        }

        let subdirectory = db.create_subdirectory(new).await.map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                CreateError::DuplicateSubdirectory(kind)
            }
            other => CreateError::Database(other),
        })?;
        tracing::info!(
            "created {} subdirectory {} under {} for {}",
            kind,
            subdirectory.id,
            parent_id,
            requester.id
        );

        return Ok((
            StatusCode::CREATED,
            Json(CreateResponse {
                directory: DirectoryInfo::new(subdirectory, Some(&parent), 0),
                subdirectories: Vec::new(),
            }),
        )
            .into_response());
    }

    let code = CourseCode::parse(req.course_code.as_deref().unwrap_or_default())?;
    let course = db
        .lookup(&code)
        .await?
        .ok_or_else(|| CreateError::UnknownCourse(code.clone()))?;

    let visibility = req.visibility.unwrap_or_default();
    let plan = NewDirectory::plan_root(
        &course,
        req.title.as_deref(),
        &requester.id,
        visibility,
        req.with_subdirectories,
    )?;

    let (root, subdirectories) = db.create_directories(plan).await?;
    tracing::info!(
        "created {} directory {} ({}) with {} subdirectories for {}",
        visibility,
        root.id,
        root.course_code,
        subdirectories.len(),
        requester.id
    );

    let subdirectories = subdirectories
        .into_iter()
        .map(|sub| DirectoryInfo::new(sub, Some(&root), 0))
        .collect();
    Ok((
        StatusCode::CREATED,
        Json(CreateResponse {
            directory: DirectoryInfo::new(root, None, 0),
            subdirectories,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("unknown course code: {0}")]
    UnknownCourse(CourseCode),
    #[error("subdirectory_type is required when parent_directory_id is set")]
    MissingSubdirectoryType,
    #[error("parent directory not found: {0}")]
    ParentNotFound(Uuid),
    #[error("a {0} subdirectory already exists under this directory")]
    DuplicateSubdirectory(SubdirectoryKind),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for CreateError {
    fn into_response(self) -> Response {
        match self {
            CreateError::Directory(DirectoryError::NotParentOwner) => {
                tracing::warn!("directory create denied: {}", self);
                error_response(StatusCode::FORBIDDEN, self.to_string())
            }
            CreateError::Directory(_)
            | CreateError::UnknownCourse(_)
            | CreateError::MissingSubdirectoryType => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            CreateError::ParentNotFound(_) => error_response(StatusCode::NOT_FOUND, self.to_string()),
            CreateError::DuplicateSubdirectory(_) => {
                error_response(StatusCode::CONFLICT, self.to_string())
            }
            CreateError::Database(e) => internal_error("failed to create directory", &e),
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for CreateRequest {
    type Response = CreateResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/directories")?;
        Ok(client.post(full_url).json(&self))
    }
}
