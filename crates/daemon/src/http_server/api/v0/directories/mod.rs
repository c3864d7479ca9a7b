use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use common::prelude::{CourseCode, Directory, SubdirectoryKind, Visibility, VisibilityResolver};

use crate::database::Database;
use crate::ServiceState;

pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod resources;
pub mod validate;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", post(create::handler).get(list::handler))
        .route("/validate", post(validate::handler))
        .route("/:id", get(get::handler).delete(delete::handler))
        .route("/:id/resources", get(resources::handler))
        .with_state(state)
}

/// A directory as returned by the API, with its effective visibility
/// resolved and its resource count attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryInfo {
    pub id: Uuid,
    pub course_code: CourseCode,
    pub title: String,
    pub owner_id: String,
    pub visibility: Visibility,
    pub parent_directory_id: Option<Uuid>,
    pub is_subdirectory: bool,
    pub subdirectory_type: Option<SubdirectoryKind>,
    pub resource_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl DirectoryInfo {
    pub fn new(directory: Directory, parent: Option<&Directory>, resource_count: u64) -> Self {
        Self {
            visibility: directory.effective_visibility(parent),
            is_subdirectory: directory.is_subdirectory(),
            id: directory.id,
            course_code: directory.course_code,
            title: directory.title,
            owner_id: directory.owner_id,
            parent_directory_id: directory.parent_directory_id,
            subdirectory_type: directory.subdirectory_type,
            resource_count,
            created_at: directory.created_at,
            updated_at: directory.updated_at,
        }
    }
}

/// Load a directory with its parent, if it exists and `requester_id` may
/// view it. Missing and hidden directories are indistinguishable.
pub(crate) async fn load_viewable(
    db: &Database,
    id: Uuid,
    requester_id: &str,
) -> Result<Option<(Directory, Option<Directory>)>, sqlx::Error> {
    let Some((directory, parent)) = db.get_directory_with_parent(id).await? else {
        return Ok(None);
    };

    let visible = VisibilityResolver::new(db)
        .can_view(&directory, parent.as_ref(), requester_id)
        .await?;
    if !visible {
        tracing::warn!(
            "directory {} is not visible to {}, reporting not found",
            id,
            requester_id
        );
        return Ok(None);
    }

    Ok(Some((directory, parent)))
}
