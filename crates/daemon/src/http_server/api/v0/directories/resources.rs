use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::resource::compare_for_listing;

use super::load_viewable;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::resources::ResourceInfo;
use crate::http_server::api::{error_response, internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResourcesRequest {
    #[serde(skip)]
    pub directory_id: Uuid,
    /// Case-insensitive prefix on title, description or file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResourcesResponse {
    pub directory_id: Uuid,
    pub resources: Vec<ResourceInfo>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Path(id): Path<Uuid>,
    Query(req): Query<ListResourcesRequest>,
) -> Result<impl IntoResponse, ListResourcesError> {
    let db = state.database();

    load_viewable(db, id, &requester.id)
        .await?
        .ok_or(ListResourcesError::NotFound(id))?;

    let query = req.q.as_deref().unwrap_or_default();
    let mut resources: Vec<_> = db
        .list_directory_resources(id)
        .await?
        .into_iter()
        .filter(|r| r.matches_query(query))
        .collect();
    resources.sort_by(compare_for_listing);

    let resources = resources
        .into_iter()
        .map(|r| ResourceInfo::new(r, &requester.id))
        .collect();

    Ok((
        StatusCode::OK,
        Json(ListResourcesResponse {
            directory_id: id,
            resources,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ListResourcesError {
    #[error("directory not found: {0}")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ListResourcesError {
    fn into_response(self) -> Response {
        match self {
            ListResourcesError::NotFound(_) => {
                error_response(StatusCode::NOT_FOUND, self.to_string())
            }
            ListResourcesError::Database(e) => internal_error("failed to list resources", &e),
        }
    }
}

impl ApiRequest for ListResourcesRequest {
    type Response = ListResourcesResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url =
            base_url.join(&format!("/api/v0/directories/{}/resources", self.directory_id))?;
        Ok(client.get(full_url).query(&self))
    }
}
