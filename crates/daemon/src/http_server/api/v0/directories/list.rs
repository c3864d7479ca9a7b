use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{DirectorySort, Page, PageRequest, Visibility, VisibilityResolver};

use super::DirectoryInfo;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct ListRequest {
    /// Case-insensitive prefix on course code or title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub q: Option<String>,

    /// Only directories owned by this user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub owner_id: Option<String>,

    /// Only directories with this visibility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub visibility: Option<Visibility>,

    /// code_asc, code_desc, title_asc, title_desc, newest or oldest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub sort: Option<DirectorySort>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub limit: Option<u32>,
}

pub type ListResponse = Page<DirectoryInfo>;

pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Query(req): Query<ListRequest>,
) -> Result<impl IntoResponse, ListError> {
    let db = state.database();
    let resolver = VisibilityResolver::new(db);

    let candidates = db
        .list_root_directories(req.owner_id.as_deref(), req.visibility)
        .await?;

    let query = req.q.as_deref().unwrap_or_default();
    let mut visible = Vec::with_capacity(candidates.len());
    for directory in candidates {
        if !directory.matches_query(query) {
            continue;
        }
        if resolver.can_view(&directory, None, &requester.id).await? {
            visible.push(directory);
        }
    }

    let sort = req.sort.unwrap_or_default();
    visible.sort_by(|a, b| sort.compare(a, b));

    let page = PageRequest::new(req.page, req.limit).paginate(visible);
    let mut items = Vec::with_capacity(page.items.len());
    for directory in page.items {
        let count = db.count_directory_resources(directory.id).await?;
        items.push(DirectoryInfo::new(directory, None, count));
    }

    Ok((
        StatusCode::OK,
        Json(ListResponse {
            items,
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        match self {
            ListError::Database(e) => internal_error("failed to list directories", &e),
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for ListRequest {
    type Response = ListResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/directories")?;
        Ok(client.get(full_url).query(&self))
    }
}
