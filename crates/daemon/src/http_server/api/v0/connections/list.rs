use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::database::models::{Connection, User};
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::{internal_error, Requester};
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub connections: Vec<User>,
}

/// Everyone the caller is connected to, through an edge or a legacy list.
pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
) -> Result<impl IntoResponse, ListError> {
    let db = state.database();

    let mut connections = BTreeMap::new();
    for user in Connection::connected_users(&requester.id, db).await? {
        connections.insert(user.id.clone(), user);
    }
    for user in User::legacy_connections_of(&requester.id, db).await? {
        connections.entry(user.id.clone()).or_insert(user);
    }

    Ok((
        StatusCode::OK,
        Json(ListResponse {
            connections: connections.into_values().collect(),
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
            ListError::Database(e) => internal_error("failed to list connections", &e),
        }
    }
}

impl ApiRequest for ListRequest {
    type Response = ListResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/connections")?;
        Ok(client.get(full_url))
    }
}
