use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::Connection;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::connections::respond::RespondError;
use crate::http_server::api::Requester;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub request_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub request_id: Uuid,
    pub cancelled: bool,
}

/// Withdraw a pending request the caller sent.
pub async fn handler(
    State(state): State<ServiceState>,
    requester: Requester,
    Path(id): Path<Uuid>,
) -> Result<Response, RespondError> {
    let request = Connection::cancel(id, &requester.id, state.database()).await?;
    tracing::info!(
        "{} cancelled connection request {} to {}",
        requester.id,
        id,
        request.receiver_id
    );

    Ok((
        StatusCode::OK,
        Json(CancelResponse {
            request_id: id,
            cancelled: true,
        }),
    )
        .into_response())
}

impl ApiRequest for CancelRequest {
    type Response = CancelResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join(&format!("/api/v0/connections/requests/{}", self.request_id))?;
        Ok(client.delete(full_url))
    }
}
