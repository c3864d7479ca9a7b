use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::{HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

pub mod client;
mod requester;
pub mod v0;

pub use requester::{
    Requester, RequesterRejection, USER_AVATAR_HEADER, USER_EMAIL_HEADER, USER_ID_HEADER,
    USER_NAME_HEADER,
};

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::DELETE])
        .allow_headers(vec![
            ACCEPT,
            CONTENT_TYPE,
            ORIGIN,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_EMAIL_HEADER),
            HeaderName::from_static(USER_NAME_HEADER),
            HeaderName::from_static(USER_AVATAR_HEADER),
        ])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .nest("/v0", v0::router(state.clone()))
        .with_state(state)
        .layer(cors_layer)
}

/// JSON error body used by every API handler.
pub(crate) fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    let body = serde_json::json!({"msg": msg.into()});
    (status, Json(body)).into_response()
}

/// Generic 500 for persistence failures. Details stay in the server log.
pub(crate) fn internal_error(context: &str, err: &dyn std::fmt::Display) -> Response {
    tracing::error!("{}: {}", context, err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}
