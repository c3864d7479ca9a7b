use axum::routing::{delete, get, post};
use axum::Router;

use crate::ServiceState;

pub mod cancel;
pub mod disconnect;
pub mod incoming;
pub mod list;
pub mod request;
pub mod respond;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", get(list::handler))
        .route("/:user_id", delete(disconnect::handler))
        .route(
            "/requests",
            get(incoming::handler).post(request::handler),
        )
        .route("/requests/:id", delete(cancel::handler))
        .route("/requests/:id/accept", post(respond::accept_handler))
        .route("/requests/:id/reject", post(respond::reject_handler))
        .with_state(state)
}
