use axum::routing::get;
use axum::Router;

use crate::ServiceState;

pub mod list;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", get(list::handler))
        .with_state(state)
}
