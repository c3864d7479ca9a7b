use axum::Router;

pub mod activities;
pub mod connections;
pub mod directories;
pub mod resources;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/directories", directories::router(state.clone()))
        .nest("/resources", resources::router(state.clone()))
        .nest("/connections", connections::router(state.clone()))
        .nest("/activities", activities::router(state.clone()))
        .with_state(state)
}
