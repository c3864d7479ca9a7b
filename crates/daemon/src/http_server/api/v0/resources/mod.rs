use axum::routing::{delete, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use common::prelude::{Resource, VoteTally};

use crate::ServiceState;

pub mod create;
pub mod delete;
pub mod vote;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", post(create::handler))
        .route("/:id", delete(delete::handler))
        .route("/:id/vote", post(vote::handler))
        .with_state(state)
}

/// A resource with its vote counts and the caller's own vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    #[serde(flatten)]
    pub resource: Resource,
    pub votes: VoteTally,
}

impl ResourceInfo {
    pub fn new(resource: Resource, requester_id: &str) -> Self {
        let votes = resource.votes.tally_for(requester_id);
        Self { resource, votes }
    }
}
