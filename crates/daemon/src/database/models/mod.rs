pub mod activity;
pub mod connection;
pub mod course;
pub mod directory;
pub mod resource;
pub mod user;

pub use activity::{log_activity, Activity, ActivityAction};
pub use connection::{Connection, ConnectionTransitionError, RequestOutcome};
pub use directory::DeletedCounts;
pub use user::{LegacyConnection, User, UserProfile};
