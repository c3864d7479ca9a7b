pub mod daemon;
pub mod dir;
pub mod health;
pub mod init;
pub mod version;
pub mod vote;

pub use daemon::Daemon;
pub use dir::Dir;
pub use health::Health;
pub use init::Init;
pub use version::Version;
pub use vote::Vote;
