pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Daemon, Dir, Health, Init, Version, Vote};
