mod dtext;

pub use dtext::{DText, DUuid};
