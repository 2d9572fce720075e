//! Utility modules shared by both tools.

pub mod errors;
pub mod logger;

pub use errors::{Result, SyncError};
