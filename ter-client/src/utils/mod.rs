//! Utility modules for the registry client.

pub mod errors;
pub mod logger;

pub use errors::{ClientError, Result};
