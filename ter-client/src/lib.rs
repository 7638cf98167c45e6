//! Registry client library
//!
//! Command line front end for the extension registry: packs extension
//! directories with `ext-packer` and uploads or removes versions over RPC.

pub mod cli;
pub mod commands;
pub mod config;
pub mod prompt;
pub mod rpc;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::ClientError;
pub type Result<T> = std::result::Result<T, ClientError>;
