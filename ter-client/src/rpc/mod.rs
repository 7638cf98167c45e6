//! Registry RPC seam.
//!
//! Commands talk to the registry through [`RegistryClient`]; the HTTP
//! transport in [`http`] is one implementation of it.

pub mod http;

use crate::utils::Result;
use async_trait::async_trait;
use ext_packer::Payload;
use serde::Deserialize;
use std::fmt;

pub use http::HttpRegistryClient;

/// Registry account credentials. Passed through untouched, never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result mapping returned by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistryResponse {
    /// Version now on the registry, when the call echoes one
    #[serde(default)]
    pub version: Option<String>,

    /// Human-readable messages, in order
    #[serde(default)]
    pub messages: Vec<String>,
}

#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Upload a packed extension version.
    async fn upload(&self, credentials: &Credentials, payload: &Payload) -> Result<RegistryResponse>;

    /// Remove one version of an extension.
    async fn remove_version(
        &self,
        credentials: &Credentials,
        extension_key: &str,
        version: &str,
    ) -> Result<RegistryResponse>;
}
