//! JSON-over-HTTP transport for registry calls.
//!
//! Every call is a single POST of a JSON envelope naming the remote
//! method; the response body is the registry's result mapping.

use super::{Credentials, RegistryClient, RegistryResponse};
use crate::utils::{ClientError, Result};
use async_trait::async_trait;
use ext_packer::packer::{ExtensionData, FileRecord};
use ext_packer::Payload;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

pub const UPLOAD_METHOD: &str = "uploadExtension";
pub const DELETE_METHOD: &str = "deleteExtension";

#[derive(Serialize)]
struct AccountData<'a> {
    username: &'a str,
    password: &'a str,
}

impl<'a> From<&'a Credentials> for AccountData<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            username: &credentials.username,
            password: &credentials.password,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest<'a> {
    method: &'static str,
    account_data: AccountData<'a>,
    extension_data: &'a ExtensionData,
    files_data: &'a [FileRecord],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    method: &'static str,
    account_data: AccountData<'a>,
    extension_key: &'a str,
    version: &'a str,
}

/// Registry client over HTTP using reqwest.
pub struct HttpRegistryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRegistryClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ter-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn call<T: Serialize + Sync>(&self, method: &str, request: &T) -> Result<RegistryResponse> {
        debug!("POST {} ({})", self.endpoint, method);
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        info!("Registry answered {} with HTTP {}", method, status.as_u16());
        parse_response(status.as_u16(), &body)
    }
}

/// Turn an HTTP status and body into the registry's result mapping.
pub fn parse_response(status: u16, body: &str) -> Result<RegistryResponse> {
    if !(200..300).contains(&status) {
        return Err(ClientError::Registry {
            status,
            body: body.trim().to_string(),
        });
    }
    if body.trim().is_empty() {
        return Ok(RegistryResponse::default());
    }
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn upload(&self, credentials: &Credentials, payload: &Payload) -> Result<RegistryResponse> {
        let request = UploadRequest {
            method: UPLOAD_METHOD,
            account_data: credentials.into(),
            extension_data: &payload.extension_data,
            files_data: &payload.files_data,
        };
        self.call(UPLOAD_METHOD, &request).await
    }

    async fn remove_version(
        &self,
        credentials: &Credentials,
        extension_key: &str,
        version: &str,
    ) -> Result<RegistryResponse> {
        let request = DeleteRequest {
            method: DELETE_METHOD,
            account_data: credentials.into(),
            extension_key,
            version,
        };
        self.call(DELETE_METHOD, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delete_envelope() {
        let credentials = Credentials::new("jdoe", "secret");
        let request = DeleteRequest {
            method: DELETE_METHOD,
            account_data: (&credentials).into(),
            extension_key: "news",
            version: "7.3.1",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "method": "deleteExtension",
                "accountData": {"username": "jdoe", "password": "secret"},
                "extensionKey": "news",
                "version": "7.3.1",
            })
        );
    }

    #[test]
    fn test_parse_success() {
        let response = parse_response(200, r#"{"version":"7.3.1","messages":["Done"]}"#).unwrap();
        assert_eq!(response.version.as_deref(), Some("7.3.1"));
        assert_eq!(response.messages, vec!["Done"]);
    }

    #[test]
    fn test_parse_empty_body() {
        assert_eq!(parse_response(204, "").unwrap(), RegistryResponse::default());
    }

    #[test]
    fn test_parse_error_status() {
        match parse_response(403, "Access denied\n") {
            Err(ClientError::Registry { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "Access denied");
            }
            other => panic!("expected registry error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(matches!(
            parse_response(200, "<html>"),
            Err(ClientError::Serialization(_))
        ));
    }

    #[test]
    fn test_client_keeps_endpoint() {
        let client = HttpRegistryClient::new("http://localhost:9/rpc", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint, "http://localhost:9/rpc");
    }
}
