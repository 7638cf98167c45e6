//! Subcommand implementations.

pub mod pack;
pub mod remove_version;
pub mod upload;

use crate::cli::{Command, CredentialArgs};
use crate::config::Config;
use crate::prompt::TerminalPrompt;
use crate::rpc::{HttpRegistryClient, RegistryResponse};
use crate::utils::Result;
use std::time::Duration;

/// Output lines for a registry result mapping.
pub fn render_response(action: &str, response: &RegistryResponse) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(version) = &response.version {
        lines.push(format!("Successfully {action} extension version: {version}"));
    }
    for (index, message) in response.messages.iter().enumerate() {
        lines.push(format!("Message #{}: {}", index + 1, message));
    }
    lines
}

fn http_client(credentials: &CredentialArgs, config: &Config) -> Result<HttpRegistryClient> {
    let endpoint = credentials
        .endpoint
        .clone()
        .unwrap_or_else(|| config.registry.url.clone());
    HttpRegistryClient::new(endpoint, Duration::from_secs(config.registry.timeout_secs))
}

/// Run one parsed subcommand and print its output.
pub async fn run(command: Command, config: &Config) -> Result<()> {
    let lines = match command {
        Command::Upload(args) => {
            let client = http_client(&args.credentials, config)?;
            upload::execute(&args, config, &client, &TerminalPrompt).await?
        }
        Command::RemoveVersion(args) => {
            let client = http_client(&args.credentials, config)?;
            remove_version::execute(&args, config, &client, &TerminalPrompt).await?
        }
        Command::Pack(args) => pack::execute(&args)?,
    };

    for line in lines {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::rpc::{Credentials, RegistryClient, RegistryResponse};
    use crate::utils::Result;
    use async_trait::async_trait;
    use ext_packer::Payload;
    use std::sync::Mutex;

    /// What the fake registry was asked to do.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Upload {
            username: String,
            extension_key: String,
            version: String,
            files: usize,
        },
        Remove {
            username: String,
            extension_key: String,
            version: String,
        },
    }

    /// In-memory registry recording calls and answering with a fixed response.
    pub struct FakeRegistry {
        pub response: RegistryResponse,
        pub calls: Mutex<Vec<Call>>,
    }

    impl FakeRegistry {
        pub fn answering(response: RegistryResponse) -> Self {
            Self {
                response,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl RegistryClient for FakeRegistry {
        async fn upload(&self, credentials: &Credentials, payload: &Payload) -> Result<RegistryResponse> {
            self.calls.lock().unwrap().push(Call::Upload {
                username: credentials.username.clone(),
                extension_key: payload.extension_key().to_string(),
                version: payload.version().to_string(),
                files: payload.files_data.len(),
            });
            Ok(self.response.clone())
        }

        async fn remove_version(
            &self,
            credentials: &Credentials,
            extension_key: &str,
            version: &str,
        ) -> Result<RegistryResponse> {
            self.calls.lock().unwrap().push(Call::Remove {
                username: credentials.username.clone(),
                extension_key: extension_key.to_string(),
                version: version.to_string(),
            });
            Ok(self.response.clone())
        }
    }
}
