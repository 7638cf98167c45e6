//! `remove-version`: delete one version of an extension from the registry.

use super::render_response;
use crate::cli::RemoveVersionArgs;
use crate::config::Config;
use crate::prompt::{resolve_credentials, CredentialPrompt};
use crate::rpc::RegistryClient;
use crate::utils::Result;
use tracing::info;

pub async fn execute<C, P>(
    args: &RemoveVersionArgs,
    config: &Config,
    client: &C,
    prompt: &P,
) -> Result<Vec<String>>
where
    C: RegistryClient,
    P: CredentialPrompt,
{
    let credentials = resolve_credentials(
        args.credentials.username.clone(),
        args.credentials.password.clone(),
        &config.registry,
        prompt,
    )?;

    info!("Removing {} version {}", args.extension_key, args.version);
    let response = client
        .remove_version(&credentials, &args.extension_key, &args.version)
        .await?;
    Ok(render_response("removed", &response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CredentialArgs;
    use crate::commands::test_support::{Call, FakeRegistry};
    use crate::prompt::TerminalPrompt;
    use crate::rpc::RegistryResponse;

    #[tokio::test]
    async fn test_remove_version_uses_config_credentials() {
        let mut config = Config::default();
        config.registry.username = Some("admin".to_string());
        config.registry.password = Some("secret".to_string());

        let args = RemoveVersionArgs {
            extension_key: "news".to_string(),
            version: "7.3.1".to_string(),
            credentials: CredentialArgs::default(),
        };
        let registry = FakeRegistry::answering(RegistryResponse {
            version: Some("7.3.1".to_string()),
            messages: vec!["Version removed".to_string()],
        });

        let lines = execute(&args, &config, &registry, &TerminalPrompt).await.unwrap();

        assert_eq!(
            lines,
            vec![
                "Successfully removed extension version: 7.3.1",
                "Message #1: Version removed",
            ]
        );
        assert_eq!(
            registry.calls(),
            vec![Call::Remove {
                username: "admin".to_string(),
                extension_key: "news".to_string(),
                version: "7.3.1".to_string(),
            }]
        );
    }
}
