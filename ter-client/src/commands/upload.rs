//! `upload`: pack a directory and send it to the registry.

use super::render_response;
use crate::cli::UploadArgs;
use crate::config::Config;
use crate::prompt::{resolve_credentials, CredentialPrompt};
use crate::rpc::RegistryClient;
use crate::utils::Result;
use tracing::info;

pub async fn execute<C, P>(args: &UploadArgs, config: &Config, client: &C, prompt: &P) -> Result<Vec<String>>
where
    C: RegistryClient,
    P: CredentialPrompt,
{
    // Pack before asking for credentials so manifest problems surface first.
    let payload = ext_packer::pack(&args.extension_key, &args.directory, &args.comment)?;

    let credentials = resolve_credentials(
        args.credentials.username.clone(),
        args.credentials.password.clone(),
        &config.registry,
        prompt,
    )?;

    info!(
        "Uploading {} version {} ({} files)",
        payload.extension_key(),
        payload.version(),
        payload.files_data.len()
    );
    let response = client.upload(&credentials, &payload).await?;
    Ok(render_response("uploaded", &response))
}
