//! Credential resolution and interactive prompts.
//!
//! Username and password come from command line flags first, then the
//! configuration file, and finally an interactive prompt that repeats until
//! a non-empty answer is given.

use crate::config::RegistryConfig;
use crate::rpc::Credentials;
use crate::utils::{ClientError, Result};
use dialoguer::{Input, Password};

/// Source of answers for missing credentials.
pub trait CredentialPrompt {
    fn ask_username(&self) -> Result<String>;
    fn ask_password(&self) -> Result<String>;
}

/// Terminal prompt using dialoguer.
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn ask_username(&self) -> Result<String> {
        Input::<String>::new()
            .with_prompt("Please specify a username")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| ClientError::Prompt(e.to_string()))
    }

    fn ask_password(&self) -> Result<String> {
        Password::new()
            .with_prompt("Please specify a password")
            .allow_empty_password(true)
            .interact()
            .map_err(|e| ClientError::Prompt(e.to_string()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn ask_until_set<F>(mut ask: F) -> Result<String>
where
    F: FnMut() -> Result<String>,
{
    loop {
        let answer = ask()?;
        if !answer.is_empty() {
            return Ok(answer);
        }
    }
}

/// Resolve credentials: flags, then configuration, then `prompt`.
pub fn resolve_credentials<P: CredentialPrompt>(
    username: Option<String>,
    password: Option<String>,
    config: &RegistryConfig,
    prompt: &P,
) -> Result<Credentials> {
    let username = match non_empty(username).or_else(|| non_empty(config.username.clone())) {
        Some(username) => username,
        None => ask_until_set(|| prompt.ask_username())?,
    };
    let password = match non_empty(password).or_else(|| non_empty(config.password.clone())) {
        Some(password) => password,
        None => ask_until_set(|| prompt.ask_password())?,
    };
    Ok(Credentials::new(username, password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Replays scripted answers and records how often it was asked.
    struct ScriptedPrompt {
        usernames: RefCell<Vec<&'static str>>,
        passwords: RefCell<Vec<&'static str>>,
        asked: RefCell<usize>,
    }

    impl ScriptedPrompt {
        fn new(usernames: &[&'static str], passwords: &[&'static str]) -> Self {
            Self {
                usernames: RefCell::new(usernames.iter().rev().copied().collect()),
                passwords: RefCell::new(passwords.iter().rev().copied().collect()),
                asked: RefCell::new(0),
            }
        }

        fn next(&self, answers: &RefCell<Vec<&'static str>>) -> Result<String> {
            *self.asked.borrow_mut() += 1;
            answers
                .borrow_mut()
                .pop()
                .map(str::to_string)
                .ok_or_else(|| ClientError::Prompt("no more answers".to_string()))
        }
    }

    impl CredentialPrompt for ScriptedPrompt {
        fn ask_username(&self) -> Result<String> {
            self.next(&self.usernames)
        }

        fn ask_password(&self) -> Result<String> {
            self.next(&self.passwords)
        }
    }

    #[test]
    fn test_flags_win() {
        let prompt = ScriptedPrompt::new(&[], &[]);
        let config = RegistryConfig {
            username: Some("from-config".to_string()),
            ..RegistryConfig::default()
        };

        let credentials = resolve_credentials(
            Some("flag-user".to_string()),
            Some("flag-pass".to_string()),
            &config,
            &prompt,
        )
        .unwrap();

        assert_eq!(credentials, Credentials::new("flag-user", "flag-pass"));
        assert_eq!(*prompt.asked.borrow(), 0);
    }

    #[test]
    fn test_config_fills_missing_flags() {
        let prompt = ScriptedPrompt::new(&[], &["typed-pass"]);
        let config = RegistryConfig {
            username: Some("from-config".to_string()),
            ..RegistryConfig::default()
        };

        let credentials = resolve_credentials(None, None, &config, &prompt).unwrap();
        assert_eq!(credentials, Credentials::new("from-config", "typed-pass"));
        assert_eq!(*prompt.asked.borrow(), 1);
    }

    #[test]
    fn test_prompt_repeats_on_empty_answers() {
        let prompt = ScriptedPrompt::new(&["", "", "jdoe"], &["", "secret"]);

        let credentials =
            resolve_credentials(Some(String::new()), None, &RegistryConfig::default(), &prompt).unwrap();

        assert_eq!(credentials, Credentials::new("jdoe", "secret"));
        assert_eq!(*prompt.asked.borrow(), 5);
    }

    #[test]
    fn test_prompt_failure_propagates() {
        let prompt = ScriptedPrompt::new(&[], &[]);
        assert!(matches!(
            resolve_credentials(None, None, &RegistryConfig::default(), &prompt),
            Err(ClientError::Prompt(_))
        ));
    }
}
