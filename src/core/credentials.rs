//! API token storage and validation.
//!
//! Uses the system keychain (Keyring) for persistence, with an
//! environment variable taking precedence at resolution time.

use keyring::Entry;
use thiserror::Error;

const SERVICE_NAME: &str = "paperchat";
const TOKEN_KEY: &str = "replicate_api_token";

/// Environment variable consulted before the keychain.
pub const TOKEN_ENV_VAR: &str = "REPLICATE_API_TOKEN";

const TOKEN_PREFIX: &str = "r8_";
const TOKEN_LEN: usize = 40;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Keyring error: {0}")]
    KeyringError(#[from] keyring::Error),

    #[error("Credential not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CredentialError>;

// ============================================================================
// Credential Store
// ============================================================================

pub struct CredentialStore {
    service: String,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Store the API token in the keychain.
    pub fn store_token(&self, value: &str) -> Result<()> {
        let entry = Entry::new(&self.service, TOKEN_KEY)?;
        entry.set_password(value)?;
        log::info!("Stored API token in keychain");
        Ok(())
    }

    /// Retrieve the API token from the keychain.
    pub fn get_token(&self) -> Result<String> {
        let entry = Entry::new(&self.service, TOKEN_KEY)?;
        match entry.get_password() {
            Ok(value) => Ok(value),
            Err(keyring::Error::NoEntry) => {
                Err(CredentialError::NotFound(TOKEN_KEY.to_string()))
            }
            Err(e) => Err(CredentialError::KeyringError(e)),
        }
    }

    /// Delete the stored API token.
    pub fn delete_token(&self) -> Result<()> {
        let entry = Entry::new(&self.service, TOKEN_KEY)?;
        match entry.delete_password() {
            Ok(()) => {
                log::info!("Deleted API token from keychain");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted
            Err(e) => Err(CredentialError::KeyringError(e)),
        }
    }

    /// Resolve the token: environment variable first, then keychain.
    ///
    /// Returns `None` when neither source yields a token; the caller is
    /// expected to fall back to the sidebar input field.
    pub fn resolve_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.is_empty() {
                log::info!("API token resolved from environment");
                return Some(token);
            }
        }
        match self.get_token() {
            Ok(token) => {
                log::info!("API token resolved from keychain");
                Some(token)
            }
            Err(_) => None,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Validate the API token format: `r8_` prefix, exactly 40 characters.
pub fn validate_token(token: &str) -> bool {
    token.starts_with(TOKEN_PREFIX) && token.chars().count() == TOKEN_LEN
}

/// Mask a token for display (show first 4 and last 4 chars).
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
