use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::core::credentials::{self, CredentialStore};
use crate::core::llm::ReplicateClient;

use super::events::AppEvent;

/// Centralized handle to backend services.
///
/// Created once at startup, then passed by ref to views that need
/// backend access. The inference client exists only while a valid
/// token is resolved.
pub struct Services {
    llm: Option<ReplicateClient>,
    pub credentials: CredentialStore,
    pub event_tx: mpsc::UnboundedSender<AppEvent>,
    base_url: String,
    token_mask: Option<String>,
}

impl Services {
    /// Initialize services from config, resolving the API token from
    /// the environment or keychain when possible.
    pub fn init(config: &AppConfig, event_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        let credentials = CredentialStore::new();
        let base_url = config.inference.base_url.clone();

        let (llm, token_mask) = match credentials.resolve_token() {
            Some(token) if credentials::validate_token(&token) => {
                let mask = credentials::mask_token(&token);
                log::info!("Inference client ready ({mask})");
                (
                    Some(ReplicateClient::with_base_url(base_url.clone(), token)),
                    Some(mask),
                )
            }
            Some(_) => {
                log::warn!("Resolved API token has invalid format, ignoring");
                (None, None)
            }
            None => {
                log::info!("No API token resolved; waiting for sidebar input");
                (None, None)
            }
        };

        Self {
            llm,
            credentials,
            event_tx,
            base_url,
            token_mask,
        }
    }

    pub fn llm(&self) -> Option<&ReplicateClient> {
        self.llm.as_ref()
    }

    /// Masked form of the active token, for display.
    pub fn token_mask(&self) -> Option<&str> {
        self.token_mask.as_deref()
    }

    /// Accept a token entered in the sidebar: validate, persist to the
    /// keychain, and build the inference client.
    ///
    /// Returns false when the token fails shape validation; no state
    /// changes in that case.
    pub fn set_token(&mut self, token: &str) -> bool {
        if !credentials::validate_token(token) {
            log::warn!("Rejected token with invalid format");
            return false;
        }
        if let Err(e) = self.credentials.store_token(token) {
            // Keychain persistence is best-effort; the client still runs
            log::warn!("Failed to persist token to keychain: {e}");
        }
        self.llm = Some(ReplicateClient::with_base_url(
            self.base_url.clone(),
            token.to_string(),
        ));
        self.token_mask = Some(credentials::mask_token(token));
        true
    }

    /// Forget the token: remove it from the keychain and drop the
    /// inference client.
    pub fn clear_token(&mut self) {
        if let Err(e) = self.credentials.delete_token() {
            log::warn!("Failed to remove token from keychain: {e}");
        }
        self.llm = None;
        self.token_mask = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_services() -> Services {
        let (tx, _rx) = mpsc::unbounded_channel();
        Services {
            llm: None,
            credentials: CredentialStore::with_service("paperchat-test"),
            event_tx: tx,
            base_url: "http://localhost".to_string(),
            token_mask: None,
        }
    }

    #[test]
    fn test_set_token_rejects_bad_format() {
        let mut services = test_services();
        assert!(!services.set_token("not-a-token"));
        assert!(services.llm().is_none());
        assert!(services.token_mask().is_none());
    }

    #[test]
    fn test_clear_token_drops_client_and_mask() {
        let mut services = test_services();
        services.llm = Some(ReplicateClient::with_base_url(
            "http://localhost".to_string(),
            "r8_x".to_string(),
        ));
        services.token_mask = Some("r8_x...".to_string());
        services.clear_token();
        assert!(services.llm().is_none());
        assert!(services.token_mask().is_none());
    }
}
