//! API key lookup: environment first, then the system keyring

use keyring::Entry;

use super::error::ClaudeError;

const SERVICE_NAME: &str = "lector";
const API_KEY_ENTRY: &str = "anthropic-api-key";

/// Environment variable checked before the keyring
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Stores and resolves the Anthropic API key
pub struct ApiKeyManager;

impl ApiKeyManager {
    /// Resolve the API key from the environment or the keyring
    pub fn resolve() -> Result<String, ClaudeError> {
        Self::resolve_with(|name| std::env::var(name).ok(), Self::stored_key)
    }

    /// Resolve with explicit lookups; a blank environment value is ignored
    pub fn resolve_with(
        env: impl Fn(&str) -> Option<String>,
        stored: impl FnOnce() -> Result<String, ClaudeError>,
    ) -> Result<String, ClaudeError> {
        match env(API_KEY_ENV).map(|key| key.trim().to_string()) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => stored(),
        }
    }

    /// The key saved in the keyring
    pub fn stored_key() -> Result<String, ClaudeError> {
        Self::entry()?.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => ClaudeError::ApiKeyNotFound,
            _ => ClaudeError::KeyringError(e.to_string()),
        })
    }

    /// Validate and save a key, returning the trimmed form that was stored
    pub fn store(key: &str) -> Result<String, ClaudeError> {
        let key = key.trim();
        if !Self::is_well_formed(key) {
            return Err(ClaudeError::InvalidApiKey);
        }
        Self::entry()?.set_password(key).map_err(|e| ClaudeError::KeyringError(e.to_string()))?;
        Ok(key.to_string())
    }

    /// Remove the saved key; removing a missing key is not an error
    pub fn clear() -> Result<(), ClaudeError> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ClaudeError::KeyringError(e.to_string())),
        }
    }

    fn entry() -> Result<Entry, ClaudeError> {
        Entry::new(SERVICE_NAME, API_KEY_ENTRY).map_err(|e| ClaudeError::KeyringError(e.to_string()))
    }

    /// Anthropic keys start with "sk-ant-"
    fn is_well_formed(key: &str) -> bool {
        key.starts_with("sk-ant-") && key.len() > 20 && !key.contains(char::is_whitespace)
    }

    /// First 8 and last 4 characters, for display
    pub fn mask_key(key: &str) -> String {
        let chars: Vec<char> = key.chars().collect();
        if chars.len() <= 12 {
            return "*".repeat(chars.len());
        }
        let prefix: String = chars[..8].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{prefix}...{suffix}")
    }
}
