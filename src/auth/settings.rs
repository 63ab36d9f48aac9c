//! OAuth2 client settings for the Ahjo login service.

use serde::{Deserialize, Serialize};

/// Client settings; usable only when every field is non-empty
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthSettings {
    pub auth_url: String,
    pub token_url: String,
    pub callback_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("callback_url", &self.callback_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

impl AuthSettings {
    /// Names of the settings that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("auth_url", &self.auth_url),
            ("token_url", &self.token_url),
            ("callback_url", &self.callback_url),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("scope", &self.scope),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}
