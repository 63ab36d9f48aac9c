//! # Auth Token
//!
//! The persisted OAuth2 token and the parsing of token endpoint responses.
//!
//! Persisted shape (consumed by other tools, keep stable):
//! `{"token": "...", "expires": 1700000000, "refreshToken": "..."}`

use super::error::{TokenError, TokenResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "token")]
    pub access_token: String,
    /// Unix timestamp
    #[serde(rename = "expires")]
    pub expires_at: i64,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

impl AuthToken {
    pub fn new(
        access_token: impl Into<String>,
        expires_at: i64,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
            refresh_token: refresh_token.into(),
        }
    }

    /// The "no valid token" sentinel written while a refresh is in flight
    pub fn empty() -> Self {
        Self::new("", 0, "")
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }

    pub fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at
    }

    pub fn from_json(value: &str) -> TokenResult<Self> {
        serde_json::from_str(value).map_err(|e| TokenError::parse(e.to_string()))
    }

    pub fn to_json(&self) -> TokenResult<String> {
        serde_json::to_string(self).map_err(|e| TokenError::parse(e.to_string()))
    }

    /// Build a token from a token endpoint response body.
    ///
    /// `access_token`, `refresh_token` and `expires_in` are all required;
    /// any failure carries the raw body for diagnostics.
    pub fn from_token_response(body: &str, now: i64) -> TokenResult<Self> {
        let response: TokenResponse = serde_json::from_str(body)
            .map_err(|e| TokenError::malformed_response(e.to_string(), body))?;

        let access_token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| TokenError::malformed_response("missing access_token", body))?;
        let refresh_token = response
            .refresh_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| TokenError::malformed_response("missing refresh_token", body))?;
        let expires_in = response
            .expires_in
            .ok_or_else(|| TokenError::malformed_response("missing expires_in", body))?;

        Ok(Self::new(access_token, now + expires_in, refresh_token))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}
