//! # Token Lifecycle Manager
//!
//! Owns acquisition, refresh and validity checks of the Ahjo OAuth2 token.
//!
//! Refresh tokens are single-use on the server side, so a refresh runs under
//! a named lock scoped to the environment and fails immediately when another
//! process holds it. Before the token request the current token is copied to
//! a `previous` slot and the active slot is overwritten with the empty
//! sentinel; a crash between the two writes leaves an observably invalid
//! token rather than a stale one that looks valid.

use super::error::{TokenError, TokenResult};
use super::lock::LockService;
use super::settings::AuthSettings;
use super::store::TokenStore;
use super::token::AuthToken;
use crate::config::AhjoSyncConfig;
use crate::constants;
use crate::http::{HttpClient, HttpError, HttpRequest};
use crate::logging::log_token_operation;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);

pub struct TokenManager {
    settings: AuthSettings,
    environment: String,
    http: Arc<dyn HttpClient>,
    store: Arc<dyn TokenStore>,
    locks: Arc<dyn LockService>,
    lock_ttl: Duration,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("settings", &self.settings)
            .field("environment", &self.environment)
            .field("lock_ttl", &self.lock_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(
        settings: AuthSettings,
        environment: impl Into<String>,
        http: Arc<dyn HttpClient>,
        store: Arc<dyn TokenStore>,
        locks: Arc<dyn LockService>,
    ) -> Self {
        Self {
            settings,
            environment: environment.into(),
            http,
            store,
            locks,
            lock_ttl: DEFAULT_LOCK_TTL,
        }
    }

    pub fn from_config(
        config: &AhjoSyncConfig,
        http: Arc<dyn HttpClient>,
        store: Arc<dyn TokenStore>,
        locks: Arc<dyn LockService>,
    ) -> Self {
        Self::new(
            config.auth.clone(),
            config.environment.clone(),
            http,
            store,
            locks,
        )
        .with_lock_ttl(config.lock_ttl())
    }

    pub fn with_lock_ttl(mut self, lock_ttl: Duration) -> Self {
        self.lock_ttl = lock_ttl;
        self
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    fn store_key(&self) -> String {
        constants::token::store_key(&self.environment)
    }

    fn lock_name(&self) -> String {
        constants::token::lock_name(&self.environment)
    }

    async fn read_token(&self, key: &str) -> TokenResult<Option<AuthToken>> {
        match self.store.get(key).await? {
            Some(value) if !value.is_empty() => AuthToken::from_json(&value).map(Some),
            _ => Ok(None),
        }
    }

    /// Currently persisted token for the active environment
    pub async fn stored_token(&self) -> TokenResult<Option<AuthToken>> {
        self.read_token(&self.store_key()).await
    }

    /// Token that was active before the most recent refresh
    pub async fn previous_token(&self) -> TokenResult<Option<AuthToken>> {
        self.read_token(&constants::token::previous_store_key(&self.environment))
            .await
    }

    /// Settings are complete and a refresh token is stored. Never fails.
    pub async fn is_configured(&self) -> bool {
        if !self.settings.is_complete() {
            return false;
        }
        matches!(
            self.stored_token().await,
            Ok(Some(token)) if !token.refresh_token.is_empty()
        )
    }

    /// A stored token exists and has not expired. Never triggers a refresh.
    pub async fn check_auth_token(&self) -> bool {
        match self.stored_token().await {
            Ok(Some(token)) => token.is_valid_at(Utc::now().timestamp()),
            Ok(None) => false,
            Err(e) => {
                warn!(environment = %self.environment, error = %e, "Stored token unreadable");
                false
            }
        }
    }

    /// Stored access token, even when expired; checking validity first is
    /// the caller's job. Empty when nothing usable is stored.
    pub async fn get_auth_token(&self) -> String {
        match self.stored_token().await {
            Ok(Some(token)) => {
                if !token.is_empty() && !token.is_valid_at(Utc::now().timestamp()) {
                    error!(
                        environment = %self.environment,
                        expired_at = token.expires_at,
                        "❌ Returning expired Ahjo access token"
                    );
                }
                token.access_token
            }
            Ok(None) => String::new(),
            Err(e) => {
                error!(environment = %self.environment, error = %e, "❌ Stored token unreadable");
                String::new()
            }
        }
    }

    /// Expiry of the stored token as a unix timestamp, 0 when unavailable
    pub async fn get_auth_token_expiration(&self) -> i64 {
        match self.stored_token().await {
            Ok(Some(token)) => token.expires_at,
            _ => 0,
        }
    }

    /// Authorization URL an operator visits to start the code flow
    pub fn authorization_url(&self, state: Option<&str>) -> TokenResult<String> {
        let missing = self.settings.missing_fields();
        if !missing.is_empty() {
            return Err(TokenError::not_configured(missing));
        }

        let mut params = vec![
            ("response_type", "code"),
            ("client_id", self.settings.client_id.as_str()),
            ("redirect_uri", self.settings.callback_url.as_str()),
            ("scope", self.settings.scope.as_str()),
        ];
        if let Some(state) = state {
            params.push(("state", state));
        }

        Url::parse_with_params(&self.settings.auth_url, &params)
            .map(String::from)
            .map_err(|e| HttpError::invalid_url(&self.settings.auth_url, e.to_string()).into())
    }

    /// Request a new token.
    ///
    /// With `code` the authorization_code grant is used, otherwise the
    /// refresh_token grant with the stored refresh token.
    pub async fn refresh_auth_token(&self, code: Option<&str>) -> TokenResult<AuthToken> {
        let missing = self.settings.missing_fields();
        if !missing.is_empty() {
            return Err(TokenError::not_configured(missing));
        }

        let lock_name = self.lock_name();
        if !self.locks.acquire(&lock_name, self.lock_ttl).await? {
            warn!(lock = %lock_name, "🔒 Token refresh already in progress");
            return Err(TokenError::lock_unavailable(lock_name));
        }

        let result = self.refresh_locked(code).await;

        if let Err(e) = self.locks.release(&lock_name).await {
            warn!(lock = %lock_name, error = %e, "Failed to release token lock, TTL will expire it");
        }

        let grant = if code.is_some() {
            constants::token::GRANT_AUTHORIZATION_CODE
        } else {
            constants::token::GRANT_REFRESH_TOKEN
        };
        match &result {
            Ok(token) => log_token_operation(
                "refresh",
                &self.environment,
                "success",
                Some(&format!("grant={grant} expires={}", token.expires_at)),
            ),
            Err(e) => log_token_operation(
                "refresh",
                &self.environment,
                "failed",
                Some(&format!("grant={grant} error={e}")),
            ),
        }

        result
    }

    async fn refresh_locked(&self, code: Option<&str>) -> TokenResult<AuthToken> {
        let key = self.store_key();
        let raw_current = self.store.get(&key).await?;

        let grant = match code {
            Some(code) => vec![
                (
                    "grant_type".to_string(),
                    constants::token::GRANT_AUTHORIZATION_CODE.to_string(),
                ),
                ("code".to_string(), code.to_string()),
                ("redirect_uri".to_string(), self.settings.callback_url.clone()),
            ],
            None => {
                let refresh_token = raw_current
                    .as_deref()
                    .filter(|value| !value.is_empty())
                    .and_then(|value| AuthToken::from_json(value).ok())
                    .map(|token| token.refresh_token)
                    .filter(|token| !token.is_empty())
                    .ok_or_else(|| TokenError::missing_refresh_token(&self.environment))?;
                vec![
                    (
                        "grant_type".to_string(),
                        constants::token::GRANT_REFRESH_TOKEN.to_string(),
                    ),
                    ("refresh_token".to_string(), refresh_token),
                ]
            }
        };

        if let Some(current) = raw_current.as_deref().filter(|value| !value.is_empty()) {
            self.store
                .set(&constants::token::previous_store_key(&self.environment), current)
                .await?;
        }
        self.store.set(&key, &AuthToken::empty().to_json()?).await?;

        debug!(environment = %self.environment, token_url = %self.settings.token_url, "🔑 Requesting token");

        let request = HttpRequest::post_form(&self.settings.token_url, grant)
            .header("Accept", "application/json")
            .basic_auth(&self.settings.client_id, &self.settings.client_secret);
        let response = self.http.send(request).await?;

        if !response.is_success() {
            return Err(TokenError::http_status(response.status, response.body));
        }

        let token = AuthToken::from_token_response(&response.body, Utc::now().timestamp())?;
        self.store.set(&key, &token.to_json()?).await?;

        Ok(token)
    }

    /// Refresh with the stored refresh token when the current token has
    /// expired. Returns the new token, or `None` when nothing was needed.
    pub async fn refresh_if_expired(&self) -> TokenResult<Option<AuthToken>> {
        if self.check_auth_token().await {
            return Ok(None);
        }
        self.refresh_auth_token(None).await.map(Some)
    }
}
