#![allow(dead_code)]

pub mod fakes;
pub mod strategies;

pub use fakes::*;
pub use strategies::*;

use ahjo_sync::auth::AuthSettings;

pub const ENVIRONMENT: &str = "test";
pub const TOKEN_URL: &str = "https://login.example.test/oauth2/token";
pub const API_BASE: &str = "https://ahjo.example.test/ahjo-proxy/";

pub fn complete_settings() -> AuthSettings {
    AuthSettings {
        auth_url: "https://login.example.test/oauth2/authorize".to_string(),
        token_url: TOKEN_URL.to_string(),
        callback_url: "https://cms.example.test/ahjo-api/login".to_string(),
        client_id: "ahjo-client".to_string(),
        client_secret: "ahjo-secret".to_string(),
        scope: "openid".to_string(),
    }
}

pub fn token_response(access: &str, refresh: &str, expires_in: i64) -> String {
    serde_json::json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": expires_in,
        "token_type": "bearer"
    })
    .to_string()
}
