//! # System Constants
//!
//! Queue names, store keys and thresholds shared across the pipeline.

/// Queue identifiers as they are known to the queue backend
pub mod queues {
    /// Bulk and initial imports fed by the paginated source
    pub const AGGREGATION: &str = "ahjo_api_aggregation_queue";
    /// Webhook-driven updates from the Ahjo callback subscription
    pub const SUBSCRIBER: &str = "ahjo_api_subscriber_queue";
    /// Second chance for expired items from the two feeder queues
    pub const RETRY: &str = "ahjo_api_retry_queue";
    /// Terminal queue, never reroutes further
    pub const ERROR: &str = "ahjo_api_error_queue";

    pub const ALL: [&str; 4] = [AGGREGATION, SUBSCRIBER, RETRY, ERROR];
}

/// Log channels carried as a structured field by each worker
pub mod channels {
    pub const AGGREGATION: &str = "ahjo_api_aggregation";
    pub const SUBSCRIBER: &str = "ahjo_api_subscriber";
    pub const RETRY: &str = "ahjo_api_retry";
    pub const ERROR: &str = "ahjo_api_error";
}

/// Token store keys and lock names, suffixed with the active environment
pub mod token {
    pub const STORE_KEY_PREFIX: &str = "ahjo_api.auth_token";
    pub const PREVIOUS_SLOT_SUFFIX: &str = "previous";
    pub const LOCK_NAME_PREFIX: &str = "ahjo_api.token_refresh";

    /// OAuth2 grant used for the first token after the authorize redirect
    pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
    pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

    pub fn store_key(environment: &str) -> String {
        format!("{STORE_KEY_PREFIX}.{environment}")
    }

    pub fn previous_store_key(environment: &str) -> String {
        format!("{STORE_KEY_PREFIX}.{environment}.{PREVIOUS_SLOT_SUFFIX}")
    }

    pub fn lock_name(environment: &str) -> String {
        format!("{LOCK_NAME_PREFIX}.{environment}")
    }
}

/// Endpoint whose updates trigger motion regeneration
pub const MEETINGS_ENDPOINT: &str = "meetings";

/// Update types beginning with this prefix denote a modification of existing content
pub const UPDATED_PREFIX: &str = "Updated";

/// Separator between an update type and the queue it was rerouted from
pub const PROVENANCE_SEPARATOR: &str = " - ";

/// Completion code the migration executor reports for a successful import
pub const MIGRATION_SUCCESS: i32 = 1;

/// Consecutive unchanged rows after which a partial import stops
pub const DEFAULT_UNCHANGED_THRESHOLD: u32 = 20;

pub const DEFAULT_MAX_RETRY_HOURS: i64 = 24;
pub const SUBSCRIBER_MAX_RETRY_HOURS: i64 = 3;
