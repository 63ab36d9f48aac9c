//! # Structured Logging Module
//!
//! Environment-aware structured logging that outputs to both console and a
//! JSON log file, so queue runs started by a scheduler leave a trail.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let filter = || {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level))
        };

        let console = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true)
            .with_filter(filter());

        let log_dir = PathBuf::from("log");
        let file_layer = match fs::create_dir_all(&log_dir) {
            Ok(()) => {
                let log_filename = format!(
                    "{}.{}.{}.log",
                    environment,
                    process::id(),
                    Utc::now().format("%Y%m%d_%H%M%S")
                );
                let appender = tracing_appender::rolling::never(&log_dir, log_filename);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                Some((
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_ansi(false)
                        .json()
                        .with_filter(filter()),
                    guard,
                ))
            }
            Err(_) => None,
        };

        let (file_layer, guard) = match file_layer {
            Some((layer, guard)) => (Some(layer), Some(guard)),
            None => (None, None),
        };

        // A subscriber may already be installed by an embedding application
        if tracing_subscriber::registry()
            .with(console)
            .with(file_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized");
        }

        tracing::info!(
            pid = process::id(),
            environment = %environment,
            file_output = guard.is_some(),
            "🔧 STRUCTURED LOGGING: Initialized"
        );

        // The writer must outlive every log call in the process
        if let Some(guard) = guard {
            std::mem::forget(guard);
        }
    });
}

fn get_environment() -> String {
    std::env::var("AHJO_SYNC_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for queue operations
pub fn log_queue_operation(
    operation: &str,
    queue: &str,
    entity_id: Option<&str>,
    endpoint: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        queue = %queue,
        entity_id = entity_id,
        endpoint = endpoint,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 QUEUE_OPERATION"
    );
}

/// Log structured data for token operations
pub fn log_token_operation(operation: &str, environment: &str, status: &str, details: Option<&str>) {
    tracing::info!(
        operation = %operation,
        environment = %environment,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "🔑 TOKEN_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
