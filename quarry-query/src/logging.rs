//! Logging infrastructure for Quarry.
//!
//! This module provides structured logging controlled by the `QUARRY_DEBUG`
//! environment variable and the `[debug]` section of `quarry.toml`.
//!
//! # Environment Variables
//!
//! - `QUARRY_DEBUG=true` - Enable debug logging
//! - `QUARRY_DEBUG=1` - Enable debug logging
//! - `QUARRY_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `QUARRY_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use quarry_query::logging;
//!
//! // Initialize logging (call once at startup)
//! logging::init();
//! ```
//!
//! Compiled SQL is logged at debug level when `[debug] log_sql` is on; bound
//! parameter values are only included when `log_params` is also on:
//!
//! ```rust
//! use quarry_query::logging;
//! use quarry_schema::DebugConfig;
//!
//! logging::apply_config(&DebugConfig { log_sql: true, log_params: false });
//! assert!(logging::log_sql_enabled());
//! assert!(!logging::log_params_enabled());
//! ```

use std::env;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use quarry_schema::DebugConfig;

static INIT: Once = Once::new();
static LOG_SQL: AtomicBool = AtomicBool::new(false);
static LOG_PARAMS: AtomicBool = AtomicBool::new(false);

/// Check if debug logging is enabled via `QUARRY_DEBUG` environment variable.
///
/// Returns `true` if `QUARRY_DEBUG` is set to "true", "1", or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("QUARRY_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level from `QUARRY_LOG_LEVEL` environment variable.
///
/// Defaults to "debug" if `QUARRY_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var("QUARRY_LOG_LEVEL") {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// Get the configured log format from `QUARRY_LOG_FORMAT` environment variable.
///
/// Defaults to "json" for structured logging.
pub fn get_log_format() -> &'static str {
    env::var("QUARRY_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Apply the `[debug]` section of the configuration.
pub fn apply_config(config: &DebugConfig) {
    LOG_SQL.store(config.log_sql, Ordering::Relaxed);
    LOG_PARAMS.store(config.log_sql && config.log_params, Ordering::Relaxed);
}

/// Whether compiled SQL should be logged.
#[inline]
pub fn log_sql_enabled() -> bool {
    LOG_SQL.load(Ordering::Relaxed) || is_debug_enabled()
}

/// Whether bound parameter values should be logged with the SQL.
#[inline]
pub fn log_params_enabled() -> bool {
    LOG_PARAMS.load(Ordering::Relaxed)
}

/// Initialize the Quarry logging system.
///
/// This should be called once at application startup. Subsequent calls are no-ops.
///
/// Logging is controlled by:
/// - `QUARRY_DEBUG=true` - Enable debug-level logging
/// - `QUARRY_LOG_LEVEL` - Override the log level (trace, debug, info, warn, error)
/// - `QUARRY_LOG_FORMAT` - Output format (pretty, json, compact)
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("QUARRY_LOG_LEVEL").is_err() {
            // No logging requested, skip initialization
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(format!(
                "quarry={},quarry_query={},quarry_schema={},quarry_sqlite={}",
                level, level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            match get_log_format() {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json())
                        .init();
                }
                "compact" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact())
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty())
                        .init();
                }
            }

            tracing::info!(
                level = level,
                format = get_log_format(),
                "Quarry logging initialized"
            );
        }
    });
}

/// Initialize logging for debugging (convenience function).
///
/// Equivalent to setting `QUARRY_DEBUG=true` and calling `init()`.
///
/// # Safety
///
/// This function modifies environment variables, which is unsafe in
/// multi-threaded programs. Call this early in your program before
/// spawning threads.
pub fn init_debug() {
    // SAFETY: This should only be called at program startup before threads are spawned.
    unsafe {
        env::set_var("QUARRY_DEBUG", "true");
    }
    init();
}

/// Macro for conditional debug logging.
///
/// Only logs if `QUARRY_DEBUG` is enabled at runtime.
#[macro_export]
macro_rules! quarry_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Macro for conditional trace logging.
#[macro_export]
macro_rules! quarry_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::trace!($($arg)*);
        }
    };
}
