//! Core use-case services.
//!
//! # Responsibility
//! - Validate caller input, then delegate to repositories.
//! - Emit one metadata-only log event per operation.
//! - Keep callers decoupled from storage details.

pub mod directory_service;
pub mod group_service;
pub mod leaderboard_service;
pub mod role_service;
pub mod score_service;

use crate::error::CoreResult;
use log::{error, info, warn};
use std::time::Instant;

/// Logs the outcome of one operation.
///
/// `fields` is pre-formatted `key=value` metadata; it must never contain
/// free text supplied by users.
pub(crate) fn log_outcome<T>(
    event: &str,
    module: &str,
    fields: &str,
    started_at: Instant,
    result: &CoreResult<T>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event={event} module={module} status=ok duration_ms={duration_ms} {fields}"),
        Err(err) if err.is_rejection() => warn!(
            "event={event} module={module} status=rejected duration_ms={duration_ms} error_code={} {fields}",
            err.code()
        ),
        Err(err) => error!(
            "event={event} module={module} status=error duration_ms={duration_ms} error_code={} retryable={} {fields} error={err}",
            err.code(),
            err.is_retryable()
        ),
    }
}
