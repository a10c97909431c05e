// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as batch size bounds, non-empty topic names, and lease/timeout coherence.

use crate::diagnostic::ConfigError;
use crate::model::{BrokerKind, RegistryConfig};

/// Largest accepted `outbox.batch_size`.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let outbox = &config.outbox;

    if outbox.batch_size == 0 || outbox.batch_size > MAX_BATCH_SIZE {
        errors.push(ConfigError::Validation {
            message: format!(
                "outbox.batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                outbox.batch_size
            ),
        });
    }

    if outbox.interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "outbox.interval_secs must be at least 1".to_string(),
        });
    }

    if outbox.topic.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "outbox.topic must not be empty".to_string(),
        });
    }

    if outbox.publish_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "outbox.publish_timeout_ms must be at least 1".to_string(),
        });
    }

    if outbox.max_retries == 0 {
        errors.push(ConfigError::Validation {
            message: "outbox.max_retries must be at least 1".to_string(),
        });
    }

    // The lease is extended before every event, so it only has to outlive one publish.
    if outbox.lease_ttl_secs.saturating_mul(1000) <= outbox.publish_timeout_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "outbox.lease_ttl_secs ({}s) must exceed outbox.publish_timeout_ms ({}ms)",
                outbox.lease_ttl_secs, outbox.publish_timeout_ms
            ),
        });
    }

    if outbox.worker_id.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "outbox.worker_id must not be empty".to_string(),
        });
    }

    if config.broker.kind == BrokerKind::KafkaRest {
        match config.broker.rest_url.as_deref().map(str::trim) {
            None | Some("") => errors.push(ConfigError::Validation {
                message: "broker.rest_url is required when broker.kind = \"kafka_rest\""
                    .to_string(),
            }),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                errors.push(ConfigError::Validation {
                    message: format!("broker.rest_url `{url}` must be an http(s) URL"),
                })
            }
            Some(_) => {}
        }
    }

    if config.broker.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "broker.request_timeout_secs must be at least 1".to_string(),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if !matches!(
        config.service.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level must be one of trace, debug, info, warn, error; got `{}`",
                config.service.log_level
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
