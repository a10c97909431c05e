// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./custreg.toml` > `~/.config/custreg/custreg.toml` >
//! `/etc/custreg/custreg.toml` with environment variable overrides via `CUSTREG_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::RegistryConfig;

/// Sections that may be targeted by `CUSTREG_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "service",
    "storage",
    "outbox",
    "broker",
    "gateway",
    "prometheus",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/custreg/custreg.toml` (system-wide)
/// 3. `~/.config/custreg/custreg.toml` (user XDG config)
/// 4. `./custreg.toml` (local directory)
/// 5. `CUSTREG_*` environment variables
pub fn load_config() -> Result<RegistryConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<RegistryConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RegistryConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RegistryConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RegistryConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RegistryConfig::default()))
        .merge(Toml::file("/etc/custreg/custreg.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("custreg/custreg.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("custreg.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `CUSTREG_OUTBOX_BATCH_SIZE` must become `outbox.batch_size`,
/// not `outbox.batch.size`.
fn env_provider() -> Env {
    Env::prefixed("CUSTREG_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key to its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
