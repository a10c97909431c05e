// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the custreg customer registration service.
//!
//! This crate provides the error type, the domain types shared between the
//! storage, relay and service layers, and the port traits (broker publisher,
//! outbox store) that decouple the outbox relay from concrete backends.

pub mod error;
pub mod traits;
pub mod types;

pub use error::RegistryError;
pub use types::{
    AdapterType, CustomerEventType, CustomerStatus, HealthStatus, OutboxEvent, OutboxStatus,
};

pub use traits::{BrokerPublisher, OutboxStore, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_has_all_variants() {
        let _config = RegistryError::Config("test".into());
        let _storage = RegistryError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _serialization = RegistryError::Serialization {
            source: Box::new(std::io::Error::other("test")),
        };
        let _publish = RegistryError::Publish {
            message: "test".into(),
            source: None,
        };
        let _timeout = RegistryError::Timeout {
            duration: std::time::Duration::from_secs(10),
        };
        let _not_found = RegistryError::NotFound {
            entity: "customer".into(),
            key: "42".into(),
        };
        let _exists = RegistryError::AlreadyExists("pan".into());
        let _rule = RegistryError::BusinessRule {
            code: "AGE_NOT_ELIGIBLE".into(),
            message: "test".into(),
        };
        let _validation = RegistryError::Validation("test".into());
        let _internal = RegistryError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_broker_publisher<T: BrokerPublisher>() {}
        fn _assert_outbox_store<T: OutboxStore>() {}
    }
}
