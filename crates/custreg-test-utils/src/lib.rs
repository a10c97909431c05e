// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for custreg integration tests.
//!
//! Provides a scriptable broker and a temp-SQLite harness for fast,
//! deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockBroker`] - Broker publish port that records calls and fails or stalls on demand
//! - [`TestHarness`] - Temp database, storage, mock broker and customer service

pub mod harness;
pub mod mock_broker;

pub use harness::TestHarness;
pub use mock_broker::{MockBroker, PublishedMessage};
