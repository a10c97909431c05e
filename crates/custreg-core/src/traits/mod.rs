// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port traits.
//!
//! The relay depends only on [`OutboxStore`] and [`BrokerPublisher`], so its
//! retry and ordering logic can be driven by fakes in tests. All traits use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod broker;
pub mod outbox_store;

pub use adapter::PluginAdapter;
pub use broker::BrokerPublisher;
pub use outbox_store::OutboxStore;
