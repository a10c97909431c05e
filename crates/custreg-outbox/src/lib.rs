// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox relay.
//!
//! Moves committed outbox events to the broker with at-least-once delivery.
//! A [`Relay`] runs one bounded cycle at a time: select `PENDING` events
//! oldest first, publish each under a timeout, and advance its status
//! individually. [`Relay::run`] repeats the cycle on a fixed delay until
//! cancelled.

pub mod relay;
pub mod settings;

pub use relay::{CycleOutcome, CycleReport, Relay};
pub use settings::RelaySettings;
