// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules.
//!
//! `customers` holds synchronous functions meant to run inside
//! [`crate::Database::transact`] / [`crate::Database::read`] closures.
//! `outbox` and `lease` expose async functions for the relay.

pub mod customers;
pub mod lease;
pub mod outbox;
