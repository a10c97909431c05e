// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the custreg service.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, caller-scoped units of work, the
//! customer tables, and the outbox record store used by the relay.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;
pub mod writer;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use writer::OutboxWriter;
