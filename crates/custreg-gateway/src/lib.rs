// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST gateway for the customer registration service.
//!
//! Serves the `/api/customers` resource, `/health` with outbox backlog
//! counts, and Prometheus text on `/metrics`. Every error is a JSON body
//! `{status, error, message, path, timestamp}`.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, serve, start_server, GatewayState, HealthState, ServerConfig};
