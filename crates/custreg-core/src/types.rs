// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the storage, relay and service layers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Broker,
    Observability,
}

// --- Outbox ---

/// Delivery status of an outbox event.
///
/// `PENDING` is the only "not yet sent" value. Transitions are
/// `PENDING -> SENT` and `PENDING -> FAILED`; neither terminal state
/// ever moves back.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxStatus {
    Pending,
    Sent,
    Failed,
}

impl OutboxStatus {
    /// The string persisted in the `status` column.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// One row of the outbox table: a domain fact waiting to be announced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEvent {
    /// Storage identity. Never leaves the service.
    pub id: i64,
    /// Identifier of the aggregate the event concerns; used as the broker key.
    pub aggregate_id: String,
    pub event_type: String,
    /// Serialized snapshot of the aggregate at creation time. Immutable.
    pub payload: String,
    pub status: OutboxStatus,
    /// Number of failed delivery attempts so far.
    pub retry_count: u32,
    /// Error text from the most recent failed attempt.
    pub last_error: Option<String>,
    /// ISO 8601 creation timestamp; defines relay order.
    pub created_at: String,
    /// Set when the event is marked `SENT`.
    pub processed_at: Option<String>,
}

// --- Customer aggregate ---

/// Lifecycle status of a customer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    PendingKyc,
    Active,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Event types written to the outbox by the customer service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerEventType {
    CustomerRegistered,
    CustomerCreated,
    CustomerKycCompleted,
    CustomerUpdated,
    CustomerStatusChanged,
}

impl CustomerEventType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Current residential address captured during KYC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Always `CURRENT` for addresses captured by this service.
    pub address_type: String,
    pub house_no: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// Employment details captured during KYC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employment {
    pub employment_type: String,
    pub company_name: String,
    pub monthly_income: f64,
    pub total_experience: Option<i32>,
}

/// The customer aggregate. This full state is the outbox payload for
/// every customer event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    /// Externally visible identifier and outbox aggregate id.
    pub customer_uuid: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub mobile: String,
    pub pan_number: String,
    pub aadhaar_number: String,
    pub status: CustomerStatus,
    pub address: Option<Address>,
    pub employment: Option<Employment>,
    pub created_at: String,
    pub updated_at: String,
}

/// Current UTC time in the ISO 8601 format used for every persisted timestamp.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
