// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route handlers for `/api/customers`, `/health` and `/metrics`.
//!
//! Path, query and body rejections are turned into the same JSON error body
//! as service errors so every non-2xx response has one shape.

use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use custreg_core::{CustomerStatus, HealthStatus, OutboxStatus, RegistryError};
use custreg_customer::{
    CustomerRequest, CustomerResponse, EnquiryRequest, PageResponse, StatusUpdateRequest,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::{GatewayState, HealthState};

type ApiResult<T> = Result<T, ApiError>;

/// `page` and `size` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PageParams {
    pub page: u32,
    pub size: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self { page: 0, size: 10 }
    }
}

/// Query for `/api/customers/search`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub q: String,
    pub page: u32,
    pub size: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        let paging = PageParams::default();
        Self {
            q: String::new(),
            page: paging.page,
            size: paging.size,
        }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>, uri: &Uri) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text(), uri))
}

fn query<T>(params: Result<Query<T>, QueryRejection>, uri: &Uri) -> ApiResult<T> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text(), uri))
}

fn customer_id(raw: &str, uri: &Uri) -> ApiResult<i64> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid customer id: {raw}"), uri))
}

/// POST /api/customers/enquiry
pub async fn create_enquiry(
    State(state): State<GatewayState>,
    uri: Uri,
    payload: Result<Json<EnquiryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CustomerResponse>)> {
    let req = body(payload, &uri)?;
    let created = state
        .service
        .create_enquiry(req)
        .await
        .map_err(|e| ApiError::new(e, &uri))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/customers
pub async fn create_customer(
    State(state): State<GatewayState>,
    uri: Uri,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CustomerResponse>)> {
    let req = body(payload, &uri)?;
    let created = state
        .service
        .create_customer(req)
        .await
        .map_err(|e| ApiError::new(e, &uri))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/customers?page&size
pub async fn list_customers(
    State(state): State<GatewayState>,
    uri: Uri,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<PageResponse<CustomerResponse>>> {
    let paging = query(params, &uri)?;
    state
        .service
        .list(paging.page, paging.size)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, &uri))
}

/// GET /api/customers/search?q&page&size
pub async fn search_customers(
    State(state): State<GatewayState>,
    uri: Uri,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<PageResponse<CustomerResponse>>> {
    let params = query(params, &uri)?;
    state
        .service
        .search(&params.q, params.page, params.size)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, &uri))
}

/// GET /api/customers/status/{status}
pub async fn list_by_status(
    State(state): State<GatewayState>,
    uri: Uri,
    Path(raw): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<PageResponse<CustomerResponse>>> {
    let status = CustomerStatus::from_str(&raw)
        .map_err(|_| ApiError::bad_request(format!("unknown customer status: {raw}"), &uri))?;
    let paging = query(params, &uri)?;
    state
        .service
        .list_by_status(status, paging.page, paging.size)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, &uri))
}

/// GET /api/customers/{id}
pub async fn get_customer(
    State(state): State<GatewayState>,
    uri: Uri,
    Path(raw): Path<String>,
) -> ApiResult<Json<CustomerResponse>> {
    let id = customer_id(&raw, &uri)?;
    state
        .service
        .get_by_id(id)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, &uri))
}

/// GET /api/customers/uuid/{uuid}
pub async fn get_by_uuid(
    State(state): State<GatewayState>,
    uri: Uri,
    Path(uuid): Path<String>,
) -> ApiResult<Json<CustomerResponse>> {
    state
        .service
        .get_by_uuid(&uuid)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, &uri))
}

/// GET /api/customers/pan/{pan}
pub async fn get_by_pan(
    State(state): State<GatewayState>,
    uri: Uri,
    Path(pan): Path<String>,
) -> ApiResult<Json<CustomerResponse>> {
    state
        .service
        .get_by_pan(&pan)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, &uri))
}

/// GET /api/customers/email/{email}
pub async fn get_by_email(
    State(state): State<GatewayState>,
    uri: Uri,
    Path(email): Path<String>,
) -> ApiResult<Json<CustomerResponse>> {
    state
        .service
        .get_by_email(&email)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, &uri))
}

/// PUT /api/customers/{id}
pub async fn update_customer(
    State(state): State<GatewayState>,
    uri: Uri,
    Path(raw): Path<String>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> ApiResult<Json<CustomerResponse>> {
    let id = customer_id(&raw, &uri)?;
    let req = body(payload, &uri)?;
    state
        .service
        .update_customer(id, req)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, &uri))
}

/// PUT /api/customers/{id}/kyc
pub async fn complete_kyc(
    State(state): State<GatewayState>,
    uri: Uri,
    Path(raw): Path<String>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> ApiResult<Json<CustomerResponse>> {
    let id = customer_id(&raw, &uri)?;
    let req = body(payload, &uri)?;
    state
        .service
        .complete_kyc(id, req)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, &uri))
}

/// PATCH /api/customers/{id}/status
pub async fn update_status(
    State(state): State<GatewayState>,
    uri: Uri,
    Path(raw): Path<String>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<CustomerResponse>> {
    let id = customer_id(&raw, &uri)?;
    let req = body(payload, &uri)?;
    state
        .service
        .update_status(id, req.status)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, &uri))
}

pub async fn route_not_found(uri: Uri) -> ApiError {
    let path = uri.path().to_string();
    ApiError::new(RegistryError::not_found("route", path), &uri)
}

/// Outbox backlog reported by `/health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutboxHealth {
    pub pending: u64,
    pub failed: u64,
}

/// Health check response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok`, `degraded` or `unavailable`.
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub outbox: Option<OutboxHealth>,
    pub adapters: Vec<AdapterHealth>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdapterHealth {
    pub name: String,
    pub status: String,
}

async fn outbox_counts(health: &HealthState) -> Result<OutboxHealth, RegistryError> {
    Ok(OutboxHealth {
        pending: health.outbox.count_by_status(OutboxStatus::Pending).await?,
        failed: health.outbox.count_by_status(OutboxStatus::Failed).await?,
    })
}

/// GET /health
///
/// 200 while every backend answers (`degraded` if any reports trouble),
/// 503 when the outbox cannot be counted or a backend is unhealthy.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let health = &state.health;
    let mut status = "ok";
    let mut available = true;

    let outbox = match outbox_counts(health).await {
        Ok(counts) => Some(counts),
        Err(e) => {
            tracing::warn!(error = %e, "outbox health query failed");
            available = false;
            None
        }
    };

    let mut adapters = Vec::with_capacity(health.adapters.len());
    for adapter in &health.adapters {
        let report = match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => "healthy".to_string(),
            Ok(HealthStatus::Degraded(reason)) => {
                status = "degraded";
                format!("degraded: {reason}")
            }
            Ok(HealthStatus::Unhealthy(reason)) => {
                available = false;
                format!("unhealthy: {reason}")
            }
            Err(e) => {
                available = false;
                format!("unhealthy: {e}")
            }
        };
        adapters.push(AdapterHealth {
            name: adapter.name().to_string(),
            status: report,
        });
    }

    let code = if available {
        StatusCode::OK
    } else {
        status = "unavailable";
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: health.start_time.elapsed().as_secs(),
        outbox,
        adapters,
    };
    (code, Json(body)).into_response()
}

/// GET /metrics
pub async fn get_metrics(State(state): State<GatewayState>, uri: Uri) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => {
            ApiError::new(RegistryError::not_found("route", "/metrics"), &uri).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_default() {
        let params = PageParams::default();
        assert_eq!(params.page, 0);
        assert_eq!(params.size, 10);
    }

    #[test]
    fn customer_id_rejects_non_numeric() {
        let uri = Uri::from_static("/api/customers/abc");
        let err = customer_id("abc", &uri).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(customer_id("42", &uri).unwrap(), 42);
    }

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".into(),
            version: "0.1.0".into(),
            uptime_secs: 42,
            outbox: Some(OutboxHealth {
                pending: 3,
                failed: 1,
            }),
            adapters: vec![AdapterHealth {
                name: "sqlite".into(),
                status: "healthy".into(),
            }],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["outbox"]["pending"], 3);
        assert_eq!(json["outbox"]["failed"], 1);
        assert_eq!(json["adapters"][0]["name"], "sqlite");
    }
}
