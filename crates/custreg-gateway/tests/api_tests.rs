// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP round trips against a gateway bound to an ephemeral port.

use std::sync::Arc;
use std::time::Instant;

use custreg_core::{OutboxStatus, OutboxStore, PluginAdapter};
use custreg_gateway::{serve, GatewayState, HealthState};
use custreg_test_utils::TestHarness;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

struct TestServer {
    base: String,
    harness: TestHarness,
    client: reqwest::Client,
    cancel: CancellationToken,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with_metrics(None).await
    }

    async fn start_with_metrics(render: Option<Arc<dyn Fn() -> String + Send + Sync>>) -> Self {
        let harness = TestHarness::new().await.unwrap();
        let adapters: Vec<Arc<dyn PluginAdapter>> =
            vec![harness.storage.clone(), harness.broker.clone() as Arc<dyn PluginAdapter>];
        let state = GatewayState {
            service: harness.service.clone(),
            health: HealthState {
                start_time: Instant::now(),
                outbox: harness.storage.clone(),
                adapters,
                prometheus_render: render,
            },
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let cancel = CancellationToken::new();
        tokio::spawn(serve(listener, state, cancel.clone()));
        Self {
            base,
            harness,
            client: reqwest::Client::new(),
            cancel,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self.client.post(self.url(path)).json(body).send().await.unwrap();
        (resp.status(), resp.json().await.unwrap())
    }

    async fn put(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self.client.put(self.url(path)).json(body).send().await.unwrap();
        (resp.status(), resp.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        (resp.status(), resp.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn enquiry(n: u32) -> Value {
    json!({
        "first_name": format!("Asha{n}"),
        "last_name": "Rao",
        "gender": "F",
        "date_of_birth": "1990-05-15",
        "email": format!("asha{n}@example.com"),
        "mobile_number": format!("98765432{n:02}"),
        "pan_number": format!("ABCDE12{n:02}F"),
        "aadhaar_number": format!("1234567890{n:02}"),
    })
}

fn full(n: u32) -> Value {
    let mut body = enquiry(n);
    body["address"] = json!({
        "house_no": "12B",
        "city": "Pune",
        "state": "MH",
        "pincode": "411001",
    });
    body["employment_details"] = json!({
        "employment_type": "SALARIED",
        "company_name": "Acme",
        "monthly_income": 85000.0,
        "total_experience": 6,
    });
    body
}

async fn pending(server: &TestServer) -> u64 {
    server
        .harness
        .storage
        .count_by_status(OutboxStatus::Pending)
        .await
        .unwrap()
}

#[tokio::test]
async fn enquiry_is_created_with_masked_identifiers() {
    let server = TestServer::start().await;
    let (status, body) = server.post("/api/customers/enquiry", &enquiry(1)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING_KYC");
    assert_eq!(body["active"], false);
    assert_eq!(body["pan_number"], "ABC*****F");
    assert_eq!(body["aadhaar_number"], "********9001");
    assert_eq!(pending(&server).await, 1);

    let id = body["customer_id"].as_i64().unwrap();
    let (status, fetched) = server.get(&format!("/api/customers/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["customer_uuid"], body["customer_uuid"]);
}

#[tokio::test]
async fn duplicate_pan_is_a_conflict() {
    let server = TestServer::start().await;
    server.post("/api/customers/enquiry", &enquiry(1)).await;

    let mut dup = enquiry(2);
    dup["pan_number"] = json!("ABCDE1201F");
    let (status, body) = server.post("/api/customers/enquiry", &dup).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);
    assert_eq!(body["error"], "Conflict");
    assert_eq!(body["path"], "/api/customers/enquiry");
    assert!(body["message"].as_str().unwrap().contains("ABC*****F"));
    assert!(body["timestamp"].is_string());
    assert_eq!(pending(&server).await, 1);
}

#[tokio::test]
async fn invalid_body_is_a_bad_request() {
    let server = TestServer::start().await;
    let mut bad = enquiry(1);
    bad["pan_number"] = json!("nope");
    let (status, body) = server.post("/api/customers/enquiry", &bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("pan_number"));

    let resp = server
        .client
        .post(server.url("/api/customers/enquiry"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], 400);
    assert_eq!(pending(&server).await, 0);
}

#[tokio::test]
async fn unknown_customer_is_not_found() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/api/customers/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["path"], "/api/customers/999");

    let (status, _) = server.get("/api/customers/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server.get("/api/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn kyc_activates_and_status_patch_changes_status() {
    let server = TestServer::start().await;
    let (_, created) = server.post("/api/customers/enquiry", &enquiry(1)).await;
    let id = created["customer_id"].as_i64().unwrap();

    let (status, kyc) = server.put(&format!("/api/customers/{id}/kyc"), &full(1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kyc["status"], "ACTIVE");
    assert_eq!(kyc["active"], true);
    assert_eq!(kyc["address"]["city"], "Pune");

    let resp = server
        .client
        .patch(server.url(&format!("/api/customers/{id}/status")))
        .json(&json!({ "status": "INACTIVE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "INACTIVE");
    assert_eq!(pending(&server).await, 3);

    let resp = server
        .client
        .patch(server.url(&format!("/api/customers/{id}/status")))
        .json(&json!({ "status": "DELETED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_create_and_lookups() {
    let server = TestServer::start().await;
    let (status, created) = server.post("/api/customers", &full(3)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["employment_details"]["company_name"], "Acme");

    let uuid = created["customer_uuid"].as_str().unwrap();
    let (status, _) = server.get(&format!("/api/customers/uuid/{uuid}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.get("/api/customers/pan/ABCDE1203F").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.get("/api/customers/email/asha3@example.com").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server.get("/api/customers/pan/ZZZZZ9999Z").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!body["message"].as_str().unwrap().contains("ZZZZZ9999Z"));
}

#[tokio::test]
async fn paging_search_and_status_listing() {
    let server = TestServer::start().await;
    for n in 1..=3 {
        server.post("/api/customers/enquiry", &enquiry(n)).await;
    }

    let (status, page) = server.get("/api/customers?page=0&size=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["content"].as_array().unwrap().len(), 2);
    assert_eq!(page["total_elements"], 3);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["first"], true);
    assert_eq!(page["last"], false);

    let (status, found) = server.get("/api/customers/search?q=asha2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["total_elements"], 1);

    let (status, _) = server.get("/api/customers/search?q=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, by_status) = server.get("/api/customers/status/pending_kyc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_status["total_elements"], 3);

    let (status, _) = server.get("/api/customers/status/UNKNOWN").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.get("/api/customers?size=500").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_outbox_backlog() {
    let server = TestServer::start().await;
    server.post("/api/customers/enquiry", &enquiry(1)).await;

    let (status, health) = server.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["outbox"]["pending"], 1);
    assert_eq!(health["outbox"]["failed"], 0);
    assert_eq!(health["adapters"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn metrics_endpoint_renders_or_is_absent() {
    let server = TestServer::start().await;
    let resp = server.client.get(server.url("/metrics")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let render: Arc<dyn Fn() -> String + Send + Sync> =
        Arc::new(|| "custreg_outbox_pending 0\n".to_string());
    let server = TestServer::start_with_metrics(Some(render)).await;
    let resp = server.client.get(server.url("/metrics")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("custreg_outbox_pending"));
}
