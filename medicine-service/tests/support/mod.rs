#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use common_auth::{JwtConfig, JwtVerifier};
use common_observability::MetricsRegistry;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use medicine_service::config::HttpConfig;
use medicine_service::instrumentation::StatusLabel;
use medicine_service::{build_router, AppState, InMemoryMedicineStore, MedicineMetrics, MedicineStore};
use serde_json::{json, Value};
use tower::util::ServiceExt;

pub const SECRET: &[u8] = b"pharmacy-test-secret-0123456789";

pub fn token(role: &str) -> String {
    let claims = json!({
        "sub": "tester",
        "role": role,
        "exp": Utc::now().timestamp() + 600,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).expect("sign token")
}

pub fn bearer(role: &str) -> String {
    format!("Bearer {}", token(role))
}

pub fn verifier() -> Arc<JwtVerifier> {
    Arc::new(JwtVerifier::with_hmac_secret(JwtConfig::new(), SECRET))
}

pub fn metrics(label: StatusLabel) -> Arc<MedicineMetrics> {
    Arc::new(MedicineMetrics::new(Arc::new(MetricsRegistry::new()), label).expect("metrics"))
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn with_store<S: MedicineStore + 'static>(store: S, label: StatusLabel) -> Self {
        let state = AppState::new(store, verifier(), metrics(label));
        let router = build_router(state.clone(), &HttpConfig::default());
        Self { router, state }
    }

    pub fn in_memory() -> Self {
        Self::with_store(InMemoryMedicineStore::new(), StatusLabel::Class)
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.expect("router is infallible");
        let status = resp.status();
        let bytes = resp.into_body().collect().await.expect("body").to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    /// Creates a medicine through the API as Admin and returns its id.
    pub async fn seed(&self, name: &str, quantity: i32) -> i32 {
        let (status, body) = self
            .send(json_request("POST", "/api/medicine/CreateNewMedicine", Some(&bearer("Admin")), medicine_json(name, quantity)))
            .await;
        assert_eq!(status, StatusCode::OK, "seed failed: {body}");
        body["id"].as_i64().expect("id") as i32
    }
}

pub fn medicine_json(name: &str, quantity: i32) -> Value {
    json!({
        "name": name,
        "manufacturer": "Bayer",
        "unitPrice": "12.50",
        "discount": "0",
        "quantity": quantity,
        "expDate": "2027-05-31",
        "imageUrl": "https://img.example/medicine.png",
    })
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn get_request(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::empty()).expect("request")
}
