//! Common test utilities

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::util::ServiceExt;

use driving_school::api::{self, AppState};
use driving_school::auth::{InMemoryRevocationStore, InMemoryUserStore, TokenService};
use driving_school::domain::{PlanCatalog, Role, UuidIdGenerator};
use driving_school::store::{InMemoryStudentStore, RetryPolicy};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub tokens: Arc<TokenService>,
    pub students: Arc<InMemoryStudentStore>,
    pub revocations: Arc<InMemoryRevocationStore>,
}

/// Application wired to fresh in-memory stores
pub fn setup_app() -> TestApp {
    let students = Arc::new(InMemoryStudentStore::new());
    let revocations = Arc::new(InMemoryRevocationStore::new());
    let tokens = Arc::new(TokenService::new(TEST_SECRET, chrono::Duration::hours(1)));

    let state = AppState::new(
        students.clone(),
        Arc::new(InMemoryUserStore::new()),
        revocations.clone(),
        tokens.clone(),
        Arc::new(PlanCatalog::standard()),
        Arc::new(UuidIdGenerator),
        RetryPolicy::new(3, Duration::from_millis(1)),
        100,
    );

    TestApp {
        router: api::build_router(state),
        tokens,
        students,
        revocations,
    }
}

impl TestApp {
    pub fn token(&self, role: Role) -> String {
        self.tokens
            .issue(&format!("{}@school.test", role.as_str().to_lowercase()), role)
            .unwrap()
            .token
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

/// Minimal valid registration body
pub fn student_body(application_number: &str, mobile: &str, plan: &str) -> Value {
    serde_json::json!({
        "name": "Arjun Menon",
        "mobile_number": mobile,
        "application_number": application_number,
        "email": format!("{}@example.com", application_number.to_lowercase()),
        "national_id_number": format!("NID-{}", application_number),
        "plan": plan,
    })
}

/// Read a decimal field serialized as a string
pub fn decimal(value: &Value, field: &str) -> Decimal {
    let raw = value[field]
        .as_str()
        .unwrap_or_else(|| panic!("field {} missing in {}", field, value));
    Decimal::from_str(raw).unwrap()
}
