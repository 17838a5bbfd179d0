//! Student ledger API integration tests

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;

use driving_school::domain::Role;

mod common;

use common::{decimal, setup_app, student_body};

#[tokio::test]
async fn test_health() {
    let app = setup_app();
    let (status, _) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_basic_student() {
    let app = setup_app();
    let token = app.token(Role::Instructor);

    let (status, body) = app
        .send("POST", "/students", Some(&token), Some(student_body("APP-100", "9800000001", "Basic")))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(decimal(&body, "total_amount"), dec!(5000));
    assert_eq!(decimal(&body, "paid_amount"), dec!(0));
    assert_eq!(decimal(&body, "balance"), dec!(5000));
    assert_eq!(body["full_payment_status"], "Pending");
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_payment_sequence_to_completion() {
    let app = setup_app();
    let token = app.token(Role::Instructor);
    app.send("POST", "/students", Some(&token), Some(student_body("APP-1", "9800000001", "Basic")))
        .await;

    let (status, first) = app
        .send("POST", "/students/APP-1/payments", Some(&token), Some(json!({ "amount": "3000" })))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", first);
    assert_eq!(decimal(&first["student"], "balance"), dec!(2000));
    assert_eq!(first["student"]["full_payment_status"], "Pending");

    let (status, second) = app
        .send(
            "POST",
            "/students/APP-1/payments",
            Some(&token),
            Some(json!({ "amount": "2000", "transaction_id": "UPI-4411" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let student = &second["student"];
    assert_eq!(decimal(student, "balance"), dec!(0));
    assert_eq!(decimal(student, "paid_amount"), dec!(5000));
    assert_eq!(student["full_payment_status"], "Completed");

    let payments = student["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(decimal(&payments[0], "amount"), dec!(3000));
    assert_eq!(decimal(&payments[1], "amount"), dec!(2000));
    assert_ne!(payments[0]["payment_id"], payments[1]["payment_id"]);
    assert_eq!(payments[1]["payment_id"], second["payment"]["payment_id"]);
    assert_eq!(payments[1]["transaction_id"], "UPI-4411");

    // Paid up: any further payment is rejected with the current balance
    let (status, rejected) = app
        .send("POST", "/students/APP-1/payments", Some(&token), Some(json!({ "amount": "100" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(rejected["error_code"], "overpayment_rejected");
    assert_eq!(rejected["details"], "0");

    let (_, ledger) = app.send("GET", "/students/APP-1/ledger", Some(&token), None).await;
    assert_eq!(decimal(&ledger, "paid_amount"), dec!(5000));
}

#[tokio::test]
async fn test_overshooting_payment_rejected_and_unchanged() {
    let app = setup_app();
    let token = app.token(Role::Admin);
    app.send("POST", "/students", Some(&token), Some(student_body("APP-1", "9800000001", "Basic")))
        .await;

    let (status, body) = app
        .send("POST", "/students/APP-1/payments", Some(&token), Some(json!({ "amount": "5000.01" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"], "5000");

    let (_, student) = app
        .send("GET", "/students/by-application/APP-1", Some(&token), None)
        .await;
    assert!(student["payments"].as_array().unwrap().is_empty());
    assert_eq!(decimal(&student, "balance"), dec!(5000));
}

#[tokio::test]
async fn test_unknown_plan_persists_nothing() {
    let app = setup_app();
    let token = app.token(Role::Instructor);

    let (status, body) = app
        .send("POST", "/students", Some(&token), Some(student_body("APP-9", "9800000009", "Gold")))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "unknown_plan");
    assert!(app.students.is_empty().await);
}

#[tokio::test]
async fn test_initial_payments_and_invalid_amounts() {
    let app = setup_app();
    let token = app.token(Role::Instructor);

    let mut body = student_body("APP-2", "9800000002", "Standard");
    body["payments"] = json!([{ "amount": "2500" }, { "amount": "500", "payment_id": "given-id" }]);
    let (status, created) = app.send("POST", "/students", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(decimal(&created, "balance"), dec!(4000));
    assert_eq!(created["payments"][1]["payment_id"], "given-id");

    let mut over = student_body("APP-3", "9800000003", "Basic");
    over["payments"] = json!([{ "amount": "6000" }]);
    let (status, _) = app.send("POST", "/students", Some(&token), Some(over)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Zero is not a valid payment amount
    let (status, _) = app
        .send("POST", "/students/APP-2/payments", Some(&token), Some(json!({ "amount": "0" })))
        .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_duplicate_keys_conflict() {
    let app = setup_app();
    let token = app.token(Role::Instructor);
    app.send("POST", "/students", Some(&token), Some(student_body("APP-1", "9800000001", "Basic")))
        .await;

    let (status, body) = app
        .send("POST", "/students", Some(&token), Some(student_body("APP-1", "9800000002", "Basic")))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "duplicate_key");
    assert_eq!(body["details"], "application_number");
}

#[tokio::test]
async fn test_lookups_listing_and_delete() {
    let app = setup_app();
    let writer = app.token(Role::Instructor);
    let reader = app.token(Role::Student);
    let admin = app.token(Role::Admin);
    for (app_no, mobile, plan) in [
        ("APP-1", "9800000001", "Basic"),
        ("APP-2", "9800000002", "Heavy"),
        ("APP-3", "9800000003", "Basic"),
    ] {
        let (status, _) = app
            .send("POST", "/students", Some(&writer), Some(student_body(app_no, mobile, plan)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, student) = app
        .send("GET", "/students/by-mobile/9800000002", Some(&reader), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(student["application_number"], "APP-2");

    let (_, student) = app
        .send("GET", "/students/by-national-id/NID-APP-3", Some(&reader), None)
        .await;
    assert_eq!(student["mobile_number"], "9800000003");

    let (_, list) = app.send("GET", "/students/by-plan/Basic", Some(&reader), None).await;
    assert_eq!(list["count"], 2);

    let (_, list) = app.send("GET", "/students?limit=2", Some(&reader), None).await;
    assert_eq!(list["count"], 2);
    assert_eq!(list["students"][0]["application_number"], "APP-1");

    // Instructors may not delete
    let (status, _) = app.send("DELETE", "/students/APP-1", Some(&writer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("DELETE", "/students/APP-1", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .send("DELETE", "/students/by-mobile/9800000002", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .send("GET", "/students/by-application/APP-1", Some(&reader), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "student_not_found");
}

#[tokio::test]
async fn test_full_replace_preserves_identity() {
    let app = setup_app();
    let token = app.token(Role::Instructor);
    let (_, created) = app
        .send("POST", "/students", Some(&token), Some(student_body("APP-1", "9800000001", "Basic")))
        .await;
    let (_, paid) = app
        .send("POST", "/students/APP-1/payments", Some(&token), Some(json!({ "amount": "1000" })))
        .await;
    let payment_id = paid["payment"]["payment_id"].clone();

    let mut replacement = student_body("APP-1", "9800000001", "Premium");
    replacement["name"] = json!("Arjun K Menon");
    replacement["status"] = json!("InTraining");
    replacement["payments"] = json!([{ "payment_id": payment_id, "amount": "1000" }]);

    let (status, updated) = app
        .send("PUT", "/students/APP-1", Some(&token), Some(replacement))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["registered_date"], created["registered_date"]);
    assert_eq!(updated["name"], "Arjun K Menon");
    assert_eq!(updated["status"], "InTraining");
    assert_eq!(updated["payments"][0]["payment_id"], payment_id);
    assert_eq!(decimal(&updated, "total_amount"), dec!(9000));
    assert_eq!(decimal(&updated, "balance"), dec!(8000));
}

#[tokio::test]
async fn test_read_is_stable() {
    let app = setup_app();
    let token = app.token(Role::Instructor);
    app.send("POST", "/students", Some(&token), Some(student_body("APP-1", "9800000001", "Elite")))
        .await;
    app.send("POST", "/students/APP-1/payments", Some(&token), Some(json!({ "amount": "700.50" })))
        .await;

    let (_, first) = app.send("GET", "/students/by-application/APP-1", Some(&token), None).await;
    let (_, second) = app.send("GET", "/students/by-application/APP-1", Some(&token), None).await;

    assert_eq!(first, second);
    assert_eq!(decimal(&first, "balance"), dec!(10299.50));
}

#[tokio::test]
async fn test_student_role_is_read_only() {
    let app = setup_app();
    let token = app.token(Role::Student);

    let (status, body) = app
        .send("POST", "/students", Some(&token), Some(student_body("APP-1", "9800000001", "Basic")))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "forbidden");
}
