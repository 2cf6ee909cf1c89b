//! Platform API Integration Tests
//!
//! Exercises the assembled router over HTTP: public showroom, customer
//! self-service, role checks, refresh-token rotation and the
//! receipt-to-waiting-list flow.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use dl_platform::{Bootstrapper, Platform, PlatformSettings};

const ADMIN_EMAIL: &str = "admin@dealer.test";
const ADMIN_PASSWORD: &str = "admin-password-1";

async fn app() -> Router {
    let platform = Platform::in_memory(PlatformSettings::testing()).unwrap();
    Bootstrapper::new(
        platform.repos.users.clone(),
        platform.repos.vehicles.clone(),
        platform.passwords.clone(),
    )
    .run(Some((ADMIN_EMAIL, ADMIN_PASSWORD)), true)
    .await
    .unwrap();
    platform.router(Some("test".into()))
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> Value {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body
}

async fn register_customer(app: &Router, email: &str) -> String {
    let (status, _) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "customer-pass-1",
            "firstName": "Ada",
            "lastName": "Lovelace"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session = login(app, email, "customer-pass-1").await;
    session["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_showroom_is_public() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/api/showroom?size=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let id = body["data"][0]["id"].as_str().unwrap();
    let (status, vehicle) = call(&app, Method::GET, &format!("/api/showroom/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(vehicle["priceCents"].as_i64().unwrap() > 0);

    let (status, _) = call(&app, Method::GET, "/api/showroom/does-not-exist", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = app().await;
    let (status, _) = call(&app, Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_customer_books_test_drive() {
    let app = app().await;
    let token = register_customer(&app, "ada@example.com").await;

    let (status, profile) = call(&app, Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "ada@example.com");

    let (_, showroom) = call(&app, Method::GET, "/api/showroom", None, None).await;
    let vehicle_id = showroom["data"][0]["id"].as_str().unwrap().to_string();
    let start_at = (Utc::now() + Duration::days(2)).to_rfc3339();

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/me/appointments",
        Some(&token),
        Some(json!({
            "kind": "TEST_DRIVE",
            "vehicleId": vehicle_id,
            "startAt": start_at,
            "durationMinutes": 30
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);

    // Same car, same slot
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/me/appointments",
        Some(&token),
        Some(json!({
            "kind": "TEST_DRIVE",
            "vehicleId": vehicle_id,
            "startAt": start_at,
            "durationMinutes": 30
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/me/appointments",
        Some(&token),
        Some(json!({
            "kind": "DELIVERY",
            "startAt": start_at,
            "durationMinutes": 60
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, mine) = call(&app, Method::GET, "/api/me/appointments", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["data"][0]["id"], created["id"]);
}

#[tokio::test]
async fn test_staff_endpoints_enforce_roles() {
    let app = app().await;
    let customer = register_customer(&app, "bob@example.com").await;

    let (status, _) = call(&app, Method::GET, "/api/dashboard/summary", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/dashboard/summary", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let admin_token = admin["accessToken"].as_str().unwrap();
    let (status, summary) = call(&app, Method::GET, "/api/dashboard/summary", Some(admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["openSalesOrders"], 0);

    // Staff have no customer profile
    let (status, _) = call(&app, Method::GET, "/api/me", Some(admin_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_refresh_token_rotation() {
    let app = app().await;
    let session = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let first = session["refreshToken"].as_str().unwrap().to_string();

    let (status, rotated) = call(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": first })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refreshToken"], session["refreshToken"]);

    // A retired token is refused
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": first })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

async fn admin_token(app: &Router) -> String {
    let session = login(app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    session["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_customers_cannot_touch_each_others_records() {
    let app = app().await;
    let ada = register_customer(&app, "ada@example.com").await;
    let eve = register_customer(&app, "eve@example.com").await;
    let admin = admin_token(&app).await;

    let (_, showroom) = call(&app, Method::GET, "/api/showroom", None, None).await;
    let vehicle_id = showroom["data"][0]["id"].as_str().unwrap().to_string();
    let (status, appointment) = call(
        &app,
        Method::POST,
        "/api/me/appointments",
        Some(&ada),
        Some(json!({
            "kind": "TEST_DRIVE",
            "vehicleId": vehicle_id,
            "startAt": (Utc::now() + Duration::days(3)).to_rfc3339(),
            "durationMinutes": 30
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", appointment);
    let appointment_id = appointment["id"].as_str().unwrap();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/me/appointments/{}/cancel", appointment_id),
        Some(&eve),
        Some(json!({ "reason": "not mine" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Invoice Ada for a car
    let (_, profile) = call(&app, Method::GET, "/api/me", Some(&ada), None).await;
    let (status, order) = call(
        &app,
        Method::POST,
        "/api/sales-orders",
        Some(&admin),
        Some(json!({ "customerId": profile["id"], "vehicleId": vehicle_id, "taxRateBps": 800 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    let order_id = order["id"].as_str().unwrap();
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/sales-orders/{}/confirm", order_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, invoice) = call(
        &app,
        Method::POST,
        "/api/invoices/sales",
        Some(&admin),
        Some(json!({ "salesOrderId": order_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", invoice);
    let invoice_id = invoice["id"].as_str().unwrap();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/me/invoices/{}/pay", invoice_id),
        Some(&eve),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Nothing moved
    let (_, stored) = call(&app, Method::GET, &format!("/api/invoices/{}", invoice_id), Some(&admin), None).await;
    assert_eq!(stored["status"], "ISSUED");
    assert_eq!(stored["amountPaidCents"], 0);
    let (_, mine) = call(&app, Method::GET, "/api/me/appointments", Some(&ada), None).await;
    assert_eq!(mine["data"][0]["status"], "SCHEDULED");

    // The owner can pay
    let (status, receipt) = call(
        &app,
        Method::POST,
        &format!("/api/me/invoices/{}/pay", invoice_id),
        Some(&ada),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", receipt);
    assert_eq!(receipt["invoiceBalanceCents"], 0);
}

#[tokio::test]
async fn test_receiving_stock_notifies_the_waiting_list() {
    let app = app().await;
    let admin = admin_token(&app).await;

    let (status, customer) = call(
        &app,
        Method::POST,
        "/api/customers",
        Some(&admin),
        Some(json!({ "firstName": "Jan", "lastName": "Novak", "email": "jan@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", customer);
    let (status, entry) = call(
        &app,
        Method::POST,
        "/api/waiting-list",
        Some(&admin),
        Some(json!({ "customerId": customer["id"], "make": "ŠKODA", "model": "Octavia" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", entry);
    let entry_id = entry["id"].as_str().unwrap();

    let (status, order) = call(
        &app,
        Method::POST,
        "/api/purchase-orders",
        Some(&admin),
        Some(json!({
            "supplier": "Mlada Boleslav Export",
            "lines": [{
                "vin": "TMBJJ7NE8L0123456",
                "make": "Škoda",
                "model": "Octavia",
                "year": 2020,
                "condition": "USED",
                "unitCostCents": 1_500_000,
                "listPriceCents": 1_800_000
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    let order_id = order["id"].as_str().unwrap();
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/purchase-orders/{}/submit", order_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, receipt) = call(
        &app,
        Method::POST,
        &format!("/api/purchase-orders/{}/receive", order_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", receipt);
    assert_eq!(receipt["notifiedEntries"], 1);
    let vehicle_id = receipt["vehicleIds"][0].as_str().unwrap();

    let (_, stored) = call(&app, Method::GET, &format!("/api/waiting-list/{}", entry_id), Some(&admin), None).await;
    assert_eq!(stored["status"], "NOTIFIED");

    let (_, order_events) = call(
        &app,
        Method::GET,
        &format!("/api/audit/events?subject=purchasing.purchase-order.{}", order_id),
        Some(&admin),
        None,
    )
    .await;
    let received = order_events["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["eventType"] == "dealerline:purchasing:purchase-order:received")
        .unwrap();

    let (_, vehicle_events) = call(
        &app,
        Method::GET,
        &format!("/api/audit/events?subject=crm.waiting-list.{}", vehicle_id),
        Some(&admin),
        None,
    )
    .await;
    let notified = &vehicle_events["data"][0];
    assert_eq!(notified["eventType"], "dealerline:crm:waiting-list:notified");
    assert_eq!(notified["causationId"], received["id"]);
    assert_eq!(notified["correlationId"], received["correlationId"]);
    assert_eq!(notified["data"]["entryIds"][0], entry_id);
}
