//! Client interceptor tests against a mock API.

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dl_client::{BookAppointment, BookableKind, Client, ClientConfig, Error, PageRequest, ShowroomSearch};

fn tokens(access: &str, refresh: &str) -> Value {
    json!({
        "accessToken": access,
        "refreshToken": refresh,
        "tokenType": "Bearer",
        "expiresIn": 900,
        "user": {
            "id": "U1",
            "email": "ada@example.com",
            "displayName": "Ada Lovelace",
            "role": "CUSTOMER",
            "customerId": "C1"
        }
    })
}

fn profile() -> Value {
    json!({
        "id": "C1",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "notes": [],
        "hasAccount": true,
        "createdAt": "2026-01-05T10:00:00Z",
        "updatedAt": "2026-01-05T10:00:00Z"
    })
}

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({ "error": "INVALID_TOKEN", "message": "Token expired" }))
}

async fn logged_in_client(server: &MockServer) -> Client {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens("a1", "r1")))
        .mount(server)
        .await;

    let client = Client::new(ClientConfig::new(format!("{}/api", server.uri()))).unwrap();
    let user = client.login("ada@example.com", "secret-password").await.unwrap();
    assert_eq!(user.customer_id.as_deref(), Some("C1"));
    client
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/me"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile()))
        .expect(1)
        .mount(&server)
        .await;

    let me = client.profile().await.unwrap();
    assert_eq!(me.email, "ada@example.com");
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/me"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_string_contains("r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens("a2", "r2")))
        .expect(1)
        .mount(&server)
        .await;

    let calls = (0..5).map(|_| {
        let client = client.clone();
        async move { client.profile().await }
    });
    let results = futures::future::join_all(calls).await;
    assert!(results.iter().all(|r| r.is_ok()));

    let session_user = client.current_user().await.unwrap();
    assert_eq!(session_user.id, "U1");
}

#[tokio::test]
async fn test_refused_refresh_clears_session() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/me/invoices"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;

    let result = client.my_invoices(PageRequest::new(0, 20)).await;
    assert!(matches!(result, Err(Error::SessionExpired)));
    assert!(!client.is_logged_in().await);

    let after = client.my_invoices(PageRequest::new(0, 20)).await;
    assert!(matches!(after, Err(Error::NotLoggedIn)));
}

#[tokio::test]
async fn test_request_is_retried_only_once() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/me/appointments"))
        .respond_with(unauthorized())
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens("a2", "r2")))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.my_appointments(PageRequest::default()).await;
    assert!(matches!(result, Err(Error::Authentication(_))));
    // The refreshed session survives
    assert!(client.is_logged_in().await);
}

#[tokio::test]
async fn test_showroom_is_anonymous() {
    let server = MockServer::start().await;
    let client = Client::new(ClientConfig::new(format!("{}/api", server.uri()))).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/showroom"))
        .and(query_param("make", "Toyota"))
        .and(query_param("size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "V1",
                "stockNumber": "STK-1",
                "make": "Toyota",
                "model": "Corolla",
                "year": 2023,
                "mileage": 9800,
                "condition": "USED",
                "priceCents": 2190000,
                "features": [],
                "imageUrls": []
            }],
            "page": 0,
            "size": 10,
            "total": 1,
            "totalPages": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = ShowroomSearch {
        make: Some("Toyota".into()),
        ..Default::default()
    };
    let page = client.showroom(&search, PageRequest::new(0, 10)).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].price_cents, 2_190_000);
    assert!(!client.is_logged_in().await);
}

#[tokio::test]
async fn test_booking_conflict_surfaces_error_code() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/me/appointments"))
        .and(body_string_contains("TEST_DRIVE"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "SLOT_UNAVAILABLE",
            "message": "The vehicle is already booked at that time"
        })))
        .mount(&server)
        .await;

    let booking = BookAppointment {
        kind: BookableKind::TestDrive,
        vehicle_id: Some("V1".into()),
        start_at: Utc.with_ymd_and_hms(2026, 11, 2, 15, 0, 0).unwrap(),
        duration_minutes: 30,
        notes: None,
    };
    let error = client.book_appointment(&booking).await.unwrap_err();
    assert_eq!(error.code(), Some("SLOT_UNAVAILABLE"));
}
