//! Request-level checks that are settled before MongoDB is consulted: routing,
//! guards, validation, and cross-origin headers. The pool points at a port
//! nothing listens on, so nothing here needs a running database.

use mongodb::bson::oid::ObjectId;
use rocket::figment::Figment;
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};

use salon_api::jwt::JwtKeys;
use salon_api::models::user::{Role, User};

const SECRET: &str = "test-secret";
const ORIGIN: &str = "http://localhost:5173";

fn figment() -> Figment {
    rocket::Config::figment()
        .merge(("jwt_secret", SECRET))
        .merge(("cors_origin", ORIGIN))
        .merge((
            "databases.salon_db.url",
            "mongodb://127.0.0.1:9/salon_test?serverSelectionTimeoutMS=300&connectTimeoutMS=300",
        ))
        .merge(("log_level", "off"))
}

async fn client() -> Client {
    client_with(figment()).await
}

async fn client_with(figment: Figment) -> Client {
    Client::tracked(salon_api::build_with(figment))
        .await
        .expect("valid rocket instance")
}

fn bearer(role: Role, salon_id: Option<ObjectId>) -> Header<'static> {
    let user = User::new("caller@example.com", String::new(), role, salon_id);
    let token = JwtKeys::new(SECRET, 1).create_token(&user).unwrap();
    Header::new("Authorization", format!("Bearer {token}"))
}

async fn error_of(response: rocket::local::asynchronous::LocalResponse<'_>) -> String {
    let body: Value = response.into_json().await.expect("json error body");
    body["error"].as_str().unwrap_or_default().to_string()
}

#[rocket::async_test]
async fn liveness_needs_nothing() {
    let client = client().await;
    let response = client.get("/live").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body, json!({ "alive": true }));
}

#[rocket::async_test]
async fn unknown_route_is_json_404() {
    let client = client().await;
    let response = client.get("/api/nowhere").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(error_of(response).await, "Route /api/nowhere not found");
}

#[rocket::async_test]
async fn missing_and_bad_tokens_are_401() {
    let client = client().await;

    let response = client.get("/api/auth/me").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(error_of(response).await, "Missing authorization token");

    let response = client
        .get("/api/auth/me")
        .header(Header::new("Authorization", "Bearer not-a-jwt"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(error_of(response).await, "Invalid or expired token");
}

#[rocket::async_test]
async fn token_signed_with_another_secret_is_rejected() {
    let client = client().await;
    let user = User::new("intruder@example.com", String::new(), Role::SuperAdmin, None);
    let token = JwtKeys::new("other-secret", 1).create_token(&user).unwrap();
    let response = client
        .get("/api/admin/overview")
        .header(Header::new("Authorization", format!("Bearer {token}")))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[rocket::async_test]
async fn admin_routes_require_super_admin() {
    let client = client().await;
    let owner = bearer(Role::Owner, Some(ObjectId::new()));

    let response = client.get("/api/admin/overview").header(owner.clone()).dispatch().await;
    assert_eq!(response.status(), Status::Forbidden);
    assert_eq!(error_of(response).await, "Super admin access required");

    let response = client
        .post("/api/admin/salons")
        .header(owner)
        .header(ContentType::JSON)
        .body(r#"{"name":"X","slug":"x","ownerEmail":"o@x.io","ownerPassword":"secret1"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
}

#[rocket::async_test]
async fn reset_owner_password_enforces_minimum_length() {
    let client = client().await;
    let response = client
        .post(format!("/api/admin/salons/{}/reset-owner-password", ObjectId::new()))
        .header(bearer(Role::SuperAdmin, None))
        .header(ContentType::JSON)
        .body(r#"{"newPassword":"abc"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "newPassword (min 6 chars) is required");
}

#[rocket::async_test]
async fn public_listings_require_salon_id() {
    let client = client().await;

    let response = client.get("/api/services").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "salonId is required");

    let response = client.get("/api/staff/public?salonId=").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);

    let response = client.get("/api/services?salonId=abc").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "Invalid salonId");
}

#[rocket::async_test]
async fn public_booking_reports_first_missing_field() {
    let client = client().await;
    let body = json!({
        "salon_id": ObjectId::new().to_hex(),
        "staff_id": ObjectId::new().to_hex(),
        "service_id": ObjectId::new().to_hex(),
        "appointment_date": "2026-05-01",
    });
    let response = client
        .post("/api/appointments/public")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "customer_name is required");
}

#[rocket::async_test]
async fn public_booking_checks_date_format() {
    let client = client().await;
    let body = json!({
        "salon_id": ObjectId::new().to_hex(),
        "staff_id": ObjectId::new().to_hex(),
        "service_id": ObjectId::new().to_hex(),
        "customer_name": "Ada",
        "appointment_date": "01.05.2026",
        "appointment_time": "10:00",
    });
    let response = client
        .post("/api/appointments/public")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "appointment_date must be YYYY-MM-DD");
}

#[rocket::async_test]
async fn appointment_listing_needs_a_scope() {
    let client = client().await;
    let response = client
        .get("/api/appointments")
        .header(bearer(Role::Owner, Some(ObjectId::new())))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "salonId or staffId is required");
}

#[rocket::async_test]
async fn appointments_of_another_salon_are_forbidden() {
    let client = client().await;
    let response = client
        .get(format!("/api/appointments?salonId={}", ObjectId::new()))
        .header(bearer(Role::Owner, Some(ObjectId::new())))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
}

#[rocket::async_test]
async fn unread_count_needs_salon_and_role() {
    let client = client().await;
    let salon = ObjectId::new();
    let response = client
        .get(format!("/api/notifications/unread-count?salonId={salon}"))
        .header(bearer(Role::Owner, Some(salon)))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "salonId and role are required");
}

#[rocket::async_test]
async fn staff_cannot_manage_services_or_staff() {
    let client = client().await;
    let salon = ObjectId::new();
    let staff = bearer(Role::Staff, Some(salon));

    let response = client
        .post("/api/services")
        .header(staff.clone())
        .header(ContentType::JSON)
        .body(json!({ "salonId": salon.to_hex(), "name": "Cut", "price": 20.0, "duration": 30 }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
    assert_eq!(error_of(response).await, "Only the salon owner can do this");

    let response = client
        .post("/api/staff")
        .header(staff)
        .header(ContentType::JSON)
        .body(json!({ "email": "new@x.io", "password": "secret1", "salonId": salon.to_hex() }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
}

#[rocket::async_test]
async fn service_creation_lists_required_fields() {
    let client = client().await;
    let salon = ObjectId::new();
    let response = client
        .post("/api/services")
        .header(bearer(Role::Owner, Some(salon)))
        .header(ContentType::JSON)
        .body(json!({ "salonId": salon.to_hex(), "name": "Cut" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(
        error_of(response).await,
        "salonId, name, price, and duration are required"
    );
}

#[rocket::async_test]
async fn self_registration_is_for_owners_only() {
    let client = client().await;
    let response = client
        .post("/api/auth/register")
        .header(ContentType::JSON)
        .body(r#"{"email":"s@x.io","password":"secret1","role":"staff"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .post("/api/auth/login")
        .header(ContentType::JSON)
        .body(r#"{"email":"s@x.io"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "Email and password are required");
}

#[rocket::async_test]
async fn service_patch_rejects_negative_price_and_blank_name() {
    let client = client().await;
    let owner = bearer(Role::Owner, Some(ObjectId::new()));
    let url = format!("/api/services/{}", ObjectId::new());

    let response = client
        .patch(url.as_str())
        .header(owner.clone())
        .header(ContentType::JSON)
        .body(r#"{"price":-10}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "price must not be negative");

    let response = client
        .patch(url.as_str())
        .header(owner)
        .header(ContentType::JSON)
        .body(r#"{"name":"  ","duration":30}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "name must not be blank");
}

#[rocket::async_test]
async fn seeding_default_passwords_is_refused_outside_development() {
    let client = client_with(figment().merge(("environment", "production"))).await;
    let response = client.post("/api/seed/init").dispatch().await;
    assert_eq!(response.status(), Status::Forbidden);
    assert_eq!(
        error_of(response).await,
        "Seeding with default passwords is only allowed in development"
    );
}

#[rocket::async_test]
async fn push_subscription_requires_keys() {
    let client = client().await;
    let response = client
        .post("/api/push-subscriptions")
        .header(bearer(Role::Owner, Some(ObjectId::new())))
        .header(ContentType::JSON)
        .body(r#"{"endpoint":"https://push.example/abc"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "endpoint, p256dh, and auth are required");
}

#[rocket::async_test]
async fn preflight_gets_cors_headers() {
    let client = client().await;
    let response = client
        .options("/api/appointments/public")
        .header(Header::new("Origin", ORIGIN))
        .header(Header::new("Access-Control-Request-Method", "POST"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);
    let headers = response.headers();
    assert_eq!(headers.get_one("Access-Control-Allow-Origin"), Some(ORIGIN));
    assert_eq!(headers.get_one("Access-Control-Allow-Credentials"), Some("true"));
    assert_eq!(
        headers.get_one("Access-Control-Allow-Methods"),
        Some("GET, POST, PATCH, DELETE, OPTIONS")
    );
    assert!(headers.get_one("X-Request-Id").is_some());
}

#[rocket::async_test]
async fn unknown_origin_gets_configured_origin() {
    let client = client().await;
    let response = client
        .get("/live")
        .header(Header::new("Origin", "https://evil.example"))
        .dispatch()
        .await;
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some(ORIGIN)
    );
}
