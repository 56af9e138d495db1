//! Role and validation checks that reject a request before it reaches the
//! database.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;
use tower::ServiceExt;
use vm_api::auth::{AuthConfig, AuthMode, JwtAlgorithm};

const JWT_SECRET: &str = "integration-jwt-secret";

#[derive(Serialize)]
struct Claims<'a> {
    sub: &'a str,
    role: &'a str,
    exp: usize,
}

fn jwt_app() -> Router {
    let state = vm_api::test_state_with_auth(AuthConfig {
        mode: AuthMode::Jwt,
        api_key: None,
        jwt_secret: Some(JWT_SECRET.into()),
        jwt_public_key: None,
        jwt_algorithm: JwtAlgorithm::Hs256,
    });
    vm_api::create_router(state)
}

fn token(sub: &str, role: &str) -> String {
    let jwt = encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            sub,
            role,
            exp: 4_102_444_800,
        },
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {jwt}")
}

fn request(method: Method, uri: &str, bearer: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", bearer);
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn status(app: Router, req: Request<Body>) -> StatusCode {
    app.oneshot(req).await.unwrap().status()
}

#[tokio::test]
async fn volunteers_cannot_post_events() {
    let req = request(
        Method::POST,
        "/api/events",
        &token("vol-1", "volunteer"),
        Some(r#"{"title":"Beach Cleanup"}"#),
    );
    assert_eq!(status(jwt_app(), req).await, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn organizations_cannot_read_volunteer_feeds() {
    for uri in [
        "/api/me/notifications",
        "/api/me/upcoming-events",
        "/api/me/certificates",
    ] {
        let req = request(Method::GET, uri, &token("org-1", "organization"), None);
        assert_eq!(status(jwt_app(), req).await, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn volunteers_cannot_read_analytics_or_scan() {
    let analytics = request(
        Method::GET,
        "/api/me/analytics",
        &token("vol-1", "volunteer"),
        None,
    );
    assert_eq!(status(jwt_app(), analytics).await, StatusCode::FORBIDDEN);

    let scan = request(
        Method::POST,
        "/api/attendance/scan",
        &token("vol-1", "volunteer"),
        Some(r#"{"token":"abc"}"#),
    );
    assert_eq!(status(jwt_app(), scan).await, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn token_without_role_is_forbidden_on_me() {
    let req = request(Method::GET, "/api/me", &token("someone", "admin"), None);
    assert_eq!(status(jwt_app(), req).await, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_event_is_rejected_before_storage() {
    let req = request(
        Method::POST,
        "/api/events",
        &token("org-1", "organization"),
        Some(r#"{"title":"Food Drive","volunteers_needed":0}"#),
    );
    assert_eq!(status(jwt_app(), req).await, StatusCode::BAD_REQUEST);

    let bad_slot = request(
        Method::POST,
        "/api/events",
        &token("org-1", "organization"),
        Some(r#"{"title":"Food Drive","time_slot":"whenever"}"#),
    );
    assert_eq!(status(jwt_app(), bad_slot).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_profile_and_search_are_rejected() {
    let profile = request(
        Method::POST,
        "/api/volunteers",
        &token("vol-1", "volunteer"),
        Some(r#"{"name":"Asha","email":"not-an-email"}"#),
    );
    assert_eq!(status(jwt_app(), profile).await, StatusCode::BAD_REQUEST);

    let search = request(
        Method::GET,
        "/api/search?q=%20%20",
        &token("vol-1", "volunteer"),
        None,
    );
    assert_eq!(status(jwt_app(), search).await, StatusCode::BAD_REQUEST);

    let page = request(
        Method::GET,
        "/api/me/notifications?limit=0",
        &token("vol-1", "volunteer"),
        None,
    );
    assert_eq!(status(jwt_app(), page).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tampered_scan_token_is_rejected() {
    let req = request(
        Method::POST,
        "/api/attendance/scan",
        &token("org-1", "organization"),
        Some(r#"{"token":"not.a.jwt"}"#),
    );
    assert_eq!(status(jwt_app(), req).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn schedule_request_without_interests_is_rejected() {
    let req = request(
        Method::POST,
        "/api/schedule/suggest",
        &token("org-1", "organization"),
        Some(r#"{"event_name":"Tree Planting","interests":[],"volunteers_needed":2}"#),
    );
    assert_eq!(status(jwt_app(), req).await, StatusCode::BAD_REQUEST);
}
