use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use fitroom_common::traits::auth_traits::SessionResolver;
use fitroom_core::test_utils::fixtures::{avatar, sample_png, score_json, TestHarness, OTHER_USER, USER};
use fitroom_core::Error;

use super::{router, AppState};

const TOKEN: &str = "token-1";
const OTHER_TOKEN: &str = "token-2";

struct StaticSessions(HashMap<String, String>);

#[async_trait]
impl SessionResolver for StaticSessions {
    async fn resolve_user(&self, token: &str) -> Result<Option<String>, Error> {
        Ok(self.0.get(token).cloned())
    }
}

fn app(h: &TestHarness) -> Router {
    let sessions = StaticSessions(HashMap::from([
        (TOKEN.to_string(), USER.to_string()),
        (OTHER_TOKEN.to_string(), OTHER_USER.to_string()),
    ]));
    router(AppState {
        service: h.service.clone(),
        sessions: Arc::new(sessions),
    })
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    request_as(TOKEN, method, uri, body)
}

fn request_as(token: &str, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn create(app: &Router, garments: &[&str], occasion: &str) -> (StatusCode, Value) {
    let body = json!({ "avatarId": "A1", "garmentIds": garments, "occasion": occasion });
    send(app, request("POST", "/api/outfits", Some(body))).await
}

#[tokio::test]
async fn rejects_missing_or_unknown_token() {
    let h = TestHarness::new();
    let app = app(&h);

    let anonymous = Request::builder().uri("/api/outfits?avatarId=A1").body(Body::empty()).unwrap();
    let (status, body) = send(&app, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "ok": false, "error": "Unauthorized" }));

    let forged = Request::builder()
        .uri("/api/outfits?avatarId=A1")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_is_idempotent_over_http() {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let app = app(&h);

    let (status, first) = create(&app, &["G1", "G2"], "work").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["ok"], true);
    assert_eq!(first["cached"], false);

    let (_, second) = create(&app, &["G2", "G1"], "Work").await;
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["cached"], true);
}

#[tokio::test]
async fn create_maps_request_errors() {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let app = app(&h);

    let (status, body) = create(&app, &["G1", "G9"], "work").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["missingGarmentIds"], json!(["G9"]));

    let (status, _) = create(&app, &[], "work").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({ "avatarId": "A7", "garmentIds": ["G1"], "occasion": "work" });
    let (status, body) = send(&app, request("POST", "/api/outfits", Some(body))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);

    let (status, _) = send(&app, request("GET", "/api/outfits/missing", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn score_tryon_and_detail_round_trip() {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let app = app(&h);
    let (_, created) = create(&app, &["G1", "G2"], "work").await;
    let id = created["id"].as_str().unwrap().to_string();

    h.transport.push_text(score_json(79));
    let (status, scored) = send(&app, request("POST", &format!("/api/outfits/{id}/score"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scored["score"]["status"], "succeeded");
    assert_eq!(scored["score"]["score"]["scores"]["overall"], 79);

    h.transport.push_image(sample_png(10, 20), "image/png");
    let (status, tried) = send(&app, request("POST", &format!("/api/outfits/{id}/tryon"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tried["tryon"]["status"], "succeeded");
    let image_url = tried["tryon"]["imageUrl"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/api/storage/object?key=tryons%2F"));

    let (status, detail) = send(&app, request("GET", &format!("/api/outfits/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["outfit"]["occasion"], "work");
    assert_eq!(detail["outfit"]["garments"][0]["id"], "G1");
    assert_eq!(detail["outfit"]["garments"][0]["thumbnailUrl"], "/api/storage/object?key=garments%2FG1.png");
    assert_eq!(detail["outfit"]["tryon"]["imageUrl"], image_url.as_str());

    let response = app.clone().oneshot(request("GET", &image_url, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
}

#[tokio::test]
async fn lists_single_and_grouped() {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let app = app(&h);
    create(&app, &["G1"], "work").await;
    create(&app, &["G2"], "date").await;

    let (status, single) = send(&app, request("GET", "/api/outfits?avatarId=A1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(single["outfits"].as_array().map(Vec::len), Some(2));

    let (_, grouped) = send(&app, request("GET", "/api/outfits?avatarIds=A1,A2", None)).await;
    assert_eq!(grouped["groups"][0]["avatarId"], "A1");
    assert_eq!(grouped["groups"][0]["outfits"].as_array().map(Vec::len), Some(2));
    assert_eq!(grouped["groups"][1]["outfits"], json!([]));

    let (status, _) = send(&app, request("GET", "/api/outfits", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analysis_outcomes_map_to_status_codes() {
    let h = TestHarness::new();
    h.seed_wardrobe();
    let app = app(&h);

    h.transport.push_text(
        json!({ "success": false, "error": { "code": "MULTIPLE_PEOPLE", "message": "Two people" } }).to_string(),
    );
    let (status, body) = send(&app, request("POST", "/api/avatars/A1/analyze", None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "MULTIPLE_PEOPLE");

    h.transport.push_text("not json at all");
    h.transport.push_text("still not json");
    let (status, body) = send(&app, request("POST", "/api/avatars/A1/analyze", None)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "AI_PARSE_ERROR");
}

#[tokio::test]
async fn storage_rejects_unknown_and_missing_keys() {
    let h = TestHarness::new();
    let app = app(&h);

    let (status, _) = send(&app, request("GET", "/api/storage/object?key=tryons/none.jpg", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, request("GET", "/api/storage/object", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn storage_only_serves_the_callers_objects() {
    let h = TestHarness::new();
    h.seed_wardrobe();
    h.blobs.insert("avatars/B1.png", sample_png(8, 8), "image/png");
    h.store.insert_avatar(avatar(OTHER_USER, "B1", Some("avatars/B1.png"), None));
    let app = app(&h);

    let own = app.clone().oneshot(request("GET", "/api/storage/object?key=avatars%2FA1.png", None)).await.unwrap();
    assert_eq!(own.status(), StatusCode::OK);
    assert_eq!(own.headers()[header::CONTENT_TYPE], "image/png");

    let (status, body) = send(&app, request_as(OTHER_TOKEN, "GET", "/api/storage/object?key=avatars/A1.png", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);

    let (status, _) = send(&app, request_as(OTHER_TOKEN, "GET", "/api/storage/object?key=garments/G1.png", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, request("GET", "/api/storage/object?key=avatars/B1.png", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let theirs = app.oneshot(request_as(OTHER_TOKEN, "GET", "/api/storage/object?key=avatars/B1.png", None)).await.unwrap();
    assert_eq!(theirs.status(), StatusCode::OK);
}

#[test]
fn object_urls_encode_the_key() {
    assert_eq!(super::object_url("tryons/a b.jpg"), "/api/storage/object?key=tryons%2Fa%20b.jpg");
}
