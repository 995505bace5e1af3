use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, TripPlan};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

fn authed(method: &str, uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

/// The router shares its state across clones, so a flow can be driven with
/// one `oneshot` per step.
async fn send(app: &Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn signup_and_login(app: &Router, email: &str, nick: &str) -> (String, String) {
    let body = format!(r#"{{"email":"{email}","password":"password1","nickName":"{nick}"}}"#);
    let resp = send(app, json_request("POST", "/api/auth/signup", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = format!(r#"{{"email":"{email}","password":"password1"}}"#);
    let resp = send(app, json_request("POST", "/api/auth/login", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = body_json(resp).await;
    (
        json["result"]["accessToken"].as_str().unwrap().to_string(),
        json["result"]["refreshToken"].as_str().unwrap().to_string(),
    )
}

// --- auth ---

#[tokio::test]
async fn duplicate_email_is_rejected_with_code() {
    let app = app();
    signup_and_login(&app, "a@triptalk.app", "여행자").await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/auth/signup",
            r#"{"email":"a@triptalk.app","password":"password1","nickName":"다른이름"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let json: Value = body_json(resp).await;
    assert_eq!(json["isSuccess"], false);
    assert_eq!(json["code"], "MEMBER_EMAIL_DUPLICATE");
}

#[tokio::test]
async fn duplicate_nickname_is_rejected_with_code() {
    let app = app();
    signup_and_login(&app, "a@triptalk.app", "여행자").await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/auth/signup",
            r#"{"email":"b@triptalk.app","password":"password1","nickName":"여행자"}"#,
        ),
    )
    .await;
    let json: Value = body_json(resp).await;
    assert_eq!(json["code"], "MEMBER_NICKNAME_DUPLICATE");
    assert!(json["message"].as_str().unwrap().contains("닉네임"));
}

#[tokio::test]
async fn wrong_password_is_not_a_401() {
    let app = app();
    signup_and_login(&app, "a@triptalk.app", "여행자").await;
    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            r#"{"email":"a@triptalk.app","password":"nope"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json: Value = body_json(resp).await;
    assert_eq!(json["isSuccess"], false);
}

#[tokio::test]
async fn signup_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/auth/signup", r#"{"email":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn refresh_rotates_the_pair() {
    let app = app();
    let (_, refresh) = signup_and_login(&app, "a@triptalk.app", "여행자").await;

    let body = format!(r#"{{"refreshToken":"{refresh}"}}"#);
    let resp = send(&app, json_request("POST", "/api/auth/refresh", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = body_json(resp).await;
    assert_ne!(json["result"]["refreshToken"], refresh.as_str());

    let resp = send(&app, json_request("POST", "/api/auth/refresh", &body)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_tokens() {
    let app = app();
    let (access, _) = signup_and_login(&app, "a@triptalk.app", "여행자").await;

    let resp = send(&app, authed("POST", "/api/auth/logout", &access)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, get("/api/trip-plans", Some(&access))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_access_token_still_refreshes() {
    let app = app();
    let (access, refresh) = signup_and_login(&app, "a@triptalk.app", "여행자").await;

    let resp = send(&app, json_request("POST", "/debug/expire-tokens", "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, get("/api/trip-plans", Some(&access))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body = format!(r#"{{"refreshToken":"{refresh}"}}"#);
    let resp = send(&app, json_request("POST", "/api/auth/refresh", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- catalog ---

#[tokio::test]
async fn first_page_of_places() {
    let resp = app()
        .oneshot(get("/api/trip-places?size=5", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = body_json(resp).await;
    let result = &json["result"];
    assert_eq!(result["list"].as_array().unwrap().len(), 5);
    assert_eq!(result["hasNext"], true);
    assert_eq!(result["nextCursorId"], 5);
}

#[tokio::test]
async fn theme_filter_and_cursor() {
    let app = app();
    let resp = send(&app, get("/api/trip-places?theme=SEA&size=2", None)).await;
    let json: Value = body_json(resp).await;
    let list = json["result"]["list"].as_array().unwrap().clone();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|p| p["themes"][0] == "SEA"));
    let cursor = json["result"]["nextCursorId"].as_i64().unwrap();

    let resp = send(
        &app,
        get(&format!("/api/trip-places?theme=SEA&cursorId={cursor}&size=50"), None),
    )
    .await;
    let json: Value = body_json(resp).await;
    assert_eq!(json["result"]["hasNext"], false);
    assert!(json["result"]["nextCursorId"].is_null());
}

#[tokio::test]
async fn unknown_bearer_on_list_is_401() {
    let resp = app()
        .oneshot(get("/api/flights", Some("stale-token")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn accommodations_mix_field_names() {
    let resp = app()
        .oneshot(get("/api/accommodations?size=4", None))
        .await
        .unwrap();
    let json: Value = body_json(resp).await;
    let list = json["result"]["list"].as_array().unwrap().clone();
    assert!(list.iter().any(|a| a.get("hotelName").is_some()));
    assert!(list.iter().any(|a| a.get("hotelName").is_none() && a.get("name").is_some()));
}

// --- trip plans ---

#[tokio::test]
async fn trip_plans_require_login() {
    let resp = app()
        .oneshot(get("/api/trip-plans?status=PLANNED", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn toggle_moves_plan_between_tabs() {
    let app = app();
    let (access, _) = signup_and_login(&app, "a@triptalk.app", "여행자").await;

    let resp = send(&app, get("/api/trip-plans?status=PLANNED", Some(&access))).await;
    let json: Value = body_json(resp).await;
    let planned: Vec<TripPlan> =
        serde_json::from_value(json["result"]["tripPlanList"].clone()).unwrap();
    assert_eq!(planned.len(), 1);
    let id = planned[0].trip_plan_id;

    let resp = send(
        &app,
        authed("PATCH", &format!("/api/trip-plans/{id}/completed"), &access),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, get("/api/trip-plans?status=TRAVELED", Some(&access))).await;
    let json: Value = body_json(resp).await;
    assert_eq!(json["result"]["tripPlanList"].as_array().unwrap().len(), 2);

    let resp = send(&app, get(&format!("/api/trip-plans/{id}"), Some(&access))).await;
    let json: Value = body_json(resp).await;
    assert_eq!(json["result"]["status"], "TRAVELED");
    assert_eq!(json["result"]["dailySchedules"][0]["schedules"][0]["orderIndex"], 2);
}

#[tokio::test]
async fn foreign_plan_is_not_found() {
    let app = app();
    let (a, _) = signup_and_login(&app, "a@triptalk.app", "가").await;
    let (b, _) = signup_and_login(&app, "b@triptalk.app", "나").await;

    let resp = send(&app, get("/api/trip-plans", Some(&a))).await;
    let json: Value = body_json(resp).await;
    let id = json["result"]["tripPlanList"][0]["tripPlanId"].as_i64().unwrap();

    let resp = send(&app, get(&format!("/api/trip-plans/{id}"), Some(&b))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- planner ---

#[tokio::test]
async fn planner_returns_bare_plan() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/travel-plan",
            r#"{"companions":"가족","destination":"부산","start_date":"2025-07-01","end_date":"2025-07-03","style":["맛집"],"budget":"100만원"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = body_json(resp).await;
    assert!(json.get("isSuccess").is_none());
    assert!(json["plan"].as_str().unwrap().contains("부산"));
}

#[tokio::test]
async fn feedback_history_resets() {
    let app = app();
    let resp = send(&app, json_request("POST", "/feedback", r#"{"message":"바다 위주로"}"#)).await;
    let json: Value = body_json(resp).await;
    assert!(json["reply"].as_str().unwrap().contains("1번째"));

    let resp = send(&app, json_request("POST", "/reset-chat", "")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, json_request("POST", "/feedback", r#"{"message":"다시"}"#)).await;
    let json: Value = body_json(resp).await;
    assert!(json["reply"].as_str().unwrap().contains("1번째"));
}

#[tokio::test]
async fn health_check() {
    let resp = app().oneshot(get("/", None)).await.unwrap();
    let json: Value = body_json(resp).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn unknown_route_is_empty_404() {
    let resp = app().oneshot(get("/api/nope", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(resp).await.is_empty());
}
