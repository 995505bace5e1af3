//! In-memory stand-in for the two TripTalk backends.
//!
//! One router serves both the business API (`/api/...`) and the AI planner
//! (`/travel-plan`, `/feedback`, `/reset-chat`, `/`). Business responses use
//! the `{isSuccess, code, message, result}` envelope; the planner answers
//! with bare payloads. Catalog records deliberately mix field-name variants
//! (`hotelName` vs `name`, `price` vs `pricePerNight`, ...) so clients have
//! to normalize them.

mod auth;
mod catalog;
mod planner;
mod plans;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub use plans::TripPlan;

/// Knobs for tests that need a misbehaving backend.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Delay before the planner answers `/travel-plan` and `/feedback`.
    pub planner_delay: Duration,
}

#[derive(Debug, Clone)]
pub(crate) struct User {
    pub password: String,
    pub nick_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatTurn {
    pub role: &'static str,
    pub text: String,
}

#[derive(Debug, Default)]
pub(crate) struct Db {
    pub users: HashMap<String, User>,
    /// access token -> email
    pub access: HashMap<String, String>,
    /// refresh token -> email
    pub refresh: HashMap<String, String>,
    pub places: Vec<Value>,
    pub flights: Vec<Value>,
    pub accommodations: Vec<Value>,
    /// email -> saved plans
    pub plans: HashMap<String, Vec<TripPlan>>,
    pub next_plan_id: i64,
    pub chat: Vec<ChatTurn>,
}

impl Db {
    fn seeded() -> Self {
        Self {
            places: catalog::seed_places(),
            flights: catalog::seed_flights(),
            accommodations: catalog::seed_accommodations(),
            next_plan_id: 1,
            ..Self::default()
        }
    }

    /// Email of the user the bearer token belongs to.
    pub fn user_for(&self, headers: &HeaderMap) -> Option<String> {
        self.access.get(bearer(headers)?).cloned()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub(crate) db: Arc<RwLock<Db>>,
    pub(crate) config: Arc<MockConfig>,
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Db::seeded())),
        config: Arc::new(config),
    };
    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/trip-places", get(catalog::trip_places))
        .route("/api/flights", get(catalog::flights))
        .route("/api/accommodations", get(catalog::accommodations))
        .route("/api/trip-plans", get(plans::list))
        .route("/api/trip-plans/{id}", get(plans::detail))
        .route("/api/trip-plans/{id}/completed", patch(plans::toggle_completed))
        .route("/debug/expire-tokens", post(auth::expire_tokens))
        .route("/travel-plan", post(planner::travel_plan))
        .route("/feedback", post(planner::feedback))
        .route("/reset-chat", post(planner::reset_chat))
        .route("/", get(planner::health))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

pub(crate) fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub(crate) fn success(result: impl Serialize) -> Response {
    Json(json!({
        "isSuccess": true,
        "code": "COMMON200",
        "message": "성공입니다.",
        "result": result,
    }))
    .into_response()
}

pub(crate) fn failure(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "isSuccess": false,
            "code": code,
            "message": message,
        })),
    )
        .into_response()
}

pub(crate) fn unauthorized() -> Response {
    failure(
        StatusCode::UNAUTHORIZED,
        "AUTH_TOKEN_INVALID",
        "유효하지 않은 토큰입니다.",
    )
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc"));
        assert_eq!(bearer(&headers), None);
    }

    #[test]
    fn seeded_catalog_is_not_empty() {
        let db = Db::seeded();
        assert!(db.places.len() > 10);
        assert!(!db.flights.is_empty());
        assert!(!db.accommodations.is_empty());
        assert!(db.users.is_empty());
    }
}
