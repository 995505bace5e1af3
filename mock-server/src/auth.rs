use axum::{extract::State, http::HeaderMap, http::StatusCode, response::Response, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{failure, plans, success, unauthorized, AppState, Db, User};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub nick_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshInput {
    pub refresh_token: String,
}

fn issue_tokens(db: &mut Db, email: &str) -> serde_json::Value {
    let access = Uuid::new_v4().to_string();
    let refresh = Uuid::new_v4().to_string();
    db.access.insert(access.clone(), email.to_string());
    db.refresh.insert(refresh.clone(), email.to_string());
    json!({ "accessToken": access, "refreshToken": refresh })
}

pub async fn signup(State(state): State<AppState>, Json(input): Json<SignupInput>) -> Response {
    let mut db = state.db.write().await;
    if db.users.contains_key(&input.email) {
        return failure(
            StatusCode::CONFLICT,
            "MEMBER_EMAIL_DUPLICATE",
            "이미 사용 중인 이메일입니다.",
        );
    }
    if db.users.values().any(|u| u.nick_name == input.nick_name) {
        return failure(
            StatusCode::CONFLICT,
            "MEMBER_NICKNAME_DUPLICATE",
            "이미 사용 중인 닉네임입니다.",
        );
    }
    if input.password.chars().count() < 8 {
        return failure(
            StatusCode::BAD_REQUEST,
            "MEMBER_PASSWORD_INVALID",
            "비밀번호는 8자 이상이어야 합니다.",
        );
    }

    info!(email = %input.email, "signup");
    let seeded = plans::seed_for(&mut db);
    db.plans.insert(input.email.clone(), seeded);
    db.users.insert(
        input.email,
        User {
            password: input.password,
            nick_name: input.nick_name,
        },
    );
    success(serde_json::Value::Null)
}

pub async fn login(State(state): State<AppState>, Json(input): Json<LoginInput>) -> Response {
    let mut db = state.db.write().await;
    let valid = db
        .users
        .get(&input.email)
        .is_some_and(|u| u.password == input.password);
    if !valid {
        return failure(
            StatusCode::BAD_REQUEST,
            "AUTH_INVALID_CREDENTIALS",
            "이메일 또는 비밀번호가 일치하지 않습니다.",
        );
    }
    info!(email = %input.email, "login");
    let tokens = issue_tokens(&mut db, &input.email);
    success(tokens)
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut db = state.db.write().await;
    let Some(email) = db.user_for(&headers) else {
        return unauthorized();
    };
    db.access.retain(|_, owner| *owner != email);
    db.refresh.retain(|_, owner| *owner != email);
    info!(%email, "logout");
    success(serde_json::Value::Null)
}

/// Rotates the pair: the presented refresh token stops working.
pub async fn refresh(State(state): State<AppState>, Json(input): Json<RefreshInput>) -> Response {
    let mut db = state.db.write().await;
    let Some(email) = db.refresh.remove(&input.refresh_token) else {
        return failure(
            StatusCode::UNAUTHORIZED,
            "AUTH_REFRESH_TOKEN_INVALID",
            "다시 로그인해 주세요.",
        );
    };
    info!(%email, "token refresh");
    let tokens = issue_tokens(&mut db, &email);
    success(tokens)
}

/// Invalidate every access token while keeping refresh tokens valid, so
/// clients can be driven through the refresh path.
pub async fn expire_tokens(State(state): State<AppState>) -> Response {
    let mut db = state.db.write().await;
    let expired = db.access.len();
    db.access.clear();
    info!(expired, "access tokens expired");
    success(json!({ "expired": expired }))
}
