use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::{failure, success, unauthorized, AppState, Db};

/// A saved trip plan as the business API serializes it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPlan {
    pub trip_plan_id: i64,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub budget: Value,
    pub status: String,
    pub transportations: Vec<Value>,
    pub accommodations: Vec<Value>,
    pub daily_schedules: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// Two plans every new account starts with: one upcoming, one travelled.
pub(crate) fn seed_for(db: &mut Db) -> Vec<TripPlan> {
    let first = db.next_plan_id;
    db.next_plan_id += 2;
    vec![
        TripPlan {
            trip_plan_id: first,
            title: "제주도 2박 3일".to_string(),
            start_date: "2025-07-01".to_string(),
            end_date: "2025-07-03".to_string(),
            budget: json!(800_000),
            status: "PLANNED".to_string(),
            transportations: vec![json!({
                "airline": "대한항공",
                "origin": "GMP",
                "destination": "CJU",
                "price": 89_000,
            })],
            accommodations: vec![json!({
                "hotelName": "신라호텔 제주",
                "pricePerNight": 320_000,
            })],
            daily_schedules: vec![json!({
                "day": 1,
                "date": "2025-07-01",
                "schedules": [
                    {"orderIndex": 2, "time": "13:00:00", "title": "성산일출봉", "description": "등반 후 해녀의 집 점심"},
                    {"orderIndex": 1, "time": "10:00:00", "title": "제주공항 도착"},
                ],
            })],
        },
        TripPlan {
            trip_plan_id: first + 1,
            title: "부산 당일치기".to_string(),
            start_date: "2025-03-15".to_string(),
            end_date: "2025-03-15".to_string(),
            budget: json!("150,000원"),
            status: "TRAVELED".to_string(),
            transportations: vec![json!({
                "name": "KTX",
                "origin": "서울역",
                "destination": "부산역",
                "price": "59800",
            })],
            accommodations: Vec::new(),
            daily_schedules: Vec::new(),
        },
    ]
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatusQuery>,
) -> Response {
    let db = state.db.read().await;
    let Some(email) = db.user_for(&headers) else {
        return unauthorized();
    };
    let wanted = query.status.map(|s| s.to_ascii_uppercase());
    let plans: Vec<&TripPlan> = db
        .plans
        .get(&email)
        .into_iter()
        .flatten()
        .filter(|p| wanted.as_deref().is_none_or(|s| p.status == s))
        .collect();
    success(json!({ "tripPlanList": plans }))
}

pub async fn detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let db = state.db.read().await;
    let Some(email) = db.user_for(&headers) else {
        return unauthorized();
    };
    match db
        .plans
        .get(&email)
        .and_then(|plans| plans.iter().find(|p| p.trip_plan_id == id))
    {
        Some(plan) => success(plan),
        None => not_found(),
    }
}

pub async fn toggle_completed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut db = state.db.write().await;
    let Some(email) = db.user_for(&headers) else {
        return unauthorized();
    };
    let Some(plan) = db
        .plans
        .get_mut(&email)
        .and_then(|plans| plans.iter_mut().find(|p| p.trip_plan_id == id))
    else {
        return not_found();
    };
    plan.status = if plan.status == "PLANNED" {
        "TRAVELED".to_string()
    } else {
        "PLANNED".to_string()
    };
    info!(id, status = %plan.status, "trip plan toggled");
    success(json!({ "tripPlanId": id, "status": plan.status }))
}

fn not_found() -> Response {
    failure(
        StatusCode::NOT_FOUND,
        "TRIP_PLAN_NOT_FOUND",
        "여행 계획을 찾을 수 없습니다.",
    )
}
