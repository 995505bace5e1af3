//! AI planner endpoints. Replies are deterministic text built from the
//! request, wrapped in bare `{plan}` / `{reply}` objects.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{AppState, ChatTurn};

#[derive(Debug, Deserialize)]
pub struct TravelInput {
    pub companions: String,
    #[serde(default)]
    pub departure: Option<String>,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub style: Vec<String>,
    pub budget: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackInput {
    pub message: String,
}

pub(crate) fn render_plan(input: &TravelInput) -> String {
    let mut plan = format!(
        "[{}] {} ~ {} 여행 계획\n동행: {}\n예산: {}",
        input.destination, input.start_date, input.end_date, input.companions, input.budget
    );
    if let Some(departure) = input.departure.as_deref().filter(|d| !d.is_empty()) {
        plan.push_str(&format!("\n출발: {departure}"));
    }
    if !input.style.is_empty() {
        plan.push_str(&format!("\n스타일: {}", input.style.join(", ")));
    }
    plan.push_str(&format!(
        "\n1일차: {} 도착 후 시내 산책\n2일차: 현지 맛집 탐방",
        input.destination
    ));
    plan
}

async fn planner_delay(state: &AppState) {
    if !state.config.planner_delay.is_zero() {
        tokio::time::sleep(state.config.planner_delay).await;
    }
}

pub async fn travel_plan(
    State(state): State<AppState>,
    Json(input): Json<TravelInput>,
) -> Json<Value> {
    planner_delay(&state).await;
    let plan = render_plan(&input);
    info!(destination = %input.destination, "plan generated");
    let mut db = state.db.write().await;
    db.chat = vec![ChatTurn {
        role: "model",
        text: plan.clone(),
    }];
    Json(json!({ "plan": plan }))
}

pub async fn feedback(
    State(state): State<AppState>,
    Json(input): Json<FeedbackInput>,
) -> Json<Value> {
    planner_delay(&state).await;
    let mut db = state.db.write().await;
    db.chat.push(ChatTurn {
        role: "user",
        text: input.message.clone(),
    });
    let reply = format!(
        "요청하신 \"{}\" 내용을 반영했어요. (대화 {}번째)",
        input.message,
        db.chat.len()
    );
    db.chat.push(ChatTurn {
        role: "model",
        text: reply.clone(),
    });
    Json(json!({ "reply": reply }))
}

pub async fn reset_chat(State(state): State<AppState>) -> impl IntoResponse {
    state.db.write().await.chat.clear();
    Json(json!({ "message": "대화 기록이 초기화되었습니다." }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "TripTalk AI API is running!" }))
}
