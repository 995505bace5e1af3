//! Domain DTOs for the TripTalk APIs.
//!
//! # Design
//! Request payloads serialize exactly as the backends expect (camelCase for
//! the business API, snake_case for the AI planner). Records read from the
//! server are first decoded into loose wire shapes (see `normalize`) and only
//! the canonical types below leave the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access/refresh token pair. This is also the persisted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signup input accumulated across the three signup steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupData {
    pub email: String,
    pub password: String,
    pub nick_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request payload for the AI planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelPlanRequest {
    pub companions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure: Option<String>,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub style: Vec<String>,
    pub budget: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub message: String,
}

/// Uniform response wrapper of the business API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub is_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

/// One page of a cursor-paginated list.
///
/// `next_cursor_id` is always `None` when `has_next` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor_id: Option<i64>,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor_id: Option<i64>, has_next: bool) -> Self {
        Self {
            items,
            next_cursor_id: if has_next { next_cursor_id } else { None },
            has_next,
        }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None, false)
    }
}

/// Theme filter for trip places. "All" is expressed as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Theme {
    Nature,
    Sea,
    Culture,
    Healing,
    History,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Nature,
        Theme::Sea,
        Theme::Culture,
        Theme::Healing,
        Theme::History,
    ];

    pub fn as_query(self) -> &'static str {
        match self {
            Theme::Nature => "NATURE",
            Theme::Sea => "SEA",
            Theme::Culture => "CULTURE",
            Theme::Healing => "HEALING",
            Theme::History => "HISTORY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Nature => "자연",
            Theme::Sea => "바다",
            Theme::Culture => "문화",
            Theme::Healing => "힐링",
            Theme::History => "역사",
        }
    }

    /// Accepts either the query value or the display label.
    pub fn parse(s: &str) -> Option<Theme> {
        let s = s.trim();
        Theme::ALL
            .into_iter()
            .find(|t| t.as_query().eq_ignore_ascii_case(s) || t.label() == s)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a saved plan is still upcoming or already travelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripPlanStatus {
    #[default]
    Planned,
    Traveled,
}

impl TripPlanStatus {
    pub fn as_query(self) -> &'static str {
        match self {
            TripPlanStatus::Planned => "PLANNED",
            TripPlanStatus::Traveled => "TRAVELED",
        }
    }

    pub fn parse(s: &str) -> Option<TripPlanStatus> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLANNED" => Some(TripPlanStatus::Planned),
            "TRAVELED" | "TRAVELLED" | "COMPLETED" => Some(TripPlanStatus::Traveled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPlace {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub themes: Vec<Theme>,
    pub view_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub id: i64,
    pub airline: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub price: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accommodation {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub price_per_night: Option<u64>,
    pub rating: Option<f64>,
}

/// A transport leg booked inside a saved plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transportation {
    pub name: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub price: Option<u64>,
}

/// A stay booked inside a saved plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedStay {
    pub name: String,
    pub address: Option<String>,
    pub price_per_night: Option<u64>,
}

/// One stop of a day's itinerary. `time` is `HH:MM` when the server sent one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub time: Option<String>,
    pub title: String,
    pub description: Option<String>,
}

/// A day of a saved plan, stops in visiting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day: u32,
    pub date: Option<String>,
    pub schedules: Vec<ScheduleItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTripPlan {
    pub id: i64,
    pub title: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub image_url: Option<String>,
    pub budget: Option<String>,
    pub status: TripPlanStatus,
    pub transportations: Vec<Transportation>,
    pub accommodations: Vec<PlannedStay>,
    pub days: Vec<DaySchedule>,
}

impl SavedTripPlan {
    /// Digits of the free-text budget, e.g. "1,500,000원" -> 1500000.
    pub fn budget_amount(&self) -> Option<u64> {
        let digits: String = self
            .budget
            .as_deref()?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }
}

/// Itinerary text produced by the AI planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub plan: String,
}

/// Planner answer to a follow-up chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReply {
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}
