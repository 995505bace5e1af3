//! Stateless HTTP request builder and response parser for the TripTalk APIs.
//!
//! # Design
//! `TripClient` holds the two base URLs (business API and AI planner) and the
//! per-class wait budgets, and carries no mutable state between calls. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. Executing the
//! round-trip is left to a `Transport` or to the host behind the C ABI.
//!
//! Every business response is an envelope `{isSuccess, code?, message?,
//! result?}`; `isSuccess: false` becomes `ApiError::Rejected` regardless of
//! the HTTP status. The AI planner may also answer with a bare payload.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, DEFAULT_TIMEOUT, GENERATION_TIMEOUT};
use crate::normalize::{
    CursorPage, Normalize, RawAccommodation, RawFlight, RawTripPlace, RawTripPlan, TripPlanList,
};
use crate::types::{
    Accommodation, AuthTokens, FeedbackReply, FeedbackRequest, Flight, GeneratedPlan, HealthStatus,
    LoginRequest, Page, RefreshRequest, SavedTripPlan, SignupData, Theme, TravelPlanRequest,
    TripPlace, TripPlanStatus,
};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Synchronous, stateless client for the TripTalk APIs.
#[derive(Debug, Clone)]
pub struct TripClient {
    api_base_url: String,
    ai_base_url: String,
    default_timeout: Duration,
    generation_timeout: Duration,
    page_size: u32,
}

impl TripClient {
    pub fn new(api_base_url: &str, ai_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            ai_base_url: ai_base_url.trim_end_matches('/').to_string(),
            default_timeout: DEFAULT_TIMEOUT,
            generation_timeout: GENERATION_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            default_timeout: config.default_timeout,
            generation_timeout: config.generation_timeout,
            ..Self::new(&config.api_base_url, &config.ai_base_url)
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn ai_base_url(&self) -> &str {
        &self.ai_base_url
    }

    fn api(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{path}", self.api_base_url)).timeout(self.default_timeout)
    }

    fn ai(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{path}", self.ai_base_url))
            .timeout(self.generation_timeout)
    }

    // --- auth ---

    pub fn build_signup(&self, input: &SignupData) -> Result<HttpRequest, ApiError> {
        Ok(self
            .api(HttpMethod::Post, "/api/auth/signup")
            .json_body(to_json(input)?))
    }

    pub fn build_login(&self, email: &str, password: &str) -> Result<HttpRequest, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        Ok(self
            .api(HttpMethod::Post, "/api/auth/login")
            .json_body(to_json(&body)?))
    }

    pub fn build_logout(&self, access_token: &str) -> HttpRequest {
        self.api(HttpMethod::Post, "/api/auth/logout")
            .bearer(Some(access_token))
    }

    pub fn build_refresh(&self, refresh_token: &str) -> Result<HttpRequest, ApiError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        Ok(self
            .api(HttpMethod::Post, "/api/auth/refresh")
            .json_body(to_json(&body)?))
    }

    // --- paginated lists ---

    pub fn build_trip_places(
        &self,
        theme: Option<Theme>,
        cursor: Option<i64>,
        access_token: Option<&str>,
    ) -> HttpRequest {
        let query = query_string(&[
            ("theme", theme.map(|t| t.as_query().to_string())),
            ("cursorId", cursor.map(|c| c.to_string())),
            ("size", Some(self.page_size.to_string())),
        ]);
        self.api(HttpMethod::Get, &format!("/api/trip-places{query}"))
            .bearer(access_token)
    }

    pub fn build_flights(&self, cursor: Option<i64>, access_token: Option<&str>) -> HttpRequest {
        let query = query_string(&[
            ("cursorId", cursor.map(|c| c.to_string())),
            ("size", Some(self.page_size.to_string())),
        ]);
        self.api(HttpMethod::Get, &format!("/api/flights{query}"))
            .bearer(access_token)
    }

    pub fn build_accommodations(
        &self,
        cursor: Option<i64>,
        access_token: Option<&str>,
    ) -> HttpRequest {
        let query = query_string(&[
            ("cursorId", cursor.map(|c| c.to_string())),
            ("size", Some(self.page_size.to_string())),
        ]);
        self.api(HttpMethod::Get, &format!("/api/accommodations{query}"))
            .bearer(access_token)
    }

    // --- saved trip plans ---

    pub fn build_saved_trip_plans(&self, status: TripPlanStatus, access_token: &str) -> HttpRequest {
        self.api(
            HttpMethod::Get,
            &format!("/api/trip-plans?status={}", status.as_query()),
        )
        .bearer(Some(access_token))
    }

    pub fn build_trip_plan_detail(&self, id: i64, access_token: &str) -> HttpRequest {
        self.api(HttpMethod::Get, &format!("/api/trip-plans/{id}"))
            .bearer(Some(access_token))
    }

    pub fn build_toggle_completed(&self, id: i64, access_token: &str) -> HttpRequest {
        self.api(HttpMethod::Patch, &format!("/api/trip-plans/{id}/completed"))
            .bearer(Some(access_token))
    }

    // --- AI planner ---

    pub fn build_create_travel_plan(
        &self,
        input: &TravelPlanRequest,
    ) -> Result<HttpRequest, ApiError> {
        Ok(self.ai(HttpMethod::Post, "/travel-plan").json_body(to_json(input)?))
    }

    pub fn build_send_feedback(&self, message: &str) -> Result<HttpRequest, ApiError> {
        let body = FeedbackRequest {
            message: message.to_string(),
        };
        Ok(self.ai(HttpMethod::Post, "/feedback").json_body(to_json(&body)?))
    }

    pub fn build_reset_chat(&self) -> HttpRequest {
        self.ai(HttpMethod::Post, "/reset-chat")
            .timeout(self.default_timeout)
    }

    pub fn build_ai_health(&self) -> HttpRequest {
        self.ai(HttpMethod::Get, "/").timeout(self.default_timeout)
    }

    // --- parsers ---

    pub fn parse_signup(&self, response: HttpResponse) -> Result<(), ApiError> {
        decode_body::<Value>(&response, false).map(|_| ())
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<AuthTokens, ApiError> {
        required(decode_body(&response, false)?)
    }

    pub fn parse_logout(&self, response: HttpResponse) -> Result<(), ApiError> {
        decode_body::<Value>(&response, false).map(|_| ())
    }

    pub fn parse_refresh(&self, response: HttpResponse) -> Result<AuthTokens, ApiError> {
        required(decode_body(&response, false)?)
    }

    pub fn parse_trip_places(&self, response: HttpResponse) -> Result<Page<TripPlace>, ApiError> {
        parse_page::<RawTripPlace>(&response)
    }

    pub fn parse_flights(&self, response: HttpResponse) -> Result<Page<Flight>, ApiError> {
        parse_page::<RawFlight>(&response)
    }

    pub fn parse_accommodations(
        &self,
        response: HttpResponse,
    ) -> Result<Page<Accommodation>, ApiError> {
        parse_page::<RawAccommodation>(&response)
    }

    pub fn parse_saved_trip_plans(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<SavedTripPlan>, ApiError> {
        let list: TripPlanList = required(decode_body(&response, false)?)?;
        Ok(crate::normalize::normalize_list(list.trip_plan_list))
    }

    pub fn parse_trip_plan_detail(
        &self,
        response: HttpResponse,
    ) -> Result<SavedTripPlan, ApiError> {
        let raw: RawTripPlan = required(decode_body(&response, false)?)?;
        raw.normalize()
            .ok_or_else(|| ApiError::Deserialization("trip plan without id".to_string()))
    }

    pub fn parse_toggle_completed(&self, response: HttpResponse) -> Result<(), ApiError> {
        decode_body::<Value>(&response, false).map(|_| ())
    }

    pub fn parse_create_travel_plan(
        &self,
        response: HttpResponse,
    ) -> Result<GeneratedPlan, ApiError> {
        required(decode_body(&response, true)?)
    }

    pub fn parse_send_feedback(&self, response: HttpResponse) -> Result<FeedbackReply, ApiError> {
        required(decode_body(&response, true)?)
    }

    pub fn parse_reset_chat(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_ai_health(&self, response: HttpResponse) -> Result<HealthStatus, ApiError> {
        required(decode_body(&response, true)?)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// `?a=1&b=2`, skipping absent values; empty when nothing is present.
fn query_string(params: &[(&str, Option<String>)]) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| format!("{key}={v}")))
        .collect();
    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

fn parse_page<W>(response: &HttpResponse) -> Result<Page<W::Output>, ApiError>
where
    W: Normalize + DeserializeOwned,
{
    let page: CursorPage<W> = required(decode_body(response, false)?)?;
    Ok(page.into_page())
}

fn required<T>(value: Option<T>) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::Deserialization("response has no result".to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        401 => Err(ApiError::Unauthorized),
        404 => Err(ApiError::NotFound),
        _ if response.is_success() => Ok(()),
        status => Err(ApiError::Http {
            status,
            body: response.body.clone(),
        }),
    }
}

/// Decode a response body into its typed `result`.
///
/// Envelopes are honoured whatever the status; `allow_bare` additionally
/// accepts an un-enveloped 2xx payload.
fn decode_body<T: DeserializeOwned>(
    response: &HttpResponse,
    allow_bare: bool,
) -> Result<Option<T>, ApiError> {
    if response.status == 401 {
        return Err(ApiError::Unauthorized);
    }

    let value: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(e) => {
            check_status(response)?;
            return Err(ApiError::Deserialization(e.to_string()));
        }
    };

    if value.get("isSuccess").is_some() {
        let envelope: crate::types::Envelope<Value> = serde_json::from_value(value)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;
        if !envelope.is_success {
            return Err(ApiError::Rejected {
                code: envelope.code,
                message: envelope.message,
            });
        }
        check_status(response)?;
        return match envelope.result {
            None | Some(Value::Null) => Ok(None),
            Some(result) => serde_json::from_value(result)
                .map(Some)
                .map_err(|e| ApiError::Deserialization(e.to_string())),
        };
    }

    check_status(response)?;
    if allow_bare {
        return serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ApiError::Deserialization(e.to_string()));
    }
    Err(ApiError::Deserialization(
        "expected an isSuccess envelope".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TripClient {
        TripClient::new("http://localhost:8080", "http://localhost:8000")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_login_produces_correct_request() {
        let req = client().build_login("a@b.com", "secret123").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8080/api/auth/login");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        assert_eq!(req.timeout, DEFAULT_TIMEOUT);
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"email": "a@b.com", "password": "secret123"}));
    }

    #[test]
    fn build_logout_sends_bearer_without_body() {
        let req = client().build_logout("access-1");
        assert_eq!(req.path, "http://localhost:8080/api/auth/logout");
        assert_eq!(req.header("authorization"), Some("Bearer access-1"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_refresh_carries_token_in_body() {
        let req = client().build_refresh("refresh-1").unwrap();
        assert!(req.header("authorization").is_none());
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["refreshToken"], "refresh-1");
    }

    #[test]
    fn first_page_has_no_cursor() {
        let req = client().build_trip_places(None, None, None);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8080/api/trip-places?size=10");
        assert!(req.headers.is_empty());
    }

    #[test]
    fn themed_page_with_cursor_and_token() {
        let req = client()
            .with_page_size(5)
            .build_trip_places(Some(Theme::Sea), Some(42), Some("tok"));
        assert_eq!(
            req.path,
            "http://localhost:8080/api/trip-places?theme=SEA&cursorId=42&size=5"
        );
        assert_eq!(req.header("authorization"), Some("Bearer tok"));
    }

    #[test]
    fn flights_and_accommodations_paths() {
        let c = client();
        assert_eq!(
            c.build_flights(Some(7), None).path,
            "http://localhost:8080/api/flights?cursorId=7&size=10"
        );
        assert_eq!(
            c.build_accommodations(None, None).path,
            "http://localhost:8080/api/accommodations?size=10"
        );
    }

    #[test]
    fn toggle_completed_is_patch() {
        let req = client().build_toggle_completed(12, "tok");
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "http://localhost:8080/api/trip-plans/12/completed");
    }

    #[test]
    fn saved_plans_filter_by_status() {
        let req = client().build_saved_trip_plans(TripPlanStatus::Traveled, "tok");
        assert_eq!(req.path, "http://localhost:8080/api/trip-plans?status=TRAVELED");
    }

    #[test]
    fn ai_calls_use_generation_timeout() {
        let c = client();
        let input = TravelPlanRequest {
            companions: "가족".into(),
            departure: Some("서울".into()),
            destination: "부산".into(),
            start_date: "2025-07-01".into(),
            end_date: "2025-07-03".into(),
            style: vec!["맛집".into()],
            budget: "100만원".into(),
        };
        let req = c.build_create_travel_plan(&input).unwrap();
        assert_eq!(req.path, "http://localhost:8000/travel-plan");
        assert_eq!(req.timeout, GENERATION_TIMEOUT);
        assert_eq!(c.build_send_feedback("더 저렴하게").unwrap().timeout, GENERATION_TIMEOUT);
        assert_eq!(c.build_reset_chat().timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn config_timeouts_are_applied() {
        let mut config = ClientConfig::with_base_urls("http://a/", "http://b/");
        config.default_timeout = Duration::from_secs(3);
        config.generation_timeout = Duration::from_secs(30);
        let c = TripClient::from_config(&config);
        assert_eq!(c.api_base_url(), "http://a");
        assert_eq!(c.build_flights(None, None).timeout, Duration::from_secs(3));
        assert_eq!(c.build_send_feedback("x").unwrap().timeout, Duration::from_secs(30));
    }

    #[test]
    fn parse_login_success() {
        let tokens = client()
            .parse_login(response(
                200,
                r#"{"isSuccess":true,"result":{"accessToken":"a1","refreshToken":"r1"}}"#,
            ))
            .unwrap();
        assert_eq!(tokens.access_token, "a1");
        assert_eq!(tokens.refresh_token, "r1");
    }

    #[test]
    fn rejected_envelope_wins_over_status() {
        let err = client()
            .parse_signup(response(
                409,
                r#"{"isSuccess":false,"code":"MEMBER_EMAIL_DUPLICATE","message":"이미 사용 중인 이메일입니다."}"#,
            ))
            .unwrap_err();
        match err {
            ApiError::Rejected { code, message } => {
                assert_eq!(code.as_deref(), Some("MEMBER_EMAIL_DUPLICATE"));
                assert!(message.unwrap().contains("이메일"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unauthorized_is_detected_before_body() {
        let err = client().parse_flights(response(401, "")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn non_json_error_keeps_status() {
        let err = client()
            .parse_flights(response(502, "<html>bad gateway</html>"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 502, .. }));
        let err = client().parse_trip_plan_detail(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn success_without_result_is_a_decode_error_for_payload_calls() {
        let err = client()
            .parse_login(response(200, r#"{"isSuccess":true}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
        assert!(client()
            .parse_logout(response(200, r#"{"isSuccess":true}"#))
            .is_ok());
    }

    #[test]
    fn parse_page_normalizes_variants() {
        let page = client()
            .parse_accommodations(response(
                200,
                r#"{"isSuccess":true,"result":{"list":[
                    {"id":1,"hotelName":"롯데호텔","pricePerNight":180000},
                    {"id":2,"name":"한옥 스테이","price":95000}
                ],"nextCursorId":2,"hasNext":true}}"#,
            ))
            .unwrap();
        assert_eq!(page.items[0].name, "롯데호텔");
        assert_eq!(page.items[1].name, "한옥 스테이");
        assert_eq!(page.items[1].price_per_night, Some(95_000));
        assert_eq!(page.next_cursor_id, Some(2));
        assert!(page.has_next);
    }

    #[test]
    fn parse_saved_trip_plans_reads_trip_plan_list() {
        let plans = client()
            .parse_saved_trip_plans(response(
                200,
                r#"{"isSuccess":true,"result":{"tripPlanList":[{"tripPlanId":3,"title":"강릉","status":"PLANNED"}]}}"#,
            ))
            .unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, 3);
    }

    #[test]
    fn schedule_item_without_time_keeps_the_listing() {
        let plans = client()
            .parse_saved_trip_plans(response(
                200,
                r#"{"isSuccess":true,"result":{"tripPlanList":[
                    {"tripPlanId":3,"dailySchedules":[{"day":1,"schedules":[{"title":"no time"}]}]},
                    {"tripPlanId":4,"title":"속초"}
                ]}}"#,
            ))
            .unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].days[0].schedules[0].time, None);
        assert_eq!(plans[1].title, "속초");
    }

    #[test]
    fn detail_reads_daily_schedules() {
        let plan = client()
            .parse_trip_plan_detail(response(
                200,
                r#"{"isSuccess":true,"result":{"tripPlanId":5,"dailySchedules":[
                    {"day":1,"schedules":[{"orderIndex":1,"time":"09:00:00","title":"출발"}]},
                    {"day":2,"schedules":[]}
                ]}}"#,
            ))
            .unwrap();
        assert_eq!(plan.days.len(), 2);
        assert_eq!(plan.days[0].schedules[0].time.as_deref(), Some("09:00"));
    }

    #[test]
    fn ai_plan_accepts_bare_and_enveloped_bodies() {
        let c = client();
        let bare = c
            .parse_create_travel_plan(response(200, r#"{"plan":"1일차: 해운대"}"#))
            .unwrap();
        let wrapped = c
            .parse_create_travel_plan(response(
                200,
                r#"{"isSuccess":true,"result":{"plan":"1일차: 해운대"}}"#,
            ))
            .unwrap();
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn bare_body_is_not_accepted_for_business_calls() {
        let err = client()
            .parse_login(response(200, r#"{"accessToken":"a","refreshToken":"r"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = TripClient::new("http://localhost:8080/", "http://localhost:8000/");
        assert_eq!(c.build_reset_chat().path, "http://localhost:8000/reset-chat");
        assert_eq!(
            c.build_trip_plan_detail(1, "t").path,
            "http://localhost:8080/api/trip-plans/1"
        );
    }
}
