//! Typed endpoint facade over an `AuthSession`.
//!
//! Every call goes through `fetch_with_timeout` with the budget its builder
//! picked. Calls that need a login fail with `NotLoggedIn` when no token is
//! held and refresh-and-retry once on 401. List calls attach the bearer only
//! when one is available.

use std::future::Future;

use crate::error::ApiError;
use crate::session::AuthSession;
use crate::store::TokenStore;
use crate::transport::Transport;
use crate::types::{
    Accommodation, FeedbackReply, Flight, GeneratedPlan, HealthStatus, Page, SavedTripPlan, Theme,
    TravelPlanRequest, TripPlace, TripPlanStatus,
};

pub struct TripApi<T, S> {
    session: AuthSession<T, S>,
}

impl<T, S> Clone for TripApi<T, S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

impl<T, S> TripApi<T, S>
where
    T: Transport + 'static,
    S: TokenStore + 'static,
{
    pub fn new(session: AuthSession<T, S>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &AuthSession<T, S> {
        &self.session
    }

    /// Anonymous when logged out, authorized (with retry) when logged in.
    async fn optional_auth<R, F, Fut>(&self, call: F) -> Result<R, ApiError>
    where
        F: Fn(Option<String>) -> Fut,
        Fut: Future<Output = Result<R, ApiError>>,
    {
        if self.session.is_logged_in().await {
            self.session.authorized(|token| call(Some(token))).await
        } else {
            call(None).await
        }
    }

    pub async fn trip_places(
        &self,
        theme: Option<Theme>,
        cursor: Option<i64>,
    ) -> Result<Page<TripPlace>, ApiError> {
        let client = self.session.client();
        self.optional_auth(|token| async move {
            let request = client.build_trip_places(theme, cursor, token.as_deref());
            client.parse_trip_places(self.session.send(request).await?)
        })
        .await
    }

    pub async fn flights(&self, cursor: Option<i64>) -> Result<Page<Flight>, ApiError> {
        let client = self.session.client();
        self.optional_auth(|token| async move {
            let request = client.build_flights(cursor, token.as_deref());
            client.parse_flights(self.session.send(request).await?)
        })
        .await
    }

    pub async fn accommodations(
        &self,
        cursor: Option<i64>,
    ) -> Result<Page<Accommodation>, ApiError> {
        let client = self.session.client();
        self.optional_auth(|token| async move {
            let request = client.build_accommodations(cursor, token.as_deref());
            client.parse_accommodations(self.session.send(request).await?)
        })
        .await
    }

    pub async fn saved_trip_plans(
        &self,
        status: TripPlanStatus,
    ) -> Result<Vec<SavedTripPlan>, ApiError> {
        let client = self.session.client();
        self.session
            .authorized(|token| async move {
                let request = client.build_saved_trip_plans(status, &token);
                client.parse_saved_trip_plans(self.session.send(request).await?)
            })
            .await
    }

    pub async fn trip_plan_detail(&self, id: i64) -> Result<SavedTripPlan, ApiError> {
        let client = self.session.client();
        self.session
            .authorized(|token| async move {
                let request = client.build_trip_plan_detail(id, &token);
                client.parse_trip_plan_detail(self.session.send(request).await?)
            })
            .await
    }

    /// Flip a saved plan between planned and travelled.
    pub async fn toggle_completed(&self, id: i64) -> Result<(), ApiError> {
        let client = self.session.client();
        self.session
            .authorized(|token| async move {
                let request = client.build_toggle_completed(id, &token);
                client.parse_toggle_completed(self.session.send(request).await?)
            })
            .await
    }

    /// Ask the planner for an itinerary. Waits up to the generation timeout;
    /// on timeout the server may or may not have produced a plan.
    pub async fn create_travel_plan(
        &self,
        input: &TravelPlanRequest,
    ) -> Result<GeneratedPlan, ApiError> {
        let client = self.session.client();
        let request = client.build_create_travel_plan(input)?;
        client.parse_create_travel_plan(self.session.send(request).await?)
    }

    pub async fn send_feedback(&self, message: &str) -> Result<FeedbackReply, ApiError> {
        if message.trim().is_empty() {
            return Err(ApiError::Validation("message is empty".into()));
        }
        let client = self.session.client();
        let request = client.build_send_feedback(message)?;
        client.parse_send_feedback(self.session.send(request).await?)
    }

    pub async fn reset_chat(&self) -> Result<(), ApiError> {
        let client = self.session.client();
        client.parse_reset_chat(self.session.send(client.build_reset_chat()).await?)
    }

    pub async fn ai_health(&self) -> Result<HealthStatus, ApiError> {
        let client = self.session.client();
        client.parse_ai_health(self.session.send(client.build_ai_health()).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::http::HttpMethod;
    use crate::session::tests::{ok, pair, session, status, Scripted};

    const PLACES: &str = r#"{"isSuccess":true,"result":{"list":[{"tripPlaceId":1,"title":"성산일출봉"}],"nextCursorId":1,"hasNext":true}}"#;

    #[tokio::test]
    async fn anonymous_list_has_no_bearer() {
        let transport = Arc::new(Scripted::new(|req| {
            assert!(req.header("authorization").is_none());
            ok(PLACES)
        }));
        let api = TripApi::new(session(transport, None).await);
        let page = api.trip_places(Some(Theme::Nature), None).await.unwrap();
        assert_eq!(page.items[0].name, "성산일출봉");
        assert_eq!(page.next_cursor_id, Some(1));
    }

    #[tokio::test]
    async fn logged_in_list_sends_bearer() {
        let transport = Arc::new(Scripted::new(|req| {
            assert_eq!(req.header("authorization"), Some("Bearer access-1"));
            ok(r#"{"isSuccess":true,"result":{"list":[],"nextCursorId":null,"hasNext":false}}"#)
        }));
        let api = TripApi::new(session(transport, Some(pair(1))).await);
        let page = api.flights(None).await.unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn saved_plans_need_login() {
        let transport = Arc::new(Scripted::new(|_| ok("{}")));
        let api = TripApi::new(session(transport.clone(), None).await);
        let err = api
            .saved_trip_plans(TripPlanStatus::Planned)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotLoggedIn));
        assert_eq!(transport.total(), 0);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_call_retried() {
        let transport = Arc::new(Scripted::new(|req| {
            if req.path.ends_with("/api/auth/refresh") {
                return ok(
                    r#"{"isSuccess":true,"result":{"accessToken":"access-2","refreshToken":"refresh-2"}}"#,
                );
            }
            match req.header("authorization") {
                Some("Bearer access-2") => {
                    assert_eq!(req.method, HttpMethod::Patch);
                    ok(r#"{"isSuccess":true}"#)
                }
                _ => status(401, ""),
            }
        }));
        let api = TripApi::new(session(transport.clone(), Some(pair(1))).await);
        api.toggle_completed(4).await.unwrap();
        assert_eq!(transport.count("/api/trip-plans/4/completed"), 2);
        assert_eq!(transport.count("/api/auth/refresh"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_planner_times_out() {
        let transport =
            Arc::new(Scripted::new(|_| ok(r#"{"plan":"late"}"#)).with_delay(Duration::from_secs(600)));
        let api = TripApi::new(session(transport, None).await);
        let input = TravelPlanRequest {
            companions: "친구".into(),
            departure: None,
            destination: "제주도".into(),
            start_date: "2025-05-01".into(),
            end_date: "2025-05-03".into(),
            style: vec![],
            budget: "50만원".into(),
        };
        let err = api.create_travel_plan(&input).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(err, ApiError::Timeout { after } if after == Duration::from_secs(120)));
    }

    #[tokio::test]
    async fn feedback_reply_and_blank_guard() {
        let transport = Arc::new(Scripted::new(|_| ok(r#"{"reply":"숙소를 바꿨어요"}"#)));
        let api = TripApi::new(session(transport.clone(), None).await);
        assert!(api.send_feedback("  ").await.is_err());
        assert_eq!(transport.total(), 0);
        let reply = api.send_feedback("더 저렴한 숙소로").await.unwrap();
        assert_eq!(reply.reply, "숙소를 바꿨어요");
    }

    #[tokio::test]
    async fn health_and_reset() {
        let transport = Arc::new(Scripted::new(|req| {
            if req.path.ends_with("/reset-chat") {
                ok(r#"{"message":"reset"}"#)
            } else {
                ok(r#"{"status":"ok","message":"AI Travel Planner API"}"#)
            }
        }));
        let api = TripApi::new(session(transport, None).await);
        api.reset_chat().await.unwrap();
        assert_eq!(api.ai_health().await.unwrap().status, "ok");
    }
}
