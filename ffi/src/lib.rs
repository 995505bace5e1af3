//! C-ABI wrapper around `triptalk-core`.
//!
//! # Overview
//! Exposes the TripTalk request builders and response parsers through
//! `extern "C"` functions so the mobile shell can do the HTTP round-trip
//! with its native stack while Rust owns URLs, headers, wait budgets,
//! envelope handling and record normalization.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `triptalk_build_*` returns an `FfiHttpRequest` (null on bad input);
//!   `triptalk_parse_*` returns an `FfiResult` envelope.
//! - Token pairs come back as a C struct; every other payload is a JSON C
//!   string of the normalized record.
//! - The host owns all returned pointers and must call the matching
//!   `triptalk_free_*` function to release them.
//! - Token refresh stays on the host side: on `Unauthorized` it builds a
//!   refresh request, stores the new pair and retries once.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use triptalk_core::{
    ApiError, HttpRequest, HttpResponse, SignupData, Theme, TravelPlanRequest, TripClient,
    TripPlanStatus,
};

use types::*;

/// Borrow a C string argument; `None` for null or invalid UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Negative cursors mean "first page".
fn cursor_arg(cursor: i64) -> Option<i64> {
    (cursor >= 0).then_some(cursor)
}

/// Shared body of every `triptalk_build_*` function.
fn build_with(
    client: *const FfiTripClient,
    build: impl FnOnce(&TripClient) -> Option<HttpRequest>,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match build(&client.inner) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Shared body of every `triptalk_parse_*` function.
fn parse_with(
    name: &str,
    client: *const FfiTripClient,
    response: *const FfiHttpResponse,
    parse: impl FnOnce(&TripClient, HttpResponse) -> *mut FfiResult,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        let result = match ffi_response_to_core(resp) {
            Ok(core_resp) => parse(&client.inner, core_resp),
            Err(e) => FfiResult::from_error(e),
        };
        unsafe { (*result).http_status = resp.status };
        result
    }))
    .unwrap_or_else(|_| FfiResult::panic(&format!("panic in {name}")))
}

/// A null body is an empty body; bytes that are not UTF-8 are a decode error.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> Result<HttpResponse, ApiError> {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }
            .to_str()
            .map_err(|e| ApiError::Deserialization(format!("response body is not UTF-8: {e}")))?
            .to_string()
    };
    Ok(HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    })
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for the business API at `api_base` and the AI planner at
/// `ai_base`.
///
/// Returns null if either URL is null or not UTF-8. Free the handle with
/// `triptalk_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_client_new(
    api_base: *const c_char,
    ai_base: *const c_char,
) -> *mut FfiTripClient {
    catch_unwind(|| {
        let (Some(api), Some(ai)) = (unsafe { str_arg(api_base) }, unsafe { str_arg(ai_base) })
        else {
            return std::ptr::null_mut();
        };
        let client = TripClient::new(api, ai);
        Box::into_raw(Box::new(FfiTripClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `triptalk_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_client_free(client: *mut FfiTripClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_signup(
    client: *const FfiTripClient,
    email: *const c_char,
    password: *const c_char,
    nick_name: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let data = SignupData {
            email: unsafe { str_arg(email) }?.trim().to_string(),
            password: unsafe { str_arg(password) }?.to_string(),
            nick_name: unsafe { str_arg(nick_name) }?.trim().to_string(),
        };
        c.build_signup(&data).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_login(
    client: *const FfiTripClient,
    email: *const c_char,
    password: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let email = unsafe { str_arg(email) }?;
        let password = unsafe { str_arg(password) }?;
        c.build_login(email.trim(), password).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_refresh(
    client: *const FfiTripClient,
    refresh_token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        c.build_refresh(unsafe { str_arg(refresh_token) }?).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_logout(
    client: *const FfiTripClient,
    access_token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        Some(c.build_logout(unsafe { str_arg(access_token) }?))
    })
}

/// `theme` is a query value (`"SEA"`) or label (`"바다"`); null means all.
/// `cursor < 0` requests the first page. `access_token` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_trip_places(
    client: *const FfiTripClient,
    theme: *const c_char,
    cursor: i64,
    access_token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let theme = match unsafe { str_arg(theme) } {
            None => None,
            Some(t) => Some(Theme::parse(t)?),
        };
        Some(c.build_trip_places(theme, cursor_arg(cursor), unsafe { str_arg(access_token) }))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_flights(
    client: *const FfiTripClient,
    cursor: i64,
    access_token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        Some(c.build_flights(cursor_arg(cursor), unsafe { str_arg(access_token) }))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_accommodations(
    client: *const FfiTripClient,
    cursor: i64,
    access_token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        Some(c.build_accommodations(cursor_arg(cursor), unsafe { str_arg(access_token) }))
    })
}

/// `status` is `"PLANNED"` or `"TRAVELED"`.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_saved_trip_plans(
    client: *const FfiTripClient,
    status: *const c_char,
    access_token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let status = TripPlanStatus::parse(unsafe { str_arg(status) }?)?;
        Some(c.build_saved_trip_plans(status, unsafe { str_arg(access_token) }?))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_trip_plan_detail(
    client: *const FfiTripClient,
    id: i64,
    access_token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        Some(c.build_trip_plan_detail(id, unsafe { str_arg(access_token) }?))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_toggle_completed(
    client: *const FfiTripClient,
    id: i64,
    access_token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        Some(c.build_toggle_completed(id, unsafe { str_arg(access_token) }?))
    })
}

/// `request_json` is the planner payload as JSON (snake_case keys).
/// Returns null if it does not decode.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_create_travel_plan(
    client: *const FfiTripClient,
    request_json: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let input: TravelPlanRequest =
            serde_json::from_str(unsafe { str_arg(request_json) }?).ok()?;
        c.build_create_travel_plan(&input).ok()
    })
}

/// Returns null for a blank message.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_build_send_feedback(
    client: *const FfiTripClient,
    message: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let message = unsafe { str_arg(message) }.filter(|m| !m.trim().is_empty())?;
        c.build_send_feedback(message).ok()
    })
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Parse a login or refresh response. `data_tag = Tokens` on success.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_parse_tokens(
    client: *const FfiTripClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with("triptalk_parse_tokens", client, response, |c, resp| {
        match c.parse_login(resp) {
            Ok(tokens) => FfiResult::ok_tokens(tokens),
            Err(e) => FfiResult::from_error(e),
        }
    })
}

/// Parse one page of `kind`. `data_tag = Json` holding
/// `{items, nextCursorId, hasNext}`.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_parse_page(
    client: *const FfiTripClient,
    kind: FfiListKind,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with("triptalk_parse_page", client, response, |c, resp| {
        let parsed = match kind {
            FfiListKind::TripPlaces => c.parse_trip_places(resp).map(|p| FfiResult::ok_json(&p)),
            FfiListKind::Flights => c.parse_flights(resp).map(|p| FfiResult::ok_json(&p)),
            FfiListKind::Accommodations => {
                c.parse_accommodations(resp).map(|p| FfiResult::ok_json(&p))
            }
        };
        parsed.unwrap_or_else(FfiResult::from_error)
    })
}

/// Parse a saved-plan listing. `data_tag = Json` holding an array.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_parse_trip_plans(
    client: *const FfiTripClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with("triptalk_parse_trip_plans", client, response, |c, resp| {
        match c.parse_saved_trip_plans(resp) {
            Ok(plans) => FfiResult::ok_json(&plans),
            Err(e) => FfiResult::from_error(e),
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn triptalk_parse_trip_plan(
    client: *const FfiTripClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with("triptalk_parse_trip_plan", client, response, |c, resp| {
        match c.parse_trip_plan_detail(resp) {
            Ok(plan) => FfiResult::ok_json(&plan),
            Err(e) => FfiResult::from_error(e),
        }
    })
}

/// Parse a planner response. `data_tag = Json` holding `{plan}`.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_parse_generated_plan(
    client: *const FfiTripClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with("triptalk_parse_generated_plan", client, response, |c, resp| {
        match c.parse_create_travel_plan(resp) {
            Ok(plan) => FfiResult::ok_json(&plan),
            Err(e) => FfiResult::from_error(e),
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn triptalk_parse_feedback(
    client: *const FfiTripClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with("triptalk_parse_feedback", client, response, |c, resp| {
        match c.parse_send_feedback(resp) {
            Ok(reply) => FfiResult::ok_json(&reply),
            Err(e) => FfiResult::from_error(e),
        }
    })
}

/// Parse a response whose only content is success or failure (signup,
/// logout, toggle-completed). `data_tag = None` on success.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_parse_ack(
    client: *const FfiTripClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with("triptalk_parse_ack", client, response, |c, resp| {
        match c.parse_signup(resp) {
            Ok(()) => FfiResult::ok_empty(),
            Err(e) => FfiResult::from_error(e),
        }
    })
}

/// Result for a request the host could not complete, so timeouts and
/// network failures reach the UI through the same envelope.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_transport_failure(
    failure: FfiTransportFailure,
    timeout_ms: u64,
) -> *mut FfiResult {
    catch_unwind(|| {
        let err = match failure {
            FfiTransportFailure::Timeout => ApiError::Timeout {
                after: Duration::from_millis(timeout_ms),
            },
            FfiTransportFailure::Network => ApiError::Transport("host transport failed".into()),
        };
        FfiResult::from_error(err)
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in triptalk_transport_failure"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `triptalk_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.path);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiResult` returned by any `triptalk_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.server_code);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Tokens => {
                let tokens = unsafe { Box::from_raw(result.data as *mut FfiAuthTokens) };
                free_c_string(tokens.access_token);
                free_c_string(tokens.refresh_token);
            }
            FfiDataTag::Json => free_c_string(result.data as *mut c_char),
            FfiDataTag::None => {}
        }
    });
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn triptalk_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
