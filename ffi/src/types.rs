//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Requests and tokens mirror core types with C-compatible fields. Every
//! other payload (pages, saved plans, planner replies) crosses as one JSON C
//! string of the normalized record, so hosts decode it with their own JSON
//! library instead of walking nested pointer graphs.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use serde::Serialize;
use triptalk_core::{ApiError, AuthTokens, HttpMethod, HttpRequest, TripClient};

/// Opaque handle to a `TripClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiTripClient {
    pub(crate) inner: TripClient,
}

/// Heap C string; interior NULs are dropped rather than failing.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s: String = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Patch = 2,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Patch => FfiHttpMethod::Patch,
        }
    }
}

#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// `path` is the absolute URL. The host must abort the call once
/// `timeout_ms` has elapsed and report it as a timeout to the user.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
    pub timeout_ms: u64,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let body = req.body.map_or(std::ptr::null_mut(), c_string);
        let timeout_ms = u64::try_from(req.timeout.as_millis()).unwrap_or(u64::MAX);

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: c_string(req.path),
            headers,
            headers_len,
            body,
            timeout_ms,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// The host fills this in after executing a request. `body` may be null for
/// an empty body. The FFI layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

/// What the host did with a request that produced no response. Lets the
/// host report failures through the same result envelope.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiTransportFailure {
    Timeout = 0,
    Network = 1,
}

/// Which paginated list a response belongs to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiListKind {
    TripPlaces = 0,
    Flights = 1,
    Accommodations = 2,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    /// Refresh the tokens and retry once; on a second failure log out.
    Unauthorized = 1,
    NotFound = 2,
    /// `isSuccess: false`; `server_code` holds the backend's code.
    Rejected = 3,
    Http = 4,
    Timeout = 5,
    Transport = 6,
    Deserialization = 7,
    Serialization = 8,
    Validation = 9,
    Storage = 10,
    Panic = 11,
    NullArg = 12,
}

/// Tag that tells `triptalk_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is a `FfiAuthTokens`.
    Tokens = 1,
    /// `data` is a NUL-terminated JSON document.
    Json = 2,
}

#[repr(C)]
pub struct FfiAuthTokens {
    pub access_token: *mut c_char,
    pub refresh_token: *mut c_char,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, the message is null and `data` is tagged
/// by `data_tag`. On failure `error_message` is text fit for an alert dialog
/// and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub server_code: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        data_tag: FfiDataTag,
        data: *mut c_void,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message,
            server_code: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    pub(crate) fn ok_tokens(tokens: AuthTokens) -> *mut Self {
        let ffi_tokens = Box::new(FfiAuthTokens {
            access_token: c_string(tokens.access_token),
            refresh_token: c_string(tokens.refresh_token),
        });
        Self::boxed(
            FfiErrorCode::Ok,
            std::ptr::null_mut(),
            FfiDataTag::Tokens,
            Box::into_raw(ffi_tokens) as *mut c_void,
        )
    }

    pub(crate) fn ok_json<T: Serialize>(value: &T) -> *mut Self {
        match serde_json::to_string(value) {
            Ok(json) => Self::boxed(
                FfiErrorCode::Ok,
                std::ptr::null_mut(),
                FfiDataTag::Json,
                c_string(json) as *mut c_void,
            ),
            Err(e) => Self::from_error(ApiError::Serialization(e.to_string())),
        }
    }

    pub(crate) fn ok_empty() -> *mut Self {
        Self::boxed(
            FfiErrorCode::Ok,
            std::ptr::null_mut(),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::Unauthorized | ApiError::NotLoggedIn => (FfiErrorCode::Unauthorized, 401),
            ApiError::NotFound => (FfiErrorCode::NotFound, 404),
            ApiError::Rejected { .. } => (FfiErrorCode::Rejected, 0),
            ApiError::Http { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::Timeout { .. } => (FfiErrorCode::Timeout, 0),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::Deserialization(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::Serialization(_) => (FfiErrorCode::Serialization, 0),
            ApiError::Validation(_) => (FfiErrorCode::Validation, 0),
            ApiError::Storage(_) => (FfiErrorCode::Storage, 0),
        };
        let server_code = match &err {
            ApiError::Rejected {
                code: Some(code), ..
            } => c_string(code.as_str()),
            _ => std::ptr::null_mut(),
        };

        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: c_string(err.user_message()),
            server_code,
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            c_string(format!("null argument: {name}")),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::Panic,
            c_string(msg),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }
}
