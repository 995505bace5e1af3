//! Error types for the TripTalk API client.
//!
//! # Design
//! `Timeout` is kept apart from `Transport` because the app shows a distinct
//! message when the planner is slow. `Rejected` carries the envelope's
//! `isSuccess: false` payload, which can arrive with any HTTP status.
//! `Unauthorized` is the only signal callers use to trigger a token refresh.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by the client, transport and session layers.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request did not complete within its wait budget and was aborted.
    #[error("request timed out after {}s", after.as_secs())]
    Timeout { after: Duration },

    /// The request never produced an HTTP response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server returned 401; the access token is missing or expired.
    #[error("unauthorized")]
    Unauthorized,

    /// The operation needs a logged-in session and none is held.
    #[error("login required")]
    NotLoggedIn,

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server answered with `isSuccess: false`.
    #[error("rejected by server: {}", message.as_deref().unwrap_or("no message"))]
    Rejected {
        code: Option<String>,
        message: Option<String>,
    },

    /// A non-2xx status without a readable envelope.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Input rejected before anything was sent.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The durable token store could not be read or written.
    #[error("token storage failed: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }

    /// Text suitable for an alert dialog.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Timeout { .. } => {
                "The request timed out. Please try again in a moment.".to_string()
            }
            ApiError::Transport(_) => "Could not reach the server.".to_string(),
            ApiError::Unauthorized | ApiError::NotLoggedIn => "Please log in again.".to_string(),
            ApiError::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ApiError::Validation(msg) => msg.clone(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Why the server refused a signup, as far as its free-text error allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupRejection {
    EmailTaken,
    NicknameTaken,
    Other(String),
}

impl SignupRejection {
    /// Map a signup failure onto a specific reason.
    ///
    /// The backend only reports duplicates through error codes such as
    /// `MEMBER_EMAIL_DUPLICATE` or through free text (Korean or English), so
    /// this is the one place that inspects those strings.
    pub fn classify(err: &ApiError) -> Self {
        let (code, message) = match err {
            ApiError::Rejected { code, message } => (
                code.as_deref().unwrap_or_default(),
                message.as_deref().unwrap_or_default(),
            ),
            ApiError::Http { body, .. } => ("", body.as_str()),
            other => return SignupRejection::Other(other.user_message()),
        };

        let lowered = message.to_lowercase();
        if code.to_uppercase().contains("EMAIL")
            || lowered.contains("email")
            || message.contains("이메일")
        {
            SignupRejection::EmailTaken
        } else if code.to_uppercase().contains("NICKNAME")
            || lowered.contains("nickname")
            || message.contains("닉네임")
        {
            SignupRejection::NicknameTaken
        } else {
            SignupRejection::Other(err.user_message())
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            SignupRejection::EmailTaken => {
                "This email is already in use. Please enter another email.".to_string()
            }
            SignupRejection::NicknameTaken => {
                "This nickname is already in use. Please enter another nickname.".to_string()
            }
            SignupRejection::Other(msg) => msg.clone(),
        }
    }
}
