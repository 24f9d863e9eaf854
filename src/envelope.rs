//! The JSON response envelope every transport emits.

use serde::Serialize;

/// Outcome marker for the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatus {
    Success,
    Fail,
}

/// `{message, errorstatus, result}` — `result` is omitted on failure.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T: Serialize> {
    pub message: String,
    pub errorstatus: ErrorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(message: impl Into<String>, result: T) -> Self {
        Self {
            message: message.into(),
            errorstatus: ErrorStatus::Success,
            result: Some(result),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errorstatus: ErrorStatus::Fail,
            result: None,
        }
    }
}
