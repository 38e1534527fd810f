//! Response DTOs for the cache server protocol
//!
//! Defines the structure of outgoing framed JSON responses and
//! server-pushed notifications. Both travel as the same record; a
//! notification is a response with `IsNotification: true` and an embedded
//! event.

use serde::Serialize;
use serde_json::Value;

use crate::events::CacheEvent;

/// One framed server response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CacheResponse {
    /// Whether the operation succeeded
    pub success: bool,
    /// Read result; JSON `null` when the key was blank, missing, or expired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Failure detail, present when `success` is false and a message applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True for server-pushed notifications
    pub is_notification: bool,
    /// The cache event carried by a notification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<CacheEvent>,
}

impl CacheResponse {
    /// Response reporting an operation outcome with no payload.
    pub fn outcome(success: bool) -> Self {
        Self {
            success,
            value: None,
            error: None,
            is_notification: false,
            event: None,
        }
    }

    /// Response to a Read.
    ///
    /// The `Value` field is always serialized, carrying JSON `null` when
    /// the lookup produced nothing.
    pub fn read_result(value: Option<Value>) -> Self {
        Self {
            success: true,
            value: Some(value.unwrap_or(Value::Null)),
            error: None,
            is_notification: false,
            event: None,
        }
    }

    /// Failure response with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(message.into()),
            is_notification: false,
            event: None,
        }
    }

    /// Server-pushed notification wrapping a cache event.
    pub fn notification(event: CacheEvent) -> Self {
        Self {
            success: true,
            value: None,
            error: None,
            is_notification: true,
            event: Some(event),
        }
    }
}
