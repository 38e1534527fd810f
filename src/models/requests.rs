//! Request DTOs for the cache server protocol
//!
//! Defines the structure of incoming framed JSON requests.
//!
//! Requests are a single flat record: the `Operation` field selects the
//! branch and the dispatcher enforces which optional fields are meaningful
//! for it. Unknown operations are answered, not treated as codec faults.

use serde::Deserialize;
use serde_json::Value;

/// One framed client request.
///
/// # Fields
/// - `operation`: `Create`, `Read`, `Update`, `Delete`, `Subscribe`, or
///   `Unsubscribe` (anything else gets an "Invalid operation" response)
/// - `key`: required for the four CRUD operations
/// - `value`: used by `Create` and `Update`; absent means JSON `null`
/// - `expiration_seconds`: optional positive TTL for `Create`/`Update`
/// - `subscribed_event_types`: used by `Subscribe`/`Unsubscribe`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CacheRequest {
    /// The requested operation
    pub operation: String,
    /// The cache key, where the operation needs one
    #[serde(default)]
    pub key: Option<String>,
    /// The payload for Create/Update
    #[serde(default)]
    pub value: Option<Value>,
    /// Optional TTL in seconds
    #[serde(default)]
    pub expiration_seconds: Option<i64>,
    /// Event-type names for Subscribe/Unsubscribe
    #[serde(default)]
    pub subscribed_event_types: Option<Vec<String>>,
}

impl CacheRequest {
    /// The key, defaulting to blank when absent so the engine's blank-key
    /// handling applies uniformly.
    pub fn key_or_blank(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    /// The payload, defaulting to JSON `null` when absent.
    pub fn value_or_null(&self) -> Value {
        self.value.clone().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_deserialize() {
        let json = r#"{"Operation":"Create","Key":"test","Value":"hello"}"#;
        let req: CacheRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.operation, "Create");
        assert_eq!(req.key.as_deref(), Some("test"));
        assert_eq!(req.value, Some(json!("hello")));
        assert!(req.expiration_seconds.is_none());
    }

    #[test]
    fn test_request_with_ttl() {
        let json = r#"{"Operation":"Create","Key":"k","Value":1,"ExpirationSeconds":60}"#;
        let req: CacheRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.expiration_seconds, Some(60));
    }

    #[test]
    fn test_subscribe_request_deserialize() {
        let json = r#"{"Operation":"Subscribe","SubscribedEventTypes":["ItemAdded","ItemEvicted"]}"#;
        let req: CacheRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.operation, "Subscribe");
        assert_eq!(
            req.subscribed_event_types,
            Some(vec!["ItemAdded".to_string(), "ItemEvicted".to_string()])
        );
    }

    #[test]
    fn test_non_string_value_accepted() {
        let json = r#"{"Operation":"Update","Key":"k","Value":{"nested":[1,2,3]}}"#;
        let req: CacheRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.value, Some(json!({"nested": [1, 2, 3]})));
    }

    #[test]
    fn test_missing_key_defaults_to_blank() {
        let json = r#"{"Operation":"Read"}"#;
        let req: CacheRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key_or_blank(), "");
    }

    #[test]
    fn test_missing_value_defaults_to_null() {
        let json = r#"{"Operation":"Create","Key":"k"}"#;
        let req: CacheRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.value_or_null(), Value::Null);
    }
}
