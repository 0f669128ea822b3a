//! Request DTOs for the remote cache protocol
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;

/// Request body for storing a value (`POST /api/v2/utils/cache`)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `data`: The value to store, any JSON
/// - `ttl`: Optional TTL in seconds (uses default if not specified)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutRequest {
    pub key: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl PutRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Shared key rule for request bodies and path parameters.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}
