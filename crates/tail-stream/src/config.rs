use serde::{Deserialize, Serialize};

pub const DEFAULT_EVENT_SOURCE: &str = "/events";
pub const DEFAULT_TARGET_ELEMENT: &str = "event-stream";
pub const DEFAULT_FOLLOW_THRESHOLD: f64 = 50.0;

/// How a non-fatal transport error is described in the rendered status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatus {
    /// Report the transport's connection state name (`CONNECTING`, `OPEN`, `CLOSED`).
    #[default]
    ConnectionState,
    /// Report the canned `re-connecting` phrase.
    Phrase,
}

/// Startup configuration for one subscription.
///
/// Field names on the wire follow the page bootstrap object
/// (`eventSource`, `targetElement`, `onErrorDisconnect`) so the same
/// document can be fed from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    #[serde(rename = "eventSource")]
    pub endpoint_url: String,
    #[serde(rename = "targetElement")]
    pub target_container_id: String,
    #[serde(rename = "onErrorDisconnect")]
    pub close_on_error: bool,
    #[serde(rename = "followThreshold")]
    pub follow_threshold: f64,
    #[serde(rename = "errorStatus")]
    pub error_status: ErrorStatus,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_EVENT_SOURCE.to_string(),
            target_container_id: DEFAULT_TARGET_ELEMENT.to_string(),
            close_on_error: false,
            follow_threshold: DEFAULT_FOLLOW_THRESHOLD,
            error_status: ErrorStatus::default(),
        }
    }
}
