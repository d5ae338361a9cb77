//! Request DTOs for the control channel
//!
//! Defines the messages clients send to the worker.

use serde::{Deserialize, Serialize};

/// Payload of `precache-urls`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecachePayload {
    /// URLs or upstream-relative paths to fetch and store
    pub urls: Vec<String>,
}

/// Control message sent by a client to the worker.
///
/// Wire form is `{"type": "...", "payload": {...}}`; the payload is only
/// present for `precache-urls`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ControlMessage {
    /// Leave the waiting state immediately
    #[serde(alias = "SKIP_WAITING")]
    SkipWaiting,
    /// Report the current cache version
    #[serde(alias = "GET_VERSION")]
    GetVersion,
    /// Delete every partition regardless of version
    #[serde(alias = "CLEAR_CACHE")]
    ClearCache,
    /// Report entry counts and URLs of the current partitions
    #[serde(alias = "GET_CACHE_STATS")]
    GetCacheStats,
    /// Fetch and store the given URLs in the dynamic partition
    #[serde(alias = "PRECACHE_URLS")]
    PrecacheUrls(PrecachePayload),
}

impl ControlMessage {
    /// The wire name of this message type.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::SkipWaiting => "skip-waiting",
            ControlMessage::GetVersion => "get-version",
            ControlMessage::ClearCache => "clear-cache",
            ControlMessage::GetCacheStats => "get-cache-stats",
            ControlMessage::PrecacheUrls(_) => "precache-urls",
        }
    }

    /// Every message except `skip-waiting` gets exactly one reply.
    pub fn expects_reply(&self) -> bool {
        !matches!(self, ControlMessage::SkipWaiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_without_payload() {
        let msg: ControlMessage = serde_json::from_str(r#"{"type": "get-cache-stats"}"#).unwrap();
        assert_eq!(msg, ControlMessage::GetCacheStats);
        assert!(msg.expects_reply());
    }

    #[test]
    fn test_deserialize_precache_urls() {
        let json = r#"{"type": "precache-urls", "payload": {"urls": ["/a.css", "/b.js"]}}"#;
        let msg: ControlMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ControlMessage::PrecacheUrls(PrecachePayload {
                urls: vec!["/a.css".to_string(), "/b.js".to_string()],
            })
        );
    }

    #[test]
    fn test_deserialize_screaming_alias() {
        let msg: ControlMessage = serde_json::from_str(r#"{"type": "SKIP_WAITING"}"#).unwrap();
        assert_eq!(msg, ControlMessage::SkipWaiting);
        assert!(!msg.expects_reply());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<ControlMessage, _> = serde_json::from_str(r#"{"type": "reboot"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_kind_matches_wire_name() {
        let msg = ControlMessage::ClearCache;
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], msg.kind());
    }
}
