use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

pub const DEFAULT_USERNAME: &str = "Anonymous";

/// A user submission, as carried in a datagram and stored on disk.
///
/// On the wire `message` is required and no other fields are allowed;
/// a missing `username` falls back to [`DEFAULT_USERNAME`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Message {
    #[serde(default)]
    pub username: String,
    pub message: String,
}

impl Message {
    /// Builds a message from optional form fields, filling in defaults.
    pub fn new(username: Option<String>, message: Option<String>) -> Self {
        Self {
            username: username.unwrap_or_default(),
            message: message.unwrap_or_default(),
        }
        .normalized()
    }

    fn normalized(mut self) -> Self {
        if self.username.is_empty() {
            self.username = DEFAULT_USERNAME.to_string();
        }
        self
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes a datagram payload: a UTF-8 JSON object with a string
    /// `message` and an optional string `username`.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(payload)?;
        // Structs also deserialize from JSON arrays, so insist on an object first.
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;
        let message: Message = serde_json::from_value(serde_json::Value::Object(object))?;
        Ok(message.normalized())
    }
}

/// A message as persisted by the store, keyed by its ISO-8601 timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: String,
    pub message: Message,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_missing_and_empty_username() {
        assert_eq!(Message::new(None, None).username, "Anonymous");
        assert_eq!(Message::new(Some(String::new()), None).username, "Anonymous");
        assert_eq!(Message::new(None, None).message, "");

        let msg = Message::new(Some("olena".into()), Some("привіт".into()));
        assert_eq!(msg.username, "olena");
        assert_eq!(msg.message, "привіт");
    }

    #[test]
    fn decode_accepts_wire_payload() {
        let msg = Message::decode(br#"{"username":"bob","message":"hi"}"#).unwrap();
        assert_eq!(msg, Message::new(Some("bob".into()), Some("hi".into())));
    }

    #[test]
    fn decode_defaults_missing_username() {
        let msg = Message::decode(br#"{"message":"no name"}"#).unwrap();
        assert_eq!(msg.username, "Anonymous");
        assert_eq!(msg.message, "no name");
    }

    #[test]
    fn decode_rejects_malformed_payloads() {
        assert!(matches!(
            Message::decode(b"not json"),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            Message::decode(br#"["username","message"]"#),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            Message::decode(br#"{"username":42,"message":"x"}"#),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(Message::decode(b"{}"), Err(DecodeError::Json(_))));
        assert!(matches!(
            Message::decode(br#"{"foo":1}"#),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            Message::decode(br#"{"username":"a","message":"b","extra":true}"#),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            Message::decode(&[0xff, 0xfe, 0x7b]),
            Err(DecodeError::Utf8(_))
        ));
    }

    #[test]
    fn encode_produces_both_fields() {
        let bytes = Message::new(None, Some("x".into())).encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["username"], "Anonymous");
        assert_eq!(value["message"], "x");
    }
}
