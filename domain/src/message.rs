//! Outbound message entities

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One part of an outbound message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentPart {
    /// Plain text.
    Text { text: String },
    /// An inline image, base64-encoded.
    Image {
        #[serde(rename = "mediaType")]
        media_type: String,
        data: String,
    },
}

/// A message travelling from the input loop to the agent service.
///
/// Created by the input loop, owned exclusively by the bridge queue until the
/// outbound transport feed pulls it, and immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl OutboundMessage {
    /// Creates a user message with a single text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::Text { text: text.into() }],
            session_id: None,
        }
    }

    /// Attach the session id once it is known.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Concatenated text of all text parts (used for history records).
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for part in &self.content {
            if let ContentPart::Text { text } = part {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_constructor_builds_user_message() {
        let msg = OutboundMessage::text("hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(
            msg.content,
            vec![ContentPart::Text {
                text: "hello".to_string()
            }]
        );
        assert!(msg.session_id.is_none());
    }

    #[test]
    fn with_session_attaches_id() {
        let msg = OutboundMessage::text("hi").with_session("sess-1");
        assert_eq!(msg.session_id.as_deref(), Some("sess-1"));
    }

    #[test]
    fn plain_text_skips_image_parts() {
        let msg = OutboundMessage {
            role: Role::User,
            content: vec![
                ContentPart::Text {
                    text: "before".to_string(),
                },
                ContentPart::Image {
                    media_type: "image/png".to_string(),
                    data: "aGVsbG8=".to_string(),
                },
                ContentPart::Text {
                    text: "after".to_string(),
                },
            ],
            session_id: None,
        };
        assert_eq!(msg.plain_text(), "before\nafter");
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let msg = OutboundMessage::text("hi").with_session("s");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["sessionId"], "s");
        assert_eq!(json["content"][0]["kind"], "text");
    }
}
