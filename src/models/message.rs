use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::ModelError;
use crate::security::validation::{self, MAX_MESSAGE_LEN};

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Message {
    pub message_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub message_text: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build a message from raw text: sanitize, reject anything the
    /// injection guards flag, enforce the length ceiling.
    pub fn new(from_user_id: Uuid, to_user_id: Uuid, text: &str) -> Result<Self, ModelError> {
        if from_user_id == to_user_id {
            return Err(ModelError::SelfMessage);
        }
        if text.chars().count() > MAX_MESSAGE_LEN {
            return Err(ModelError::MessageTooLong);
        }

        let cleaned = validation::security_clean(text);
        if cleaned.is_empty() {
            return Err(ModelError::EmptyMessageText);
        }
        if cleaned.chars().count() > MAX_MESSAGE_LEN {
            return Err(ModelError::MessageTooLong);
        }

        Ok(Self {
            message_id: Uuid::new_v4(),
            from_user_id,
            to_user_id,
            message_text: cleaned,
            is_read: false,
            created_at: Utc::now(),
        })
    }

    pub fn is_valid(&self) -> bool {
        !self.message_id.is_nil()
            && !self.from_user_id.is_nil()
            && !self.to_user_id.is_nil()
            && self.from_user_id != self.to_user_id
            && validation::message_text_valid(&self.message_text)
    }
}

/// Message joined with both participant logins, the read model for every
/// listing endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MessageWithLogins {
    pub message_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub from_login: String,
    pub to_login: String,
    pub message_text: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub to_login: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub message_ids: Option<Vec<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn new_sanitizes_and_validates() {
        let (from, to) = pair();
        let msg = Message::new(from, to, "  hello\nworld  ").unwrap();
        assert_eq!(msg.message_text, "hello world");
        assert!(!msg.is_read);
        assert!(msg.is_valid());
    }

    #[test]
    fn self_send_is_rejected() {
        let id = Uuid::new_v4();
        assert_eq!(Message::new(id, id, "hi"), Err(ModelError::SelfMessage));
    }

    #[test]
    fn length_boundaries_after_sanitization() {
        let (from, to) = pair();
        assert!(Message::new(from, to, "a").is_ok());
        assert!(Message::new(from, to, &"a".repeat(MAX_MESSAGE_LEN)).is_ok());
        assert_eq!(
            Message::new(from, to, ""),
            Err(ModelError::EmptyMessageText)
        );
        assert_eq!(
            Message::new(from, to, &"a".repeat(MAX_MESSAGE_LEN + 1)),
            Err(ModelError::MessageTooLong)
        );
    }

    #[test]
    fn flagged_text_is_rejected_as_empty() {
        let (from, to) = pair();
        assert_eq!(
            Message::new(from, to, "<script>alert(1)</script>"),
            Err(ModelError::EmptyMessageText)
        );
        assert_eq!(
            Message::new(from, to, "   \n\t  "),
            Err(ModelError::EmptyMessageText)
        );
    }

    #[test]
    fn joined_view_serializes_every_field() {
        let (from, to) = pair();
        let now = Utc::now();
        let view = MessageWithLogins {
            message_id: Uuid::new_v4(),
            from_user_id: from,
            to_user_id: to,
            from_login: "alice".into(),
            to_login: "bob".into(),
            message_text: "hi".into(),
            is_read: false,
            created_at: now,
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["from_login"], "alice");
        assert_eq!(value["to_login"], "bob");
        assert_eq!(value["message_text"], "hi");
        assert_eq!(value["is_read"], false);
    }
}
