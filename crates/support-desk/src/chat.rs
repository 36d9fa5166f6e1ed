//! Conversation entries as clients send them.
//!
//! The browser client sends `{ "user": "You" | "AI", "message": ... }` while API callers tend
//! to use `{ "role": ..., "content": ... }`. Both shapes are accepted, and any extra fields
//! (client-side ids and the like) are kept, so a stored history reads back with the same
//! sender, text and extra fields it was sent with. Explicit `null` values for the four known
//! fields are not kept: they read back as absent keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::llm::{ModelTurn, TurnRole};

/// Sender markers that identify a model-authored entry.
const MODEL_SENDERS: &[&str] = &["AI", "assistant"];
/// Sender markers that identify a human-authored entry.
const HUMAN_SENDERS: &[&str] = &["You", "user"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatEntry {
    pub fn from_user(text: impl Into<String>) -> Self {
        Self {
            user: Some("You".to_string()),
            message: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn from_assistant(text: impl Into<String>) -> Self {
        Self {
            user: Some("AI".to_string()),
            message: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_role(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// `user` wins over `role`; empty strings count as absent.
    pub fn sender(&self) -> Option<&str> {
        non_empty(&self.user).or_else(|| non_empty(&self.role))
    }

    /// `message` wins over `content`; empty strings count as absent.
    pub fn text(&self) -> Option<&str> {
        non_empty(&self.message).or_else(|| non_empty(&self.content))
    }

    pub fn is_model_authored(&self) -> bool {
        self.sender().is_some_and(|s| MODEL_SENDERS.contains(&s))
    }

    pub fn is_human_authored(&self) -> bool {
        self.sender().is_some_and(|s| HUMAN_SENDERS.contains(&s))
    }

    pub fn to_model_turn(&self) -> ModelTurn {
        let role = if self.is_model_authored() { TurnRole::Model } else { TurnRole::User };
        ModelTurn::new(role, self.text().unwrap_or_default())
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Convert a client history into the model's turn format, preserving order.
pub fn to_model_turns(history: &[ChatEntry]) -> Vec<ModelTurn> {
    history.iter().map(ChatEntry::to_model_turn).collect()
}

/// Text of the first human-authored entry, if any.
pub fn first_human_text(history: &[ChatEntry]) -> Option<&str> {
    history
        .iter()
        .filter(|entry| entry.is_human_authored())
        .find_map(ChatEntry::text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn accepts_both_client_shapes() {
        let history: Vec<ChatEntry> = serde_json::from_value(json!([
            { "user": "You", "message": "How do I return an item?" },
            { "role": "assistant", "content": "Within 30 days." }
        ]))
        .unwrap();

        assert_eq!(history[0].sender(), Some("You"));
        assert_eq!(history[0].text(), Some("How do I return an item?"));
        assert_eq!(history[1].sender(), Some("assistant"));
        assert_eq!(history[1].text(), Some("Within 30 days."));
    }

    #[test]
    fn user_field_takes_precedence_over_role() {
        let entry = ChatEntry {
            user: Some("AI".into()),
            role: Some("user".into()),
            message: Some("hi".into()),
            ..Default::default()
        };
        assert!(entry.is_model_authored());
        assert!(!entry.is_human_authored());
    }

    #[test]
    fn maps_senders_to_turn_roles() {
        let history = vec![
            ChatEntry::from_assistant("Hello!"),
            ChatEntry::from_user("Where is my parcel?"),
            ChatEntry::with_role("assistant", "Let me check."),
            ChatEntry::with_role("system-ish", "odd sender"),
        ];
        let turns = to_model_turns(&history);

        let roles: Vec<TurnRole> = turns.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![TurnRole::Model, TurnRole::User, TurnRole::Model, TurnRole::User]);
        assert_eq!(turns[1].text, "Where is my parcel?");
    }

    #[test]
    fn missing_text_becomes_empty_turn() {
        let entry = ChatEntry { user: Some("You".into()), ..Default::default() };
        assert_eq!(entry.to_model_turn().text, "");
    }

    #[test]
    fn first_human_text_skips_model_entries() {
        let history = vec![
            ChatEntry::from_assistant("Hello!"),
            ChatEntry::from_user("first question"),
            ChatEntry::from_user("second question"),
        ];
        assert_eq!(first_human_text(&history), Some("first question"));
        assert_eq!(first_human_text(&history[..1]), None);
    }

    #[test]
    fn extra_client_fields_round_trip() {
        let raw = json!({ "user": "AI", "message": "Hi", "id": 1712, "fullResponse": "Hi there" });
        let entry: ChatEntry = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(entry.extra.get("id"), Some(&json!(1712)));
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn explicit_nulls_on_known_fields_read_back_as_absent() {
        let raw = json!({ "user": "You", "message": "hi", "role": null, "content": null, "id": null });
        let entry: ChatEntry = serde_json::from_value(raw).unwrap();

        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({ "user": "You", "message": "hi", "id": null })
        );
    }

    proptest! {
        #[test]
        fn history_round_trips_through_json(
            entries in prop::collection::vec(("[A-Za-z]{1,10}", ".{0,40}", any::<bool>()), 0..8)
        ) {
            let history: Vec<ChatEntry> = entries
                .into_iter()
                .map(|(sender, text, role_shape)| {
                    if role_shape {
                        ChatEntry::with_role(&sender, text)
                    } else {
                        ChatEntry { user: Some(sender), message: Some(text), ..Default::default() }
                    }
                })
                .collect();

            let encoded = serde_json::to_string(&history).unwrap();
            let decoded: Vec<ChatEntry> = serde_json::from_str(&encoded).unwrap();
            prop_assert_eq!(decoded, history);
        }
    }
}
