//! Conversation types and state management

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Fortune-telling style picked from the quick-reply menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Horoscope,
    Saju,
    Tarot,
}

impl Topic {
    /// Menu order
    pub const ALL: [Topic; 3] = [Topic::Horoscope, Topic::Saju, Topic::Tarot];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Horoscope => "horoscope",
            Topic::Saju => "saju",
            Topic::Tarot => "tarot",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Topic::Horoscope => "✨",
            Topic::Saju => "🎋",
            Topic::Tarot => "🎯",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown topic: {0}")]
pub struct UnknownTopic(pub String);

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "horoscope" => Ok(Topic::Horoscope),
            "saju" => Ok(Topic::Saju),
            "tarot" => Ok(Topic::Tarot),
            _ => Err(UnknownTopic(s.to_string())),
        }
    }
}

/// Per-session conversation state.
///
/// `messages` always starts with the assistant greeting and only ever grows.
/// `show_options` starts true and flips to false for good once the user
/// picks a topic or sends free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
    show_options: bool,
    waiting_for_input: bool,
    selected_topic: Option<Topic>,
}

impl ConversationState {
    pub fn new(greeting: &str) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            show_options: true,
            waiting_for_input: false,
            selected_topic: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn show_options(&self) -> bool {
        self.show_options
    }

    pub fn waiting_for_input(&self) -> bool {
        self.waiting_for_input
    }

    pub fn selected_topic(&self) -> Option<Topic> {
        self.selected_topic
    }

    pub fn last_message(&self) -> &Message {
        // never empty: seeded with the greeting
        &self.messages[self.messages.len() - 1]
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn choose_topic(&mut self, topic: Topic) {
        self.selected_topic = Some(topic);
        self.close_options();
    }

    pub(crate) fn close_options(&mut self) {
        self.show_options = false;
        self.waiting_for_input = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_seeded() {
        let state = ConversationState::new("hello");
        assert_eq!(state.messages(), &[Message::assistant("hello")]);
        assert!(state.show_options());
        assert!(!state.waiting_for_input());
        assert!(state.selected_topic().is_none());
    }

    #[test]
    fn test_topic_parsing() {
        assert_eq!("Tarot".parse::<Topic>().unwrap(), Topic::Tarot);
        assert_eq!(" saju ".parse::<Topic>().unwrap(), Topic::Saju);
        assert!("palmistry".parse::<Topic>().is_err());
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
