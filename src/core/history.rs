//! In-memory conversation history for one session.
//!
//! The history is sent verbatim to the model server on every turn, so
//! insertion order is the chronological dialogue. After seeding, the first
//! entry is always the persona's system prompt.

use crate::api::ChatMessage;
use crate::core::message::{Message, Role};
use crate::core::persona::PersonaAssets;

#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the history with the first-launch seed:
    /// system prompt, moderator note, and the init prompt.
    pub fn seed(&mut self, assets: &PersonaAssets) {
        self.messages = Self::seeded(assets, &assets.user_init);
    }

    /// Replace the history with the new-chat seed:
    /// system prompt, moderator note, and the reset prompt.
    pub fn reset(&mut self, assets: &PersonaAssets) {
        self.messages = Self::seeded(assets, &assets.user_reset);
    }

    fn seeded(assets: &PersonaAssets, user_prompt: &str) -> Vec<Message> {
        vec![
            Message::system(assets.system_prompt.clone()),
            Message::assistant(assets.init_mod_message.clone()),
            Message::user(user_prompt.to_string()),
        ]
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn starts_with_system(&self) -> bool {
        self.messages
            .first()
            .map(|message| message.role == Role::System)
            .unwrap_or(false)
    }

    pub fn to_api_messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(ChatMessage::from).collect()
    }
}
