//! In-memory conversation

use crate::provider::{ChatRequest, Message, Role};
use crate::tools::ToolSpec;
use uuid::Uuid;

/// The live exchange: tool set, optional system instructions and history
#[derive(Debug, Clone)]
pub struct Conversation {
    id: Uuid,
    tools: Vec<ToolSpec>,
    instructions: Option<String>,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(tools: Vec<ToolSpec>, instructions: Option<String>) -> Self {
        let messages = instructions
            .iter()
            .map(|text| Message::system(text.clone()))
            .collect();

        Self {
            id: Uuid::new_v4(),
            tools,
            instructions,
            messages,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
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

    /// Number of operator messages so far
    pub fn user_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drop every message after the first `len`
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    /// Snapshot of the conversation as a provider request
    pub fn request(&self) -> ChatRequest {
        ChatRequest {
            messages: self.messages.clone(),
            tools: self.tools.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_become_system_message() {
        let conv = Conversation::new(Vec::new(), Some("Work in small commits.".to_string()));
        assert_eq!(conv.messages(), &[Message::system("Work in small commits.")]);
        assert_eq!(conv.user_turns(), 0);

        let bare = Conversation::new(Vec::new(), None);
        assert!(bare.is_empty());
    }

    #[test]
    fn test_truncate_rolls_back() {
        let mut conv = Conversation::new(vec![ToolSpec::new("git_status", "status")], None);
        conv.push(Message::user("first"));
        conv.push(Message::assistant("ok", Vec::new()));
        let checkpoint = conv.len();

        conv.push(Message::user("second"));
        conv.truncate(checkpoint);

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.user_turns(), 1);
        assert_eq!(conv.request().tools.len(), 1);
    }

    #[test]
    fn test_each_conversation_has_own_id() {
        assert_ne!(Conversation::new(Vec::new(), None).id(), Conversation::new(Vec::new(), None).id());
    }
}
