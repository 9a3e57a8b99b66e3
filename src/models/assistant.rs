//! Reading assistant conversation types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Speaker of a conversation turn. Clients cannot inject system turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[validate(length(min = 1, max = 4000, message = "Message must be between 1 and 4000 characters"))]
    pub content: String,
}

/// Conversation so far, oldest turn first
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 50, message = "Conversation must hold 1 to 50 messages"), nested)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatReply {
    pub reply: String,
    pub model: String,
    /// Books included in the catalog snapshot
    pub catalog_size: usize,
}
