//! Prompt assembly for the chat endpoint.

use crate::conversation::Exchange;
use crate::provider::{ChatMessage, Role};

/// System instruction sent at the start of every chat prompt.
pub const TELUGU_ASSISTANT_PROMPT: &str = "You are a helpful Telugu AI assistant. Always respond in Telugu (తెలుగు). Be friendly, helpful, and natural. Use colloquial Telugu when appropriate. Provide direct answers without unnecessary formalities.";

/// Build the ordered message list for a completion call.
///
/// Layout: system instruction, then a user/assistant pair per exchange in
/// `history` (oldest first), then the new question. Callers pass the
/// already-windowed history from [`ConversationStore::get_recent`].
///
/// [`ConversationStore::get_recent`]: crate::conversation::ConversationStore::get_recent
pub fn build_messages(system: &str, history: &[Exchange], question: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::new(Role::System, system));

    for exchange in history {
        messages.push(ChatMessage::new(Role::User, &exchange.user_question));
        messages.push(ChatMessage::new(Role::Assistant, &exchange.assistant_response));
    }

    messages.push(ChatMessage::new(Role::User, question));
    messages
}
