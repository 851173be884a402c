//! Message adapter - convert envelope messages to the provider wire format

use crate::types::ChatMessage;
use serde_json::{Value, json};

/// Adapter for converting envelope messages to the wire shape.
///
/// Ollama and OpenAI-compatible chat APIs both take role/content objects, so
/// one conversion serves every client.
pub struct MessageAdapter;

impl MessageAdapter {
    /// Returns: [{"role": "...", "content": "..."}]
    pub fn to_wire_format(messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.as_str(),
                    "content": msg.content.clone()
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    #[test]
    fn wire_format_preserves_order_and_roles() {
        let messages = vec![
            ChatMessage::new(MessageRole::System, "be brief"),
            ChatMessage::new(MessageRole::User, "hi"),
        ];
        let formatted = MessageAdapter::to_wire_format(&messages);
        assert_eq!(formatted[0]["role"], "system");
        assert_eq!(formatted[1]["content"], "hi");
    }
}
