use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw conversation transcript item, used to resume the session across
/// processing stages. Append-only; never mutated after being pushed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ConversationMessage {
    User {
        content: String,
    },

    Assistant {
        content: Vec<AssistantContent>,
    },

    Tool {
        content: Vec<ToolResultContent>,
    },
}

/// Content part of an in-flight or finalized assistant message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AssistantContent {
    Text {
        text: String,
    },

    ToolCall {
        tool_call_id: String,
        tool_name: String,
        args: Value,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultContent {
    pub tool_call_id: String,
    pub tool_name: String,
    pub result: Value,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User { content: content.into() }
    }

    pub fn assistant(content: Vec<AssistantContent>) -> Self {
        Self::Assistant { content }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        result: Value,
    ) -> Self {
        Self::Tool {
            content: vec![ToolResultContent {
                tool_call_id: tool_call_id.into(),
                tool_name: tool_name.into(),
                result,
            }],
        }
    }

    pub fn role(&self) -> &str {
        match self {
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }
}
