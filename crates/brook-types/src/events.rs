use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One chunk of an LLM tool-calling stream, as delivered by the upstream
/// provider adapter. Consumed exactly once, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    /// Plain assistant text (streamed token-by-token)
    TextDelta {
        delta: String,
    },

    /// A tool call has started streaming; arguments follow as deltas
    ToolCallStreamingStart {
        tool_call_id: String,
        tool_name: String,
    },

    /// A fragment of the tool call's JSON argument text
    ToolCallDelta {
        tool_call_id: String,
        args_text_delta: String,
    },

    /// The tool call is complete; `args` is the authoritative argument object
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        args: Value,
    },

    /// The tool finished executing
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        result: Value,
    },

    /// One agent step finished (more steps may follow)
    StepFinish,

    /// The stream is done
    Finish,
}

impl StreamEvent {
    /// Event tag as it appears on the wire, used for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextDelta { .. } => "text-delta",
            Self::ToolCallStreamingStart { .. } => "tool-call-streaming-start",
            Self::ToolCallDelta { .. } => "tool-call-delta",
            Self::ToolCall { .. } => "tool-call",
            Self::ToolResult { .. } => "tool-result",
            Self::StepFinish => "step-finish",
            Self::Finish => "finish",
        }
    }
}
