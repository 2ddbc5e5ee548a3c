use brook_streaming::{OptimisticJsonParser, ParseResult};
use brook_types::ToolName;
use serde_json::Value;
use std::collections::HashMap;

/// Accumulated state for one tool call while its arguments stream.
///
/// Owned exclusively by the tracker; destroyed when the matching
/// tool-result is processed.
#[derive(Debug)]
pub struct ToolCallState {
    pub call_id: String,
    pub tool: ToolName,
    pub raw_tool_name: String,
    pub raw_args_text: String,
    pub parsed_args: Value,
    /// Streamed `files` array index → realized record id
    pub file_slots: Vec<Option<String>>,
}

impl ToolCallState {
    fn new(call_id: String, raw_tool_name: String) -> Self {
        let tool = ToolName::parse(&raw_tool_name);
        Self {
            call_id,
            tool,
            raw_tool_name,
            raw_args_text: String::new(),
            parsed_args: Value::Object(Default::default()),
            file_slots: Vec::new(),
        }
    }

    /// Append an argument fragment and re-run the optimistic parser
    pub fn append_delta(&mut self, delta: &str) -> ParseResult {
        self.raw_args_text.push_str(delta);
        let result = OptimisticJsonParser::parse(&self.raw_args_text);
        if result.parsed.is_object() {
            self.parsed_args = result.parsed.clone();
        }
        result
    }
}

/// Per-call lifecycle tracking for tool calls in flight
#[derive(Debug, Default)]
pub struct ToolCallTracker {
    calls: HashMap<String, ToolCallState>,
}

impl ToolCallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a streaming tool call; re-registration is a no-op so that
    /// replayed events do not reset accumulated argument text
    pub fn start(&mut self, call_id: &str, raw_tool_name: &str) -> &mut ToolCallState {
        self.calls
            .entry(call_id.to_string())
            .or_insert_with(|| ToolCallState::new(call_id.to_string(), raw_tool_name.to_string()))
    }

    pub fn get(&self, call_id: &str) -> Option<&ToolCallState> {
        self.calls.get(call_id)
    }

    pub fn get_mut(&mut self, call_id: &str) -> Option<&mut ToolCallState> {
        self.calls.get_mut(call_id)
    }

    pub fn remove(&mut self, call_id: &str) -> Option<ToolCallState> {
        self.calls.remove(call_id)
    }
}
