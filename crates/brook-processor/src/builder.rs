use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use brook_persist::{PersistenceGateway, SessionSaver, DEFAULT_QUEUE_DEPTH};
use brook_types::{ConversationMessage, ReasoningEntry, ResponseEntry};

use crate::file_selection::{DashboardContext, FileSelection};
use crate::processor::ChunkProcessor;
use crate::tracker::ToolCallTracker;

/// Fluent construction of a [`ChunkProcessor`].
///
/// Prior transcript and logs support cross-stage continuation; the allow
/// list and dashboard context are plain data fixed for the session.
/// Persistence is enabled by supplying both a gateway and a session id
/// (the saver spawns its writer task, so `build` must run inside a tokio
/// runtime in that case).
pub struct ChunkProcessorBuilder {
    session_id: Option<String>,
    gateway: Option<Arc<dyn PersistenceGateway>>,
    queue_depth: usize,
    initial_transcript: Vec<ConversationMessage>,
    initial_reasoning: Vec<ReasoningEntry>,
    initial_response: Vec<ResponseEntry>,
    allowed_tools: Option<HashSet<String>>,
    dashboard_context: Vec<DashboardContext>,
    session_start: Option<Instant>,
}

impl ChunkProcessorBuilder {
    pub fn new() -> Self {
        Self {
            session_id: None,
            gateway: None,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            initial_transcript: Vec::new(),
            initial_reasoning: Vec::new(),
            initial_response: Vec::new(),
            allowed_tools: None,
            dashboard_context: Vec::new(),
            session_start: None,
        }
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn gateway(mut self, gateway: Arc<dyn PersistenceGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    pub fn initial_transcript(mut self, transcript: Vec<ConversationMessage>) -> Self {
        self.initial_transcript = transcript;
        self
    }

    pub fn initial_reasoning(mut self, reasoning: Vec<ReasoningEntry>) -> Self {
        self.initial_reasoning = reasoning;
        self
    }

    pub fn initial_response(mut self, response: Vec<ResponseEntry>) -> Self {
        self.initial_response = response;
        self
    }

    /// Restrict projection to these tool names; unset means all tools
    pub fn allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn dashboard_context(mut self, context: Vec<DashboardContext>) -> Self {
        self.dashboard_context = context;
        self
    }

    /// Explicit session start for elapsed-time formatting; defaults to now
    pub fn session_start(mut self, start: Instant) -> Self {
        self.session_start = Some(start);
        self
    }

    pub fn build(self) -> ChunkProcessor {
        let saver = match (self.gateway, self.session_id) {
            (Some(gateway), Some(session_id)) => Some(SessionSaver::with_queue_depth(
                gateway,
                session_id,
                self.queue_depth,
            )),
            _ => None,
        };

        ChunkProcessor {
            saver,
            transcript: self.initial_transcript,
            current_assistant: None,
            tracker: ToolCallTracker::new(),
            reasoning: self.initial_reasoning,
            response: self.initial_response,
            allowed_tools: self.allowed_tools,
            dashboard_context: self.dashboard_context,
            selection: FileSelection::default(),
            file_entries_inserted: false,
            done_call_id: None,
            has_finishing_tool: false,
            finishing_tool_name: None,
            terminal_summary: None,
            session_start: self.session_start.unwrap_or_else(Instant::now),
            last_completion: None,
            sql_started: Default::default(),
            last_save: None,
        }
    }
}

impl Default for ChunkProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
