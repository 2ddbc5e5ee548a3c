use anyhow::Result;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use brook_persist::{PersistError, SessionSaver, SessionSnapshot};
use brook_streaming::{optimistic_array, OptimisticJsonParser, ParseResult};
use brook_types::{
    determine_tool_status, AssistantContent, ConversationMessage, EntryStatus, ReasoningEntry,
    ResponseEntry, StreamEvent, ToolName,
};

use crate::builder::ChunkProcessorBuilder;
use crate::file_selection::{self, DashboardContext, FileSelection};
use crate::reasoning;
use crate::response;
use crate::timing;
use crate::tracker::ToolCallTracker;

/// Minimum spacing between opportunistic saves on the hot event path
const SAVE_THROTTLE: Duration = Duration::from_millis(250);

/// Stateful aggregator over one LLM tool-calling session's event stream.
///
/// Consumes [`StreamEvent`]s one at a time and projects them into the
/// reasoning trace, the response log and the raw conversation transcript.
/// The processor is the sole owner of all mutable state; the only async
/// boundary is the injected persistence gateway behind a bounded,
/// non-blocking save queue. A single bad event never terminates the
/// stream: handler errors are caught at the dispatch boundary and logged.
pub struct ChunkProcessor {
    pub(crate) saver: Option<SessionSaver>,

    pub(crate) transcript: Vec<ConversationMessage>,
    pub(crate) current_assistant: Option<Vec<AssistantContent>>,
    pub(crate) tracker: ToolCallTracker,

    pub(crate) reasoning: Vec<ReasoningEntry>,
    pub(crate) response: Vec<ResponseEntry>,

    pub(crate) allowed_tools: Option<HashSet<String>>,
    pub(crate) dashboard_context: Vec<DashboardContext>,

    pub(crate) selection: FileSelection,
    pub(crate) file_entries_inserted: bool,
    pub(crate) done_call_id: Option<String>,

    pub(crate) has_finishing_tool: bool,
    pub(crate) finishing_tool_name: Option<String>,
    pub(crate) terminal_summary: Option<String>,

    pub(crate) session_start: Instant,
    pub(crate) last_completion: Option<Instant>,
    pub(crate) sql_started: HashMap<String, Instant>,
    pub(crate) last_save: Option<Instant>,
}

impl ChunkProcessor {
    pub fn builder() -> ChunkProcessorBuilder {
        ChunkProcessorBuilder::new()
    }

    /// Process one event to completion. Never fails: handler errors are
    /// logged with the event type attached and the stream continues.
    pub fn process_event(&mut self, event: StreamEvent) {
        let kind = event.kind();
        if let Err(e) = self.dispatch(event) {
            tracing::error!(event_type = kind, error = %e, "error processing stream event");
        }
        self.save_if_due();
    }

    /// Drive the processor from an async event source, then flush.
    pub async fn process_stream<S>(&mut self, stream: S) -> std::result::Result<(), PersistError>
    where
        S: Stream<Item = StreamEvent>,
    {
        futures::pin_mut!(stream);
        while let Some(event) = stream.next().await {
            self.process_event(event);
        }
        self.flush().await
    }

    /// Drain the save queue and perform one final awaited write.
    ///
    /// The terminal state is durable after this returns, even when
    /// intermediate opportunistic saves were dropped.
    pub async fn flush(&mut self) -> std::result::Result<(), PersistError> {
        if let Some(saver) = self.saver.take() {
            let snapshot = self.snapshot();
            if let Err(e) = saver.shutdown(snapshot).await {
                tracing::error!(error = %e, "final session save failed");
                return Err(e);
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, event: StreamEvent) -> Result<()> {
        match event {
            StreamEvent::TextDelta { delta } => self.handle_text_delta(&delta),
            StreamEvent::ToolCallStreamingStart { tool_call_id, tool_name } => {
                self.handle_tool_call_start(&tool_call_id, &tool_name)
            }
            StreamEvent::ToolCallDelta { tool_call_id, args_text_delta } => {
                self.handle_tool_call_delta(&tool_call_id, &args_text_delta)
            }
            StreamEvent::ToolCall { tool_call_id, tool_name, args } => {
                self.handle_tool_call(&tool_call_id, &tool_name, args)
            }
            StreamEvent::ToolResult { tool_call_id, tool_name, result } => {
                self.handle_tool_result(&tool_call_id, &tool_name, result)
            }
            StreamEvent::StepFinish => self.handle_step_finish(),
            StreamEvent::Finish => self.handle_finish(),
        }
    }

    fn handle_text_delta(&mut self, delta: &str) -> Result<()> {
        let content = self.current_assistant.get_or_insert_with(Vec::new);
        if let Some(AssistantContent::Text { text }) = content
            .iter_mut()
            .find(|part| matches!(part, AssistantContent::Text { .. }))
        {
            text.push_str(delta);
        } else {
            content.push(AssistantContent::Text { text: delta.to_string() });
        }
        Ok(())
    }

    fn handle_tool_call_start(&mut self, call_id: &str, raw_name: &str) -> Result<()> {
        self.ensure_transcript_tool_call(call_id, raw_name, Value::Object(Default::default()));
        self.tracker.start(call_id, raw_name);

        if !self.is_tool_allowed(raw_name) {
            tracing::warn!(tool_name = raw_name, "tool not in allow-list, excluded from projection");
            return Ok(());
        }

        let tool = ToolName::parse(raw_name);

        if tool.is_response_tool() {
            if tool == ToolName::Done {
                self.done_call_id = Some(call_id.to_string());
                self.refresh_file_selection();
            }
            if !self.response_entry_exists(call_id) {
                let parse = empty_parse();
                if let Some(entry) = response::create_response_entry(call_id, &tool, &parse) {
                    self.response.push(entry);
                }
            }
        } else if !self.reasoning_entry_exists(call_id) {
            if let Some(entry) = reasoning::initial_entry(call_id, &tool, raw_name) {
                self.reasoning.push(entry);
            }
        }

        if tool.is_workflow_completing() {
            self.terminal_summary =
                Some(timing::format_reasoned_duration(self.session_start.elapsed()));
        }

        Ok(())
    }

    fn handle_tool_call_delta(&mut self, call_id: &str, delta: &str) -> Result<()> {
        let Some(state) = self.tracker.get_mut(call_id) else {
            // Delta for a call we never saw start; tolerated
            return Ok(());
        };
        let parse = state.append_delta(delta);
        let raw_name = state.raw_tool_name.clone();
        let tool = state.tool.clone();

        if parse.parsed.is_object() {
            self.update_transcript_tool_args(call_id, parse.parsed.clone());
        }

        if !self.is_tool_allowed(&raw_name) {
            return Ok(());
        }

        if tool.is_response_tool() {
            if let Some(entry) = find_response_mut(&mut self.response, call_id) {
                response::update_response_entry(entry, &tool, &parse);
            } else if let Some(entry) = response::create_response_entry(call_id, &tool, &parse) {
                self.response.push(entry);
            }
        } else if tool.is_file_tool() {
            self.stream_file_elements(call_id, &tool, &raw_name, &parse);
        } else if let Some(entry) = find_reasoning_mut(&mut self.reasoning, call_id) {
            reasoning::update_entry_optimistic(entry, &tool, &parse);
        } else if let Some(entry) = reasoning::create_entry(call_id, &tool, &raw_name, &parse.parsed) {
            self.reasoning.push(entry);
        }

        Ok(())
    }

    fn handle_tool_call(&mut self, call_id: &str, raw_name: &str, args: Value) -> Result<()> {
        self.ensure_transcript_tool_call(call_id, raw_name, args.clone());
        self.update_transcript_tool_args(call_id, args.clone());
        self.tracker.start(call_id, raw_name).parsed_args = args.clone();

        if !self.is_tool_allowed(raw_name) {
            tracing::warn!(tool_name = raw_name, "tool not in allow-list, excluded from projection");
            return Ok(());
        }

        let tool = ToolName::parse(raw_name);
        // Complete arguments are authoritative; a re-parse of their
        // serialized form yields the full extracted-value map
        let parse = OptimisticJsonParser::parse(&args.to_string());

        if tool.is_response_tool() {
            if tool == ToolName::Done {
                self.done_call_id = Some(call_id.to_string());
                self.refresh_file_selection();
            }
            if let Some(entry) = find_response_mut(&mut self.response, call_id) {
                response::update_response_entry(entry, &tool, &parse);
            } else if let Some(entry) = response::create_response_entry(call_id, &tool, &parse) {
                self.response.push(entry);
            }
        } else if tool.is_file_tool() {
            self.stream_file_elements(call_id, &tool, raw_name, &parse);
        } else if let Some(index) = self.reasoning.iter().position(|e| e.id() == call_id) {
            match &mut self.reasoning[index] {
                // Files-shaped entries (SQL, todo) keep their accumulated
                // records and take final content from the complete args
                entry @ ReasoningEntry::Files(_) => {
                    reasoning::update_entry_optimistic(entry, &tool, &parse);
                }
                entry => {
                    if entry.status() == EntryStatus::Loading {
                        if let Some(new_entry) =
                            reasoning::create_entry(call_id, &tool, raw_name, &args)
                        {
                            self.reasoning[index] = new_entry;
                        }
                    }
                }
            }
        } else if let Some(entry) = reasoning::create_entry(call_id, &tool, raw_name, &args) {
            self.reasoning.push(entry);
        }

        if tool.is_finishing_tool() {
            self.has_finishing_tool = true;
            self.finishing_tool_name = Some(raw_name.to_string());
            if tool.is_workflow_completing() {
                self.terminal_summary =
                    Some(timing::format_reasoned_duration(self.session_start.elapsed()));
            }
        }

        if tool == ToolName::ExecuteSql {
            self.sql_started.insert(call_id.to_string(), Instant::now());
        }

        Ok(())
    }

    fn handle_tool_result(&mut self, call_id: &str, raw_name: &str, result: Value) -> Result<()> {
        self.finalize_assistant_message();
        self.transcript
            .push(ConversationMessage::tool_result(call_id, raw_name, result.clone()));

        if !self.is_tool_allowed(raw_name) {
            tracing::warn!(
                tool_name = raw_name,
                "tool result recorded in transcript but excluded from projection"
            );
            self.tracker.remove(call_id);
            return Ok(());
        }

        let tool = ToolName::parse(raw_name);
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_completion.unwrap_or(self.session_start));
        self.last_completion = Some(now);
        let status = determine_tool_status(&result);

        if tool == ToolName::ExecuteSql {
            let secondary = self
                .sql_started
                .remove(call_id)
                .map(|start| timing::format_elapsed(start.elapsed()));
            let results_id = format!("{call_id}-results");
            if self.reasoning_entry_exists(call_id) && !self.reasoning_entry_exists(&results_id) {
                self.reasoning
                    .push(reasoning::sql_results_entry(call_id, &result, secondary));
            }
        }

        let mut file_summary = None;
        if let Some(operation) = tool.file_operation() {
            if let Some(files) =
                find_reasoning_mut(&mut self.reasoning, call_id).and_then(|e| e.as_files_mut())
            {
                file_summary =
                    Some(crate::identity::resolve_file_identities(files, operation, &result));
            }
        }

        if let Some(entry) = find_reasoning_mut(&mut self.reasoning, call_id) {
            entry.advance_status(status);
            entry.set_secondary_title(timing::format_elapsed(elapsed));

            if let Some(summary) = file_summary {
                if let Some(title) = reasoning::file_result_title(&tool, summary) {
                    entry.set_title(title);
                }
            } else {
                reasoning::set_record_statuses(entry, status);
                if let Some(title) = reasoning::completion_title(entry, &tool) {
                    entry.set_title(title);
                }
            }
        }

        if tool.is_file_tool() {
            self.refresh_file_selection();
        }

        self.tracker.remove(call_id);
        self.save_opportunistic();
        Ok(())
    }

    fn handle_step_finish(&mut self) -> Result<()> {
        self.finalize_assistant_message();
        self.save_opportunistic();
        Ok(())
    }

    fn handle_finish(&mut self) -> Result<()> {
        self.finalize_assistant_message();
        self.save_opportunistic();
        Ok(())
    }

    /// Realize streamed `files` array elements into the call's entry
    fn stream_file_elements(
        &mut self,
        call_id: &str,
        tool: &ToolName,
        raw_name: &str,
        parse: &ParseResult,
    ) {
        if !self.reasoning_entry_exists(call_id) {
            if let Some(entry) = reasoning::initial_entry(call_id, tool, raw_name) {
                self.reasoning.push(entry);
            }
        }

        let Some(elements) = optimistic_array(&parse.extracted_values, "files").cloned() else {
            return;
        };
        let Some(state) = self.tracker.get_mut(call_id) else { return };
        if let Some(files) =
            find_reasoning_mut(&mut self.reasoning, call_id).and_then(|e| e.as_files_mut())
        {
            reasoning::stream_file_records(files, tool, &mut state.file_slots, &elements);
        }
    }

    /// Recompute the surfaced-file set; bump the version on change and,
    /// when a terminating tool has already been observed, materialize the
    /// deferred file response entries.
    fn refresh_file_selection(&mut self) {
        let extracted = file_selection::extract_files(&self.reasoning);
        let selected = file_selection::select_files(&extracted, &self.dashboard_context);

        if selected != self.selection.files {
            self.selection = FileSelection {
                files: selected,
                version: self.selection.version + 1,
            };
        }

        if self.done_call_id.is_some() {
            self.insert_file_entries();
        }
    }

    /// Insert file response entries exactly once, before the terminating
    /// tool's text entry.
    fn insert_file_entries(&mut self) {
        if self.file_entries_inserted || self.selection.files.is_empty() {
            return;
        }

        let insert_at = self
            .done_call_id
            .as_deref()
            .and_then(|id| self.response.iter().position(|e| e.id() == id))
            .unwrap_or(0);

        for (offset, entry) in response::file_response_entries(&self.selection.files)
            .into_iter()
            .enumerate()
        {
            self.response.insert(insert_at + offset, entry);
        }
        self.file_entries_inserted = true;
    }

    fn ensure_transcript_tool_call(&mut self, call_id: &str, raw_name: &str, args: Value) {
        let content = self.current_assistant.get_or_insert_with(Vec::new);
        let exists = content.iter().any(|part| {
            matches!(part, AssistantContent::ToolCall { tool_call_id, .. } if tool_call_id == call_id)
        });
        if !exists {
            content.push(AssistantContent::ToolCall {
                tool_call_id: call_id.to_string(),
                tool_name: raw_name.to_string(),
                args,
            });
        }
    }

    fn update_transcript_tool_args(&mut self, call_id: &str, new_args: Value) {
        if let Some(content) = self.current_assistant.as_mut() {
            for part in content.iter_mut() {
                if let AssistantContent::ToolCall { tool_call_id, args, .. } = part {
                    if tool_call_id == call_id {
                        *args = new_args;
                        return;
                    }
                }
            }
        }
    }

    fn finalize_assistant_message(&mut self) {
        if let Some(content) = self.current_assistant.take() {
            if !content.is_empty() {
                self.transcript.push(ConversationMessage::Assistant { content });
            }
        }
    }

    fn is_tool_allowed(&self, raw_name: &str) -> bool {
        self.allowed_tools
            .as_ref()
            .map_or(true, |allowed| allowed.contains(raw_name))
    }

    fn reasoning_entry_exists(&self, id: &str) -> bool {
        self.reasoning.iter().any(|e| e.id() == id)
    }

    fn response_entry_exists(&self, id: &str) -> bool {
        self.response.iter().any(|e| e.id() == id)
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            transcript: self.transcript(),
            reasoning: self.reasoning.clone(),
            response: self.response.clone(),
            terminal_summary: self.terminal_summary.clone(),
        }
    }

    fn save_if_due(&mut self) {
        let due = self
            .last_save
            .map_or(true, |last| last.elapsed() >= SAVE_THROTTLE);
        if due {
            self.save_opportunistic();
        }
    }

    fn save_opportunistic(&mut self) {
        if self.saver.is_none() || (self.transcript.is_empty() && self.current_assistant.is_none()) {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(saver) = &self.saver {
            saver.try_save(snapshot);
            self.last_save = Some(Instant::now());
        }
    }

    // ---- pull-based accessors -------------------------------------------

    /// Full transcript, including the in-progress assistant message
    pub fn transcript(&self) -> Vec<ConversationMessage> {
        let mut messages = self.transcript.clone();
        if let Some(content) = &self.current_assistant {
            messages.push(ConversationMessage::Assistant { content: content.clone() });
        }
        messages
    }

    pub fn reasoning(&self) -> &[ReasoningEntry] {
        &self.reasoning
    }

    pub fn response(&self) -> &[ResponseEntry] {
        &self.response
    }

    pub fn file_selection(&self) -> &FileSelection {
        &self.selection
    }

    pub fn has_finishing_tool(&self) -> bool {
        self.has_finishing_tool
    }

    pub fn finishing_tool_name(&self) -> Option<&str> {
        self.finishing_tool_name.as_deref()
    }

    pub fn terminal_summary(&self) -> Option<&str> {
        self.terminal_summary.as_deref()
    }
}

fn find_reasoning_mut<'a>(
    reasoning: &'a mut [ReasoningEntry],
    id: &str,
) -> Option<&'a mut ReasoningEntry> {
    reasoning.iter_mut().find(|e| e.id() == id)
}

fn find_response_mut<'a>(
    response: &'a mut [ResponseEntry],
    id: &str,
) -> Option<&'a mut ResponseEntry> {
    response.iter_mut().find(|e| e.id() == id)
}

fn empty_parse() -> ParseResult {
    OptimisticJsonParser::parse("")
}
