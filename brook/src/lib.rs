//! # Brook
//!
//! Stateful stream chunk processor for LLM tool-calling sessions.
//!
//! Brook consumes the ordered event stream of one agent turn and
//! incrementally projects it into two append-only, UI-facing logs — an
//! internal reasoning trace and a final response log — plus the raw
//! conversation transcript used to resume the session. Along the way it
//! optimistically parses still-streaming JSON tool arguments, reconciles
//! placeholder artifact ids against backend-assigned ids, decides which
//! generated artifacts to surface, and persists incrementally through an
//! injected gateway without ever blocking stream consumption.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brook::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let gateway: Arc<dyn PersistenceGateway> = Arc::new(MemoryGateway::new());
//!
//!     let mut processor = ChunkProcessor::builder()
//!         .session_id("session-123")
//!         .gateway(gateway)
//!         .allowed_tools(["sequentialThinking", "createMetrics", "doneTool"])
//!         .build();
//!
//!     // Events arrive one at a time from the upstream stream adapter
//!     processor.process_event(StreamEvent::ToolCallStreamingStart {
//!         tool_call_id: "call-1".to_string(),
//!         tool_name: "sequentialThinking".to_string(),
//!     });
//!
//!     // ... feed the rest of the stream, then flush the final state
//!     processor.flush().await?;
//!
//!     for entry in processor.reasoning() {
//!         println!("{}", entry.title());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Brook is organized into focused crates:
//!
//! - **`brook-types`**: event, transcript and log-entry model
//! - **`brook-streaming`**: optimistic parsing of incomplete JSON
//! - **`brook-processor`**: the chunk processor and projection rules
//! - **`brook-persist`**: persistence gateway seam and bounded save queue

pub mod prelude;

pub use brook_processor::{
    ChunkProcessor, ChunkProcessorBuilder, DashboardContext, ExtractedFile, FileSelection,
};

pub use brook_types::{
    AssistantContent, ConversationMessage, EntryStatus, FileOperation, FileRecord, FileType,
    ReasoningEntry, ReasoningFiles, ReasoningText, ResponseEntry, ResponseFile,
    ResponseFileMetadata, ResponseText, StreamEvent, ToolName, ToolResultContent,
};

pub use brook_streaming::{normalize_escaped_text, OptimisticJsonParser, ParseResult};

pub use brook_persist::{
    MemoryGateway, PersistError, PersistenceGateway, SessionSaver, SessionSnapshot,
};
