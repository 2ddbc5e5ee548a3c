//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use brook::prelude::*;
//! ```

pub use brook_processor::{
    ChunkProcessor, ChunkProcessorBuilder, DashboardContext, ExtractedFile, FileSelection,
};

pub use brook_types::{
    ConversationMessage, EntryStatus, FileRecord, FileType, ReasoningEntry, ResponseEntry,
    StreamEvent, ToolName,
};

pub use brook_streaming::OptimisticJsonParser;

pub use brook_persist::{MemoryGateway, PersistenceGateway, SessionSnapshot};
