pub mod entries;
pub mod events;
pub mod status;
pub mod tools;
pub mod transcript;

pub use entries::{
    EntryStatus, FileRecord, FileType, ReasoningEntry, ReasoningFiles, ReasoningText,
    ResponseEntry, ResponseFile, ResponseFileMetadata, ResponseText,
};
pub use events::StreamEvent;
pub use status::{determine_tool_status, is_error_result};
pub use tools::{FileOperation, ToolName};
pub use transcript::{AssistantContent, ConversationMessage, ToolResultContent};
