pub mod builder;
pub mod file_selection;
pub mod identity;
pub mod processor;
pub mod reasoning;
pub mod response;
pub mod timing;
pub mod tracker;

pub use builder::ChunkProcessorBuilder;
pub use file_selection::{
    extract_files, metric_ids_from_dashboard_content, select_files, DashboardContext,
    ExtractedFile, FileSelection,
};
pub use identity::{resolve_file_identities, FileResultSummary};
pub use processor::ChunkProcessor;
pub use timing::{format_elapsed, format_reasoned_duration};
pub use tracker::{ToolCallState, ToolCallTracker};
