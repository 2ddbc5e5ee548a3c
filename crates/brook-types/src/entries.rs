use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of a log entry or file record.
///
/// Transitions are monotonic: once `Completed` or `Failed`, an entry never
/// goes back to `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Loading,
    Completed,
    Failed,
}

impl EntryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Apply a transition, refusing any move back to `Loading`
    pub fn advance(&mut self, next: EntryStatus) {
        if self.is_terminal() && next == EntryStatus::Loading {
            return;
        }
        *self = next;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileType {
    Metric,
    Dashboard,
    AgentAction,
}

/// One generated or modified artifact inside a Files reasoning entry.
///
/// `id` is a client-generated placeholder for create operations until the
/// identity resolver substitutes the backend-assigned id; modify operations
/// carry the real id from the start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub file_type: FileType,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_number: Option<u32>,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub content: String,
}

/// Internal-facing reasoning trace item, keyed by tool call id.
/// Exactly one entry per call id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReasoningEntry {
    Text(ReasoningText),
    Files(ReasoningFiles),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningText {
    pub id: String,
    pub title: String,
    pub status: EntryStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_reasoning: Option<bool>,
}

/// Files-type reasoning entry. `file_ids` preserves the positional order in
/// which records streamed in; `files` is the id-keyed record map. Identity
/// resolution replaces both wholesale rather than renaming keys in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningFiles {
    pub id: String,
    pub title: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_title: Option<String>,
    pub file_ids: Vec<String>,
    pub files: HashMap<String, FileRecord>,
}

impl ReasoningFiles {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: EntryStatus::Loading,
            secondary_title: None,
            file_ids: Vec::new(),
            files: HashMap::new(),
        }
    }

    /// Append a record, registering its id at the next positional slot
    pub fn push_record(&mut self, record: FileRecord) {
        self.file_ids.push(record.id.clone());
        self.files.insert(record.id.clone(), record);
    }

    /// Record id at a streamed array index, if one has been assigned yet
    pub fn id_at_index(&self, index: usize) -> Option<&str> {
        self.file_ids.get(index).map(String::as_str)
    }

    pub fn record_mut(&mut self, file_id: &str) -> Option<&mut FileRecord> {
        self.files.get_mut(file_id)
    }

    /// Swap in a rebuilt id list and record map (identity resolution)
    pub fn replace_records(&mut self, file_ids: Vec<String>, files: HashMap<String, FileRecord>) {
        self.file_ids = file_ids;
        self.files = files;
    }

    /// Records in positional order
    pub fn ordered_records(&self) -> impl Iterator<Item = &FileRecord> {
        self.file_ids.iter().filter_map(|id| self.files.get(id))
    }
}

impl ReasoningEntry {
    pub fn text(id: impl Into<String>, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Text(ReasoningText {
            id: id.into(),
            title: title.into(),
            status: EntryStatus::Loading,
            message: message.into(),
            secondary_title: None,
            finished_reasoning: None,
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Text(e) => &e.id,
            Self::Files(e) => &e.id,
        }
    }

    pub fn status(&self) -> EntryStatus {
        match self {
            Self::Text(e) => e.status,
            Self::Files(e) => e.status,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Text(e) => &e.title,
            Self::Files(e) => &e.title,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        match self {
            Self::Text(e) => e.title = title.into(),
            Self::Files(e) => e.title = title.into(),
        }
    }

    pub fn advance_status(&mut self, next: EntryStatus) {
        match self {
            Self::Text(e) => e.status.advance(next),
            Self::Files(e) => e.status.advance(next),
        }
    }

    pub fn set_secondary_title(&mut self, secondary: impl Into<String>) {
        let secondary = Some(secondary.into());
        match self {
            Self::Text(e) => e.secondary_title = secondary,
            Self::Files(e) => e.secondary_title = secondary,
        }
    }

    pub fn as_files(&self) -> Option<&ReasoningFiles> {
        match self {
            Self::Files(e) => Some(e),
            Self::Text(_) => None,
        }
    }

    pub fn as_files_mut(&mut self) -> Option<&mut ReasoningFiles> {
        match self {
            Self::Files(e) => Some(e),
            Self::Text(_) => None,
        }
    }
}

/// User-facing response log item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResponseEntry {
    Text(ResponseText),
    File(ResponseFile),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseText {
    pub id: String,
    pub message: String,
    pub is_final_message: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFile {
    pub id: String,
    pub file_type: FileType,
    pub file_name: String,
    pub version_number: u32,
    pub metadata: Vec<ResponseFileMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFileMetadata {
    pub status: EntryStatus,
    pub message: String,
    pub timestamp: i64,
}

impl ResponseEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Text(e) => &e.id,
            Self::File(e) => &e.id,
        }
    }
}
