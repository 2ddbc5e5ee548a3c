use async_trait::async_trait;
use brook_types::{ConversationMessage, ReasoningEntry, ResponseEntry};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Full session state handed to the storage layer on every save.
///
/// Saves are whole-state overwrites: a later snapshot always supersedes an
/// earlier one, which is what lets the save queue drop writes when full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub transcript: Vec<ConversationMessage>,
    pub reasoning: Vec<ReasoningEntry>,
    pub response: Vec<ResponseEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_summary: Option<String>,
}

/// Trait for the injected storage collaborator
///
/// Implementations own the actual schema/query layer; the processor only
/// ever calls `save`. Failures are logged by the caller and never propagate
/// into stream consumption.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn save(&self, session_id: &str, snapshot: SessionSnapshot) -> Result<()>;
}
