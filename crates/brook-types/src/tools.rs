use crate::FileType;

/// Closed set of tool names the projection rules understand.
///
/// Each recognized tool accepts both its camelCase and kebab-case spelling;
/// anything else lands in `Other` and gets the generic projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolName {
    SequentialThinking,
    SubmitThoughts,
    ExecuteSql,
    CreateMetrics,
    CreateDashboards,
    ModifyMetrics,
    ModifyDashboards,
    CreateTodoList,
    Done,
    RespondWithoutAnalysis,
    ClarifyingQuestion,
    Other(String),
}

impl ToolName {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "sequentialThinking" | "sequential-thinking" => Self::SequentialThinking,
            "submitThoughts" | "submit-thoughts" => Self::SubmitThoughts,
            "executeSql" | "execute-sql" => Self::ExecuteSql,
            "createMetrics" | "create-metrics-file" => Self::CreateMetrics,
            "createDashboards" | "create-dashboards-file" => Self::CreateDashboards,
            "modifyMetrics" | "modify-metrics-file" => Self::ModifyMetrics,
            "modifyDashboards" | "modify-dashboards-file" => Self::ModifyDashboards,
            "createTodoList" | "create-todo-list" => Self::CreateTodoList,
            "doneTool" | "done-tool" => Self::Done,
            "respondWithoutAnalysis" | "respond-without-analysis" => Self::RespondWithoutAnalysis,
            "messageUserClarifyingQuestion" | "message-user-clarifying-question" => {
                Self::ClarifyingQuestion
            }
            other => Self::Other(other.to_string()),
        }
    }

    /// Response tools project into the response log, never the reasoning log
    pub fn is_response_tool(&self) -> bool {
        matches!(
            self,
            Self::Done | Self::RespondWithoutAnalysis | Self::ClarifyingQuestion
        )
    }

    /// Finishing tools end the current conversational turn; the caller may
    /// cancel the upstream source once one is observed
    pub fn is_finishing_tool(&self) -> bool {
        matches!(
            self,
            Self::Done | Self::RespondWithoutAnalysis | Self::SubmitThoughts | Self::ClarifyingQuestion
        )
    }

    /// Workflow-completing tools end the whole session, not just a step;
    /// only these produce a terminal reasoning summary
    pub fn is_workflow_completing(&self) -> bool {
        matches!(
            self,
            Self::Done | Self::RespondWithoutAnalysis | Self::ClarifyingQuestion
        )
    }

    pub fn is_file_tool(&self) -> bool {
        self.file_operation().is_some()
    }

    /// Create vs modify, for file-producing tools
    pub fn file_operation(&self) -> Option<FileOperation> {
        match self {
            Self::CreateMetrics | Self::CreateDashboards => Some(FileOperation::Create),
            Self::ModifyMetrics | Self::ModifyDashboards => Some(FileOperation::Modify),
            _ => None,
        }
    }

    pub fn file_type(&self) -> Option<FileType> {
        match self {
            Self::CreateMetrics | Self::ModifyMetrics => Some(FileType::Metric),
            Self::CreateDashboards | Self::ModifyDashboards => Some(FileType::Dashboard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Create,
    Modify,
}
