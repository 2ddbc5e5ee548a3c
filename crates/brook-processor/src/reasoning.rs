use brook_streaming::{
    normalize_escaped_text, optimistic_array, optimistic_bool, optimistic_str, ParseResult,
};
use brook_types::{
    EntryStatus, FileOperation, FileRecord, FileType, ReasoningEntry, ReasoningFiles,
    ReasoningText, ToolName,
};
use serde_json::Value;

use crate::identity::FileResultSummary;

/// Streaming-start projection: tools that can show a placeholder before any
/// arguments have arrived get an entry immediately.
pub(crate) fn initial_entry(call_id: &str, tool: &ToolName, raw_name: &str) -> Option<ReasoningEntry> {
    match tool {
        ToolName::CreateMetrics => Some(files_entry(call_id, "Building new metrics...")),
        ToolName::CreateDashboards => Some(files_entry(call_id, "Building new dashboards...")),
        ToolName::ModifyMetrics => Some(files_entry(call_id, "Modifying metrics...")),
        ToolName::ModifyDashboards => Some(files_entry(call_id, "Modifying dashboards...")),
        ToolName::CreateTodoList => Some(todo_entry(call_id, "")),
        ToolName::Other(_) => Some(generic_entry(call_id, raw_name, &Value::Object(Default::default()))),
        // Thinking tools wait for their first closed argument value; SQL
        // waits for a statement list; response tools never come here
        _ => None,
    }
}

/// Build an entry from argument values (complete or optimistically parsed)
pub(crate) fn create_entry(
    call_id: &str,
    tool: &ToolName,
    raw_name: &str,
    args: &Value,
) -> Option<ReasoningEntry> {
    match tool {
        ToolName::SequentialThinking => {
            let thought = args.get("thought").and_then(Value::as_str)?;
            let next_needed = args.get("nextThoughtNeeded").and_then(Value::as_bool);
            Some(ReasoningEntry::Text(ReasoningText {
                id: call_id.to_string(),
                title: "Thinking it through...".to_string(),
                status: EntryStatus::Loading,
                message: normalize_escaped_text(thought),
                secondary_title: None,
                finished_reasoning: Some(!next_needed.unwrap_or(false)),
            }))
        }

        ToolName::SubmitThoughts => {
            let thoughts = args.get("thoughts").and_then(Value::as_str)?;
            Some(ReasoningEntry::Text(ReasoningText {
                id: call_id.to_string(),
                title: "Submitting analysis...".to_string(),
                status: EntryStatus::Loading,
                message: normalize_escaped_text(thoughts),
                secondary_title: None,
                finished_reasoning: Some(false),
            }))
        }

        ToolName::ExecuteSql => {
            let statements = sql_statements(args);
            if statements.is_empty() {
                return None;
            }
            let mut entry = ReasoningFiles::new(call_id, "Generating validation queries...");
            entry.push_record(FileRecord {
                id: uuid::Uuid::new_v4().to_string(),
                file_type: FileType::AgentAction,
                file_name: "Validation Queries".to_string(),
                version_number: Some(1),
                status: EntryStatus::Loading,
                error_message: None,
                content: statements_yaml(&statements),
            });
            Some(ReasoningEntry::Files(entry))
        }

        ToolName::CreateMetrics | ToolName::CreateDashboards | ToolName::ModifyMetrics
        | ToolName::ModifyDashboards => {
            args.get("files").and_then(Value::as_array)?;
            initial_entry(call_id, tool, raw_name)
        }

        ToolName::CreateTodoList => {
            let todos = args.get("todos").and_then(Value::as_str).unwrap_or("");
            Some(todo_entry(call_id, todos))
        }

        ToolName::Done | ToolName::RespondWithoutAnalysis | ToolName::ClarifyingQuestion => None,

        ToolName::Other(_) => Some(generic_entry(call_id, raw_name, args)),
    }
}

/// Feed optimistically-extracted values into an existing entry while the
/// call's arguments are still streaming
pub(crate) fn update_entry_optimistic(entry: &mut ReasoningEntry, tool: &ToolName, parse: &ParseResult) {
    match tool {
        ToolName::SequentialThinking => {
            if let ReasoningEntry::Text(text) = entry {
                if let Some(thought) = optimistic_str(&parse.extracted_values, "thought") {
                    text.message = normalize_escaped_text(thought);
                }
                if let Some(next_needed) = optimistic_bool(&parse.extracted_values, "nextThoughtNeeded") {
                    text.finished_reasoning = Some(!next_needed);
                }
            }
        }

        ToolName::SubmitThoughts => {
            if let ReasoningEntry::Text(text) = entry {
                if let Some(thoughts) = optimistic_str(&parse.extracted_values, "thoughts") {
                    text.message = normalize_escaped_text(thoughts);
                }
            }
        }

        ToolName::ExecuteSql => {
            let Some(files) = entry.as_files_mut() else { return };
            let Some(first_id) = files.file_ids.first().cloned() else { return };
            let Some(record) = files.record_mut(&first_id) else { return };

            if let Some(raw) = optimistic_array(&parse.extracted_values, "statements") {
                let statements: Vec<String> = raw
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                if !statements.is_empty() {
                    record.content = statements_yaml(&statements);
                }
            } else if let Some(sql) = optimistic_str(&parse.extracted_values, "sql") {
                record.content = sql.to_string();
            }
        }

        ToolName::CreateTodoList => {
            let Some(files) = entry.as_files_mut() else { return };
            let Some(first_id) = files.file_ids.first().cloned() else { return };
            if let Some(record) = files.record_mut(&first_id) {
                if let Some(todos) = optimistic_str(&parse.extracted_values, "todos") {
                    record.content = todos.to_string();
                }
            }
        }

        // File tools are handled via stream_file_records (the caller has the
        // positional slot map); everything else has no incremental rule
        _ => {}
    }
}

/// Incrementally realize streamed `files` array elements as records.
///
/// `slots` maps element index to the record id it produced, so re-parses of
/// the growing array update existing records instead of duplicating them.
/// A create element becomes a record once both name and content have
/// streamed; a modify element once id and name have.
pub(crate) fn stream_file_records(
    entry: &mut ReasoningFiles,
    tool: &ToolName,
    slots: &mut Vec<Option<String>>,
    elements: &[Value],
) {
    let (Some(operation), Some(file_type)) = (tool.file_operation(), tool.file_type()) else {
        return;
    };

    if slots.len() < elements.len() {
        slots.resize(elements.len(), None);
    }

    for (index, element) in elements.iter().enumerate() {
        if !element.is_object() {
            continue;
        }
        let name = element.get("name").and_then(Value::as_str).filter(|s| !s.is_empty());
        let content = element
            .get("yml_content")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());

        match &slots[index] {
            Some(record_id) => {
                if let Some(record) = entry.record_mut(record_id) {
                    if operation == FileOperation::Modify {
                        if let Some(name) = name {
                            if name != record.file_name {
                                record.file_name = name.to_string();
                            }
                        }
                    }
                    if let Some(content) = content {
                        record.content = content.to_string();
                    }
                }
            }
            None => {
                let record = match operation {
                    FileOperation::Create => {
                        let (Some(name), Some(content)) = (name, content) else { continue };
                        FileRecord {
                            id: uuid::Uuid::new_v4().to_string(),
                            file_type,
                            file_name: name.to_string(),
                            version_number: None,
                            status: EntryStatus::Loading,
                            error_message: None,
                            content: content.to_string(),
                        }
                    }
                    FileOperation::Modify => {
                        let id = element.get("id").and_then(Value::as_str).filter(|s| !s.is_empty());
                        let (Some(id), Some(name)) = (id, name) else { continue };
                        FileRecord {
                            id: id.to_string(),
                            file_type,
                            file_name: name.to_string(),
                            version_number: None,
                            status: EntryStatus::Loading,
                            error_message: None,
                            content: content.unwrap_or("").to_string(),
                        }
                    }
                };
                slots[index] = Some(record.id.clone());
                entry.push_record(record);
            }
        }
    }
}

/// Final title once a tool's result has arrived, for tools whose title
/// reflects what actually happened
pub(crate) fn completion_title(entry: &ReasoningEntry, tool: &ToolName) -> Option<String> {
    match tool {
        ToolName::SequentialThinking => Some("Thought for a few seconds".to_string()),
        ToolName::CreateTodoList => Some("Broke down your request".to_string()),
        ToolName::ExecuteSql => {
            let files = entry.as_files()?;
            let first = files.ordered_records().next()?;
            let count = first.content.lines().filter(|l| l.starts_with("  - ")).count();
            if count == 0 {
                return None;
            }
            Some(format!(
                "Generated {} validation {}",
                count,
                if count == 1 { "query" } else { "queries" }
            ))
        }
        _ => None,
    }
}

/// Title for a file tool entry after identity resolution
pub(crate) fn file_result_title(tool: &ToolName, summary: FileResultSummary) -> Option<String> {
    let verb = match tool.file_operation()? {
        FileOperation::Create => "Created",
        FileOperation::Modify => "Modified",
    };
    let entity = match tool.file_type()? {
        FileType::Metric => {
            if summary.succeeded == 1 { "metric" } else { "metrics" }
        }
        FileType::Dashboard => {
            if summary.succeeded == 1 { "dashboard" } else { "dashboards" }
        }
        FileType::AgentAction => return None,
    };

    if summary.failed > 0 {
        Some(format!("{verb} {} {entity}, {} failed", summary.succeeded, summary.failed))
    } else {
        Some(format!("{verb} {} {entity}", summary.succeeded))
    }
}

/// A new sibling entry summarizing SQL execution results; the original
/// statement entry is never mutated with result data.
pub(crate) fn sql_results_entry(
    call_id: &str,
    result: &Value,
    secondary_title: Option<String>,
) -> ReasoningEntry {
    let rows = result
        .get("results")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut yaml = String::from("results:");
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for row in &rows {
        let is_error = row.get("status").and_then(Value::as_str) == Some("error");
        let sql = row.get("sql").and_then(Value::as_str).unwrap_or("");
        yaml.push_str(&format!(
            "\n  - status: {}",
            if is_error { "error" } else { "success" }
        ));
        yaml.push_str(&format!("\n    sql: {sql}"));

        if is_error {
            failed += 1;
            if let Some(message) = row.get("error_message").and_then(Value::as_str) {
                yaml.push_str(&format!("\n    error_message: |-\n      {message}"));
            }
        } else {
            succeeded += 1;
            if let Some(values) = row.get("results").and_then(Value::as_array) {
                yaml.push_str("\n    results:");
                for value in values {
                    yaml.push_str("\n      -");
                    if let Some(object) = value.as_object() {
                        for (key, cell) in object {
                            yaml.push_str(&format!("\n        {key}: {}", render_cell(cell)));
                        }
                    }
                }
            }
        }
    }

    let title = if failed > 0 {
        format!(
            "Ran {} validation {}, {} failed",
            succeeded,
            if succeeded == 1 { "query" } else { "queries" },
            failed
        )
    } else {
        format!(
            "Ran {} validation {}",
            rows.len(),
            if rows.len() == 1 { "query" } else { "queries" }
        )
    };

    let record_id = uuid::Uuid::new_v4().to_string();
    let mut entry = ReasoningFiles::new(format!("{call_id}-results"), title);
    entry.status = EntryStatus::Completed;
    entry.secondary_title = secondary_title;
    entry.push_record(FileRecord {
        id: record_id,
        file_type: FileType::AgentAction,
        file_name: "Query Results".to_string(),
        version_number: Some(1),
        status: EntryStatus::Completed,
        error_message: None,
        content: yaml,
    });
    ReasoningEntry::Files(entry)
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Mark every record of a Files entry (SQL, todo) with the entry's final
/// status; file tool records get per-record statuses from identity
/// resolution instead.
pub(crate) fn set_record_statuses(entry: &mut ReasoningEntry, status: EntryStatus) {
    if let Some(files) = entry.as_files_mut() {
        for record in files.files.values_mut() {
            record.status.advance(status);
        }
    }
}

pub(crate) fn sql_statements(args: &Value) -> Vec<String> {
    match args.get("statements") {
        Some(Value::Array(items)) => {
            return items.iter().filter_map(Value::as_str).map(str::to_string).collect();
        }
        Some(Value::String(raw)) => {
            // Statements occasionally arrive as a JSON-encoded string
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) {
                return items.iter().filter_map(Value::as_str).map(str::to_string).collect();
            }
            return vec![raw.clone()];
        }
        _ => {}
    }

    if let Some(queries) = args.get("queries").and_then(Value::as_array) {
        return queries
            .iter()
            .filter_map(|query| match query {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj.get("sql").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect();
    }

    if let Some(sql) = args.get("sql").and_then(Value::as_str) {
        return vec![sql.to_string()];
    }

    Vec::new()
}

pub(crate) fn statements_yaml(statements: &[String]) -> String {
    let mut yaml = String::from("statements:");
    for statement in statements {
        yaml.push_str(&format!("\n  - {statement}"));
    }
    yaml
}

fn files_entry(call_id: &str, title: &str) -> ReasoningEntry {
    ReasoningEntry::Files(ReasoningFiles::new(call_id, title))
}

fn todo_entry(call_id: &str, todos: &str) -> ReasoningEntry {
    let mut entry = ReasoningFiles::new(call_id, "Breaking down your request...");
    entry.push_record(FileRecord {
        id: format!("todo-{}", uuid::Uuid::new_v4()),
        file_type: FileType::AgentAction,
        file_name: "TODO list".to_string(),
        version_number: Some(1),
        status: EntryStatus::Loading,
        error_message: None,
        content: todos.to_string(),
    });
    ReasoningEntry::Files(entry)
}

fn generic_entry(call_id: &str, raw_name: &str, args: &Value) -> ReasoningEntry {
    let message = serde_json::to_string_pretty(args)
        .unwrap_or_else(|_| "[Unable to display tool arguments]".to_string());
    ReasoningEntry::Text(ReasoningText {
        id: call_id.to_string(),
        title: raw_name.to_string(),
        status: EntryStatus::Loading,
        message,
        secondary_title: None,
        finished_reasoning: Some(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use brook_streaming::OptimisticJsonParser;
    use serde_json::json;

    #[test]
    fn test_thinking_entry_normalizes_escapes() {
        let args = json!({"thought": "line1\\nline2", "nextThoughtNeeded": true});
        let entry = create_entry("c1", &ToolName::SequentialThinking, "sequentialThinking", &args)
            .unwrap();

        match entry {
            ReasoningEntry::Text(text) => {
                assert_eq!(text.message, "line1\nline2");
                assert_eq!(text.finished_reasoning, Some(false));
            }
            _ => panic!("Expected text entry"),
        }
    }

    #[test]
    fn test_sql_entry_renders_statement_yaml() {
        let args = json!({"statements": ["SELECT 1", "SELECT 2"]});
        let entry = create_entry("c1", &ToolName::ExecuteSql, "executeSql", &args).unwrap();

        let files = entry.as_files().unwrap();
        let record = files.ordered_records().next().unwrap();
        assert_eq!(record.content, "statements:\n  - SELECT 1\n  - SELECT 2");
        assert_eq!(record.file_name, "Validation Queries");
        assert_eq!(completion_title(&entry, &ToolName::ExecuteSql).as_deref(),
            Some("Generated 2 validation queries"));
    }

    #[test]
    fn test_sql_statements_variants() {
        assert_eq!(sql_statements(&json!({"sql": "SELECT 1"})), vec!["SELECT 1"]);
        assert_eq!(
            sql_statements(&json!({"queries": ["SELECT 1", {"sql": "SELECT 2"}]})),
            vec!["SELECT 1", "SELECT 2"]
        );
        assert_eq!(
            sql_statements(&json!({"statements": "[\"SELECT 1\"]"})),
            vec!["SELECT 1"]
        );
        assert_eq!(
            sql_statements(&json!({"statements": "SELECT raw"})),
            vec!["SELECT raw"]
        );
    }

    #[test]
    fn test_streamed_records_update_in_place() {
        let mut entry = ReasoningFiles::new("c1", "Building new metrics...");
        let mut slots = Vec::new();
        let tool = ToolName::CreateMetrics;

        let parse = OptimisticJsonParser::parse(
            r#"{"files": [{"name": "revenue", "yml_content": "v1"}]}"#,
        );
        let elements = parse.extracted_values["files"].as_array().unwrap().clone();
        stream_file_records(&mut entry, &tool, &mut slots, &elements);
        assert_eq!(entry.file_ids.len(), 1);
        let first_id = entry.file_ids[0].clone();

        // Same element again with longer content: update, not duplicate
        let parse = OptimisticJsonParser::parse(
            r#"{"files": [{"name": "revenue", "yml_content": "v1 extended"}]}"#,
        );
        let elements = parse.extracted_values["files"].as_array().unwrap().clone();
        stream_file_records(&mut entry, &tool, &mut slots, &elements);

        assert_eq!(entry.file_ids.len(), 1);
        assert_eq!(entry.file_ids[0], first_id);
        assert_eq!(entry.files[&first_id].content, "v1 extended");
    }

    #[test]
    fn test_modify_records_use_real_ids() {
        let mut entry = ReasoningFiles::new("c1", "Modifying metrics...");
        let mut slots = Vec::new();
        let elements = vec![json!({"id": "real-1", "name": "revenue"})];

        stream_file_records(&mut entry, &ToolName::ModifyMetrics, &mut slots, &elements);

        assert_eq!(entry.file_ids, vec!["real-1"]);
        assert_eq!(entry.files["real-1"].content, "");
    }

    #[test]
    fn test_sql_results_sibling_entry() {
        let result = json!({"results": [
            {"status": "success", "sql": "SELECT 1", "results": [{"n": 1}]},
            {"status": "error", "sql": "SELECT bad", "error_message": "no such column"},
        ]});

        let entry = sql_results_entry("c1", &result, Some("2.0 seconds".to_string()));

        assert_eq!(entry.id(), "c1-results");
        assert_eq!(entry.title(), "Ran 1 validation query, 1 failed");
        assert_eq!(entry.status(), EntryStatus::Completed);

        let files = entry.as_files().unwrap();
        let record = files.ordered_records().next().unwrap();
        assert!(record.content.contains("status: success"));
        assert!(record.content.contains("n: 1"));
        assert!(record.content.contains("error_message: |-\n      no such column"));
    }

    #[test]
    fn test_generic_entry_pretty_prints_args() {
        let entry = generic_entry("c1", "weatherLookup", &json!({"city": "Oslo"}));
        match entry {
            ReasoningEntry::Text(text) => {
                assert_eq!(text.title, "weatherLookup");
                assert!(text.message.contains("\"city\": \"Oslo\""));
            }
            _ => panic!("Expected text entry"),
        }
    }

    #[test]
    fn test_file_result_titles() {
        let summary = FileResultSummary { succeeded: 2, failed: 0 };
        assert_eq!(
            file_result_title(&ToolName::CreateMetrics, summary).as_deref(),
            Some("Created 2 metrics")
        );

        let summary = FileResultSummary { succeeded: 1, failed: 2 };
        assert_eq!(
            file_result_title(&ToolName::ModifyDashboards, summary).as_deref(),
            Some("Modified 1 dashboard, 2 failed")
        );
    }
}
