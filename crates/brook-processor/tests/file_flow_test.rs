use brook_processor::{ChunkProcessor, DashboardContext};
use brook_types::{EntryStatus, FileType, ReasoningEntry, StreamEvent};
use serde_json::json;

fn start(call_id: &str, tool_name: &str) -> StreamEvent {
    StreamEvent::ToolCallStreamingStart {
        tool_call_id: call_id.to_string(),
        tool_name: tool_name.to_string(),
    }
}

fn delta(call_id: &str, fragment: &str) -> StreamEvent {
    StreamEvent::ToolCallDelta {
        tool_call_id: call_id.to_string(),
        args_text_delta: fragment.to_string(),
    }
}

fn complete(call_id: &str, tool_name: &str, args: serde_json::Value) -> StreamEvent {
    StreamEvent::ToolCall {
        tool_call_id: call_id.to_string(),
        tool_name: tool_name.to_string(),
        args,
    }
}

fn result(call_id: &str, tool_name: &str, value: serde_json::Value) -> StreamEvent {
    StreamEvent::ToolResult {
        tool_call_id: call_id.to_string(),
        tool_name: tool_name.to_string(),
        result: value,
    }
}

#[test]
fn test_create_metrics_streaming_to_resolution() {
    let mut processor = ChunkProcessor::builder().build();
    processor.process_event(start("call-1", "createMetrics"));

    // Placeholder entry appears immediately so the UI can show loading
    assert_eq!(processor.reasoning().len(), 1);
    assert_eq!(processor.reasoning()[0].title(), "Building new metrics...");

    // First file record realizes once name and content have both streamed
    processor.process_event(delta(
        "call-1",
        r#"{"files": [{"name": "revenue", "yml_content": "name: revenue"}"#,
    ));
    let files = processor.reasoning()[0].as_files().unwrap();
    assert_eq!(files.file_ids.len(), 1);
    let placeholder_id = files.file_ids[0].clone();

    // Second record streams in; first keeps its placeholder id
    processor.process_event(delta(
        "call-1",
        r#", {"name": "churn", "yml_content": "name: churn"}]}"#,
    ));
    let files = processor.reasoning()[0].as_files().unwrap();
    assert_eq!(files.file_ids.len(), 2);
    assert_eq!(files.file_ids[0], placeholder_id);
    let churn_placeholder = files.file_ids[1].clone();

    processor.process_event(complete(
        "call-1",
        "createMetrics",
        json!({"files": [
            {"name": "revenue", "yml_content": "name: revenue"},
            {"name": "churn", "yml_content": "name: churn"},
        ]}),
    ));
    // Complete args finalize without duplicating records
    assert_eq!(processor.reasoning()[0].as_files().unwrap().file_ids.len(), 2);

    processor.process_event(result(
        "call-1",
        "createMetrics",
        json!({
            "files": [{"id": "backend-rev", "name": "revenue", "version_number": 1}],
            "failed_files": [{"name": "churn", "error": "duplicate name"}],
        }),
    ));

    let entry = &processor.reasoning()[0];
    assert_eq!(entry.title(), "Created 1 metric, 1 failed");
    // Business failure from failed_files propagates to the entry status
    assert_eq!(entry.status(), EntryStatus::Failed);

    let files = entry.as_files().unwrap();
    assert_eq!(files.file_ids.len(), 2);
    assert_eq!(files.file_ids[0], "backend-rev");
    assert_eq!(files.files["backend-rev"].status, EntryStatus::Completed);

    // The failed record keeps its client-generated placeholder id
    assert_eq!(files.file_ids[1], churn_placeholder);
    let failed = &files.files[&churn_placeholder];
    assert_eq!(failed.status, EntryStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("duplicate name"));
}

#[test]
fn test_sql_execution_appends_results_sibling() {
    let mut processor = ChunkProcessor::builder().build();
    processor.process_event(start("call-1", "executeSql"));
    // No entry until a statement list is visible
    assert!(processor.reasoning().is_empty());

    processor.process_event(complete(
        "call-1",
        "executeSql",
        json!({"statements": ["SELECT count(*) FROM orders"]}),
    ));
    assert_eq!(processor.reasoning().len(), 1);

    processor.process_event(result(
        "call-1",
        "executeSql",
        json!({"results": [
            {"status": "success", "sql": "SELECT count(*) FROM orders", "results": [{"count": 42}]},
        ]}),
    ));

    let reasoning = processor.reasoning();
    assert_eq!(reasoning.len(), 2);

    // Original entry: finalized in place, title from statement count
    assert_eq!(reasoning[0].id(), "call-1");
    assert_eq!(reasoning[0].title(), "Generated 1 validation query");
    assert_eq!(reasoning[0].status(), EntryStatus::Completed);

    // Sibling entry: a new entry, never a mutation of the original
    assert_eq!(reasoning[1].id(), "call-1-results");
    assert_eq!(reasoning[1].title(), "Ran 1 validation query");
    let record = reasoning[1].as_files().unwrap().ordered_records().next().unwrap();
    assert_eq!(record.file_name, "Query Results");
    assert!(record.content.contains("count: 42"));
}

#[test]
fn test_dashboard_covers_metrics_in_selection() {
    let mut processor = ChunkProcessor::builder().build();

    processor.process_event(complete(
        "call-1",
        "createMetrics",
        json!({"files": [{"name": "revenue", "yml_content": "name: revenue"}]}),
    ));
    processor.process_event(result(
        "call-1",
        "createMetrics",
        json!({"files": [{"id": "metric-1", "name": "revenue", "version_number": 1}]}),
    ));

    assert_eq!(processor.file_selection().files.len(), 1);
    let version_after_metric = processor.file_selection().version;

    processor.process_event(complete(
        "call-2",
        "createDashboards",
        json!({"files": [{
            "name": "overview",
            "yml_content": "{\"rows\":[{\"items\":[{\"id\":\"metric-1\"}]}]}",
        }]}),
    ));
    processor.process_event(result(
        "call-2",
        "createDashboards",
        json!({"files": [{"id": "dash-1", "name": "overview", "version_number": 1}]}),
    ));

    let selection = processor.file_selection();
    assert!(selection.version > version_after_metric);
    assert_eq!(selection.files.len(), 1);
    assert_eq!(selection.files[0].id, "dash-1");
    assert_eq!(selection.files[0].file_type, FileType::Dashboard);
}

#[test]
fn test_modified_metric_surfaces_context_dashboard() {
    let context = vec![DashboardContext {
        id: "existing-dash".to_string(),
        name: "Sales Overview".to_string(),
        version_number: 4,
        metric_ids: vec!["metric-1".to_string()],
    }];
    let mut processor = ChunkProcessor::builder().dashboard_context(context).build();

    processor.process_event(complete(
        "call-1",
        "modifyMetrics",
        json!({"files": [{"id": "metric-1", "name": "revenue", "yml_content": "name: revenue v2"}]}),
    ));
    processor.process_event(result(
        "call-1",
        "modifyMetrics",
        json!({"files": [{"id": "metric-1", "name": "revenue", "version": 2}]}),
    ));

    let selection = processor.file_selection();
    assert_eq!(selection.files.len(), 1);
    assert_eq!(selection.files[0].id, "existing-dash");
    assert_eq!(selection.files[0].file_name, "Sales Overview");
    assert_eq!(selection.files[0].version_number, Some(4));
}

#[test]
fn test_todo_list_streams_into_agent_action_file() {
    let mut processor = ChunkProcessor::builder().build();
    processor.process_event(start("call-1", "createTodoList"));
    processor.process_event(complete(
        "call-1",
        "createTodoList",
        json!({"todos": "- [ ] check revenue\n- [ ] build dashboard"}),
    ));
    processor.process_event(result("call-1", "createTodoList", json!({"success": true})));

    let entry = &processor.reasoning()[0];
    assert_eq!(entry.title(), "Broke down your request");
    let record = entry.as_files().unwrap().ordered_records().next().unwrap();
    assert_eq!(record.file_type, FileType::AgentAction);
    assert!(record.content.contains("check revenue"));
    assert_eq!(record.status, EntryStatus::Completed);

    // Agent actions are never surfaced as artifacts
    assert!(processor.file_selection().files.is_empty());
}

#[test]
fn test_empty_files_with_message_is_failure() {
    let mut processor = ChunkProcessor::builder().build();
    processor.process_event(complete(
        "call-1",
        "createMetrics",
        json!({"files": [{"name": "revenue", "yml_content": "name: revenue"}]}),
    ));
    processor.process_event(result(
        "call-1",
        "createMetrics",
        json!({"files": [], "message": "validation rejected all files"}),
    ));

    assert_eq!(processor.reasoning()[0].status(), EntryStatus::Failed);
    assert!(processor.file_selection().files.is_empty());
}

#[test]
fn test_modify_dashboard_title_rewrite() {
    let mut processor = ChunkProcessor::builder().build();
    processor.process_event(complete(
        "call-1",
        "modifyDashboards",
        json!({"files": [{"id": "dash-1", "name": "overview", "yml_content": "{}"}]}),
    ));

    assert_eq!(processor.reasoning()[0].title(), "Modifying dashboards...");

    processor.process_event(result(
        "call-1",
        "modifyDashboards",
        json!({"files": [{"id": "dash-1", "name": "overview", "version": 2}]}),
    ));

    let entry = &processor.reasoning()[0];
    assert_eq!(entry.title(), "Modified 1 dashboard");
    let entry = match entry {
        ReasoningEntry::Files(files) => files,
        _ => panic!("Expected files entry"),
    };
    assert_eq!(entry.files["dash-1"].version_number, Some(2));
}
