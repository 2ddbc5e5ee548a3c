use brook_types::{EntryStatus, FileOperation, ReasoningFiles};
use serde_json::Value;
use std::collections::HashMap;

/// Success/failure counts from one file tool result, used for title rewrites
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResultSummary {
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug)]
struct SucceededFile {
    id: String,
    name: String,
    version: Option<u32>,
}

/// Reconcile placeholder record ids against the backend-assigned ids in a
/// file tool result.
///
/// Matching is by file name (create) or by file name or existing id
/// (modify) — never by index, because streaming order and result order are
/// not guaranteed identical. Records matched in the succeeded list are
/// renamed to the backend id and completed; records matched in the failed
/// list keep their placeholder id and fail with the reported error;
/// everything else is left untouched. The id list and record map are
/// rebuilt wholesale and swapped in, preserving positional order.
pub fn resolve_file_identities(
    entry: &mut ReasoningFiles,
    operation: FileOperation,
    result: &Value,
) -> FileResultSummary {
    let succeeded = succeeded_files(result);
    let failed = failed_files(result);

    let mut new_ids = Vec::with_capacity(entry.file_ids.len());
    let mut new_files = HashMap::with_capacity(entry.files.len());

    for file_id in entry.file_ids.clone() {
        let Some(mut record) = entry.files.get(&file_id).cloned() else {
            continue;
        };

        let matched = succeeded.iter().find(|f| {
            f.name == record.file_name
                || (operation == FileOperation::Modify && f.id == record.id)
        });

        if let Some(success) = matched {
            record.id = success.id.clone();
            record.status.advance(EntryStatus::Completed);
            match success.version {
                Some(version) => record.version_number = Some(version),
                None => match operation {
                    FileOperation::Create => record.version_number = Some(1),
                    FileOperation::Modify => {
                        if record.version_number.is_none() {
                            tracing::warn!(
                                file_name = %record.file_name,
                                backend_id = %success.id,
                                "no version number in successful modify result, defaulting to 1"
                            );
                            record.version_number = Some(1);
                        }
                    }
                },
            }
            new_ids.push(success.id.clone());
            new_files.insert(success.id.clone(), record);
        } else if let Some(error) = failed.get(&record.file_name) {
            record.status.advance(EntryStatus::Failed);
            record.error_message = Some(error.clone());
            new_ids.push(file_id.clone());
            new_files.insert(file_id, record);
        } else {
            new_ids.push(file_id.clone());
            new_files.insert(file_id, record);
        }
    }

    entry.replace_records(new_ids, new_files);

    FileResultSummary {
        succeeded: succeeded.len(),
        failed: failed.len(),
    }
}

fn succeeded_files(result: &Value) -> Vec<SucceededFile> {
    let Some(files) = result.get("files").and_then(Value::as_array) else {
        return Vec::new();
    };

    files
        .iter()
        .filter_map(|file| {
            let id = file.get("id").and_then(Value::as_str)?;
            let name = file.get("name").and_then(Value::as_str)?;
            let version = file
                .get("version")
                .or_else(|| file.get("version_number"))
                .and_then(Value::as_u64)
                .map(|v| v as u32);
            Some(SucceededFile {
                id: id.to_string(),
                name: name.to_string(),
                version,
            })
        })
        .collect()
}

fn failed_files(result: &Value) -> HashMap<String, String> {
    let Some(failed) = result.get("failed_files").and_then(Value::as_array) else {
        return HashMap::new();
    };

    failed
        .iter()
        .filter_map(|file| {
            let name = file.get("name").and_then(Value::as_str)?;
            let error = file
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            Some((name.to_string(), error.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use brook_types::{FileRecord, FileType};
    use serde_json::json;

    fn entry_with_placeholders(names: &[&str]) -> ReasoningFiles {
        let mut entry = ReasoningFiles::new("call_1", "Building new metrics...");
        for (i, name) in names.iter().enumerate() {
            entry.push_record(FileRecord {
                id: format!("placeholder-{i}"),
                file_type: FileType::Metric,
                file_name: name.to_string(),
                version_number: None,
                status: EntryStatus::Loading,
                error_message: None,
                content: format!("name: {name}"),
            });
        }
        entry
    }

    #[test]
    fn test_all_records_resolved_by_name() {
        let mut entry = entry_with_placeholders(&["revenue", "churn"]);
        let result = json!({
            "files": [
                {"id": "backend-2", "name": "churn", "version_number": 1},
                {"id": "backend-1", "name": "revenue", "version_number": 1},
            ]
        });

        let summary = resolve_file_identities(&mut entry, FileOperation::Create, &result);

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 0);
        // Positional order preserved despite reversed result order
        assert_eq!(entry.file_ids, vec!["backend-1", "backend-2"]);
        let record = entry.files.get("backend-1").unwrap();
        assert_eq!(record.status, EntryStatus::Completed);
        assert_eq!(record.version_number, Some(1));
    }

    #[test]
    fn test_partial_failure_keeps_placeholder_ids() {
        let mut entry = entry_with_placeholders(&["revenue", "churn", "margin"]);
        let result = json!({
            "files": [{"id": "backend-1", "name": "revenue"}],
            "failed_files": [
                {"name": "churn", "error": "duplicate name"},
                {"name": "margin", "error": "invalid yml"},
            ]
        });

        let summary = resolve_file_identities(&mut entry, FileOperation::Create, &result);

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(entry.file_ids.len(), 3);
        assert_eq!(entry.file_ids[0], "backend-1");
        assert_eq!(entry.file_ids[1], "placeholder-1");

        let failed = entry.files.get("placeholder-1").unwrap();
        assert_eq!(failed.status, EntryStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("duplicate name"));
        // Create with no version in the result defaults to 1
        assert_eq!(entry.files.get("backend-1").unwrap().version_number, Some(1));
    }

    #[test]
    fn test_modify_matches_by_existing_id() {
        let mut entry = ReasoningFiles::new("call_1", "Modifying metrics...");
        entry.push_record(FileRecord {
            id: "real-id".to_string(),
            file_type: FileType::Metric,
            file_name: "old name".to_string(),
            version_number: Some(2),
            status: EntryStatus::Loading,
            error_message: None,
            content: String::new(),
        });

        // Backend renamed the file; match is by id
        let result = json!({"files": [{"id": "real-id", "name": "new name", "version": 3}]});
        let summary = resolve_file_identities(&mut entry, FileOperation::Modify, &result);

        assert_eq!(summary.succeeded, 1);
        let record = entry.files.get("real-id").unwrap();
        assert_eq!(record.version_number, Some(3));
        assert_eq!(record.status, EntryStatus::Completed);
    }

    #[test]
    fn test_modify_without_version_defaults_and_retains() {
        let mut entry = ReasoningFiles::new("call_1", "Modifying metrics...");
        entry.push_record(FileRecord {
            id: "real-id".to_string(),
            file_type: FileType::Metric,
            file_name: "m".to_string(),
            version_number: Some(4),
            status: EntryStatus::Loading,
            error_message: None,
            content: String::new(),
        });

        let result = json!({"files": [{"id": "real-id", "name": "m"}]});
        resolve_file_identities(&mut entry, FileOperation::Modify, &result);

        // Existing version retained when the backend omits one
        assert_eq!(entry.files.get("real-id").unwrap().version_number, Some(4));
    }

    #[test]
    fn test_unmatched_records_left_unchanged() {
        let mut entry = entry_with_placeholders(&["revenue"]);
        let result = json!({"files": [], "failed_files": []});

        let summary = resolve_file_identities(&mut entry, FileOperation::Create, &result);

        assert_eq!(summary.succeeded, 0);
        assert_eq!(entry.file_ids, vec!["placeholder-0"]);
        assert_eq!(
            entry.files.get("placeholder-0").unwrap().status,
            EntryStatus::Loading
        );
    }
}
