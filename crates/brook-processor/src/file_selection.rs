use brook_types::{EntryStatus, FileOperation, FileType, ReasoningEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Read-only projection of one artifact produced this turn, derived from
/// completed Files-type reasoning entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFile {
    pub id: String,
    pub file_type: FileType,
    pub file_name: String,
    pub status: EntryStatus,
    pub operation: Option<FileOperation>,
    pub version_number: Option<u32>,
    pub content: String,
    /// Dashboard ids from this turn that reference this metric
    pub contained_in_dashboards: Vec<String>,
}

/// Cross-turn containment supplied at construction: dashboards that already
/// exist in storage and the metric ids they reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardContext {
    pub id: String,
    pub name: String,
    pub version_number: u32,
    pub metric_ids: Vec<String>,
}

/// Current surfaced-file set. `version` increments on every change so
/// consumers can detect updates cheaply.
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    pub files: Vec<ExtractedFile>,
    pub version: u64,
}

/// Pull completed, successfully-produced metric and dashboard records out of
/// the reasoning log, in positional order, with containment filled in.
pub fn extract_files(reasoning: &[ReasoningEntry]) -> Vec<ExtractedFile> {
    let mut files = Vec::new();

    for entry in reasoning {
        let Some(files_entry) = entry.as_files() else { continue };
        if files_entry.status != EntryStatus::Completed {
            continue;
        }

        let operation = detect_operation(&files_entry.title);

        for record in files_entry.ordered_records() {
            if record.status != EntryStatus::Completed
                || record.file_name.is_empty()
                || record.error_message.is_some()
            {
                continue;
            }
            let file_type = match record.file_type {
                FileType::Metric | FileType::Dashboard => record.file_type,
                // Synthetic action renderings are never surfaced
                FileType::AgentAction => continue,
            };

            files.push(ExtractedFile {
                id: record.id.clone(),
                file_type,
                file_name: record.file_name.clone(),
                status: EntryStatus::Completed,
                operation,
                version_number: record.version_number,
                content: record.content.clone(),
                contained_in_dashboards: Vec::new(),
            });
        }
    }

    build_containment(&mut files);
    files
}

/// Detect create vs modify from the entry title; titles are rewritten on
/// completion ("Created 2 metrics", "Modifying dashboards...")
fn detect_operation(title: &str) -> Option<FileOperation> {
    let lower = title.to_lowercase();
    if lower.contains("creat") {
        Some(FileOperation::Create)
    } else if lower.contains("modif") {
        Some(FileOperation::Modify)
    } else {
        None
    }
}

fn build_containment(files: &mut [ExtractedFile]) {
    let dashboard_metrics: Vec<(String, Vec<String>)> = files
        .iter()
        .filter(|f| f.file_type == FileType::Dashboard)
        .map(|f| (f.id.clone(), metric_ids_from_dashboard_content(&f.content)))
        .collect();

    for file in files.iter_mut() {
        if file.file_type != FileType::Metric {
            continue;
        }
        file.contained_in_dashboards = dashboard_metrics
            .iter()
            .filter(|(_, metric_ids)| metric_ids.contains(&file.id))
            .map(|(dashboard_id, _)| dashboard_id.clone())
            .collect();
    }
}

/// Metric ids referenced by a dashboard's generated content.
///
/// JSON content exposes them as `rows[].items[].id`; otherwise any UUID
/// literal following an `id:` key in the text counts.
pub fn metric_ids_from_dashboard_content(content: &str) -> Vec<String> {
    let mut ids = Vec::new();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(content) {
        if let Some(rows) = value.get("rows").and_then(|r| r.as_array()) {
            for row in rows {
                let Some(items) = row.get("items").and_then(|i| i.as_array()) else { continue };
                for item in items {
                    if let Some(id) = item.get("id").and_then(|i| i.as_str()) {
                        ids.push(id.to_string());
                    }
                }
            }
        }
    } else {
        for line in content.lines() {
            let Some(idx) = line.find("id:") else { continue };
            let tail = line[idx + 3..].trim_start();
            let token: String = tail
                .chars()
                .skip_while(|c| *c == '"' || *c == '\'')
                .take_while(|c| c.is_ascii_hexdigit() || *c == '-')
                .collect();
            if Uuid::parse_str(&token).is_ok() {
                ids.push(token);
            }
        }
    }

    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
    ids
}

/// Choose which artifacts to surface to the user.
///
/// A dashboard is a superset view of its metrics, so surfacing both is
/// redundant. Priority order:
/// 1. context dashboards containing a modified metric
/// 2. this turn's dashboards containing a modified metric
/// 3. all other dashboards from this turn
/// 4. metrics not covered by any selected dashboard
/// 5. all metrics, when no dashboard was selected at all
pub fn select_files(files: &[ExtractedFile], context: &[DashboardContext]) -> Vec<ExtractedFile> {
    let dashboards: Vec<&ExtractedFile> = files
        .iter()
        .filter(|f| f.file_type == FileType::Dashboard)
        .collect();
    let metrics: Vec<&ExtractedFile> = files
        .iter()
        .filter(|f| f.file_type == FileType::Metric)
        .collect();

    let mut session_dashboards_with_modified: HashSet<&str> = HashSet::new();
    for metric in &metrics {
        if metric.operation != Some(FileOperation::Modify) {
            continue;
        }
        for dashboard_id in &metric.contained_in_dashboards {
            if dashboards.iter().any(|d| d.id == *dashboard_id) {
                session_dashboards_with_modified.insert(dashboard_id.as_str());
            }
        }
    }

    let mut context_dashboards: Vec<ExtractedFile> = Vec::new();
    for metric in &metrics {
        if metric.operation != Some(FileOperation::Modify) {
            continue;
        }
        for ctx in context {
            if !ctx.metric_ids.contains(&metric.id) {
                continue;
            }
            let already_included = files.iter().any(|f| f.id == ctx.id)
                || context_dashboards.iter().any(|f| f.id == ctx.id);
            if already_included {
                continue;
            }
            context_dashboards.push(ExtractedFile {
                id: ctx.id.clone(),
                file_type: FileType::Dashboard,
                file_name: ctx.name.clone(),
                status: EntryStatus::Completed,
                // Pre-existing dashboard, not produced this turn
                operation: None,
                version_number: Some(ctx.version_number),
                content: String::new(),
                contained_in_dashboards: Vec::new(),
            });
        }
    }

    let mut selected: Vec<ExtractedFile> = Vec::new();
    selected.extend(context_dashboards);
    selected.extend(
        dashboards
            .iter()
            .filter(|d| session_dashboards_with_modified.contains(d.id.as_str()))
            .map(|d| (*d).clone()),
    );
    selected.extend(
        dashboards
            .iter()
            .filter(|d| !session_dashboards_with_modified.contains(d.id.as_str()))
            .map(|d| (*d).clone()),
    );

    if selected.is_empty() {
        return metrics.into_iter().cloned().collect();
    }

    let mut covered: HashSet<String> = HashSet::new();
    for dashboard in &selected {
        covered.extend(metric_ids_from_dashboard_content(&dashboard.content));
        if let Some(ctx) = context.iter().find(|c| c.id == dashboard.id) {
            covered.extend(ctx.metric_ids.iter().cloned());
        }
    }

    selected.extend(
        metrics
            .iter()
            .filter(|m| !covered.contains(&m.id))
            .map(|m| (*m).clone()),
    );

    selected
}
