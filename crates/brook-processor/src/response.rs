use brook_streaming::{optimistic_str, ParseResult};
use brook_types::{
    EntryStatus, FileOperation, FileType, ResponseEntry, ResponseFile, ResponseFileMetadata,
    ResponseText, ToolName,
};

use crate::file_selection::ExtractedFile;

/// Argument key whose streamed value becomes the response message
fn message_key(tool: &ToolName) -> Option<&'static str> {
    match tool {
        ToolName::Done | ToolName::RespondWithoutAnalysis => Some("final_response"),
        ToolName::ClarifyingQuestion => Some("clarifying_question"),
        _ => None,
    }
}

/// Create the single Text response entry for a response tool call.
/// Created on first sight even with an empty message so the UI can stream
/// into it.
pub(crate) fn create_response_entry(
    call_id: &str,
    tool: &ToolName,
    parse: &ParseResult,
) -> Option<ResponseEntry> {
    let key = message_key(tool)?;
    let message = optimistic_str(&parse.extracted_values, key)
        .unwrap_or("")
        .to_string();

    Some(ResponseEntry::Text(ResponseText {
        id: call_id.to_string(),
        message,
        is_final_message: true,
    }))
}

/// Mutate a streaming response entry's message in place
pub(crate) fn update_response_entry(entry: &mut ResponseEntry, tool: &ToolName, parse: &ParseResult) {
    let Some(key) = message_key(tool) else { return };
    if let ResponseEntry::Text(text) = entry {
        if let Some(message) = optimistic_str(&parse.extracted_values, key) {
            text.message = message.to_string();
        }
    }
}

/// File-type response entries for a surfaced selection
pub(crate) fn file_response_entries(files: &[ExtractedFile]) -> Vec<ResponseEntry> {
    files
        .iter()
        .map(|file| {
            let noun = match file.file_type {
                FileType::Dashboard => "Dashboard",
                _ => "Metric",
            };
            let verb = match file.operation {
                Some(FileOperation::Modify) => "modified",
                _ => "created",
            };

            ResponseEntry::File(ResponseFile {
                id: file.id.clone(),
                file_type: file.file_type,
                file_name: file.file_name.clone(),
                version_number: file.version_number.unwrap_or(1),
                metadata: vec![ResponseFileMetadata {
                    status: EntryStatus::Completed,
                    message: format!("{noun} {verb} successfully"),
                    timestamp: chrono::Utc::now().timestamp_millis(),
                }],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use brook_streaming::OptimisticJsonParser;

    #[test]
    fn test_entry_created_empty_then_streamed() {
        let parse = OptimisticJsonParser::parse(r#"{"final_response": "Here"#);
        let mut entry = create_response_entry("c1", &ToolName::Done, &parse).unwrap();
        match &entry {
            ResponseEntry::Text(text) => {
                assert_eq!(text.message, "");
                assert!(text.is_final_message);
            }
            _ => panic!("Expected text entry"),
        }

        let parse = OptimisticJsonParser::parse(r#"{"final_response": "Here you go", "#);
        update_response_entry(&mut entry, &ToolName::Done, &parse);
        match &entry {
            ResponseEntry::Text(text) => assert_eq!(text.message, "Here you go"),
            _ => panic!("Expected text entry"),
        }
    }

    #[test]
    fn test_clarifying_question_key() {
        let parse = OptimisticJsonParser::parse(r#"{"clarifying_question": "Which year?"}"#);
        let entry = create_response_entry("c1", &ToolName::ClarifyingQuestion, &parse).unwrap();
        match entry {
            ResponseEntry::Text(text) => assert_eq!(text.message, "Which year?"),
            _ => panic!("Expected text entry"),
        }
    }

    #[test]
    fn test_non_response_tool_gets_no_entry() {
        let parse = OptimisticJsonParser::parse("{}");
        assert!(create_response_entry("c1", &ToolName::ExecuteSql, &parse).is_none());
    }
}
