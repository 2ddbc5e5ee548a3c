use serde_json::{Map, Value};
use std::collections::HashMap;

/// Result of an optimistic parse over possibly-incomplete JSON text.
///
/// `is_complete` is true iff the text parsed strictly; in that case `parsed`
/// is the strict result. Otherwise `parsed` is a best-effort value built
/// from the parts whose closing delimiters have streamed, and
/// `extracted_values` maps dotted key paths to every value that could be
/// recovered. Worst case: an empty object and an empty map, never an error.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub parsed: Value,
    pub is_complete: bool,
    pub extracted_values: HashMap<String, Value>,
}

pub struct OptimisticJsonParser;

impl OptimisticJsonParser {
    pub fn parse(text: &str) -> ParseResult {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            let mut extracted = HashMap::new();
            collect_paths(&value, String::new(), &mut extracted);
            return ParseResult {
                parsed: value,
                is_complete: true,
                extracted_values: extracted,
            };
        }

        let mut extracted = HashMap::new();
        let mut scanner = Scanner::new(text.as_bytes());
        scanner.skip_ws();
        let parsed = match scanner.scan_value(Some(String::new()), &mut extracted) {
            Scanned::Complete(v) | Scanned::Partial(v) => v,
            Scanned::Incomplete => Value::Object(Map::new()),
        };
        let parsed = match parsed {
            v @ (Value::Object(_) | Value::Array(_)) => v,
            _ => Value::Object(Map::new()),
        };

        ParseResult {
            parsed,
            is_complete: false,
            extracted_values: extracted,
        }
    }
}

/// Fetch a string value extracted at `path`, if any
pub fn optimistic_str<'a>(values: &'a HashMap<String, Value>, path: &str) -> Option<&'a str> {
    values.get(path).and_then(Value::as_str)
}

pub fn optimistic_bool(values: &HashMap<String, Value>, path: &str) -> Option<bool> {
    values.get(path).and_then(Value::as_bool)
}

pub fn optimistic_array<'a>(values: &'a HashMap<String, Value>, path: &str) -> Option<&'a Vec<Value>> {
    values.get(path).and_then(Value::as_array)
}

/// Register every object member (at any depth) under its dotted path.
/// Arrays are registered as whole values; their elements are not pathed.
fn collect_paths(value: &Value, prefix: String, out: &mut HashMap<String, Value>) {
    if let Value::Object(map) = value {
        for (key, child) in map {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            out.insert(path.clone(), child.clone());
            if child.is_object() {
                collect_paths(child, path, out);
            }
        }
    }
}

enum Scanned {
    /// Value closed by its delimiter
    Complete(Value),
    /// Container cut off mid-stream; holds only its complete parts
    Partial(Value),
    /// Nothing recoverable (unterminated string, trailing number, malformed)
    Incomplete,
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    /// `path`: Some(prefix) when object members at this level should be
    /// registered in `extracted`; None inside arrays.
    fn scan_value(&mut self, path: Option<String>, extracted: &mut HashMap<String, Value>) -> Scanned {
        match self.peek() {
            Some(b'"') => self
                .scan_string()
                .map_or(Scanned::Incomplete, |s| Scanned::Complete(Value::String(s))),
            Some(b'{') => self.scan_object(path, extracted),
            Some(b'[') => self.scan_array(extracted),
            Some(b't') => self.scan_literal("true", Value::Bool(true)),
            Some(b'f') => self.scan_literal("false", Value::Bool(false)),
            Some(b'n') => self.scan_literal("null", Value::Null),
            Some(b'-' | b'0'..=b'9') => self.scan_number(),
            _ => Scanned::Incomplete,
        }
    }

    /// Returns the decoded string if the closing quote has streamed
    fn scan_string(&mut self) -> Option<String> {
        debug_assert_eq!(self.peek(), Some(b'"'));
        self.pos += 1;
        let mut out = Vec::new();
        while let Some(b) = self.peek() {
            match b {
                b'"' => {
                    self.pos += 1;
                    // Re-decode through serde_json so \uXXXX and friends
                    // behave exactly like the strict parser
                    let raw = String::from_utf8_lossy(&out).into_owned();
                    let quoted = format!("\"{raw}\"");
                    return match serde_json::from_str::<String>(&quoted) {
                        Ok(s) => Some(s),
                        Err(_) => Some(raw),
                    };
                }
                b'\\' => {
                    out.push(b);
                    self.pos += 1;
                    if let Some(esc) = self.peek() {
                        out.push(esc);
                        self.pos += 1;
                    } else {
                        return None;
                    }
                }
                _ => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
        None
    }

    fn scan_object(&mut self, path: Option<String>, extracted: &mut HashMap<String, Value>) -> Scanned {
        self.pos += 1; // consume '{'
        let mut map = Map::new();

        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    return Scanned::Complete(Value::Object(map));
                }
                Some(b'"') => {}
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                _ => return Scanned::Partial(Value::Object(map)),
            }

            let Some(key) = self.scan_string() else {
                return Scanned::Partial(Value::Object(map));
            };

            self.skip_ws();
            if self.peek() != Some(b':') {
                return Scanned::Partial(Value::Object(map));
            }
            self.pos += 1;
            self.skip_ws();

            let child_path = path.as_ref().map(|prefix| {
                if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                }
            });

            match self.scan_value(child_path.clone(), extracted) {
                Scanned::Complete(value) => {
                    if let Some(p) = &child_path {
                        extracted.insert(p.clone(), value.clone());
                    }
                    map.insert(key, value);
                }
                Scanned::Partial(value) => {
                    // Surface the partial container so callers can read the
                    // prefix of complete elements while the tail streams
                    if let Some(p) = &child_path {
                        extracted.insert(p.clone(), value.clone());
                    }
                    map.insert(key, value);
                    return Scanned::Partial(Value::Object(map));
                }
                Scanned::Incomplete => return Scanned::Partial(Value::Object(map)),
            }

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Scanned::Complete(Value::Object(map));
                }
                _ => return Scanned::Partial(Value::Object(map)),
            }
        }
    }

    fn scan_array(&mut self, extracted: &mut HashMap<String, Value>) -> Scanned {
        self.pos += 1; // consume '['
        let mut items = Vec::new();

        loop {
            self.skip_ws();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Scanned::Complete(Value::Array(items));
                }
                None => return Scanned::Partial(Value::Array(items)),
                _ => {}
            }

            match self.scan_value(None, extracted) {
                Scanned::Complete(value) => items.push(value),
                Scanned::Partial(value) => {
                    items.push(value);
                    return Scanned::Partial(Value::Array(items));
                }
                Scanned::Incomplete => return Scanned::Partial(Value::Array(items)),
            }

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Scanned::Complete(Value::Array(items));
                }
                _ => return Scanned::Partial(Value::Array(items)),
            }
        }
    }

    /// Literals cannot extend once fully spelled, so a complete token counts
    /// as closed even at end of input
    fn scan_literal(&mut self, word: &str, value: Value) -> Scanned {
        let end = self.pos + word.len();
        if self.bytes.len() >= end && &self.bytes[self.pos..end] == word.as_bytes() {
            self.pos = end;
            Scanned::Complete(value)
        } else {
            self.pos = self.bytes.len();
            Scanned::Incomplete
        }
    }

    /// Numbers at the end of input may still grow more digits; only a number
    /// followed by a delimiter is complete
    fn scan_number(&mut self) -> Scanned {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9')
        ) {
            self.pos += 1;
        }
        if self.pos == self.bytes.len() {
            return Scanned::Incomplete;
        }
        let raw = &self.bytes[start..self.pos];
        match serde_json::from_slice::<Value>(raw) {
            Ok(v) if v.is_number() => Scanned::Complete(v),
            _ => Scanned::Incomplete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_parse_is_complete() {
        let result = OptimisticJsonParser::parse(r#"{"a":1,"b":2}"#);
        assert!(result.is_complete);
        assert_eq!(result.parsed["a"], 1);
        assert_eq!(result.extracted_values.get("b"), Some(&Value::from(2)));
    }

    #[test]
    fn test_unterminated_string_not_extracted() {
        let result = OptimisticJsonParser::parse(r#"{"thought": "partial"#);
        assert!(!result.is_complete);
        assert!(!result.extracted_values.contains_key("thought"));
    }

    #[test]
    fn test_closed_string_extracted_before_truncation() {
        let result = OptimisticJsonParser::parse(r#"{"first": "value1", "second": "val"#);
        assert!(!result.is_complete);
        assert_eq!(optimistic_str(&result.extracted_values, "first"), Some("value1"));
        assert!(!result.extracted_values.contains_key("second"));
    }

    #[test]
    fn test_nested_paths() {
        let result = OptimisticJsonParser::parse(r#"{"outer": {"inner": "deep", "tail": "cut"#);
        assert_eq!(optimistic_str(&result.extracted_values, "outer.inner"), Some("deep"));
        assert!(result.extracted_values.contains_key("outer"));
    }

    #[test]
    fn test_partial_array_surfaces_complete_prefix() {
        let result = OptimisticJsonParser::parse(
            r#"{"files": [{"name": "a", "content": "x"}, {"name": "b", "content": "y"#,
        );
        let files = optimistic_array(&result.extracted_values, "files").unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0]["name"], "a");
        assert_eq!(files[0]["content"], "x");
        // Trailing element surfaces only its closed members
        assert_eq!(files[1]["name"], "b");
        assert!(files[1].get("content").is_none());
    }

    #[test]
    fn test_trailing_number_ignored() {
        let result = OptimisticJsonParser::parse(r#"{"count": 12"#);
        assert!(!result.extracted_values.contains_key("count"));

        let result = OptimisticJsonParser::parse(r#"{"count": 12, "#);
        assert_eq!(result.extracted_values.get("count"), Some(&Value::from(12)));
    }

    #[test]
    fn test_complete_literals() {
        let result = OptimisticJsonParser::parse(r#"{"flag": true, "next": "x"#);
        assert_eq!(optimistic_bool(&result.extracted_values, "flag"), Some(true));

        let result = OptimisticJsonParser::parse(r#"{"flag": fal"#);
        assert!(!result.extracted_values.contains_key("flag"));
    }

    #[test]
    fn test_escapes_decoded() {
        let result = OptimisticJsonParser::parse(r#"{"msg": "say \"hi\"\nnow", "t": "#);
        assert_eq!(
            optimistic_str(&result.extracted_values, "msg"),
            Some("say \"hi\"\nnow")
        );
    }

    #[test]
    fn test_garbage_never_errors() {
        for text in ["", "not json", "{\"missing\" \"colon\"}", "[", "{", "nul"] {
            let result = OptimisticJsonParser::parse(text);
            assert!(!result.is_complete, "{text:?} should not be complete");
        }
    }
}
