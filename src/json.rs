//! JSON Response Parser (spec §4.2, C2): extracts, repairs, and verifies
//! structural completeness of LLM JSON output before anything downstream
//! trusts it.

use crate::error::{EngineError, Result};
use serde_json::Value;

/// Parses raw LLM text into a JSON value, per the five-step pipeline in
/// spec §4.2.
pub fn parse(raw: &str) -> Result<Value> {
    if !is_balanced(raw) {
        return Err(EngineError::Truncated);
    }

    let stripped = strip_fences(raw);
    let extracted = extract_outer(&stripped).ok_or_else(|| {
        EngineError::Generation("no JSON object or array found in response".to_string())
    })?;

    let repaired = repair_trailing_commas(extracted);

    let mut value = match serde_json::from_str::<Value>(&repaired) {
        Ok(v) => v,
        Err(_) => {
            let collapsed = repaired.replace('\n', " ");
            serde_json::from_str::<Value>(&collapsed)?
        }
    };

    replace_dashes(&mut value);
    Ok(value)
}

/// Counts unescaped `{}[]`, tracking whether we're inside a string, and
/// reports whether every opener has a matching closer. An unbalanced
/// result means the model's response was cut off mid-generation.
fn is_balanced(s: &str) -> bool {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut saw_any = false;

    for ch in s.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' | '[' => {
                depth += 1;
                saw_any = true;
            }
            '}' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }

    !in_string && depth == 0 && saw_any
}

/// Strips a leading/trailing fenced-code block (```` ```json ... ``` ````
/// or plain ```` ``` ... ``` ````) if present.
fn strip_fences(s: &str) -> String {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
        let rest = rest.strip_prefix('\n').unwrap_or(rest);
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim().to_string();
        }
        return rest.trim().to_string();
    }
    trimmed.to_string()
}

/// Extracts the outermost JSON object or array by string-aware bracket
/// matching, ignoring any leading/trailing prose the model added.
fn extract_outer(s: &str) -> Option<String> {
    let chars: Vec<char> = s.chars().collect();
    let start = chars.iter().position(|&c| c == '{' || c == '[')?;
    let opener = chars[start];
    let closer = if opener == '{' { '}' } else { ']' };

    let mut depth = 0i64;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            c if c == opener => depth += 1,
            c if c == closer => {
                depth -= 1;
                if depth == 0 {
                    return Some(chars[start..=i].iter().collect());
                }
            }
            _ => {}
        }
    }
    None
}

/// Removes trailing commas before a closing brace/bracket, outside of
/// string literals.
fn repair_trailing_commas(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let chars: Vec<char> = s.chars().collect();
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            i += 1;
            continue;
        }

        if ch == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && (chars[j] == '}' || chars[j] == ']') {
                i += 1;
                continue;
            }
        }

        out.push(ch);
        i += 1;
    }

    out
}

/// Replaces en (–) and em (—) dashes inside every string value with a
/// comma — the engine's house style policy (spec §4.2 step 5).
fn replace_dashes(value: &mut Value) {
    match value {
        Value::String(s) => {
            *s = s.replace(['\u{2013}', '\u{2014}'], ",");
        }
        Value::Array(items) => {
            for item in items {
                replace_dashes(item);
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                replace_dashes(v);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_object() {
        let raw = r#"{"title": "Foo", "count": 3}"#;
        let v = parse(raw).unwrap();
        assert_eq!(v["title"], "Foo");
        assert_eq!(v["count"], 3);
    }

    #[test]
    fn strips_fenced_code_and_prose() {
        let raw = "Here is the outline:\n```json\n{\"a\": 1}\n```\nHope that helps!";
        let v = parse(raw).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn repairs_trailing_comma() {
        let raw = r#"{"list": [1, 2, 3,], "done": true,}"#;
        let v = parse(raw).unwrap();
        assert_eq!(v["list"].as_array().unwrap().len(), 3);
        assert_eq!(v["done"], true);
    }

    #[test]
    fn detects_truncation() {
        let raw = r#"{"title": "Foo", "list": [1, 2, 3"#;
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, EngineError::Truncated));
    }

    #[test]
    fn ignores_brackets_inside_strings_when_checking_balance() {
        let raw = r#"{"note": "use [brackets] like {this}"}"#;
        assert!(parse(raw).is_ok());
    }

    #[test]
    fn replaces_en_and_em_dashes_in_string_values() {
        let raw = "{\"text\": \"a cold night \u{2014} and a colder dawn \u{2013} waited.\"}";
        let v = parse(raw).unwrap();
        assert_eq!(v["text"], "a cold night , and a colder dawn , waited.");
    }

    #[test]
    fn collapses_newlines_when_initial_parse_fails() {
        // A bare newline inside a JSON string is invalid per the JSON
        // grammar; the second-pass collapse should recover it.
        let raw = "{\"text\": \"line one\nline two\"}";
        let v = parse(raw).unwrap();
        assert_eq!(v["text"], "line one line two");
    }
}
