//! Typed parsing of language-model output.
//!
//! Models wrap JSON in Markdown fences, prepend prose, and copy trailing
//! commas from example snippets. We strip all of that before handing the text
//! to serde, and report a `MalformedResponse` if it still does not fit.

use serde::de::DeserializeOwned;

use crate::ports::AiError;

/// Parse `raw` as `T`, tolerating fences, surrounding prose and trailing commas.
pub fn parse_typed<T: DeserializeOwned>(operation: &'static str, raw: &str) -> Result<T, AiError> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let candidate = extract_json(trimmed).ok_or_else(|| AiError::MalformedResponse {
        operation,
        detail: "no JSON value found".to_string(),
    })?;

    serde_json::from_str(&candidate).map_err(|e| AiError::MalformedResponse {
        operation,
        detail: e.to_string(),
    })
}

/// Locate the outermost JSON object or array inside `text`.
pub fn extract_json(text: &str) -> Option<String> {
    let body = strip_fences(text);
    let start = body.find(['{', '['])?;
    let close = if body[start..].starts_with('{') { '}' } else { ']' };
    let end = body.rfind(close)?;
    if end < start {
        return None;
    }
    Some(remove_trailing_commas(&body[start..=end]))
}

fn strip_fences(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    // Skip the language tag on the fence line.
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

fn remove_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Truncate to at most `max` characters, on a char boundary, trimming whitespace.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max) {
        Some((idx, _)) => trimmed[..idx].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

/// Trim tags, drop empties and case-insensitive duplicates.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').trim().to_string();
        if tag.is_empty() {
            continue;
        }
        let key = tag.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(tag);
        }
    }
    out
}
