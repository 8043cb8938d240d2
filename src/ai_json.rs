use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)```(?:json)?\s*(.*?)```").expect("valid fence regex"))
}

fn exponent_tail_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.?\d*e[+-]?$").expect("valid exponent regex"))
}

/// Pull a JSON payload out of free-form model output.
///
/// The payload may be wrapped in a ``` fenced block (optionally tagged
/// `json`), preceded by prose, or cut off mid-emission. The returned string
/// parses whenever the input is salvageable; on total failure the best-effort
/// candidate is returned unchanged and the caller's own parse reports the
/// error. Never panics.
pub fn extract_json(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let candidate = if let Some(caps) = fence_regex().captures(text) {
        caps[1].trim().to_string()
    } else {
        let start = match (text.find('{'), text.find('[')) {
            (Some(obj), Some(arr)) => Some(obj.min(arr)),
            (Some(obj), None) => Some(obj),
            (None, Some(arr)) => Some(arr),
            (None, None) => None,
        };
        match start {
            Some(pos) => text[pos..].trim().to_string(),
            None => text.trim().to_string(),
        }
    };

    if serde_json::from_str::<serde_json::Value>(&candidate).is_ok() {
        return candidate;
    }

    let repaired = repair_truncated_json(&candidate);
    match serde_json::from_str::<serde_json::Value>(&repaired) {
        Ok(_) => repaired,
        Err(err) => {
            warn!(
                "JSON repair did not produce a parseable result ({} chars): {}",
                candidate.len(),
                err
            );
            candidate
        }
    }
}

/// Close off a JSON string that was truncated mid-emission.
///
/// Adds only the minimum punctuation needed to make the text parseable:
/// a dangling string literal gets its closing quote, and every structure
/// still open at the cut point gets its matching closer. Data lost to the
/// truncation itself, invalid escape sequences, and closers that mismatch
/// their opener are left as-is.
pub fn repair_truncated_json(json: &str) -> String {
    let mut repaired = json.trim().to_string();

    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut is_escaped = false;

    for ch in repaired.chars() {
        if in_string {
            // Single-character escape toggle, not a full escape-pair state
            // machine; backslash runs are walked one character at a time.
            if is_escaped {
                is_escaped = false;
            } else if ch == '\\' {
                is_escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else {
            match ch {
                '"' => in_string = true,
                '{' => stack.push('}'),
                '[' => stack.push(']'),
                '}' | ']' => {
                    if stack.last() == Some(&ch) {
                        stack.pop();
                    }
                }
                _ => {}
            }
        }
    }

    if in_string {
        repaired.push('"');
    }

    repaired = repaired.trim().to_string();

    // Unterminated fraction: `"x": 12.` -> `"x": 12.0`
    let bytes = repaired.as_bytes();
    if bytes.len() >= 2
        && bytes[bytes.len() - 1] == b'.'
        && bytes[bytes.len() - 2].is_ascii_digit()
    {
        repaired.push('0');
    }

    // Incomplete scientific notation: `1.5e` / `1.5e-` -> append a digit.
    if exponent_tail_regex().is_match(&repaired) {
        repaired.push('0');
    }

    if repaired.ends_with(',') {
        repaired.pop();
    }

    if repaired.ends_with(':') {
        repaired.push_str(" null");
    }

    // Close innermost-open structures first.
    while let Some(closer) = stack.pop() {
        repaired.push(closer);
    }

    repaired
}
