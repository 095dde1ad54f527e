//! Tolerant JSON extraction from model output.
//!
//! Models wrap JSON in markdown fences, prepend chatter, or append a
//! friendly sign-off. [`extract_json`] recovers the value anyway, trying
//! progressively looser strategies:
//!
//! 1. strip code-fence markers and parse the whole text
//! 2. parse from the first `{` to the last `}`
//! 3. scan brace depth from the first `{` and try each balanced closure
//! 4. parse from the first `[` to the last `]`
//!
//! Extraction never panics; `None` means nothing usable was found.

use serde_json::Value as JsonValue;

const FENCE: &str = "```";

/// Recovers a JSON value from free-form model text.
#[must_use]
pub fn extract_json(text: &str) -> Option<JsonValue> {
    let stripped = strip_code_fences(text);
    let candidate = stripped.trim();

    if let Ok(value) = serde_json::from_str(candidate) {
        return Some(value);
    }

    if let Some(value) = extract_object(candidate) {
        return Some(value);
    }

    if let Some(value) = extract_between(candidate, '[', ']') {
        return Some(value);
    }

    let preview: String = text.chars().take(200).collect();
    tracing::debug!(preview = %preview, "No JSON found in model output");
    None
}

/// Removes markdown fence markers, including a `json` language tag and the
/// whitespace that follows each marker.
fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(FENCE) {
        out.push_str(&rest[..pos]);
        let mut after = &rest[pos + FENCE.len()..];
        if after
            .get(..4)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("json"))
        {
            after = &after[4..];
        }
        rest = after.trim_start();
    }

    out.push_str(rest);
    out
}

fn extract_object(text: &str) -> Option<JsonValue> {
    let start = text.find('{')?;

    if let Some(value) = extract_between(text, '{', '}') {
        return Some(value);
    }

    balanced_objects(&text[start..])
}

/// Parses the slice from the first `open` to the last `close`, inclusive.
fn extract_between(text: &str, open: char, close: char) -> Option<JsonValue> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Walks forward from an opening brace, trying every prefix that closes the
/// outermost object. Braces inside JSON strings are ignored.
fn balanced_objects(text: &str) -> Option<JsonValue> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0
                    && let Ok(value) = serde_json::from_str(&text[..=idx])
                {
                    return Some(value);
                }
            }
            _ => {}
        }
    }

    None
}
