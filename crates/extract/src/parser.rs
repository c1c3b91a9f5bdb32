//! Turn raw generation output into triples.
//!
//! Upstream models are told to answer with a bare JSON array but regularly
//! wrap it in a markdown fence or surround it with prose. Strict parsing
//! only unwraps a leading fence; auxiliary parsing also digs an array out
//! of surrounding text.

use crate::error::ExtractError;
use crate::schema::Triple;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::warn;

/// Leading fence, optional language tag, body up to the closing fence (or
/// end of input when the model was cut off).
static LEADING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A```[A-Za-z0-9_+-]*[^\S\n]*\n?(?P<body>.*?)(?:```|\z)")
        .expect("leading fence pattern is valid")
});

static EMBEDDED_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[^\S\n]*\n(?P<body>.*?)```")
        .expect("embedded fence pattern is valid")
});

/// Strip a surrounding code fence, if any. Input without a leading fence is
/// returned trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match LEADING_FENCE.captures(trimmed).and_then(|c| c.name("body")) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

/// Strict parsing: unwrap a leading fence, then require a top-level array.
pub fn parse_triples(raw: &str) -> Result<Vec<Triple>, ExtractError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))?;
    triples_from_array(value)
}

/// Strict parsing first; on failure, fall back to a fenced block anywhere in
/// the text, then to the outermost `[...]` span, then to a `{"triples": [...]}`
/// object.
pub fn parse_triples_auxiliary(raw: &str) -> Result<Vec<Triple>, ExtractError> {
    let strict_err = match parse_triples(raw) {
        Ok(triples) => return Ok(triples),
        Err(e) => e,
    };

    if let Some(body) = EMBEDDED_FENCE.captures(raw).and_then(|c| c.name("body")) {
        if let Ok(triples) = parse_triples(body.as_str()) {
            return Ok(triples);
        }
    }

    let stripped = strip_code_fence(raw);
    if let (Some(start), Some(end)) = (stripped.find('['), stripped.rfind(']')) {
        if start < end {
            if let Ok(triples) = parse_triples(&stripped[start..=end]) {
                return Ok(triples);
            }
        }
    }

    if let Ok(Value::Object(mut obj)) = serde_json::from_str::<Value>(stripped) {
        if let Some(array) = obj.remove("triples") {
            return triples_from_array(array);
        }
    }

    Err(strict_err)
}

pub fn parse_response(raw: &str, auxiliary: bool) -> Result<Vec<Triple>, ExtractError> {
    if auxiliary {
        parse_triples_auxiliary(raw)
    } else {
        parse_triples(raw)
    }
}

fn triples_from_array(value: Value) -> Result<Vec<Triple>, ExtractError> {
    let Value::Array(items) = value else {
        return Err(ExtractError::Malformed("expected a JSON array".to_string()));
    };

    let mut triples = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match item {
            Value::Object(obj) => triples.push(Triple::new(
                field(obj, "subject"),
                field(obj, "predicate"),
                field(obj, "object"),
            )),
            other => warn!(index = idx, item = %other, "Skipping non-object triple"),
        }
    }

    Ok(triples)
}

/// Strings pass through, numbers and booleans are rendered, anything else
/// becomes empty and is rejected at storage.
fn field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
