//! Lenient JSON recovery for free-text model replies.
//!
//! Stage one decodes the whole reply (minus any Markdown fence). Stage two
//! searches for a JSON-looking substring that starts at a known key and
//! decodes only that. Anything else is `Unrecoverable`.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static TITLED_ARRAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\[\s*\{\s*"title".*\}\s*\]"#).expect("valid titled-array regex")
});

static SYMBOL_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{\s*"symbol".*\}"#).expect("valid symbol-object regex")
});

/// Key the second stage anchors on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonAnchor {
    /// An array whose first object starts with `"title"`.
    TitledArray,
    /// An object that starts with `"symbol"`.
    SymbolObject,
}

impl JsonAnchor {
    fn pattern(self) -> &'static Regex {
        match self {
            Self::TitledArray => &TITLED_ARRAY,
            Self::SymbolObject => &SYMBOL_OBJECT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsonParse {
    Parsed(Value),
    Unrecoverable(String),
}

impl JsonParse {
    pub fn into_result(self) -> anyhow::Result<Value> {
        match self {
            Self::Parsed(v) => Ok(v),
            Self::Unrecoverable(raw) => {
                anyhow::bail!("could not recover JSON from model reply: {raw}")
            }
        }
    }
}

pub fn parse_lenient(text: &str, anchor: JsonAnchor) -> JsonParse {
    let body = strip_fences(text);
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        return JsonParse::Parsed(v);
    }

    tracing::warn!(?anchor, "model reply is not plain JSON; attempting extraction");
    if let Some(m) = anchor.pattern().find(text) {
        if let Ok(v) = serde_json::from_str::<Value>(m.as_str()) {
            return JsonParse::Parsed(v);
        }
    }

    JsonParse::Unrecoverable(text.to_string())
}

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    // Remove Markdown fences (```json ... ``` or ``` ... ```).
    let mut inner = trimmed;
    if let Some((_, after_first)) = inner.split_once('\n') {
        inner = after_first;
    }
    if let Some(end) = inner.rfind("```") {
        inner = &inner[..end];
    }
    inner.trim()
}
