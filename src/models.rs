use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One search hit. `answer` may carry markdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub answer: String,
}

/// `{ "entries": [ { "answer": ... }, ... ] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntriesResponse {
    pub entries: Vec<Entry>,
}

/// `{ "text": ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchResponse {
    Entries(EntriesResponse),
    Text(TextResponse),
}

/// How a controller renders responses. Chosen once, when the controller is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Each entry becomes a `<p class="answer">` with its markdown converted to HTML.
    #[default]
    Entries,
    /// The `text` field replaces the target's text content.
    PlainText,
}

impl RenderMode {
    /// Selector of the render target the bundled help page provides for this mode.
    pub fn default_target(&self) -> &'static str {
        match self {
            RenderMode::Entries => ".js-hits",
            RenderMode::PlainText => ".answer",
        }
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entries" => Ok(RenderMode::Entries),
            "text" | "plain-text" | "plaintext" => Ok(RenderMode::PlainText),
            other => Err(format!(
                "unknown render mode {other:?} (expected \"entries\" or \"text\")"
            )),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Entries => f.write_str("entries"),
            RenderMode::PlainText => f.write_str("text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_mode_parse() {
        assert_eq!("entries".parse::<RenderMode>(), Ok(RenderMode::Entries));
        assert_eq!(" Text ".parse::<RenderMode>(), Ok(RenderMode::PlainText));
        assert_eq!("plain-text".parse::<RenderMode>(), Ok(RenderMode::PlainText));
        assert!("markdown".parse::<RenderMode>().is_err());
    }

    #[test]
    fn test_entries_ignore_unknown_fields() {
        let body = r#"{"entries":[{"answer":"a","score":0.3}],"took":12}"#;
        let parsed: EntriesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.entries, vec![Entry { answer: "a".into() }]);
    }

    #[test]
    fn test_entry_without_answer_is_rejected() {
        let body = r#"{"entries":[{"question":"q"}]}"#;
        assert!(serde_json::from_str::<EntriesResponse>(body).is_err());
    }

    #[test]
    fn test_text_response_requires_text() {
        assert!(serde_json::from_str::<TextResponse>(r#"{"entries":[]}"#).is_err());
        let parsed: TextResponse = serde_json::from_str(r#"{"text":"Hello"}"#).unwrap();
        assert_eq!(parsed.text, "Hello");
    }
}
