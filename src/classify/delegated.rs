//! Delegated classification: one batch prompt per document, answered by a
//! remote oracle. Every failure collapses to `None` so callers fall back.

use tracing::{debug, warn};

use crate::classify::label::Label;
use crate::classify::oracle::CompletionOracle;
use crate::textutil::excerpt;

pub const LABEL_PROMPT_HEADER: &str = r#"Classify each of the following document paragraphs into exactly one label per line:
- title (document or section title, usually short, one line)
- heading (section heading, subsection title)
- body (normal paragraph)
- caption (figure/table caption)
- other

Return ONLY a JSON array of strings, one label per paragraph, in order. Example: ["title","heading","body","body","caption"]
Paragraphs (one per line, numbered):
"#;

pub const SUMMARY_PROMPT_HEADER: &str = "Summarize this document in 1–2 short sentences. Be concise.\n\n";

#[derive(Clone, Debug, PartialEq)]
pub struct DelegationSettings {
    /// Per-paragraph excerpt length in the label prompt.
    pub excerpt_chars: usize,
    pub label_temperature: f32,
    pub summary_temperature: f32,
    pub summary_max_chars: usize,
}

impl Default for DelegationSettings {
    fn default() -> Self {
        Self {
            excerpt_chars: 200,
            label_temperature: 0.0,
            summary_temperature: 0.3,
            summary_max_chars: 4000,
        }
    }
}

/// Optional capability: present when an oracle (and so a credential) exists.
pub struct DelegatedClassifier {
    oracle: Option<Box<dyn CompletionOracle>>,
    settings: DelegationSettings,
}

impl DelegatedClassifier {
    pub fn new(oracle: Box<dyn CompletionOracle>, settings: DelegationSettings) -> Self {
        Self {
            oracle: Some(oracle),
            settings,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            oracle: None,
            settings: DelegationSettings::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.oracle.is_some()
    }

    pub fn settings(&self) -> &DelegationSettings {
        &self.settings
    }

    /// One label per input text, or `None` when delegation is unavailable,
    /// the call fails, or the answer is not a list of the right length.
    pub fn labels(&self, texts: &[String]) -> Option<Vec<Label>> {
        let oracle = self.oracle.as_ref()?;
        if texts.is_empty() {
            return None;
        }
        let prompt = build_label_prompt(texts, self.settings.excerpt_chars);
        let raw = match oracle.complete(&prompt, self.settings.label_temperature) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "delegated labeling failed");
                return None;
            }
        };
        let labels = parse_label_response(&raw, texts.len());
        if labels.is_none() {
            warn!(expected = texts.len(), "delegated labeling answer rejected");
            debug!(raw = %raw, "rejected labeling answer");
        }
        labels
    }

    /// A short synopsis of `text`, or `None` when unavailable or empty.
    pub fn summarize(&self, text: &str) -> Option<String> {
        let oracle = self.oracle.as_ref()?;
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let prompt = format!(
            "{SUMMARY_PROMPT_HEADER}{}",
            excerpt(text, self.settings.summary_max_chars)
        );
        match oracle.complete(&prompt, self.settings.summary_temperature) {
            Ok(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "delegated summary failed");
                None
            }
        }
    }
}

pub fn build_label_prompt(texts: &[String], excerpt_chars: usize) -> String {
    let mut prompt = String::from(LABEL_PROMPT_HEADER);
    for (i, t) in texts.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, excerpt(t, excerpt_chars)));
    }
    prompt
}

/// Removes a Markdown code fence around the answer, if any. A `json` tag on
/// the opening fence is dropped in any letter case.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
        if let Some(body) = s.trim_end().strip_suffix("```") {
            s = body;
        }
    }
    s.trim()
}

/// Parses a JSON array of label strings; the length must equal `expected`.
pub fn parse_label_response(raw: &str, expected: usize) -> Option<Vec<Label>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(strip_code_fence(raw)).ok()?;
    if values.len() != expected {
        return None;
    }
    Some(
        values
            .iter()
            .map(|v| match v {
                serde_json::Value::String(s) => Label::parse_lenient(s),
                other => Label::parse_lenient(&other.to_string()),
            })
            .collect(),
    )
}
