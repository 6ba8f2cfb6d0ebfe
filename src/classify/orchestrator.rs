//! Chooses where a document's labels come from and tracks the title position.

use serde::Serialize;
use tracing::{debug, info};

use crate::classify::delegated::DelegatedClassifier;
use crate::classify::label::Label;
use crate::classify::rules::classify_paragraph;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    Precomputed,
    Delegated,
    RuleBased,
}

impl LabelSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LabelSource::Precomputed => "precomputed",
            LabelSource::Delegated => "delegated",
            LabelSource::RuleBased => "rule_based",
        }
    }
}

/// One label per non-empty paragraph plus the position of the first title.
///
/// Only the rule-based pass records a title position. Precomputed and
/// delegated labels are styled as given and never force a page break.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub labels: Vec<Label>,
    pub title_position: Option<usize>,
    pub source: LabelSource,
}

impl Classification {
    fn from_labels(labels: Vec<Label>, source: LabelSource) -> Self {
        Self {
            labels,
            title_position: None,
            source,
        }
    }

    /// True only for the paragraph directly after the detected title.
    pub fn is_after_title(&self, position: usize) -> bool {
        self.title_position.map(|t| t + 1) == Some(position)
    }
}

/// Running state of the rule-based fold.
#[derive(Clone, Copy, Debug, Default)]
struct RuleContext {
    position: usize,
    title_position: Option<usize>,
}

impl RuleContext {
    fn advance(self, label: Label) -> Self {
        let title_position = match (self.title_position, label) {
            (None, Label::Title) => Some(self.position),
            (kept, _) => kept,
        };
        Self {
            position: self.position + 1,
            title_position,
        }
    }
}

/// Labels every text independently with the rule-based classifier.
pub fn classify_rule_based(texts: &[String]) -> Classification {
    let (labels, ctx) = texts.iter().fold(
        (Vec::with_capacity(texts.len()), RuleContext::default()),
        |(mut labels, ctx), text| {
            let label = classify_paragraph(text, ctx.position == 0);
            labels.push(label);
            (labels, ctx.advance(label))
        },
    );
    Classification {
        labels,
        title_position: ctx.title_position,
        source: LabelSource::RuleBased,
    }
}

/// Precomputed labels win when their length matches; otherwise delegation is
/// tried when requested; otherwise, or when delegation has no answer, rules.
pub fn classify_document(
    texts: &[String],
    use_delegated: bool,
    precomputed: Option<&[Label]>,
    delegated: &DelegatedClassifier,
) -> Classification {
    if let Some(labels) = precomputed {
        if labels.len() == texts.len() {
            info!(paragraphs = texts.len(), "using precomputed labels");
            return Classification::from_labels(labels.to_vec(), LabelSource::Precomputed);
        }
        debug!(
            labels = labels.len(),
            paragraphs = texts.len(),
            "precomputed labels ignored: length mismatch"
        );
    }

    if use_delegated {
        if let Some(labels) = delegated.labels(texts) {
            info!(paragraphs = texts.len(), "using delegated labels");
            return Classification::from_labels(labels, LabelSource::Delegated);
        }
        info!("delegated classification unavailable, falling back to rules");
    }

    let classification = classify_rule_based(texts);
    info!(paragraphs = texts.len(), "using rule-based labels");
    classification
}
