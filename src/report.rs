//! Delegated-only outputs that sit beside formatting: the classification
//! report, the document synopsis and the combined `process` result.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Context};
use base64::Engine as _;
use serde::Serialize;
use tracing::{info, warn};

use crate::classify::{DelegatedClassifier, Label};
use crate::docx::WordDocument;
use crate::format::format_document;
use crate::textutil::excerpt;

const PREVIEW_CHARS: usize = 150;
pub const SUMMARY_UNAVAILABLE: &str = "(Summary unavailable)";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParagraphLabel {
    pub index: usize,
    pub text_preview: String,
    pub label: Label,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub paragraphs: Vec<ParagraphLabel>,
    /// Count per label that occurs at least once.
    pub summary: BTreeMap<Label, usize>,
}

impl ClassificationReport {
    pub fn labels(&self) -> Vec<Label> {
        self.paragraphs.iter().map(|p| p.label).collect()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SummaryReport {
    pub summary: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProcessOutcome {
    pub formatted_file_base64: String,
    pub filename: String,
    pub summary: String,
    pub classification: BTreeMap<Label, usize>,
}

fn non_empty_texts(input: &Path) -> anyhow::Result<Vec<String>> {
    let doc =
        WordDocument::open(input).with_context(|| format!("open docx: {}", input.display()))?;
    Ok(doc.non_empty_paragraphs().into_iter().map(|(_, t)| t).collect())
}

fn build_report(texts: &[String], labels: Vec<Label>) -> ClassificationReport {
    let mut summary: BTreeMap<Label, usize> = BTreeMap::new();
    for label in &labels {
        *summary.entry(*label).or_default() += 1;
    }
    let paragraphs = texts
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(index, (text, label))| ParagraphLabel {
            index,
            text_preview: excerpt(text, PREVIEW_CHARS),
            label,
        })
        .collect();
    ClassificationReport {
        paragraphs,
        summary,
    }
}

/// Labels from the delegated classifier only. An empty document gives an
/// empty report; otherwise no answer is an error.
pub fn classification_report(
    input: &Path,
    delegated: &DelegatedClassifier,
) -> anyhow::Result<ClassificationReport> {
    let texts = non_empty_texts(input)?;
    if texts.is_empty() {
        return Ok(ClassificationReport::default());
    }
    let labels = delegated
        .labels(&texts)
        .ok_or_else(|| anyhow!("delegated classification unavailable (no API key, or the LLM call failed)"))?;
    Ok(build_report(&texts, labels))
}

/// Synopsis of the non-empty paragraph texts, or `None` when delegation has no answer.
pub fn summarize_document(
    input: &Path,
    delegated: &DelegatedClassifier,
) -> anyhow::Result<Option<String>> {
    let texts = non_empty_texts(input)?;
    Ok(delegated.summarize(&texts.join("\n")))
}

/// Classify once, format with those labels, then summarize. The output file
/// is written to `output` and also returned base64-encoded.
pub fn process_document(
    input: &Path,
    output: &Path,
    delegated: &DelegatedClassifier,
) -> anyhow::Result<ProcessOutcome> {
    let report = classification_report(input, delegated)?;
    let labels = report.labels();
    format_document(input, output, false, Some(&labels), delegated)?;

    let summary = match summarize_document(input, delegated)? {
        Some(s) => s,
        None => {
            warn!("summary unavailable");
            SUMMARY_UNAVAILABLE.to_string()
        }
    };

    let bytes =
        std::fs::read(output).with_context(|| format!("read output: {}", output.display()))?;
    let filename = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    info!(filename = %filename, bytes = bytes.len(), "processed document");

    Ok(ProcessOutcome {
        formatted_file_base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        filename,
        summary,
        classification: report.summary,
    })
}
