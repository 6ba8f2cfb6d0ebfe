use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use tracing::{debug, info};

use crate::classify::{classify_document, DelegatedClassifier, Label, LabelSource};
use crate::docx::{PageMargins, Paragraph, WordDocument};
use crate::error::FormatError;
use crate::style::apply_style;

/// 1 in top and bottom, 1.25 in left and right.
pub const PAGE_MARGINS: PageMargins = PageMargins {
    top: 1440,
    bottom: 1440,
    left: 1800,
    right: 1800,
};

pub const DEFAULT_OUTPUT_PREFIX: &str = "formatted_";

#[derive(Clone, Debug)]
pub struct FormatSummary {
    pub output: PathBuf,
    pub labels: Vec<Label>,
    pub source: LabelSource,
    pub title_position: Option<usize>,
    pub sections: usize,
    pub adopted_runs: usize,
    pub page_breaks: usize,
}

/// Text state of a document taken before styling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBaseline {
    pub paragraphs: usize,
    pub fingerprint: String,
}

impl TextBaseline {
    pub fn capture(doc: &WordDocument) -> Self {
        Self {
            paragraphs: doc.non_empty_count(),
            fingerprint: doc.text_fingerprint(),
        }
    }
}

/// Fails when every non-empty paragraph vanished or any paragraph text changed.
pub fn check_text_integrity(
    baseline: &TextBaseline,
    remaining: usize,
    fingerprint: &str,
) -> Result<(), FormatError> {
    debug!(
        before = baseline.paragraphs,
        after = remaining,
        "post-format verification"
    );
    if baseline.paragraphs > 0 && remaining == 0 {
        return Err(FormatError::AllTextLost {
            processed: baseline.paragraphs,
        });
    }
    if fingerprint != baseline.fingerprint {
        return Err(FormatError::FingerprintMismatch {
            before: baseline.fingerprint.clone(),
            after: fingerprint.to_string(),
        });
    }
    Ok(())
}

/// Checks `doc` against `baseline` and writes it only when the text survived.
pub fn save_verified(
    doc: &WordDocument,
    baseline: &TextBaseline,
    output: &Path,
) -> anyhow::Result<()> {
    check_text_integrity(baseline, doc.non_empty_count(), &doc.text_fingerprint())?;
    doc.save(output)
        .with_context(|| format!("write docx: {}", output.display()))
}

/// `<dir>/<prefix><file name>` next to the input.
pub fn default_output_path(input: &Path, prefix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document.docx".to_string());
    input.with_file_name(format!("{prefix}{name}"))
}

/// Margins, labels and per-paragraph styling for one document. The output is
/// written only after every text check has passed.
pub fn format_document(
    input: &Path,
    output: &Path,
    use_delegated: bool,
    precomputed: Option<&[Label]>,
    delegated: &DelegatedClassifier,
) -> anyhow::Result<FormatSummary> {
    let mut doc =
        WordDocument::open(input).with_context(|| format!("open docx: {}", input.display()))?;

    let sections = doc.set_margins(&PAGE_MARGINS);
    debug!(sections, "page margins set");

    let non_empty = doc.non_empty_paragraphs();
    let texts: Vec<String> = non_empty.iter().map(|(_, t)| t.clone()).collect();
    let baseline = TextBaseline::capture(&doc);

    let classification = classify_document(&texts, use_delegated, precomputed, delegated);

    let mut adopted_runs = 0usize;
    let mut page_breaks = 0usize;
    {
        let mut paragraphs: Vec<&mut Paragraph> = doc.paragraphs_mut().collect();
        for (position, ((index, _), label)) in non_empty.iter().zip(&classification.labels).enumerate() {
            let paragraph = paragraphs
                .get_mut(*index)
                .ok_or_else(|| anyhow!("paragraph index out of range: {index}"))?;
            let outcome = apply_style(
                paragraph,
                *label,
                classification.is_after_title(position),
                position,
            )
            .with_context(|| format!("style paragraph {position} ({label})"))?;
            if outcome.adopted_run {
                adopted_runs += 1;
            }
            if classification.is_after_title(position) {
                page_breaks += 1;
            }
        }
    }

    save_verified(&doc, &baseline, output)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        paragraphs = texts.len(),
        source = classification.source.as_str(),
        "formatted document"
    );

    Ok(FormatSummary {
        output: output.to_path_buf(),
        labels: classification.labels,
        source: classification.source,
        title_position: classification.title_position,
        sections,
        adopted_runs,
        page_breaks,
    })
}
