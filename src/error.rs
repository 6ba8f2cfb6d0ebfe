use thiserror::Error;

/// Formatting-integrity failures. Any of these aborts the document and no
/// output file is written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("paragraph {position} has text but no run after adoption: {preview:?}")]
    RunAdoptionFailed { position: usize, preview: String },

    #[error("paragraph {position} text changed during styling: {before:?} -> {after:?}")]
    TextChanged {
        position: usize,
        before: String,
        after: String,
    },

    #[error("formatting removed all text: {processed} non-empty paragraphs before, none after")]
    AllTextLost { processed: usize },

    #[error("document text fingerprint changed during styling ({before} -> {after})")]
    FingerprintMismatch { before: String, after: String },
}
