pub mod classify;
pub mod config;
pub mod docx;
pub mod error;
pub mod format;
pub mod report;
pub mod style;
pub mod textutil;

pub use classify::{classify_document, classify_paragraph, Classification, Label, LabelSource};
pub use error::FormatError;
pub use format::{format_document, FormatSummary, PAGE_MARGINS};
pub use style::apply_style;
