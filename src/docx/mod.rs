pub mod document;
pub mod package;
pub mod paragraph;
pub mod props;
pub mod xml;

pub use document::WordDocument;
pub use paragraph::Paragraph;
pub use props::{Alignment, PageMargins, ParagraphFormat, RunFormat};
