pub mod delegated;
pub mod label;
pub mod oracle;
pub mod orchestrator;
pub mod rules;

pub use delegated::{DelegatedClassifier, DelegationSettings};
pub use label::Label;
pub use oracle::{CompletionOracle, GeminiOracle};
pub use orchestrator::{classify_document, Classification, LabelSource};
pub use rules::classify_paragraph;
