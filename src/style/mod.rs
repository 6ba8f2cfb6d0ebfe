pub mod applicator;
pub mod profile;

pub use applicator::{apply_style, StyleOutcome, StyleStage};
pub use profile::{base_run_format, StyleProfile, BASE_FONT_FAMILY};
