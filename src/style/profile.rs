use crate::classify::Label;
use crate::docx::{Alignment, ParagraphFormat, RunFormat};

pub const BASE_FONT_FAMILY: &str = "Times New Roman";
pub const BASE_FONT_SIZE_PT: u32 = 12;

/// Fixed formatting attributes for one label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleProfile {
    pub size_pt: u32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub alignment: Alignment,
    pub space_before_pt: u32,
    pub space_after_pt: u32,
    pub line_spacing: f32,
    pub page_break_before: bool,
}

const TITLE: StyleProfile = StyleProfile {
    size_pt: 16,
    bold: true,
    italic: false,
    underline: true,
    alignment: Alignment::Center,
    space_before_pt: 0,
    space_after_pt: 12,
    line_spacing: 1.0,
    page_break_before: false,
};

const HEADING: StyleProfile = StyleProfile {
    size_pt: 14,
    bold: true,
    italic: false,
    underline: true,
    alignment: Alignment::Left,
    space_before_pt: 12,
    space_after_pt: 6,
    line_spacing: 1.0,
    page_break_before: false,
};

const CAPTION: StyleProfile = StyleProfile {
    size_pt: 10,
    bold: false,
    italic: true,
    underline: false,
    alignment: Alignment::Center,
    space_before_pt: 6,
    space_after_pt: 6,
    line_spacing: 1.0,
    page_break_before: false,
};

const BODY: StyleProfile = StyleProfile {
    size_pt: BASE_FONT_SIZE_PT,
    bold: false,
    italic: false,
    underline: false,
    alignment: Alignment::Justify,
    space_before_pt: 0,
    space_after_pt: 0,
    line_spacing: 1.5,
    page_break_before: false,
};

impl StyleProfile {
    /// `Other` is styled exactly like `Body`.
    pub fn for_label(label: Label) -> StyleProfile {
        match label {
            Label::Title => TITLE,
            Label::Heading => HEADING,
            Label::Caption => CAPTION,
            Label::Body | Label::Other => BODY,
        }
    }

    /// Same profile with a page break forced before the paragraph.
    pub fn with_page_break(self) -> StyleProfile {
        StyleProfile {
            page_break_before: true,
            ..self
        }
    }

    pub fn run_format(&self) -> RunFormat {
        RunFormat {
            font_family: BASE_FONT_FAMILY.to_string(),
            size_pt: self.size_pt,
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }

    pub fn paragraph_format(&self) -> ParagraphFormat {
        ParagraphFormat {
            alignment: self.alignment,
            space_before_pt: self.space_before_pt,
            space_after_pt: self.space_after_pt,
            line_spacing: self.line_spacing,
            page_break_before: self.page_break_before,
        }
    }
}

/// Uniform run style written before any label override.
pub fn base_run_format() -> RunFormat {
    RunFormat {
        font_family: BASE_FONT_FAMILY.to_string(),
        size_pt: BASE_FONT_SIZE_PT,
        bold: false,
        italic: false,
        underline: false,
    }
}
