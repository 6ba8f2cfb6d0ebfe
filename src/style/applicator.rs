//! Turns one labeled paragraph into direct formatting.
//!
//! Stages run strictly in order: runs ensured, base style, label style, then
//! the optional forced page break. A paragraph never goes back a stage.

use tracing::debug;

use crate::classify::Label;
use crate::docx::Paragraph;
use crate::error::FormatError;
use crate::style::profile::{base_run_format, StyleProfile};
use crate::textutil::excerpt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StyleStage {
    Unstyled,
    RunsEnsured,
    BaseStyled,
    LabelStyled,
    PageBreakForced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyleOutcome {
    /// Last stage reached; `Unstyled` means the paragraph was empty and skipped.
    pub stage: StyleStage,
    pub adopted_run: bool,
}

impl StyleOutcome {
    pub fn skipped(&self) -> bool {
        self.stage == StyleStage::Unstyled
    }
}

struct Styling<'a> {
    paragraph: &'a mut Paragraph,
    stage: StyleStage,
}

impl Styling<'_> {
    fn advance(&mut self, next: StyleStage) {
        debug_assert!(next > self.stage, "{:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}

/// Styles `paragraph` in place for `label`. `position` is the paragraph's
/// index among non-empty paragraphs and only feeds error reports.
pub fn apply_style(
    paragraph: &mut Paragraph,
    label: Label,
    is_after_title: bool,
    position: usize,
) -> anyhow::Result<StyleOutcome> {
    let before = paragraph.text();
    if before.is_empty() {
        return Ok(StyleOutcome {
            stage: StyleStage::Unstyled,
            adopted_run: false,
        });
    }

    let mut s = Styling {
        paragraph,
        stage: StyleStage::Unstyled,
    };

    let adopted_run = s.paragraph.adopt_run();
    if s.paragraph.run_count() == 0 {
        return Err(FormatError::RunAdoptionFailed {
            position,
            preview: excerpt(&before, 60),
        }
        .into());
    }
    s.advance(StyleStage::RunsEnsured);

    s.paragraph.apply_run_format(&base_run_format());
    s.advance(StyleStage::BaseStyled);

    let profile = StyleProfile::for_label(label);
    s.paragraph.apply_run_format(&profile.run_format());
    s.paragraph.apply_paragraph_format(&profile.paragraph_format());
    s.advance(StyleStage::LabelStyled);

    if is_after_title {
        s.paragraph
            .apply_paragraph_format(&profile.with_page_break().paragraph_format());
        s.advance(StyleStage::PageBreakForced);
    }

    let after = s.paragraph.text();
    if after != before {
        return Err(FormatError::TextChanged {
            position,
            before,
            after,
        }
        .into());
    }

    debug!(position, label = %label, stage = ?s.stage, adopted_run, "styled paragraph");
    Ok(StyleOutcome {
        stage: s.stage,
        adopted_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::{parse_xml_part, write_events};

    fn para(xml: &str) -> Paragraph {
        Paragraph::from_events(parse_xml_part("t.xml", xml.as_bytes()).expect("parse").events)
    }

    fn render(p: &Paragraph) -> String {
        String::from_utf8(write_events(p.events()).expect("write")).expect("utf8")
    }

    #[test]
    fn empty_paragraph_is_untouched() {
        let xml = r#"<w:p><w:pPr><w:jc w:val="right"/></w:pPr><w:r><w:t xml:space="preserve">   </w:t></w:r></w:p>"#;
        let mut p = para(xml);
        let out = apply_style(&mut p, Label::Title, true, 0).expect("style");
        assert!(out.skipped());
        assert_eq!(render(&p), xml);
    }

    #[test]
    fn heading_gets_profile_on_every_run() {
        let mut p = para(r#"<w:p><w:r><w:rPr><w:i/></w:rPr><w:t>1. </w:t></w:r><w:r><w:t>Introduction</w:t></w:r></w:p>"#);
        let out = apply_style(&mut p, Label::Heading, false, 1).expect("style");
        assert_eq!(out.stage, StyleStage::LabelStyled);
        let xml = render(&p);
        assert_eq!(xml.matches(r#"<w:sz w:val="28"/>"#).count(), 2);
        assert_eq!(xml.matches(r#"<w:b/>"#).count(), 2);
        assert_eq!(xml.matches(r#"<w:i w:val="0"/>"#).count(), 2);
        assert_eq!(xml.matches(r#"<w:u w:val="single"/>"#).count(), 2);
        assert!(xml.contains(r#"<w:jc w:val="left"/>"#));
        assert!(!xml.contains("w:pageBreakBefore"));
        assert_eq!(p.text(), "1. Introduction");
    }

    #[test]
    fn paragraph_after_title_starts_new_page() {
        let mut p = para(r#"<w:p><w:r><w:t>Body text follows.</w:t></w:r></w:p>"#);
        let out = apply_style(&mut p, Label::Body, true, 1).expect("style");
        assert_eq!(out.stage, StyleStage::PageBreakForced);
        assert!(p.has_page_break_before());
        assert!(render(&p).contains(r#"<w:jc w:val="both"/>"#));
    }

    #[test]
    fn run_less_paragraph_adopts_one_run() {
        let mut p = para(r#"<w:p><w:t>Stray caption text</w:t></w:p>"#);
        let out = apply_style(&mut p, Label::Caption, false, 4).expect("style");
        assert!(out.adopted_run);
        assert_eq!(p.run_count(), 1);
        assert_eq!(p.text(), "Stray caption text");
        assert_eq!(render(&p).matches("Stray caption text").count(), 1);
    }

    #[test]
    fn pstyle_is_kept() {
        let mut p = para(r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Scope</w:t></w:r></w:p>"#);
        apply_style(&mut p, Label::Heading, false, 2).expect("style");
        assert!(render(&p).contains(r#"<w:pStyle w:val="Heading1"/>"#));
    }

    #[test]
    fn every_label_preserves_text() {
        let src = r#"<w:p><w:r><w:t xml:space="preserve">Mixed </w:t></w:r><w:hyperlink><w:r><w:t>link</w:t></w:r></w:hyperlink><w:r><w:tab/><w:t>tail</w:t></w:r></w:p>"#;
        for label in Label::ALL {
            for after_title in [false, true] {
                let mut p = para(src);
                let before = p.text();
                apply_style(&mut p, label, after_title, 3).expect("style");
                assert_eq!(p.text(), before, "{label} after_title={after_title}");
            }
        }
    }
}
