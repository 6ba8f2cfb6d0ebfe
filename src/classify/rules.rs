//! Pattern-based paragraph classification. Everything here is pure: the
//! same text and first-paragraph flag always give the same label.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classify::label::Label;
use crate::textutil::{char_len, is_all_caps};

const TITLE_MAX_CHARS: usize = 100;
const TITLE_UNPUNCTUATED_MAX_CHARS: usize = 80;
const CAPTION_MAX_CHARS: usize = 300;
const HEADING_MAX_CHARS: usize = 200;
const HEADING_CAPS_MAX_CHARS: usize = 120;
const SHORT_LINE_CHARS: usize = 50;

/// `1 Intro`, `2.3 Scope`, `4. Results`.
static NUMBERED_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+(\.\d+)*\.?\s+\S").expect("numbered section"));

static CHAPTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(chapter|part)\s+\d+").expect("chapter"));

static FIGURE_CAPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(figure|fig\.?)\s*\d*[.:]?\s*\S").expect("figure caption"));

static TABLE_CAPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(table)\s*\d*[.:]?\s*\S").expect("table caption"));

const SECTION_KEYWORDS: &str = "abstract|acknowledgements?|acknowledgments?|appendix|references|bibliography|table of contents|contents|introduction|conclusion|chapter|part|preface|foreword|executive summary|index";

static SECTION_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b({SECTION_KEYWORDS})\b")).expect("section keyword")
});

static LEADING_SECTION_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^\s*({SECTION_KEYWORDS})\b")).expect("leading section keyword")
});

pub fn is_numbered_section(text: &str) -> bool {
    NUMBERED_SECTION_RE.is_match(text)
}

/// First-paragraph title check: short, unnumbered, and either all caps or
/// an unpunctuated line.
pub fn is_likely_title(text: &str, is_first_nonempty: bool) -> bool {
    let t = text.trim();
    if t.is_empty() || !is_first_nonempty {
        return false;
    }
    let len = char_len(t);
    if len > TITLE_MAX_CHARS || is_numbered_section(t) {
        return false;
    }
    is_all_caps(t) || (len < TITLE_UNPUNCTUATED_MAX_CHARS && !t.ends_with('.'))
}

pub fn is_caption(text: &str) -> bool {
    let t = text.trim();
    if t.is_empty() || char_len(t) > CAPTION_MAX_CHARS {
        return false;
    }
    FIGURE_CAPTION_RE.is_match(t) || TABLE_CAPTION_RE.is_match(t)
}

pub fn is_heading(text: &str) -> bool {
    let t = text.trim();
    let len = char_len(t);
    if len == 0 || len > HEADING_MAX_CHARS {
        return false;
    }
    if is_all_caps(t) && len < HEADING_CAPS_MAX_CHARS {
        return true;
    }

    let numbered = is_numbered_section(t);
    if len < SHORT_LINE_CHARS {
        // A short sentence with a full stop reads as prose, not a heading.
        if t.ends_with('.') && !numbered {
            return false;
        }
        if numbered || SECTION_KEYWORD_RE.is_match(t) || CHAPTER_RE.is_match(t) || !t.ends_with('.') {
            return true;
        }
    }

    numbered || LEADING_SECTION_KEYWORD_RE.is_match(t) || CHAPTER_RE.is_match(t)
}

/// Fixed priority: title, caption, heading, then body.
pub fn classify_paragraph(text: &str, is_first_nonempty: bool) -> Label {
    if is_likely_title(text, is_first_nonempty) {
        Label::Title
    } else if is_caption(text) {
        Label::Caption
    } else if is_heading(text) {
        Label::Heading
    } else {
        Label::Body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annual_report_sequence() {
        let texts = [
            "Annual Report 2024",
            "1. Introduction",
            "This report describes the company's performance over the last fiscal year in detail.",
            "Figure 1: Revenue growth",
        ];
        let labels: Vec<Label> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| classify_paragraph(t, i == 0))
            .collect();
        assert_eq!(
            labels,
            vec![Label::Title, Label::Heading, Label::Body, Label::Caption]
        );
    }

    #[test]
    fn all_caps_first_line_is_title() {
        assert_eq!(classify_paragraph("SUMMARY", true), Label::Title);
        assert_eq!(classify_paragraph("SUMMARY", false), Label::Heading);
    }

    #[test]
    fn title_check_precedes_caption_on_first_paragraph() {
        assert_eq!(classify_paragraph("Table 3. Results by quarter", true), Label::Title);
        assert_eq!(classify_paragraph("Table 3. Results by quarter", false), Label::Caption);
    }

    #[test]
    fn numbered_first_line_is_not_a_title() {
        assert_eq!(classify_paragraph("1. Scope", true), Label::Heading);
    }

    #[test]
    fn long_or_punctuated_first_line_is_not_a_title() {
        let long = "A".repeat(60) + " " + &"b".repeat(45);
        assert!(!is_likely_title(&long, true));
        assert!(!is_likely_title("We begin here.", true));
        assert!(is_likely_title("THE STATE OF THINGS IN THE WORLD.", true));
    }

    #[test]
    fn short_sentence_with_keyword_and_period_stays_body() {
        assert_eq!(classify_paragraph("See appendix for details.", false), Label::Body);
    }

    #[test]
    fn short_unpunctuated_line_is_heading() {
        assert_eq!(classify_paragraph("Market overview", false), Label::Heading);
    }

    #[test]
    fn long_numbered_and_keyword_led_lines_are_headings() {
        let numbered = format!("2.1 {}", "Detailed discussion of the measurement apparatus ".repeat(2));
        assert!(char_len(&numbered) > SHORT_LINE_CHARS);
        assert!(is_heading(&numbered));

        let keyword_led = "Appendix B lists every questionnaire item that was used during the interviews.";
        assert!(is_heading(keyword_led));

        let chapter = "Chapter 7 covers the remaining open problems and a roadmap for future work.";
        assert!(is_heading(chapter));
    }

    #[test]
    fn keyword_must_be_a_whole_leading_word() {
        let text = "Partial results were collected from every site during the second survey wave.";
        assert!(!is_heading(text));
        assert_eq!(classify_paragraph(text, false), Label::Body);
    }

    #[test]
    fn caption_patterns() {
        assert!(is_caption("Fig. 2 Distribution of samples"));
        assert!(is_caption("figure: overview"));
        assert!(is_caption("TABLE 4: Summary statistics"));
        assert!(!is_caption("The figure shows growth"));
        assert!(!is_caption(&format!("Figure 1: {}", "x".repeat(300))));
    }

    #[test]
    fn caps_heading_has_length_limit() {
        let caps = "SECTION ".repeat(16);
        assert!(char_len(caps.trim()) >= 120);
        assert!(!is_heading(caps.trim()));
    }

    #[test]
    fn classifier_is_deterministic() {
        for t in ["Results", "1.2 Methods", "Plain prose sentence here.", "Fig 3 Map"] {
            assert_eq!(classify_paragraph(t, false), classify_paragraph(t, false));
            assert_eq!(classify_paragraph(t, true), classify_paragraph(t, true));
        }
    }
}
