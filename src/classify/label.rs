use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural role of one paragraph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Title,
    Heading,
    #[default]
    Body,
    Caption,
    Other,
}

impl Label {
    pub const ALL: [Label; 5] = [
        Label::Title,
        Label::Heading,
        Label::Body,
        Label::Caption,
        Label::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Title => "title",
            Label::Heading => "heading",
            Label::Body => "body",
            Label::Caption => "caption",
            Label::Other => "other",
        }
    }

    /// Case-insensitive parse that ignores surrounding whitespace. Anything
    /// outside the five labels becomes `Body`.
    pub fn parse_lenient(s: &str) -> Label {
        let s = s.trim().to_lowercase();
        Label::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .unwrap_or(Label::Body)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
