//! Direct formatting on WordprocessingML property containers (`w:rPr`, `w:pPr`, `w:sectPr`).
//!
//! Each container is split into its child elements, the managed children are
//! replaced, and the result is re-ordered to the schema sequence so Word
//! accepts the part. Children this module does not manage are kept verbatim.

use crate::docx::xml::{collect_subtree, set_attr, XmlEvent};

const TWIPS_PER_POINT: u32 = 20;
const LINE_UNITS_PER_LINE: f32 = 240.0;

/// `CT_RPr` child sequence.
const RPR_ORDER: &[&str] = &[
    "w:rStyle", "w:rFonts", "w:b", "w:bCs", "w:i", "w:iCs", "w:caps", "w:smallCaps",
    "w:strike", "w:dstrike", "w:outline", "w:shadow", "w:emboss", "w:imprint", "w:noProof",
    "w:snapToGrid", "w:vanish", "w:webHidden", "w:color", "w:spacing", "w:w", "w:kern",
    "w:position", "w:sz", "w:szCs", "w:highlight", "w:u", "w:effect", "w:bdr", "w:shd",
    "w:fitText", "w:vertAlign", "w:rtl", "w:cs", "w:em", "w:lang", "w:eastAsianLayout",
    "w:specVanish", "w:oMath", "w:rPrChange",
];

/// `CT_PPr` child sequence.
const PPR_ORDER: &[&str] = &[
    "w:pStyle", "w:keepNext", "w:keepLines", "w:pageBreakBefore", "w:framePr",
    "w:widowControl", "w:numPr", "w:suppressLineNumbers", "w:pBdr", "w:shd", "w:tabs",
    "w:suppressAutoHyphens", "w:kinsoku", "w:wordWrap", "w:overflowPunct", "w:topLinePunct",
    "w:autoSpaceDE", "w:autoSpaceDN", "w:bidi", "w:adjustRightInd", "w:snapToGrid",
    "w:spacing", "w:ind", "w:contextualSpacing", "w:mirrorIndents", "w:suppressOverlap",
    "w:jc", "w:textDirection", "w:textAlignment", "w:textboxTightWrap", "w:outlineLvl",
    "w:divId", "w:cnfStyle", "w:rPr", "w:sectPr", "w:pPrChange",
];

/// `CT_SectPr` child sequence.
const SECTPR_ORDER: &[&str] = &[
    "w:headerReference", "w:footerReference", "w:footnotePr", "w:endnotePr", "w:type",
    "w:pgSz", "w:pgMar", "w:paperSrc", "w:pgBorders", "w:lnNumType", "w:pgNumType",
    "w:cols", "w:formProt", "w:vAlign", "w:noEndnote", "w:titlePg", "w:textDirection",
    "w:bidi", "w:rtlGutter", "w:docGrid", "w:printerSettings", "w:sectPrChange",
];

const THEME_FONT_ATTRS: &[&str] = &["w:asciiTheme", "w:hAnsiTheme", "w:eastAsiaTheme", "w:cstheme"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Justify,
}

impl Alignment {
    pub fn wml_value(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Justify => "both",
        }
    }
}

/// Character formatting written onto every run of a paragraph.
#[derive(Clone, Debug, PartialEq)]
pub struct RunFormat {
    pub font_family: String,
    pub size_pt: u32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

/// Paragraph-level direct formatting.
#[derive(Clone, Debug, PartialEq)]
pub struct ParagraphFormat {
    pub alignment: Alignment,
    pub space_before_pt: u32,
    pub space_after_pt: u32,
    pub line_spacing: f32,
    /// `true` adds `w:pageBreakBefore`; `false` leaves the paragraph's own setting alone.
    pub page_break_before: bool,
}

/// Page margins in twips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageMargins {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl PageMargins {
    pub fn from_inches(top: f32, bottom: f32, left: f32, right: f32) -> Self {
        let tw = |inches: f32| (inches * 1440.0).round() as u32;
        Self {
            top: tw(top),
            bottom: tw(bottom),
            left: tw(left),
            right: tw(right),
        }
    }
}

/// One child element of a property container, as its own event subtree.
#[derive(Clone, Debug)]
struct Child {
    name: String,
    events: Vec<XmlEvent>,
}

/// Splits a container subtree into its start attributes and element children.
/// Whitespace between children is dropped; other stray events are kept as
/// nameless children so nothing is lost.
fn split_children(container: &[XmlEvent]) -> (Vec<(String, String)>, Vec<Child>) {
    match container.first() {
        Some(XmlEvent::Empty { attrs, .. }) => (attrs.clone(), Vec::new()),
        Some(XmlEvent::Start { attrs, .. }) => {
            let inner = &container[1..container.len().saturating_sub(1)];
            let mut children = Vec::new();
            let mut i = 0usize;
            while i < inner.len() {
                match &inner[i] {
                    XmlEvent::Start { name, .. } | XmlEvent::Empty { name, .. } => {
                        let (events, next) = collect_subtree(inner, i);
                        children.push(Child {
                            name: name.clone(),
                            events,
                        });
                        i = next;
                    }
                    ev if ev.is_whitespace_text() => i += 1,
                    ev => {
                        children.push(Child {
                            name: String::new(),
                            events: vec![ev.clone()],
                        });
                        i += 1;
                    }
                }
            }
            (attrs.clone(), children)
        }
        _ => (Vec::new(), Vec::new()),
    }
}

/// Orders children by schema rank. Unknown children inherit the rank of the
/// element before them so they stay where they were.
fn order_children(children: Vec<Child>, order: &[&str]) -> Vec<Child> {
    let mut last_rank = 0usize;
    let mut ranked: Vec<(usize, Child)> = children
        .into_iter()
        .map(|c| {
            if let Some(r) = order.iter().position(|n| *n == c.name) {
                last_rank = r;
            }
            let rank = order.iter().position(|n| *n == c.name).unwrap_or(last_rank);
            (rank, c)
        })
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, c)| c).collect()
}

fn assemble(name: &str, attrs: Vec<(String, String)>, children: Vec<Child>) -> Vec<XmlEvent> {
    if children.is_empty() {
        return vec![XmlEvent::empty(name, attrs)];
    }
    let mut out = vec![XmlEvent::start(name, attrs)];
    for c in children {
        out.extend(c.events);
    }
    out.push(XmlEvent::end(name));
    out
}

fn empty_child(name: &str, attrs: &[(&str, String)]) -> Child {
    Child {
        name: name.to_string(),
        events: vec![XmlEvent::empty(
            name,
            attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )],
    }
}

fn toggle(name: &str, on: bool) -> Child {
    if on {
        empty_child(name, &[])
    } else {
        empty_child(name, &[("w:val", "0".to_string())])
    }
}

/// Rebuilds a `w:rPr` subtree (or creates one from `None`) with `fmt` applied.
pub fn restyle_run_properties(rpr: Option<&[XmlEvent]>, fmt: &RunFormat) -> Vec<XmlEvent> {
    const MANAGED: &[&str] = &["w:rFonts", "w:b", "w:i", "w:u", "w:sz", "w:szCs"];

    let (attrs, children) = rpr.map(split_children).unwrap_or_default();

    let mut fonts_attrs: Vec<(String, String)> = Vec::new();
    let mut kept: Vec<Child> = Vec::with_capacity(children.len() + MANAGED.len());
    for c in children {
        if c.name == "w:rFonts" {
            if let Some(a) = c.events.first().and_then(XmlEvent::attrs) {
                fonts_attrs = a.to_vec();
            }
            continue;
        }
        if !MANAGED.contains(&c.name.as_str()) {
            kept.push(c);
        }
    }

    fonts_attrs.retain(|(k, _)| !THEME_FONT_ATTRS.contains(&k.as_str()));
    for slot in ["w:ascii", "w:hAnsi", "w:eastAsia", "w:cs"] {
        set_attr(&mut fonts_attrs, slot, &fmt.font_family);
    }
    kept.push(Child {
        name: "w:rFonts".to_string(),
        events: vec![XmlEvent::empty("w:rFonts", fonts_attrs)],
    });

    let half_points = (fmt.size_pt * 2).to_string();
    kept.push(toggle("w:b", fmt.bold));
    kept.push(toggle("w:i", fmt.italic));
    kept.push(empty_child("w:sz", &[("w:val", half_points.clone())]));
    kept.push(empty_child("w:szCs", &[("w:val", half_points)]));
    kept.push(empty_child(
        "w:u",
        &[("w:val", if fmt.underline { "single" } else { "none" }.to_string())],
    ));

    let kept = order_children(kept, RPR_ORDER);
    assemble("w:rPr", attrs, kept)
}

/// Rebuilds a `w:pPr` subtree (or creates one) with `fmt` applied. `w:pStyle` is kept as is.
pub fn restyle_paragraph_properties(ppr: Option<&[XmlEvent]>, fmt: &ParagraphFormat) -> Vec<XmlEvent> {
    let (attrs, children) = ppr.map(split_children).unwrap_or_default();

    let mut kept: Vec<Child> = children
        .into_iter()
        .filter(|c| c.name != "w:jc" && c.name != "w:spacing")
        .collect();

    let line = (fmt.line_spacing * LINE_UNITS_PER_LINE).round() as u32;
    kept.push(empty_child(
        "w:spacing",
        &[
            ("w:before", (fmt.space_before_pt * TWIPS_PER_POINT).to_string()),
            ("w:after", (fmt.space_after_pt * TWIPS_PER_POINT).to_string()),
            ("w:line", line.to_string()),
            ("w:lineRule", "auto".to_string()),
        ],
    ));
    kept.push(empty_child("w:jc", &[("w:val", fmt.alignment.wml_value().to_string())]));

    if fmt.page_break_before {
        kept.retain(|c| c.name != "w:pageBreakBefore");
        kept.push(empty_child("w:pageBreakBefore", &[]));
    }

    let kept = order_children(kept, PPR_ORDER);
    assemble("w:pPr", attrs, kept)
}

/// Rebuilds a `w:sectPr` subtree with the given margins. Existing `w:pgMar`
/// attributes other than the four edges are kept.
pub fn restyle_section_properties(sect_pr: &[XmlEvent], margins: &PageMargins) -> Vec<XmlEvent> {
    let (attrs, children) = split_children(sect_pr);

    let mut pg_mar_attrs: Option<Vec<(String, String)>> = None;
    let mut kept: Vec<Child> = Vec::with_capacity(children.len() + 1);
    for c in children {
        if c.name == "w:pgMar" {
            pg_mar_attrs = c.events.first().and_then(XmlEvent::attrs).map(|a| a.to_vec());
            continue;
        }
        kept.push(c);
    }

    let mut pg_mar_attrs = pg_mar_attrs.unwrap_or_else(|| {
        vec![
            ("w:header".to_string(), "720".to_string()),
            ("w:footer".to_string(), "720".to_string()),
            ("w:gutter".to_string(), "0".to_string()),
        ]
    });
    set_attr(&mut pg_mar_attrs, "w:top", &margins.top.to_string());
    set_attr(&mut pg_mar_attrs, "w:right", &margins.right.to_string());
    set_attr(&mut pg_mar_attrs, "w:bottom", &margins.bottom.to_string());
    set_attr(&mut pg_mar_attrs, "w:left", &margins.left.to_string());
    kept.push(Child {
        name: "w:pgMar".to_string(),
        events: vec![XmlEvent::empty("w:pgMar", pg_mar_attrs)],
    });

    let kept = order_children(kept, SECTPR_ORDER);
    assemble("w:sectPr", attrs, kept)
}

/// Applies `margins` to every `w:sectPr` found in `events`; returns how many were touched.
pub fn apply_margins(events: &mut Vec<XmlEvent>, margins: &PageMargins) -> usize {
    let mut out: Vec<XmlEvent> = Vec::with_capacity(events.len() + 4);
    let mut touched = 0usize;
    let mut i = 0usize;
    while i < events.len() {
        if events[i].is_start_of("w:sectPr") || events[i].is_empty_of("w:sectPr") {
            let (sect, next) = collect_subtree(events, i);
            out.extend(restyle_section_properties(&sect, margins));
            touched += 1;
            i = next;
            continue;
        }
        out.push(events[i].clone());
        i += 1;
    }
    *events = out;
    touched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::{parse_xml_part, write_events};

    fn events(xml: &str) -> Vec<XmlEvent> {
        parse_xml_part("t.xml", xml.as_bytes()).expect("parse").events
    }

    fn render(events: &[XmlEvent]) -> String {
        String::from_utf8(write_events(events).expect("write")).expect("utf8")
    }

    fn heading_run() -> RunFormat {
        RunFormat {
            font_family: "Times New Roman".to_string(),
            size_pt: 14,
            bold: true,
            italic: false,
            underline: true,
        }
    }

    #[test]
    fn run_properties_keep_unmanaged_children_in_schema_order() {
        let rpr = events(
            r#"<w:rPr><w:color w:val="FF0000"/><w:rFonts w:asciiTheme="minorHAnsi" w:ascii="Arial"/><w:b/><w:lang w:val="en-US"/></w:rPr>"#,
        );
        let out = render(&restyle_run_properties(Some(&rpr), &heading_run()));
        assert_eq!(
            out,
            concat!(
                r#"<w:rPr><w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman" w:eastAsia="Times New Roman" w:cs="Times New Roman"/>"#,
                r#"<w:b/><w:i w:val="0"/><w:color w:val="FF0000"/><w:sz w:val="28"/><w:szCs w:val="28"/>"#,
                r#"<w:u w:val="single"/><w:lang w:val="en-US"/></w:rPr>"#
            )
        );
    }

    #[test]
    fn paragraph_properties_keep_style_id_and_add_page_break() {
        let ppr = events(r#"<w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="right"/></w:pPr>"#);
        let fmt = ParagraphFormat {
            alignment: Alignment::Justify,
            space_before_pt: 0,
            space_after_pt: 0,
            line_spacing: 1.5,
            page_break_before: true,
        };
        let out = render(&restyle_paragraph_properties(Some(&ppr), &fmt));
        assert_eq!(
            out,
            concat!(
                r#"<w:pPr><w:pStyle w:val="Heading1"/><w:pageBreakBefore/>"#,
                r#"<w:spacing w:before="0" w:after="0" w:line="360" w:lineRule="auto"/>"#,
                r#"<w:jc w:val="both"/></w:pPr>"#
            )
        );
    }

    #[test]
    fn page_break_false_leaves_existing_break() {
        let ppr = events(r#"<w:pPr><w:pageBreakBefore/></w:pPr>"#);
        let fmt = ParagraphFormat {
            alignment: Alignment::Center,
            space_before_pt: 6,
            space_after_pt: 6,
            line_spacing: 1.0,
            page_break_before: false,
        };
        let out = render(&restyle_paragraph_properties(Some(&ppr), &fmt));
        assert!(out.contains("<w:pageBreakBefore/>"));
        assert!(out.contains(r#"w:before="120" w:after="120" w:line="240""#));
    }

    #[test]
    fn margins_are_inserted_and_idempotent() {
        let margins = PageMargins::from_inches(1.0, 1.0, 1.25, 1.25);
        let mut evs = events(r#"<w:body><w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:cols w:space="720"/></w:sectPr></w:body>"#);
        assert_eq!(apply_margins(&mut evs, &margins), 1);
        let once = render(&evs);
        assert!(once.contains(
            r#"<w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:header="720" w:footer="720" w:gutter="0" w:top="1440" w:right="1800" w:bottom="1440" w:left="1800"/><w:cols"#
        ));
        apply_margins(&mut evs, &margins);
        assert_eq!(render(&evs), once);
    }

    #[test]
    fn existing_margins_are_overwritten() {
        let margins = PageMargins::from_inches(1.0, 1.0, 1.25, 1.25);
        let mut evs = events(r#"<w:sectPr><w:pgMar w:top="720" w:right="720" w:bottom="720" w:left="720" w:header="360" w:footer="360" w:gutter="0"/></w:sectPr>"#);
        apply_margins(&mut evs, &margins);
        let out = render(&evs);
        assert!(out.contains(r#"w:top="1440" w:right="1800" w:bottom="1440" w:left="1800" w:header="360""#));
    }
}
