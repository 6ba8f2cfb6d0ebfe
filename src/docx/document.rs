use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use sha2::{Digest, Sha256};

use crate::docx::package::DocxPackage;
use crate::docx::paragraph::Paragraph;
use crate::docx::props::{apply_margins, PageMargins};
use crate::docx::xml::{collect_subtree, parse_xml_part, write_xml_part, XmlEvent, XmlPart};

enum Block {
    Paragraph(Paragraph),
    Markup(Vec<XmlEvent>),
}

/// The main document part of a `.docx`, split into body-level paragraphs and
/// the markup between them. Every other package part is carried through untouched.
pub struct WordDocument {
    package: DocxPackage,
    part_name: String,
    blocks: Vec<Block>,
}

impl WordDocument {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let package = DocxPackage::read(path)?;
        let part_name = package.main_document_part()?;
        let data = &package
            .entry(&part_name)
            .with_context(|| format!("missing part: {part_name}"))?
            .data;
        let part = parse_xml_part(&part_name, data)
            .with_context(|| format!("parse xml: {part_name}"))?;
        let blocks = split_blocks(part.events);
        Ok(Self {
            package,
            part_name,
            blocks,
        })
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let part = XmlPart {
            name: self.part_name.clone(),
            events: self.events(),
        };
        let bytes = write_xml_part(&part)?;
        let mut replacements: HashMap<String, Vec<u8>> = HashMap::new();
        replacements.insert(self.part_name.clone(), bytes);
        self.package.write_with_replacements(path, &replacements)
    }

    fn events(&self) -> Vec<XmlEvent> {
        let mut out = Vec::new();
        for b in &self.blocks {
            match b {
                Block::Paragraph(p) => out.extend_from_slice(p.events()),
                Block::Markup(evs) => out.extend_from_slice(evs),
            }
        }
        out
    }

    /// Body-level paragraphs in document order, empty ones included.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Markup(_) => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Markup(_) => None,
        })
    }

    /// `(paragraph index, trimmed text)` for every paragraph with text.
    pub fn non_empty_paragraphs(&self) -> Vec<(usize, String)> {
        self.paragraphs()
            .enumerate()
            .map(|(i, p)| (i, p.text()))
            .filter(|(_, t)| !t.is_empty())
            .collect()
    }

    pub fn non_empty_count(&self) -> usize {
        self.paragraphs().filter(|p| !p.is_empty()).count()
    }

    /// Sets the margins of every section, including sections closed by a
    /// paragraph's own `w:sectPr`. Returns the number of sections updated.
    pub fn set_margins(&mut self, margins: &PageMargins) -> usize {
        let mut touched = 0usize;
        for b in &mut self.blocks {
            touched += match b {
                Block::Paragraph(p) => apply_margins(p.events_mut(), margins),
                Block::Markup(evs) => apply_margins(evs, margins),
            };
        }
        touched
    }

    /// SHA-256 over the text of every paragraph, in order.
    pub fn text_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for p in self.paragraphs() {
            hasher.update(p.text().as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}

fn split_blocks(events: Vec<XmlEvent>) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut markup: Vec<XmlEvent> = Vec::new();
    let mut stack: Vec<String> = Vec::new();

    let mut i = 0usize;
    while i < events.len() {
        let parent = stack.last().map(|s| s.as_str()).unwrap_or("");
        let ev = &events[i];
        if parent == "w:body" && (ev.is_start_of("w:p") || ev.is_empty_of("w:p")) {
            if !markup.is_empty() {
                blocks.push(Block::Markup(std::mem::take(&mut markup)));
            }
            let (para, next) = collect_subtree(&events, i);
            blocks.push(Block::Paragraph(Paragraph::from_events(para)));
            i = next;
            continue;
        }
        match ev {
            XmlEvent::Start { name, .. } => stack.push(name.clone()),
            XmlEvent::End { .. } => {
                stack.pop();
            }
            _ => {}
        }
        markup.push(ev.clone());
        i += 1;
    }
    if !markup.is_empty() {
        blocks.push(Block::Markup(markup));
    }
    blocks
}
