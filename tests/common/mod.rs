#![allow(dead_code)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use docx_stylist::classify::delegated::LABEL_PROMPT_HEADER;
use docx_stylist::classify::CompletionOracle;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

pub const SECTION: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="720" w:right="720" w:bottom="720" w:left="720" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#;

/// A plain single-run paragraph.
pub fn para(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}</w:body></w:document>"#
    )
}

pub fn write_docx(path: &Path, body: &str) {
    let f = File::create(path).expect("create docx");
    let mut zip = ZipWriter::new(f);
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("word/document.xml", document_xml(body)),
    ] {
        zip.start_file(name, opts).expect("start file");
        zip.write_all(data.as_bytes()).expect("write file");
    }
    zip.finish().expect("finish zip");
}

pub fn read_entry(path: &Path, name: &str) -> String {
    let mut zip = ZipArchive::new(File::open(path).expect("open docx")).expect("zip");
    let mut file = zip.by_name(name).expect("entry");
    let mut out = String::new();
    file.read_to_string(&mut out).expect("read entry");
    out
}

pub fn read_document_xml(path: &Path) -> String {
    read_entry(path, "word/document.xml")
}

/// The first `<w:pgMar .../>` element of a document part.
pub fn page_margin_element(xml: &str) -> String {
    let start = xml.find("<w:pgMar").expect("pgMar");
    let end = start + xml[start..].find("/>").expect("pgMar end") + 2;
    xml[start..end].to_string()
}

/// Answers label prompts with `labels` and anything else with `summary`.
pub struct FakeOracle {
    pub labels: Option<String>,
    pub summary: Option<String>,
}

impl FakeOracle {
    pub fn labels(labels: &str) -> Self {
        Self {
            labels: Some(labels.to_string()),
            summary: None,
        }
    }
}

impl CompletionOracle for FakeOracle {
    fn complete(&self, prompt: &str, _temperature: f32) -> anyhow::Result<String> {
        let answer = if prompt.starts_with(LABEL_PROMPT_HEADER) {
            &self.labels
        } else {
            &self.summary
        };
        answer
            .clone()
            .ok_or_else(|| anyhow::anyhow!("scripted failure"))
    }
}
