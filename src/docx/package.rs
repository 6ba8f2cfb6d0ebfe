use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{anyhow, Context};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::docx::xml::{find_attr, parse_xml_part, XmlEvent};

pub const DEFAULT_MAIN_PART: &str = "word/document.xml";
const PACKAGE_RELS: &str = "_rels/.rels";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// A `.docx` container held fully in memory, entry order preserved.
pub struct DocxPackage {
    pub entries: Vec<DocxEntry>,
}

pub struct DocxEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub last_modified: zip::DateTime,
    pub unix_mode: Option<u32>,
    pub is_dir: bool,
}

impl DocxPackage {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let f = File::open(path).with_context(|| format!("open docx: {}", path.display()))?;
        let mut zip = ZipArchive::new(f)
            .with_context(|| format!("read zip container: {}", path.display()))?;
        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip.by_index(i).context("zip entry")?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .with_context(|| format!("read zip entry: {}", file.name()))?;
            entries.push(DocxEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                last_modified: file.last_modified().unwrap_or_default(),
                unix_mode: file.unix_mode(),
                is_dir: file.is_dir(),
            });
        }
        Ok(Self { entries })
    }

    pub fn entry(&self, name: &str) -> Option<&DocxEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Resolves the main document part through the package relationships,
    /// falling back to `word/document.xml`.
    pub fn main_document_part(&self) -> anyhow::Result<String> {
        if let Some(rels) = self.entry(PACKAGE_RELS) {
            let part = parse_xml_part(PACKAGE_RELS, &rels.data)?;
            for ev in &part.events {
                let (XmlEvent::Empty { name, attrs } | XmlEvent::Start { name, attrs }) = ev else {
                    continue;
                };
                if !name.ends_with("Relationship") {
                    continue;
                }
                let is_main = find_attr(attrs, "Type")
                    .map(|t| t.ends_with(OFFICE_DOCUMENT_REL))
                    .unwrap_or(false);
                if let (true, Some(target)) = (is_main, find_attr(attrs, "Target")) {
                    let target = target.trim_start_matches('/').to_string();
                    if self.entry(&target).is_some() {
                        return Ok(target);
                    }
                }
            }
        }
        if self.entry(DEFAULT_MAIN_PART).is_some() {
            return Ok(DEFAULT_MAIN_PART.to_string());
        }
        Err(anyhow!("package has no main document part"))
    }

    /// Writes the package to a temp file next to `output_path` and renames it
    /// into place, so a failed write never leaves a partial `.docx` behind.
    pub fn write_with_replacements(
        &self,
        output_path: &Path,
        replacements: &HashMap<String, Vec<u8>>,
    ) -> anyhow::Result<()> {
        let dir = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::Builder::new()
            .prefix(".docx-stylist-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .with_context(|| format!("create temp file in: {}", dir.display()))?;
        let mut zout = ZipWriter::new(tmp.as_file_mut());
        for ent in &self.entries {
            let data = replacements.get(&ent.name).unwrap_or(&ent.data);
            let mut opts = SimpleFileOptions::default()
                .compression_method(ent.compression)
                .last_modified_time(ent.last_modified);
            if let Some(mode) = ent.unix_mode {
                opts = opts.unix_permissions(mode);
            }
            if ent.is_dir || ent.name.ends_with('/') {
                zout.add_directory(ent.name.as_str(), opts)
                    .with_context(|| format!("add zip dir: {}", ent.name))?;
            } else {
                zout.start_file(ent.name.as_str(), opts)
                    .with_context(|| format!("start zip file: {}", ent.name))?;
                zout.write_all(data)
                    .with_context(|| format!("write zip file: {}", ent.name))?;
            }
        }
        zout.finish().context("finish zip")?;
        tmp.as_file().sync_all().context("flush output docx")?;
        tmp.persist(output_path)
            .with_context(|| format!("replace output docx: {}", output_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package() -> DocxPackage {
        DocxPackage {
            entries: vec![DocxEntry {
                name: DEFAULT_MAIN_PART.to_string(),
                data: b"<w:document/>".to_vec(),
                compression: CompressionMethod::Deflated,
                last_modified: zip::DateTime::default(),
                unix_mode: None,
                is_dir: false,
            }],
        }
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn save_replaces_existing_output_whole() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.docx");
        std::fs::write(&out, b"stale bytes").unwrap();

        let mut replacements = HashMap::new();
        replacements.insert(DEFAULT_MAIN_PART.to_string(), b"<w:document>new</w:document>".to_vec());
        package().write_with_replacements(&out, &replacements).unwrap();

        let back = DocxPackage::read(&out).unwrap();
        assert_eq!(
            back.entry(DEFAULT_MAIN_PART).unwrap().data,
            b"<w:document>new</w:document>".to_vec()
        );
        assert_eq!(dir_names(dir.path()), vec!["out.docx".to_string()]);
    }

    #[test]
    fn failed_save_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let taken = dir.path().join("taken.docx");
        std::fs::create_dir(&taken).unwrap();
        assert!(package().write_with_replacements(&taken, &HashMap::new()).is_err());
        assert!(taken.is_dir());
        assert_eq!(dir_names(dir.path()), vec!["taken.docx".to_string()]);

        let missing = dir.path().join("no-such-dir").join("out.docx");
        assert!(package().write_with_replacements(&missing, &HashMap::new()).is_err());
        assert!(!missing.exists());
    }
}
