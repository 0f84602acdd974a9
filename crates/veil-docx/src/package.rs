//! DOCX package reader/writer
//!
//! Every archive entry is read up front and written back in its original
//! order with its original compression; only parts whose text changed get
//! new bytes.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use quick_xml::Reader;
use quick_xml::events::Event;
use veil_core::{Error, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::model::{HeaderFooterSlot, Story};
use crate::walker::StructuredDocument;
use crate::xml::{SectionRefs, XmlPart, get_attr};

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";

struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// Header/footer parts referenced by one section; `None` means linked to
/// the previous section
#[derive(Debug, Clone, Default)]
struct Section {
    headers: [Option<String>; 3],
    footers: [Option<String>; 3],
}

impl Section {
    fn part(&self, slot: HeaderFooterSlot) -> Option<&str> {
        match slot {
            HeaderFooterSlot::Header(kind) => self.headers[kind.index()].as_deref(),
            HeaderFooterSlot::Footer(kind) => self.footers[kind.index()].as_deref(),
        }
    }
}

/// An opened Word document
pub struct WordDocument {
    entries: Vec<Entry>,
    body: XmlPart,
    sections: Vec<Section>,
    parts: BTreeMap<String, XmlPart>,
}

impl WordDocument {
    /// Open a package from its bytes
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::InvalidDocument(format!("Failed to open DOCX as ZIP: {}", e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::InvalidDocument(format!("Failed to read entry {}: {}", i, e)))?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::InvalidDocument(format!("{}: {}", file.name(), e)))?;
            entries.push(Entry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        let find = |name: &str| entries.iter().find(|e| e.name == name);

        let document = find(DOCUMENT_PART)
            .ok_or_else(|| Error::InvalidDocument(format!("missing {}", DOCUMENT_PART)))?;
        let (body, section_refs) = XmlPart::parse(DOCUMENT_PART, &document.data)?;

        let relationships = match find(DOCUMENT_RELS) {
            Some(rels) => parse_relationships(&rels.data)?,
            None => BTreeMap::new(),
        };

        let mut parts = BTreeMap::new();
        let mut sections = Vec::with_capacity(section_refs.len());
        for refs in section_refs {
            let SectionRefs { headers, footers } = refs;
            let mut resolve = |id: Option<String>| -> Result<Option<String>> {
                let Some(id) = id else {
                    return Ok(None);
                };
                let Some(target) = relationships.get(&id) else {
                    tracing::warn!("Section references unknown relationship {}", id);
                    return Ok(None);
                };
                let name = resolve_target(target);
                if !parts.contains_key(&name) {
                    let Some(entry) = find(name.as_str()) else {
                        tracing::warn!("Header/footer part {} missing from package", name);
                        return Ok(None);
                    };
                    let (part, _) = XmlPart::parse(&name, &entry.data)?;
                    parts.insert(name.clone(), part);
                }
                Ok(Some(name))
            };

            let mut section = Section::default();
            for (slot, id) in section.headers.iter_mut().zip(headers) {
                *slot = resolve(id)?;
            }
            for (slot, id) in section.footers.iter_mut().zip(footers) {
                *slot = resolve(id)?;
            }
            sections.push(section);
        }

        tracing::debug!(
            "Opened DOCX with {} entries, {} sections, {} header/footer parts",
            entries.len(),
            sections.len(),
            parts.len()
        );

        Ok(Self {
            entries,
            body,
            sections,
            parts,
        })
    }

    pub fn body(&self) -> &Story {
        &self.body.story
    }

    /// Content of one header/footer position; `None` when linked
    pub fn header_footer(&self, section: usize, slot: HeaderFooterSlot) -> Option<&Story> {
        let name = self.sections.get(section)?.part(slot)?;
        self.parts.get(name).map(|part| &part.story)
    }

    /// Serialize the package with all modifications applied
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut rendered: BTreeMap<&str, Vec<u8>> = BTreeMap::new();
        if let Some(bytes) = self.body.render()? {
            rendered.insert(DOCUMENT_PART, bytes);
        }
        for (name, part) in &self.parts {
            if let Some(bytes) = part.render()? {
                rendered.insert(name.as_str(), bytes);
            }
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);

            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options).map_err(zip_error)?;
                continue;
            }

            writer.start_file(entry.name.as_str(), options).map_err(zip_error)?;
            let data = rendered
                .get(entry.name.as_str())
                .map_or(entry.data.as_slice(), Vec::as_slice);
            writer.write_all(data)?;
        }

        let cursor = writer.finish().map_err(zip_error)?;
        Ok(cursor.into_inner())
    }
}

impl StructuredDocument for WordDocument {
    fn body_mut(&mut self) -> &mut Story {
        &mut self.body.story
    }

    fn section_count(&self) -> usize {
        self.sections.len()
    }

    fn header_footer_mut(&mut self, section: usize, slot: HeaderFooterSlot) -> Option<&mut Story> {
        let name = self.sections.get(section)?.part(slot)?;
        self.parts.get_mut(name).map(|part| &mut part.story)
    }
}

pub(crate) fn zip_error(e: zip::result::ZipError) -> Error {
    Error::Io(std::io::Error::other(e))
}

/// Relationship id -> target from a `.rels` part
fn parse_relationships(xml: &[u8]) -> Result<BTreeMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut relationships = BTreeMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (get_attr(&e, b"Id"), get_attr(&e, b"Target")) {
                    relationships.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::InvalidDocument(format!("{}: {}", DOCUMENT_RELS, e)));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// Package path of a relationship target relative to `word/`
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = vec!["word"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
