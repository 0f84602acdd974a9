//! XML part parsing and rendering
//!
//! A part is kept as its full event list so untouched markup is written
//! back as read. The structured [`Story`] only records where each run's
//! `w:t` nodes and mark elements sit in that list.

use std::collections::{HashMap, HashSet};

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use veil_core::{Error, Result};

use crate::model::{Anchor, Cell, HeaderFooterKind, Paragraph, Row, Run, Story, Table};

/// Header/footer relationship ids declared by one `w:sectPr`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SectionRefs {
    pub headers: [Option<String>; 3],
    pub footers: [Option<String>; 3],
}

impl SectionRefs {
    fn record(&mut self, element: &BytesStart<'_>) {
        let kind = get_attr(element, b"w:type")
            .map_or(Some(HeaderFooterKind::Default), |t| HeaderFooterKind::from_attr(&t));
        let (Some(kind), Some(id)) = (kind, get_attr(element, b"r:id")) else {
            return;
        };

        match element.name().as_ref() {
            b"w:headerReference" => self.headers[kind.index()] = Some(id),
            b"w:footerReference" => self.footers[kind.index()] = Some(id),
            _ => {}
        }
    }
}

/// One parsed XML part
pub(crate) struct XmlPart {
    events: Vec<Event<'static>>,
    pub story: Story,
}

/// Element currently open on the parse stack
enum Open {
    Table(Table),
    Row(Row),
    Cell(Cell),
    Paragraph(Paragraph),
    Run(Run),
    Fallback,
    Other,
}

/// Replacement for one event of a modified run
enum Output {
    Text(String),
    /// A mark element that now holds text
    TextElement(String),
    Skip,
}

pub(crate) fn get_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .find(|a| a.as_ref().ok().map(|x| x.key.as_ref()) == Some(key))
        .and_then(std::result::Result::ok)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Character a mark element inside a run reads as
fn run_mark(e: &BytesStart<'_>) -> Option<char> {
    match e.name().as_ref() {
        b"w:tab" | b"w:ptab" => Some('\t'),
        b"w:br" => match get_attr(e, b"w:type").as_deref() {
            None | Some("textWrapping") => Some('\n'),
            _ => None,
        },
        b"w:cr" => Some('\n'),
        b"w:noBreakHyphen" => Some('-'),
        _ => None,
    }
}

fn invalid(part: &str, e: impl std::fmt::Display) -> Error {
    Error::InvalidDocument(format!("{}: {}", part, e))
}

impl XmlPart {
    /// Parse a part, returning it with the sections it declares
    pub fn parse(name: &str, xml: &[u8]) -> Result<(Self, Vec<SectionRefs>)> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();

        let mut events = Vec::new();
        let mut story = Story::default();
        let mut open: Vec<Open> = Vec::new();
        let mut text_start: Option<usize> = None;
        let mut sections = Vec::new();
        let mut section: Option<SectionRefs> = None;
        let mut fallback = 0usize;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| invalid(name, e))?;
            let index = events.len();

            match &event {
                Event::Eof => break,
                Event::Start(e) => match e.name().as_ref() {
                    b"w:tbl" => open.push(Open::Table(Table::default())),
                    b"w:tr" => open.push(Open::Row(Row::default())),
                    b"w:tc" => open.push(Open::Cell(Cell::default())),
                    b"w:p" => open.push(Open::Paragraph(Paragraph {
                        alternate: fallback > 0,
                        ..Paragraph::default()
                    })),
                    b"w:r" => open.push(Open::Run(Run::default())),
                    b"w:t" => {
                        if matches!(open.last(), Some(Open::Run(_))) {
                            text_start = Some(index);
                        }
                        open.push(Open::Other);
                    }
                    b"w:sectPr" => {
                        section = Some(SectionRefs::default());
                        open.push(Open::Other);
                    }
                    b"mc:Fallback" => {
                        fallback += 1;
                        open.push(Open::Fallback);
                    }
                    _ => open.push(Open::Other),
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"w:headerReference" | b"w:footerReference" => {
                        if let Some(section) = section.as_mut() {
                            section.record(e);
                        }
                    }
                    b"w:sectPr" => sections.push(SectionRefs::default()),
                    _ => {
                        if let Some(Open::Run(run)) = open.last_mut()
                            && let Some(mark) = run_mark(e)
                        {
                            run.push_piece(Anchor::Mark(index), &mark.to_string());
                        }
                    }
                },
                Event::Text(t) => {
                    if let Some(start) = text_start
                        && let Some(Open::Run(run)) = open.iter_mut().rev().nth(1)
                    {
                        let value = t.unescape().map_err(|e| invalid(name, e))?;
                        run.push_piece(Anchor::Text { start, text: index }, &value);
                    }
                }
                Event::End(e) => {
                    let Some(element) = open.pop() else {
                        return Err(invalid(name, "unbalanced end tag"));
                    };
                    match e.name().as_ref() {
                        b"w:t" => text_start = None,
                        b"w:sectPr" => sections.extend(section.take()),
                        _ => {}
                    }
                    if matches!(element, Open::Fallback) {
                        fallback -= 1;
                    }
                    attach(element, &mut open, &mut story);
                }
                _ => {}
            }

            events.push(event.into_owned());
            buf.clear();
        }

        Ok((Self { events, story }, sections))
    }

    /// Serialize with modified runs applied; `None` when nothing changed
    pub fn render(&self) -> Result<Option<Vec<u8>>> {
        let mut outputs: HashMap<usize, Output> = HashMap::new();
        let mut preserve: HashSet<usize> = HashSet::new();

        self.story.visit_runs(|run| {
            for piece in run.pieces.iter().filter(|piece| piece.changed) {
                match piece.anchor {
                    Some(Anchor::Text { start, text }) => {
                        outputs.insert(text, Output::Text(piece.text.clone()));
                        if !piece.text.is_empty() {
                            preserve.insert(start);
                        }
                    }
                    Some(Anchor::Mark(event)) if piece.text.is_empty() => {
                        outputs.insert(event, Output::Skip);
                    }
                    Some(Anchor::Mark(event)) => {
                        outputs.insert(event, Output::TextElement(piece.text.clone()));
                    }
                    None => {}
                }
            }
        });

        if outputs.is_empty() {
            return Ok(None);
        }

        let mut writer = Writer::new(Vec::new());
        for (index, event) in self.events.iter().enumerate() {
            let result = match outputs.get(&index) {
                Some(Output::Text(text)) => writer.write_event(Event::Text(BytesText::new(text))),
                Some(Output::TextElement(text)) => {
                    let mut start = BytesStart::new("w:t");
                    start.push_attribute(("xml:space", "preserve"));
                    writer
                        .write_event(Event::Start(start))
                        .and_then(|_| writer.write_event(Event::Text(BytesText::new(text))))
                        .and_then(|_| writer.write_event(Event::End(BytesEnd::new("w:t"))))
                }
                Some(Output::Skip) => Ok(()),
                None => {
                    if preserve.contains(&index)
                        && let Event::Start(start) = event
                    {
                        writer.write_event(Event::Start(with_preserved_space(start)?))
                    } else {
                        writer.write_event(event)
                    }
                }
            };
            result.map_err(|e| Error::Io(std::io::Error::other(e)))?;
        }

        Ok(Some(writer.into_inner()))
    }
}

fn with_preserved_space(start: &BytesStart<'static>) -> Result<BytesStart<'static>> {
    let mut start = start.clone();
    let present = start
        .try_get_attribute("xml:space")
        .map_err(|e| Error::InvalidDocument(e.to_string()))?
        .is_some();
    if !present {
        start.push_attribute(("xml:space", "preserve"));
    }
    Ok(start)
}

/// Hand a closed element to its container
fn attach(element: Open, open: &mut [Open], story: &mut Story) {
    match element {
        Open::Run(run) => {
            if let Some(paragraph) = open.iter_mut().rev().find_map(|o| match o {
                Open::Paragraph(p) => Some(p),
                _ => None,
            }) {
                paragraph.runs.push(run);
            }
        }
        Open::Paragraph(paragraph) => match nearest_cell(open) {
            Some(cell) => cell.paragraphs.push(paragraph),
            None => story.paragraphs.push(paragraph),
        },
        Open::Table(table) => match nearest_cell(open) {
            Some(cell) => cell.tables.push(table),
            None => story.tables.push(table),
        },
        Open::Cell(cell) => {
            if let Some(Open::Row(row)) = open.last_mut() {
                row.cells.push(cell);
            }
        }
        Open::Row(row) => {
            if let Some(Open::Table(table)) = open.last_mut() {
                table.rows.push(row);
            }
        }
        Open::Fallback | Open::Other => {}
    }
}

fn nearest_cell(open: &mut [Open]) -> Option<&mut Cell> {
    open.iter_mut().rev().find_map(|o| match o {
        Open::Cell(cell) => Some(cell),
        _ => None,
    })
}
