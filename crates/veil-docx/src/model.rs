//! Structured document model
//!
//! A [`Story`] is a flow of paragraphs and tables: the document body or one
//! header/footer. Tables nest through their cells to any depth; every
//! traversal here uses an explicit stack.

use veil_core::TextEdit;

/// Where a piece of run text sits in its part's event list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    /// A `w:t` node: its start tag and its text event
    Text { start: usize, text: usize },
    /// An empty element read as one character, such as `w:tab` or `w:br`
    Mark(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct Piece {
    pub anchor: Option<Anchor>,
    pub text: String,
    pub changed: bool,
}

/// A run of uniformly formatted text.
///
/// The text is split into pieces, one per `w:t` node or mark element, so
/// edits land next to the breaks and tabs they were written around.
#[derive(Debug, Clone, Default)]
pub struct Run {
    text: String,
    pub(crate) pieces: Vec<Piece>,
}

impl Run {
    /// A detached run holding `text` as one piece
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            pieces: vec![Piece {
                anchor: None,
                text: text.clone(),
                changed: false,
            }],
            text,
        }
    }

    pub(crate) fn push_piece(&mut self, anchor: Anchor, text: &str) {
        self.text.push_str(text);
        self.pieces.push(Piece {
            anchor: Some(anchor),
            text: text.to_string(),
            changed: false,
        });
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Apply edits over [`Run::text`], sorted and not overlapping.
    ///
    /// A replacement goes to the piece its edit starts in; text the edit
    /// covers in later pieces is removed from them.
    pub fn apply(&mut self, edits: &[TextEdit]) {
        if edits.is_empty() {
            return;
        }

        let mut offset = 0;
        for piece in &mut self.pieces {
            let range = offset..offset + piece.text.len();
            offset = range.end;

            let mut out = String::new();
            let mut cursor = range.start;
            for edit in edits {
                if edit.range.end <= range.start || edit.range.start >= range.end {
                    continue;
                }
                out.push_str(&self.text[cursor..edit.range.start.max(range.start)]);
                if range.contains(&edit.range.start) {
                    out.push_str(&edit.replacement);
                }
                cursor = edit.range.end.min(range.end);
            }
            out.push_str(&self.text[cursor..range.end]);

            if out != piece.text {
                piece.text = out;
                piece.changed = true;
            }
        }

        self.text = self.pieces.iter().map(|piece| piece.text.as_str()).collect();
    }

    /// Replace the whole text; it lands in the first piece
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.apply(&[TextEdit::new(0..self.text.len(), text)]);
        }
    }

    /// Whether any piece differs from what was read
    pub fn is_modified(&self) -> bool {
        self.pieces.iter().any(|piece| piece.changed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    /// Inside `mc:Fallback`: repeats content of the matching `mc:Choice`
    pub alternate: bool,
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }
}

#[derive(Debug, Default)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Drop for Table {
    fn drop(&mut self) {
        // unnest before dropping so deep tables don't recurse
        let mut pending = take_nested_tables(self);
        while let Some(mut table) = pending.pop() {
            pending.extend(take_nested_tables(&mut table));
        }
    }
}

fn take_nested_tables(table: &mut Table) -> Vec<Table> {
    table
        .rows
        .drain(..)
        .flat_map(|row| row.cells)
        .flat_map(|cell| cell.tables)
        .collect()
}

#[derive(Debug, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Default)]
pub struct Cell {
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<Table>,
}

/// Body, header or footer content
#[derive(Debug, Default)]
pub struct Story {
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<Table>,
}

impl Story {
    /// Visit paragraphs in walk order: own paragraphs, then tables depth-first
    pub fn visit_paragraphs(&self, mut f: impl FnMut(&Paragraph)) {
        enum Item<'a> {
            Table(&'a Table),
            Cell(&'a Cell),
        }

        self.paragraphs.iter().for_each(&mut f);

        let mut stack: Vec<Item<'_>> = self.tables.iter().rev().map(Item::Table).collect();
        while let Some(item) = stack.pop() {
            match item {
                Item::Table(table) => {
                    let cells: Vec<&Cell> =
                        table.rows.iter().flat_map(|row| row.cells.iter()).collect();
                    stack.extend(cells.into_iter().rev().map(Item::Cell));
                }
                Item::Cell(cell) => {
                    cell.paragraphs.iter().for_each(&mut f);
                    stack.extend(cell.tables.iter().rev().map(Item::Table));
                }
            }
        }
    }

    pub fn visit_runs(&self, mut f: impl FnMut(&Run)) {
        self.visit_paragraphs(|paragraph| paragraph.runs.iter().for_each(&mut f));
    }

    /// Paragraph texts in walk order
    pub fn paragraph_texts(&self) -> Vec<String> {
        let mut texts = Vec::new();
        self.visit_paragraphs(|paragraph| texts.push(paragraph.text()));
        texts
    }

    pub fn is_modified(&self) -> bool {
        let mut modified = false;
        self.visit_runs(|run| modified |= run.is_modified());
        modified
    }
}

/// The three page variants a section can define a header or footer for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderFooterKind {
    Default,
    FirstPage,
    EvenPage,
}

impl HeaderFooterKind {
    pub const ALL: [HeaderFooterKind; 3] = [
        HeaderFooterKind::Default,
        HeaderFooterKind::FirstPage,
        HeaderFooterKind::EvenPage,
    ];

    /// Parse a `w:type` attribute value
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "default" => Some(HeaderFooterKind::Default),
            "first" => Some(HeaderFooterKind::FirstPage),
            "even" => Some(HeaderFooterKind::EvenPage),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            HeaderFooterKind::Default => 0,
            HeaderFooterKind::FirstPage => 1,
            HeaderFooterKind::EvenPage => 2,
        }
    }
}

/// One header or footer position of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderFooterSlot {
    Header(HeaderFooterKind),
    Footer(HeaderFooterKind),
}

impl HeaderFooterSlot {
    /// Walk order: the three headers, then the three footers
    pub const ALL: [HeaderFooterSlot; 6] = [
        HeaderFooterSlot::Header(HeaderFooterKind::Default),
        HeaderFooterSlot::Header(HeaderFooterKind::FirstPage),
        HeaderFooterSlot::Header(HeaderFooterKind::EvenPage),
        HeaderFooterSlot::Footer(HeaderFooterKind::Default),
        HeaderFooterSlot::Footer(HeaderFooterKind::FirstPage),
        HeaderFooterSlot::Footer(HeaderFooterKind::EvenPage),
    ];
}
