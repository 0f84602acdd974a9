//! Document walker
//!
//! Visits every paragraph that can carry text: the body, body tables at
//! any depth, then each section's own headers and footers. Headers and
//! footers linked to a previous section are skipped so shared content is
//! only visited once.

use crate::model::{Cell, HeaderFooterSlot, Paragraph, Story, Table};

/// A document with a body and per-section headers/footers
pub trait StructuredDocument {
    fn body_mut(&mut self) -> &mut Story;

    fn section_count(&self) -> usize;

    /// Own content of a header/footer position; `None` when it is linked to
    /// the previous section's
    fn header_footer_mut(&mut self, section: usize, slot: HeaderFooterSlot) -> Option<&mut Story>;
}

/// Apply `f` to every text-bearing paragraph of `document`
pub fn walk<D, F>(document: &mut D, mut f: F)
where
    D: StructuredDocument + ?Sized,
    F: FnMut(&mut Paragraph),
{
    walk_story(document.body_mut(), &mut f);

    for section in 0..document.section_count() {
        for slot in HeaderFooterSlot::ALL {
            match document.header_footer_mut(section, slot) {
                Some(story) => walk_story(story, &mut f),
                None => tracing::trace!("Section {} {:?} is linked, skipping", section, slot),
            }
        }
    }
}

/// Apply `f` to a story's paragraphs, then its tables depth-first
pub fn walk_story<F>(story: &mut Story, f: &mut F)
where
    F: FnMut(&mut Paragraph),
{
    enum Work<'a> {
        Table(&'a mut Table),
        Cell(&'a mut Cell),
    }

    for paragraph in &mut story.paragraphs {
        f(paragraph);
    }

    // reversed pushes keep document order when popping
    let mut stack: Vec<Work<'_>> = story.tables.iter_mut().rev().map(Work::Table).collect();
    while let Some(work) = stack.pop() {
        match work {
            Work::Table(table) => {
                let cells: Vec<&mut Cell> = table
                    .rows
                    .iter_mut()
                    .flat_map(|row| row.cells.iter_mut())
                    .collect();
                stack.extend(cells.into_iter().rev().map(Work::Cell));
            }
            Work::Cell(cell) => {
                for paragraph in &mut cell.paragraphs {
                    f(paragraph);
                }
                stack.extend(cell.tables.iter_mut().rev().map(Work::Table));
            }
        }
    }
}
