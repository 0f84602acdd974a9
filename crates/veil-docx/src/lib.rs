//! Word document handling for veil
//!
//! This crate provides:
//! - A structured document model (paragraphs, runs, nested tables, sections)
//! - The DOCX package reader/writer that maps parts onto the model
//! - The document walker visiting every text-bearing region
//! - A ZIP archive helper for bundling outputs

pub mod archive;
pub mod model;
pub mod package;
pub mod walker;
mod xml;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixture;

pub use archive::create_zip;
pub use model::{Cell, HeaderFooterKind, HeaderFooterSlot, Paragraph, Row, Run, Story, Table};
pub use package::WordDocument;
pub use walker::{StructuredDocument, walk, walk_story};
