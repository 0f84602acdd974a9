//! Core domain types for veil
//!
//! This crate contains:
//! - The error taxonomy shared by every crate
//! - Input limits and keyword validation
//! - Placeholder templates and PII categories
//! - Text edits produced by the rewriter
//! - Processing statistics

pub mod category;
pub mod edit;
pub mod error;
pub mod keyword;
pub mod limits;
pub mod placeholder;
pub mod stats;

pub use category::PiiCategory;
pub use edit::{TextEdit, apply_edits};
pub use error::{Error, Result};
pub use keyword::{split_keywords, validate_keyword, validate_keywords};
pub use placeholder::PlaceholderTemplate;
pub use stats::ProcessingStats;
