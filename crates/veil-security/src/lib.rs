//! Redaction rules for veil
//!
//! This crate provides:
//! - The pattern library (financial amounts and PII categories)
//! - The text rewriter applying keywords, PII and financial substitution

pub mod patterns;
pub mod rewriter;

pub use patterns::{FINANCIAL, PII_RECOGNIZERS, Recognizer};
pub use rewriter::{KeywordSet, RewriteFlags, Rewriter, SessionState};
