//! Keyword dictionary storage for veil
//!
//! This crate provides:
//! - The keyword dictionary and its durable record format
//! - A store interface with locked read-modify-write transactions
//! - File-backed (cross-process) and in-memory stores
//! - A short-lived read-through cache for browsing

pub mod cache;
pub mod dictionary;
pub mod file;
pub mod memory;
pub mod store;

pub use cache::DictionaryCache;
pub use dictionary::KeywordDictionary;
pub use file::FileDictionaryStore;
pub use memory::MemoryDictionaryStore;
pub use store::DictionaryStore;
pub use veil_core::{Error, Result};
