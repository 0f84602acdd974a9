//! Keyword validation and splitting

use crate::limits::MAX_KEYWORD_LENGTH;
use crate::{Error, Result};

/// Trim a keyword and check it is non-empty and within the length limit
pub fn validate_keyword(keyword: &str) -> Result<String> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        return Err(Error::KeywordValidation(
            "Keyword cannot be empty".to_string(),
        ));
    }

    let length = trimmed.chars().count();
    if length > MAX_KEYWORD_LENGTH {
        return Err(Error::KeywordValidation(format!(
            "Keyword exceeds {} characters ({})",
            MAX_KEYWORD_LENGTH, length
        )));
    }

    Ok(trimmed.to_string())
}

/// Validate a batch, skipping (and logging) invalid entries
pub fn validate_keywords<'a>(keywords: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    keywords
        .into_iter()
        .filter_map(|keyword| match validate_keyword(keyword) {
            Ok(valid) => Some(valid),
            Err(e) => {
                tracing::warn!("Skipping invalid keyword: {}", e);
                None
            }
        })
        .collect()
}

/// Split comma-separated keyword input, dropping blank entries
pub fn split_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .map(String::from)
        .collect()
}
