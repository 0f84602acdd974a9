//! Keyword dictionary and its durable record
//!
//! The record is a JSON object:
//!
//! ```json
//! { "_meta": { "next_num": 3 }, "keywords": { "Acme": "[REDACTED_1]", "John Doe": "[REDACTED_2]" } }
//! ```
//!
//! A flat `{ "<term>": "<placeholder>" }` object is read as a legacy record
//! whose counter continues at `count + 1`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use veil_core::{PlaceholderTemplate, Result};

/// Ordered keyword -> placeholder mapping with a monotonic counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordDictionary {
    keywords: IndexMap<String, String>,
    next_num: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordMeta {
    #[serde(default = "default_next_num")]
    next_num: u64,
}

#[derive(Serialize)]
struct RecordRef<'a> {
    #[serde(rename = "_meta")]
    meta: RecordMeta,
    keywords: &'a IndexMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Current {
        #[serde(rename = "_meta")]
        meta: RecordMeta,
        #[serde(default)]
        keywords: IndexMap<String, String>,
    },
    Legacy(IndexMap<String, String>),
}

fn default_next_num() -> u64 {
    1
}

impl KeywordDictionary {
    pub fn new() -> Self {
        Self {
            keywords: IndexMap::new(),
            next_num: default_next_num(),
        }
    }

    /// Parse a stored record, accepting the legacy flat layout
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let record: StoredRecord = serde_json::from_slice(bytes)?;
        let dictionary = match record {
            StoredRecord::Current { meta, keywords } => Self {
                keywords,
                next_num: meta.next_num.max(1),
            },
            StoredRecord::Legacy(keywords) => {
                let next_num = keywords.len() as u64 + 1;
                Self { keywords, next_num }
            }
        };
        Ok(dictionary)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        let record = RecordRef {
            meta: RecordMeta {
                next_num: self.next_num,
            },
            keywords: &self.keywords,
        };
        Ok(serde_json::to_vec_pretty(&record)?)
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.keywords.get(keyword).map(String::as_str)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.contains_key(keyword)
    }

    /// Placeholder for `keyword`, assigning the next number if it is new.
    ///
    /// Returns the placeholder and whether it was newly assigned.
    pub fn assign(&mut self, keyword: &str, template: &PlaceholderTemplate) -> (String, bool) {
        if let Some(existing) = self.keywords.get(keyword) {
            return (existing.clone(), false);
        }

        let placeholder = template.render(self.next_num);
        self.keywords
            .insert(keyword.to_string(), placeholder.clone());
        self.next_num += 1;
        (placeholder, true)
    }

    /// Drop every entry and restart numbering at 1
    pub fn clear(&mut self) {
        self.keywords.clear();
        self.next_num = default_next_num();
    }

    pub fn next_num(&self) -> u64 {
        self.next_num
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Keywords in assignment order
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }

    /// (keyword, placeholder) pairs in assignment order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keywords
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.keywords
    }
}

impl Default for KeywordDictionary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_is_monotonic() {
        let template = PlaceholderTemplate::default();
        let mut dictionary = KeywordDictionary::new();

        assert_eq!(
            dictionary.assign("Acme", &template),
            ("[REDACTED_1]".to_string(), true)
        );
        assert_eq!(
            dictionary.assign("John Doe", &template),
            ("[REDACTED_2]".to_string(), true)
        );
        assert_eq!(
            dictionary.assign("Acme", &template),
            ("[REDACTED_1]".to_string(), false)
        );
        assert_eq!(dictionary.next_num(), 3);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let template = PlaceholderTemplate::default();
        let mut dictionary = KeywordDictionary::new();
        dictionary.assign("acme", &template);
        dictionary.assign("ACME", &template);
        assert_eq!(dictionary.len(), 2);
    }

    #[test]
    fn test_record_layout() {
        let template = PlaceholderTemplate::default();
        let mut dictionary = KeywordDictionary::new();
        dictionary.assign("Zeta", &template);
        dictionary.assign("Alpha", &template);

        let json: serde_json::Value =
            serde_json::from_slice(&dictionary.to_json().unwrap()).unwrap();
        assert_eq!(json["_meta"]["next_num"], 3);
        assert_eq!(json["keywords"]["Zeta"], "[REDACTED_1]");

        let reloaded = KeywordDictionary::from_json(&dictionary.to_json().unwrap()).unwrap();
        let order: Vec<_> = reloaded.keywords().collect();
        assert_eq!(order, vec!["Zeta", "Alpha"]);
        assert_eq!(reloaded.next_num(), 3);
    }

    #[test]
    fn test_legacy_record() {
        let legacy = br#"{"Acme": "[REDACTED_1]", "Globex": "[REDACTED_2]"}"#;
        let dictionary = KeywordDictionary::from_json(legacy).unwrap();
        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary.next_num(), 3);
        assert_eq!(dictionary.get("Globex"), Some("[REDACTED_2]"));
    }

    #[test]
    fn test_deleted_numbers_are_not_reused() {
        // counter persisted past the highest surviving entry
        let record = br#"{"_meta": {"next_num": 9}, "keywords": {"Acme": "[REDACTED_4]"}}"#;
        let mut dictionary = KeywordDictionary::from_json(record).unwrap();
        let (placeholder, _) = dictionary.assign("Initech", &PlaceholderTemplate::default());
        assert_eq!(placeholder, "[REDACTED_9]");
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        assert!(KeywordDictionary::from_json(b"{not json").is_err());
        assert!(KeywordDictionary::from_json(br#"{"_meta": "x", "keywords": 3}"#).is_err());
        assert!(KeywordDictionary::from_json(b"[1, 2]").is_err());
    }

    #[test]
    fn test_zero_counter_is_clamped() {
        let record = br#"{"_meta": {"next_num": 0}, "keywords": {}}"#;
        let dictionary = KeywordDictionary::from_json(record).unwrap();
        assert_eq!(dictionary.next_num(), 1);
    }

    #[test]
    fn test_clear_resets_counter() {
        let template = PlaceholderTemplate::default();
        let mut dictionary = KeywordDictionary::new();
        dictionary.assign("Acme", &template);
        dictionary.clear();
        assert!(dictionary.is_empty());
        assert_eq!(dictionary.next_num(), 1);
    }
}
