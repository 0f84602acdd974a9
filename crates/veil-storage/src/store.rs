//! Store interface for the keyword dictionary

use std::sync::Arc;

use veil_core::{PlaceholderTemplate, Result, validate_keywords};

use crate::KeywordDictionary;

/// Transactional key-value store holding one [`KeywordDictionary`].
///
/// Implementors provide unlocked `read`/`write` plus an exclusive `locked`
/// section; every mutation goes through `transact`, which holds the lock
/// across the whole read-modify-write.
pub trait DictionaryStore: Send + Sync {
    /// Read the current record. Missing or corrupt records read as empty.
    fn read(&self) -> KeywordDictionary;

    /// Persist the record atomically
    fn write(&self, dictionary: &KeywordDictionary) -> Result<()>;

    /// Run `f` while holding the store's exclusive lock
    fn locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T>;

    /// Snapshot of the dictionary
    fn load(&self) -> Result<KeywordDictionary> {
        self.locked(|| Ok(self.read()))
    }

    fn save(&self, dictionary: &KeywordDictionary) -> Result<()> {
        self.locked(|| self.write(dictionary))
    }

    /// Read, mutate and persist under one critical section.
    ///
    /// The record is only written when `f` changed it.
    fn transact<T>(&self, f: impl FnOnce(&mut KeywordDictionary) -> Result<T>) -> Result<T> {
        self.locked(|| {
            let mut dictionary = self.read();
            let before = dictionary.clone();
            let out = f(&mut dictionary)?;
            if dictionary != before {
                self.write(&dictionary)?;
            }
            Ok(out)
        })
    }

    /// Merge unseen keywords, skipping invalid ones, and return the result
    fn add(&self, keywords: &[String], template: &PlaceholderTemplate) -> Result<KeywordDictionary> {
        self.add_new(keywords, template)
            .map(|(dictionary, _)| dictionary)
    }

    /// Like [`DictionaryStore::add`], also returning the keywords this call added
    fn add_new(
        &self,
        keywords: &[String],
        template: &PlaceholderTemplate,
    ) -> Result<(KeywordDictionary, Vec<String>)> {
        let valid = validate_keywords(keywords.iter().map(String::as_str));
        self.transact(|dictionary| {
            let mut added = Vec::new();
            for keyword in valid {
                let (placeholder, is_new) = dictionary.assign(&keyword, template);
                if is_new {
                    tracing::debug!("Added keyword to dictionary as {}", placeholder);
                    added.push(keyword);
                }
            }
            Ok((dictionary.clone(), added))
        })
    }

    /// Reset to an empty mapping with the counter at 1
    fn clear(&self) -> Result<()> {
        self.locked(|| self.write(&KeywordDictionary::new()))
    }
}

impl<S: DictionaryStore> DictionaryStore for Arc<S> {
    fn read(&self) -> KeywordDictionary {
        (**self).read()
    }

    fn write(&self, dictionary: &KeywordDictionary) -> Result<()> {
        (**self).write(dictionary)
    }

    fn locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        (**self).locked(f)
    }
}
