//! In-memory dictionary store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use veil_core::{Error, Result};

use crate::{DictionaryStore, KeywordDictionary};

/// Process-local store, serialized with a mutex instead of a lock file
pub struct MemoryDictionaryStore {
    record: Mutex<KeywordDictionary>,
    gate: Mutex<()>,
    fail_writes: AtomicBool,
}

impl MemoryDictionaryStore {
    pub fn new() -> Self {
        Self::with_dictionary(KeywordDictionary::new())
    }

    /// Start from an existing dictionary
    pub fn with_dictionary(dictionary: KeywordDictionary) -> Self {
        Self {
            record: Mutex::new(dictionary),
            gate: Mutex::new(()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make subsequent writes fail as a full or read-only medium would
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn record(&self) -> MutexGuard<'_, KeywordDictionary> {
        self.record.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryDictionaryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DictionaryStore for MemoryDictionaryStore {
    fn read(&self) -> KeywordDictionary {
        self.record().clone()
    }

    fn write(&self, dictionary: &KeywordDictionary) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence("memory store rejected write".to_string()));
        }
        *self.record() = dictionary.clone();
        Ok(())
    }

    fn locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use veil_core::PlaceholderTemplate;

    #[test]
    fn test_failed_write_leaves_record_untouched() {
        let store = MemoryDictionaryStore::new();
        store.set_fail_writes(true);

        let err = store
            .add(&["Acme".to_string()], &PlaceholderTemplate::default())
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_adds() {
        let store = MemoryDictionaryStore::new();
        let template = PlaceholderTemplate::default();

        thread::scope(|scope| {
            for prefix in ["left", "right"] {
                let store = &store;
                let template = &template;
                scope.spawn(move || {
                    for i in 0..50 {
                        store.add(&[format!("{}{}", prefix, i)], template).unwrap();
                    }
                });
            }
        });

        let dictionary = store.load().unwrap();
        assert_eq!(dictionary.len(), 100);
        assert_eq!(dictionary.next_num(), 101);
    }
}
