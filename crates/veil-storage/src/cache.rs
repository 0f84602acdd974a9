//! Read-through cache for dictionary browsing

use std::sync::Mutex;
use std::time::{Duration, Instant};

use veil_core::Result;

use crate::{DictionaryStore, KeywordDictionary};

struct CachedSnapshot {
    dictionary: KeywordDictionary,
    loaded_at: Instant,
}

/// Short-lived snapshot of a store, for display only
pub struct DictionaryCache<S> {
    store: S,
    ttl: Duration,
    snapshot: Mutex<Option<CachedSnapshot>>,
}

impl<S: DictionaryStore> DictionaryCache<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            snapshot: Mutex::new(None),
        }
    }

    /// Cached dictionary, reloading from the store once the window has passed
    pub fn get(&self) -> Result<KeywordDictionary> {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = snapshot.as_ref()
            && cached.loaded_at.elapsed() < self.ttl
        {
            return Ok(cached.dictionary.clone());
        }

        let dictionary = self.store.load()?;
        *snapshot = Some(CachedSnapshot {
            dictionary: dictionary.clone(),
            loaded_at: Instant::now(),
        });
        Ok(dictionary)
    }

    pub fn is_valid(&self) -> bool {
        let snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        snapshot
            .as_ref()
            .is_some_and(|cached| cached.loaded_at.elapsed() < self.ttl)
    }

    /// Drop the snapshot; call after any mutation
    pub fn invalidate(&self) {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
