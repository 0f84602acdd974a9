//! Document anonymization pipeline
//!
//! [`Anonymizer::anonymize`] runs one document end to end:
//! 1. size check
//! 2. keyword merge under the dictionary lock, persisting new ad-hoc keywords
//! 3. empty-work guard
//! 4. parse, walk and rewrite every text run
//! 5. serialize
//!
//! Only step 2 holds the dictionary lock; document work runs outside it.

pub mod batch;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use veil_core::limits::{MAX_FILE_SIZE_BYTES, MAX_KEYWORDS_COUNT};
use veil_core::{Error, PlaceholderTemplate, ProcessingStats, Result, validate_keyword, validate_keywords};
use veil_docx::{WordDocument, walk};
use veil_security::{KeywordSet, RewriteFlags, Rewriter, SessionState};
use veil_storage::DictionaryStore;

pub use batch::{BatchReport, FileFailure, FileOutcome, InputFile, OutputFile};

/// Keywords supplied by the caller for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keywords {
    /// Literal terms; new ones are added to the dictionary
    List(Vec<String>),
    /// Ready-made keyword -> placeholder pairs, used as given and not persisted
    Map(IndexMap<String, String>),
}

impl Keywords {
    pub fn len(&self) -> usize {
        match self {
            Keywords::List(list) => list.len(),
            Keywords::Map(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-call switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizeOptions {
    pub include_dictionary: bool,
    pub anonymize_financial: bool,
    pub anonymize_pii: bool,
    pub template: PlaceholderTemplate,
}

impl Default for AnonymizeOptions {
    fn default() -> Self {
        Self {
            include_dictionary: true,
            anonymize_financial: false,
            anonymize_pii: false,
            template: PlaceholderTemplate::default(),
        }
    }
}

impl AnonymizeOptions {
    fn flags(&self) -> RewriteFlags {
        RewriteFlags {
            financial: self.anonymize_financial,
            pii: self.anonymize_pii,
        }
    }
}

/// Output of one call
#[derive(Debug, Clone)]
pub struct Anonymized {
    pub bytes: Vec<u8>,
    pub stats: ProcessingStats,
}

/// Runs documents through the pipeline against one dictionary store
pub struct Anonymizer<S> {
    store: S,
}

impl<S: DictionaryStore> Anonymizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Anonymize one document
    pub fn anonymize(
        &self,
        bytes: &[u8],
        keywords: Option<&Keywords>,
        options: &AnonymizeOptions,
    ) -> Result<Anonymized> {
        if bytes.len() > MAX_FILE_SIZE_BYTES {
            return Err(Error::FileTooLarge {
                size_bytes: bytes.len(),
                limit_bytes: MAX_FILE_SIZE_BYTES,
            });
        }

        let merged = self.merge_keywords(keywords, options)?;

        let flags = options.flags();
        if merged.is_empty() && !flags.financial && !flags.pii {
            return Err(Error::NoWorkSpecified);
        }

        let mut document = WordDocument::open(bytes)?;
        let rewriter = Rewriter::new(KeywordSet::new(&merged)?, flags);
        let mut session = SessionState::new();

        walk(&mut document, |paragraph| {
            let alternate = paragraph.alternate;
            for run in &mut paragraph.runs {
                if run.text().is_empty() {
                    continue;
                }
                let edits = if alternate {
                    session.uncounted(|session| rewriter.edits(run.text(), session))
                } else {
                    rewriter.edits(run.text(), &mut session)
                };
                run.apply(&edits);
            }
        });

        let bytes = document.to_bytes()?;
        let stats = session.stats();
        info!(
            "Anonymized document: {} keyword, {} financial, {} PII replacements",
            stats.keywords_replaced,
            stats.financial_replaced,
            stats.pii_total()
        );

        Ok(Anonymized { bytes, stats })
    }

    /// Build the keyword -> placeholder map for one call.
    ///
    /// Dictionary load, ad-hoc assignment and persistence of new keywords
    /// share one critical section, so the placeholder used in the document
    /// is always the persisted one.
    fn merge_keywords(
        &self,
        keywords: Option<&Keywords>,
        options: &AnonymizeOptions,
    ) -> Result<IndexMap<String, String>> {
        if let Some(keywords) = keywords
            && keywords.len() > MAX_KEYWORDS_COUNT
        {
            return Err(Error::TooManyKeywords {
                count: keywords.len(),
                limit: MAX_KEYWORDS_COUNT,
            });
        }

        let ad_hoc = match keywords {
            Some(Keywords::List(list)) => validate_keywords(list.iter().map(String::as_str)),
            _ => Vec::new(),
        };

        let mut merged = IndexMap::new();

        if options.include_dictionary || !ad_hoc.is_empty() {
            self.store.transact(|dictionary| {
                if options.include_dictionary {
                    merged.extend(dictionary.iter().map(|(k, v)| (k.to_string(), v.to_string())));
                }
                for keyword in &ad_hoc {
                    let (placeholder, is_new) = dictionary.assign(keyword, &options.template);
                    if is_new {
                        debug!("New keyword assigned {}", placeholder);
                    }
                    merged.insert(keyword.clone(), placeholder);
                }
                Ok(())
            })?;
        }

        if let Some(Keywords::Map(map)) = keywords {
            for (keyword, placeholder) in map {
                match validate_keyword(keyword) {
                    Ok(keyword) => {
                        merged.insert(keyword, placeholder.clone());
                    }
                    Err(e) => warn!("Skipping keyword: {}", e),
                }
            }
        }

        debug!("Merged {} keywords", merged.len());
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_docx::fixture::DocxBuilder;
    use veil_storage::{KeywordDictionary, MemoryDictionaryStore};

    fn list(keywords: &[&str]) -> Keywords {
        Keywords::List(keywords.iter().map(|k| k.to_string()).collect())
    }

    fn no_dictionary() -> AnonymizeOptions {
        AnonymizeOptions {
            include_dictionary: false,
            ..Default::default()
        }
    }

    fn body_text(bytes: &[u8]) -> Vec<String> {
        WordDocument::open(bytes).unwrap().body().paragraph_texts()
    }

    #[test]
    fn test_oversized_input_rejected_before_parsing() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let bytes = vec![0u8; MAX_FILE_SIZE_BYTES + 1];
        let err = anonymizer
            .anonymize(&bytes, Some(&list(&["Acme"])), &AnonymizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { .. }));
        // nothing reached the dictionary
        assert!(anonymizer.store().load().unwrap().is_empty());
    }

    #[test]
    fn test_too_many_keywords() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let keywords: Vec<String> = (0..=MAX_KEYWORDS_COUNT).map(|i| format!("k{}", i)).collect();
        let bytes = DocxBuilder::new().paragraph("text").build();
        let err = anonymizer
            .anonymize(&bytes, Some(&Keywords::List(keywords)), &no_dictionary())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TooManyKeywords {
                count: 101,
                limit: 100
            }
        ));
    }

    #[test]
    fn test_no_work_specified() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let bytes = DocxBuilder::new().paragraph("text").build();
        let err = anonymizer.anonymize(&bytes, None, &no_dictionary()).unwrap_err();
        assert!(matches!(err, Error::NoWorkSpecified));

        // only invalid keywords is still no work
        let err = anonymizer
            .anonymize(&bytes, Some(&list(&["  ", ""])), &no_dictionary())
            .unwrap_err();
        assert!(matches!(err, Error::NoWorkSpecified));
    }

    #[test]
    fn test_no_work_checked_before_parsing() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let err = anonymizer
            .anonymize(b"not a document", None, &no_dictionary())
            .unwrap_err();
        assert!(matches!(err, Error::NoWorkSpecified));
    }

    #[test]
    fn test_invalid_document() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let err = anonymizer
            .anonymize(b"not a document", Some(&list(&["Acme"])), &no_dictionary())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn test_dictionary_keywords_applied() {
        let mut dictionary = KeywordDictionary::new();
        dictionary.assign("Acme", &PlaceholderTemplate::default());
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::with_dictionary(dictionary));

        let bytes = DocxBuilder::new().paragraph("Acme and ACME").build();
        let out = anonymizer
            .anonymize(&bytes, None, &AnonymizeOptions::default())
            .unwrap();
        assert_eq!(body_text(&out.bytes), vec!["[REDACTED_1] and [REDACTED_1]"]);
        assert_eq!(out.stats.keywords_replaced, 2);
    }

    #[test]
    fn test_dictionary_excluded() {
        let mut dictionary = KeywordDictionary::new();
        dictionary.assign("Acme", &PlaceholderTemplate::default());
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::with_dictionary(dictionary));

        let bytes = DocxBuilder::new().paragraph("Acme met Globex").build();
        let out = anonymizer
            .anonymize(&bytes, Some(&list(&["Globex"])), &no_dictionary())
            .unwrap();
        assert_eq!(body_text(&out.bytes), vec!["Acme met [REDACTED_2]"]);
    }

    #[test]
    fn test_ad_hoc_keyword_reuses_stored_placeholder() {
        let template = PlaceholderTemplate::default();
        let mut dictionary = KeywordDictionary::new();
        dictionary.assign("Acme", &template);
        dictionary.assign("Globex", &template);
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::with_dictionary(dictionary));

        let bytes = DocxBuilder::new().paragraph("Globex").build();
        let out = anonymizer
            .anonymize(&bytes, Some(&list(&["Globex"])), &no_dictionary())
            .unwrap();
        assert_eq!(body_text(&out.bytes), vec!["[REDACTED_2]"]);
        assert_eq!(anonymizer.store().load().unwrap().next_num(), 3);
    }

    #[test]
    fn test_new_ad_hoc_keywords_persisted() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let bytes = DocxBuilder::new().paragraph("Initech").build();
        let out = anonymizer
            .anonymize(&bytes, Some(&list(&["Initech"])), &AnonymizeOptions::default())
            .unwrap();
        assert_eq!(body_text(&out.bytes), vec!["[REDACTED_1]"]);

        let dictionary = anonymizer.store().load().unwrap();
        assert_eq!(dictionary.get("Initech"), Some("[REDACTED_1]"));
        assert_eq!(dictionary.next_num(), 2);
    }

    #[test]
    fn test_persistence_failure_surfaced() {
        let store = MemoryDictionaryStore::new();
        store.set_fail_writes(true);
        let anonymizer = Anonymizer::new(store);

        let bytes = DocxBuilder::new().paragraph("Initech").build();
        let err = anonymizer
            .anonymize(&bytes, Some(&list(&["Initech"])), &AnonymizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[test]
    fn test_keyword_map_not_persisted() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let map: IndexMap<String, String> = [("Acme".to_string(), "[CLIENT]".to_string())]
            .into_iter()
            .collect();

        let bytes = DocxBuilder::new().paragraph("Acme Ltd").build();
        let out = anonymizer
            .anonymize(&bytes, Some(&Keywords::Map(map)), &no_dictionary())
            .unwrap();
        assert_eq!(body_text(&out.bytes), vec!["[CLIENT] Ltd"]);
        assert!(anonymizer.store().load().unwrap().is_empty());
    }

    #[test]
    fn test_pii_only_needs_no_dictionary() {
        let store = MemoryDictionaryStore::new();
        store.set_fail_writes(true);
        let anonymizer = Anonymizer::new(store);

        let options = AnonymizeOptions {
            include_dictionary: false,
            anonymize_pii: true,
            ..Default::default()
        };
        let bytes = DocxBuilder::new().paragraph("mail a@x.com").build();
        let out = anonymizer.anonymize(&bytes, None, &options).unwrap();
        assert_eq!(body_text(&out.bytes), vec!["mail [EMAIL_1]"]);
    }

    #[test]
    fn test_custom_template() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let options = AnonymizeOptions {
            template: PlaceholderTemplate::new("<<HIDDEN-{n}>>").unwrap(),
            ..Default::default()
        };
        let bytes = DocxBuilder::new().paragraph("Initech").build();
        let out = anonymizer
            .anonymize(&bytes, Some(&list(&["Initech"])), &options)
            .unwrap();
        assert_eq!(body_text(&out.bytes), vec!["<<HIDDEN-1>>"]);
    }
}
