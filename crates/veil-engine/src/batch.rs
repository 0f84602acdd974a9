//! Multi-file processing
//!
//! Files are processed in order and isolated from each other: a failing
//! file becomes a [`FileFailure`] and the rest of the batch continues.

use serde::Serialize;
use tracing::{info, warn};
use veil_core::limits::MAX_FILES_COUNT;
use veil_core::{Error, ProcessingStats, Result};
use veil_docx::create_zip;
use veil_storage::DictionaryStore;

use crate::{AnonymizeOptions, Anonymizer, Keywords};

const OUTPUT_PREFIX: &str = "anonymized_";

/// One uploaded document
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputFile {
    /// Name of the input this came from
    pub source: String,
    /// `anonymized_<source>`
    pub name: String,
    pub bytes: Vec<u8>,
    pub stats: ProcessingStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub name: String,
    pub category: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl FileFailure {
    fn new(name: &str, error: &Error) -> Self {
        // unanticipated errors may carry paths or content; report the category only
        let message = match error {
            Error::Io(_) | Error::Serialization(_) | Error::Other(_) => {
                format!("{} while processing the document", error.category())
            }
            e => e.to_string(),
        };
        Self {
            name: name.to_string(),
            category: error.category(),
            message,
            retryable: error.is_retryable(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FileOutcome {
    Done(OutputFile),
    Failed(FileFailure),
}

/// Per-file results in input order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &OutputFile> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Done(output) => Some(output),
            FileOutcome::Failed(_) => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Failed(failure) => Some(failure),
            FileOutcome::Done(_) => None,
        })
    }

    pub fn all_failed(&self) -> bool {
        self.succeeded().next().is_none()
    }

    /// Stats summed over successful files
    pub fn total_stats(&self) -> ProcessingStats {
        let mut total = ProcessingStats::default();
        for output in self.succeeded() {
            total.keywords_replaced += output.stats.keywords_replaced;
            total.financial_replaced += output.stats.financial_replaced;
            for (category, count) in &output.stats.pii_replaced {
                *total.pii_replaced.entry(*category).or_default() += count;
            }
        }
        total
    }

    /// Bundle every successful output into one ZIP archive
    pub fn archive(&self) -> Result<Vec<u8>> {
        let files: Vec<(String, Vec<u8>)> = self
            .succeeded()
            .map(|output| (output.name.clone(), output.bytes.clone()))
            .collect();
        create_zip(&files)
    }
}

impl<S: DictionaryStore> Anonymizer<S> {
    /// Anonymize up to [`MAX_FILES_COUNT`] documents with shared options
    pub fn anonymize_batch(
        &self,
        files: &[InputFile],
        keywords: Option<&Keywords>,
        options: &AnonymizeOptions,
    ) -> Result<BatchReport> {
        if files.len() > MAX_FILES_COUNT {
            return Err(Error::TooManyFiles {
                count: files.len(),
                limit: MAX_FILES_COUNT,
            });
        }

        let mut report = BatchReport::default();
        for file in files {
            let outcome = match self.anonymize(&file.bytes, keywords, options) {
                Ok(result) => FileOutcome::Done(OutputFile {
                    source: file.name.clone(),
                    name: format!("{}{}", OUTPUT_PREFIX, file.name),
                    bytes: result.bytes,
                    stats: result.stats,
                }),
                Err(e) => {
                    warn!("Failed to anonymize {}: {}", file.name, e.category());
                    FileOutcome::Failed(FileFailure::new(&file.name, &e))
                }
            };
            report.outcomes.push(outcome);
        }

        info!(
            "Batch finished: {} succeeded, {} failed",
            report.succeeded().count(),
            report.failed().count()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_docx::fixture::DocxBuilder;
    use veil_storage::MemoryDictionaryStore;

    fn keywords() -> Keywords {
        Keywords::List(vec!["Acme".to_string()])
    }

    #[test]
    fn test_too_many_files() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let files: Vec<InputFile> = (0..=MAX_FILES_COUNT)
            .map(|i| InputFile::new(format!("{}.docx", i), Vec::new()))
            .collect();
        let err = anonymizer
            .anonymize_batch(&files, Some(&keywords()), &AnonymizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::TooManyFiles { count: 21, limit: 20 }));
    }

    #[test]
    fn test_failures_are_isolated() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let files = vec![
            InputFile::new("good.docx", DocxBuilder::new().paragraph("Acme").build()),
            InputFile::new("broken.docx", b"garbage".to_vec()),
            InputFile::new("second.docx", DocxBuilder::new().paragraph("Acme too").build()),
        ];

        let report = anonymizer
            .anonymize_batch(&files, Some(&keywords()), &AnonymizeOptions::default())
            .unwrap();
        assert_eq!(report.outcomes.len(), 3);
        assert!(!report.all_failed());

        let names: Vec<_> = report.succeeded().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["anonymized_good.docx", "anonymized_second.docx"]);

        let failures: Vec<_> = report.failed().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "broken.docx");
        assert_eq!(failures[0].category, "InvalidDocumentError");
        assert!(!failures[0].retryable);

        assert_eq!(report.total_stats().keywords_replaced, 2);
    }

    #[test]
    fn test_all_failed() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let files = vec![InputFile::new("a.docx", b"garbage".to_vec())];
        let report = anonymizer
            .anonymize_batch(&files, Some(&keywords()), &AnonymizeOptions::default())
            .unwrap();
        assert!(report.all_failed());
    }

    #[test]
    fn test_unexpected_error_reports_category_only() {
        let error = Error::Other(std::io::Error::other("/home/user/secret.docx").into());
        let failure = FileFailure::new("a.docx", &error);
        assert_eq!(failure.category, "UnexpectedError");
        assert!(!failure.message.contains("secret"));
    }

    #[test]
    fn test_io_and_serialization_errors_report_category_only() {
        let io = Error::Io(std::io::Error::other("/home/user/secret.docx"));
        let failure = FileFailure::new("a.docx", &io);
        assert_eq!(failure.message, format!("{} while processing the document", io.category()));
        assert!(!failure.message.contains("secret"));

        let json = serde_json::from_str::<serde_json::Value>("{\"secret\": ").unwrap_err();
        let failure = FileFailure::new("a.docx", &Error::Serialization(json));
        assert!(!failure.message.contains("secret"));
        assert!(!failure.message.contains("line"));
    }

    #[test]
    fn test_archive_holds_successful_outputs() {
        let anonymizer = Anonymizer::new(MemoryDictionaryStore::new());
        let files = vec![
            InputFile::new("a.docx", DocxBuilder::new().paragraph("Acme").build()),
            InputFile::new("b.docx", b"garbage".to_vec()),
        ];
        let report = anonymizer
            .anonymize_batch(&files, Some(&keywords()), &AnonymizeOptions::default())
            .unwrap();

        let archive = report.archive().unwrap();
        assert!(archive.starts_with(b"PK"));
        assert!(
            archive
                .windows(b"anonymized_a.docx".len())
                .any(|w| w == b"anonymized_a.docx")
        );
        assert!(
            !archive
                .windows(b"anonymized_b.docx".len())
                .any(|w| w == b"anonymized_b.docx")
        );

        let failure_json = serde_json::to_value(report.failed().next().unwrap()).unwrap();
        assert_eq!(failure_json["category"], "InvalidDocumentError");
    }
}
