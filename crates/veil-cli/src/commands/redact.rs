//! Redact command - anonymize a batch of documents

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use veil_config::Config;
use veil_core::{PlaceholderTemplate, split_keywords};
use veil_engine::{AnonymizeOptions, Anonymizer, BatchReport, InputFile, Keywords};
use veil_storage::FileDictionaryStore;

use crate::cli::RedactArgs;

pub async fn handle(args: RedactArgs, store: Arc<FileDictionaryStore>, config: &Config) -> Result<()> {
    let options = options_from(&args, config)?;
    let keywords = args
        .keywords
        .as_deref()
        .map(split_keywords)
        .filter(|k| !k.is_empty())
        .map(Keywords::List);

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(InputFile::new(file_name(path), bytes));
    }

    // Document work is CPU-bound and takes the blocking dictionary lock
    let report = tokio::task::spawn_blocking(move || {
        Anonymizer::new(store).anonymize_batch(&files, keywords.as_ref(), &options)
    })
    .await??;

    let written = write_outputs(&report, &args.output, args.zip.as_deref()).await?;

    if args.json {
        print_json(&report, &written)?;
    } else {
        print_summary(&report, &written);
    }

    let failed = report.failed().count();
    if report.all_failed() {
        anyhow::bail!("No document could be anonymized");
    } else if failed > 0 {
        tracing::warn!(
            "{} of {} documents could not be anonymized",
            failed,
            report.outcomes.len()
        );
    }

    Ok(())
}

fn options_from(args: &RedactArgs, config: &Config) -> Result<AnonymizeOptions> {
    let template = match &args.template {
        Some(template) => PlaceholderTemplate::new(template.as_str())?,
        None => config.placeholder_template.clone(),
    };

    Ok(AnonymizeOptions {
        include_dictionary: config.defaults.include_dictionary && !args.no_dictionary,
        anonymize_financial: config.defaults.anonymize_financial || args.financial,
        anonymize_pii: config.defaults.anonymize_pii || args.pii,
        template,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Write outputs as separate files, or as one archive; returns written paths
async fn write_outputs(
    report: &BatchReport,
    output_dir: &Path,
    zip: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    if report.all_failed() {
        return Ok(Vec::new());
    }

    if let Some(zip) = zip {
        let archive = report.archive()?;
        tokio::fs::write(zip, archive)
            .await
            .with_context(|| format!("Failed to write {}", zip.display()))?;
        return Ok(vec![zip.to_path_buf()]);
    }

    tokio::fs::create_dir_all(output_dir).await?;
    let mut written = Vec::new();
    for output in report.succeeded() {
        let path = output_dir.join(&output.name);
        tokio::fs::write(&path, &output.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn print_summary(report: &BatchReport, written: &[PathBuf]) {
    for output in report.succeeded() {
        println!("✓ {} -> {}", output.source, output.name);
        println!("  Keywords replaced: {}", output.stats.keywords_replaced);
        println!("  Financial values: {}", output.stats.financial_replaced);
        for (category, count) in &output.stats.pii_replaced {
            println!("  {}: {}", category, count);
        }
    }

    for failure in report.failed() {
        println!("✗ {} ({})", failure.name, failure.category);
        println!("  {}", failure.message);
        if failure.retryable {
            println!("  The dictionary is busy; try again shortly.");
        }
    }

    if !written.is_empty() {
        println!("\nWritten:");
        for path in written {
            println!("  {}", path.display());
        }
        println!(
            "Total replacements: {}",
            report.total_stats().total_replacements()
        );
    }
}

fn print_json(report: &BatchReport, written: &[PathBuf]) -> Result<()> {
    let files: Vec<_> = report
        .succeeded()
        .map(|output| {
            serde_json::json!({
                "source": output.source,
                "output": output.name,
                "stats": output.stats,
            })
        })
        .collect();
    let failures: Vec<_> = report.failed().collect();

    let summary = serde_json::json!({
        "files": files,
        "failures": failures,
        "written": written,
        "total": report.total_stats(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
