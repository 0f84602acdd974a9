//! Dict command - browse and edit the keyword dictionary

use std::sync::Arc;

use anyhow::Result;
use veil_config::Config;
use veil_core::split_keywords;
use veil_storage::{DictionaryCache, DictionaryStore, FileDictionaryStore};

use crate::cli::DictCommands;

pub async fn handle(cmd: DictCommands, store: Arc<FileDictionaryStore>, config: &Config) -> Result<()> {
    let cache = DictionaryCache::new(store, config.cache_ttl());
    match cmd {
        DictCommands::List => list(&cache).await,
        DictCommands::Add { keywords } => add(&cache, &keywords, config).await,
        DictCommands::Clear { force } => clear(&cache, force).await,
        DictCommands::Path => {
            println!("{}", cache.store().path().display());
            Ok(())
        }
    }
}

async fn list(cache: &DictionaryCache<Arc<FileDictionaryStore>>) -> Result<()> {
    let dictionary = cache.get()?;

    if dictionary.is_empty() {
        println!("Dictionary is empty.");
        return Ok(());
    }

    println!("Keywords ({}):", dictionary.len());
    for (keyword, placeholder) in dictionary.iter() {
        println!("  {} -> {}", keyword, placeholder);
    }
    println!("Next number: {}", dictionary.next_num());

    Ok(())
}

async fn add(
    cache: &DictionaryCache<Arc<FileDictionaryStore>>,
    keywords: &str,
    config: &Config,
) -> Result<()> {
    let keywords = split_keywords(keywords);
    if keywords.is_empty() {
        anyhow::bail!("No keywords given");
    }

    let (dictionary, added) = cache.store().add_new(&keywords, &config.placeholder_template)?;
    cache.invalidate();

    println!(
        "✓ Added {} keyword(s); dictionary now has {}",
        added.len(),
        dictionary.len()
    );
    for keyword in &keywords {
        if let Some(placeholder) = dictionary.get(keyword) {
            println!("  {} -> {}", keyword, placeholder);
        }
    }

    Ok(())
}

async fn clear(cache: &DictionaryCache<Arc<FileDictionaryStore>>, force: bool) -> Result<()> {
    if !force {
        print!("Remove every stored keyword? [y/N] ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    cache.store().clear()?;
    cache.invalidate();
    println!("✓ Dictionary cleared");

    Ok(())
}
