use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "veil")]
#[command(about = "Redact sensitive text in Word documents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "VEIL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Anonymize one or more .docx files
    Redact(RedactArgs),

    /// Manage the keyword dictionary
    #[command(subcommand)]
    Dict(DictCommands),
}

#[derive(Args)]
pub struct RedactArgs {
    /// Documents to process (at most 20)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Comma-separated keywords for this run (e.g. "Acme Corp, John Doe")
    #[arg(short, long)]
    pub keywords: Option<String>,

    /// Ignore the stored dictionary for this run
    #[arg(long)]
    pub no_dictionary: bool,

    /// Replace currency amounts
    #[arg(long)]
    pub financial: bool,

    /// Replace emails, phone numbers, SSNs, cards, IPs and dates
    #[arg(long)]
    pub pii: bool,

    /// Keyword placeholder template; must contain {n}
    #[arg(long)]
    pub template: Option<String>,

    /// Directory for anonymized files
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Write every output into this ZIP archive instead
    #[arg(long)]
    pub zip: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum DictCommands {
    /// List stored keywords and their placeholders
    List,

    /// Add comma-separated keywords
    Add {
        /// Keywords, e.g. "Acme Corp, John Doe"
        keywords: String,
    },

    /// Remove every keyword and restart numbering
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Print the dictionary file location
    Path,
}
