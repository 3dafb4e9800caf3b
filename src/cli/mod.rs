//! CLI parser and command dispatch.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Settings;
use crate::models::AnalysisKind;

#[derive(Parser)]
#[command(name = "docsift")]
#[command(about = "Document text extraction and analysis pipeline")]
#[command(version)]
pub struct Cli {
    /// Data directory (overrides config file).
    #[arg(long, short = 'd', global = true)]
    data: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Extraction path selector for the process command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AnalysisTypeArg {
    /// Read embedded text (pdftotext); images fall back to OCR
    #[default]
    TextExtraction,
    /// Force OCR for all content
    Ocr,
}

impl From<AnalysisTypeArg> for AnalysisKind {
    fn from(arg: AnalysisTypeArg) -> Self {
        match arg {
            AnalysisTypeArg::TextExtraction => AnalysisKind::TextExtraction,
            AnalysisTypeArg::Ocr => AnalysisKind::Ocr,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Process a document through the pipeline
    Process {
        /// Path to the document (PDF or image)
        file: PathBuf,
        /// Extraction path to use
        #[arg(short = 't', long, value_enum, default_value_t = AnalysisTypeArg::TextExtraction)]
        analysis_type: AnalysisTypeArg,
        /// Run the text analyzers on the extracted text
        #[arg(short, long)]
        analyze: bool,
        /// Declared MIME type (default: guessed from the file extension)
        #[arg(long)]
        mime_type: Option<String>,
    },

    /// Start the API server
    Serve {
        /// Host address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value = "8085")]
        port: u16,
    },

    /// Remove expired cache entries
    Sweep,

    /// Show job counts and per-stage performance statistics
    Stats,

    /// Check availability of external extraction tools
    Tools,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref(), cli.data.as_deref())?;

    match cli.command {
        Commands::Init => commands::init::run(&settings).await,
        Commands::Process {
            file,
            analysis_type,
            analyze,
            mime_type,
        } => commands::process::run(&settings, &file, analysis_type.into(), analyze, mime_type).await,
        Commands::Serve { host, port } => crate::server::serve(&settings, &host, port).await,
        Commands::Sweep => commands::sweep::run(&settings).await,
        Commands::Stats => commands::stats::run(&settings).await,
        Commands::Tools => commands::tools::run(),
    }
}
