use anyhow::{bail, Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{generate, Shell};
use docchk::analysis::{AnalysisService, Document, IndexRegistry};
use docchk::cli::output::{self, OutputFormat};
use docchk::config::{Config, Overrides};
use docchk::dict;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "docchk")]
#[command(version, about = "Spelling and grammar analysis for documents", long_about = None)]
struct Cli {
    /// Files or directories to check
    #[arg(value_name = "PATHS")]
    paths: Vec<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Exit with code 0 even if issues are found
    #[arg(long)]
    no_fail: bool,

    /// Language tag (e.g., en-US, en-GB)
    #[arg(short, long, env = "LANGUAGE")]
    language: Option<String>,

    /// JSON dictionary file (array of words or object of word frequencies)
    #[arg(short, long, env = "DICTIONARY_PATH")]
    dictionary: Option<PathBuf>,

    /// Target chunk size in bytes
    #[arg(long, env = "CHUNK_SIZE")]
    chunk_size: Option<usize>,

    /// Bytes of context repeated between neighbouring chunks
    #[arg(long, env = "CHUNK_OVERLAP")]
    chunk_overlap: Option<usize>,

    /// Maximum edit distance for spelling suggestions
    #[arg(long)]
    max_edit_distance: Option<usize>,

    /// Maximum suggestions per misspelling
    #[arg(long)]
    max_suggestions: Option<usize>,

    /// Skip the external grammar engine
    #[arg(long, env = "DISABLE_GRAMMAR")]
    no_grammar: bool,

    /// LanguageTool server URL (e.g., http://localhost:8081)
    #[arg(long, env = "LANGUAGE_TOOL_URL")]
    language_tool_url: Option<String>,

    /// Documents analyzed in parallel (0 = one per core)
    #[arg(long, env = "PROCESS_WORKERS")]
    document_workers: Option<usize>,

    /// Chunk workers per document (0 = derived from core count)
    #[arg(long, env = "THREAD_WORKERS")]
    chunk_workers: Option<usize>,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,

    /// Include the token list in JSON output
    #[arg(long)]
    tokens: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Dictionary management
    Dict {
        #[command(subcommand)]
        action: DictCommands,
    },
}

#[derive(Parser, Debug)]
enum DictCommands {
    /// List installed dictionaries
    List,
    /// Download a dictionary
    Download {
        /// Language tag (e.g., en-US, en-GB)
        language: String,
    },
    /// Show dictionary info
    Info {
        /// Language tag
        language: String,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            language: self.language.clone(),
            dictionary_path: self.dictionary.clone(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            max_edit_distance: self.max_edit_distance,
            max_suggestions: self.max_suggestions,
            disable_grammar: self.no_grammar,
            language_tool_url: self.language_tool_url.clone(),
            document_workers: self.document_workers,
            chunk_workers: self.chunk_workers,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "warn,docchk=info",
        _ => "info,docchk=debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "docchk", &mut io::stdout());
        return Ok(());
    }

    if let Some(command) = cli.command.take() {
        return handle_command(command);
    }

    if cli.paths.is_empty() {
        bail!("No files specified. Use --help for usage information.");
    }

    let config = Config::load(cli.overrides())?;
    let documents = collect_documents(&cli.paths)?;
    if documents.is_empty() {
        bail!("No readable text files found.");
    }

    let registry = IndexRegistry::new();
    let service = AnalysisService::new(&config, &registry)?;
    info!(documents = documents.len(), "Analyzing");
    let results = service.analyze(&documents);

    match cli.format {
        OutputFormat::Text => {
            for result in &results {
                output::print_text_report(result);
            }
            output::print_check_summary(&results);
        }
        OutputFormat::Json => {
            println!("{}", output::render_json(&results, cli.tokens)?);
        }
    }

    let failed = results.iter().any(|r| !r.is_ok());
    if (output::total_issues(&results) > 0 || failed) && !cli.no_fail {
        std::process::exit(1);
    }

    Ok(())
}

/// One document per file; directories are walked recursively, skipping
/// hidden entries. Files that are not UTF-8 text are skipped with a warning.
fn collect_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut documents = Vec::new();

    for root in paths {
        if !root.exists() {
            eprintln!("Error: File not found: {}", root.display());
            continue;
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            match String::from_utf8(bytes) {
                Ok(content) => documents.push(Document::new(path.display().to_string(), content)),
                Err(_) => warn!(path = %path.display(), "Skipping non-UTF-8 file"),
            }
        }
    }

    Ok(documents)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Dict { action } => match action {
            DictCommands::List => {
                dict::manager::list_dictionaries()?;
            }
            DictCommands::Download { language } => {
                dict::manager::download_dictionary(&language)?;
            }
            DictCommands::Info { language } => {
                dict::manager::show_info(&language)?;
            }
        },
    }
    Ok(())
}
