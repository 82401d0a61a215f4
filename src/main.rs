use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docfiler::cli::Output;
use docfiler::cli::commands::classify::ClassifyOptions;
use docfiler::config::{
    ExtractionStrategy, NamingStyle, OutputFormat, StandardsMode, ValidationMode,
};

#[derive(Parser)]
#[command(name = "docfiler")]
#[command(
    version,
    about = "Suggest archival paths and filenames for documents using a controlled taxonomy"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Explicit config file, merged over global and project config
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify documents and print one result per document
    Classify {
        #[arg(help = "Files or directories to classify")]
        paths: Vec<PathBuf>,
        #[arg(long, help = "Read newline-separated paths from stdin")]
        batch: bool,
        #[arg(long, short, help = "Taxonomy name or YAML file")]
        taxonomy: Option<String>,
        #[arg(long, help = "Taxonomy validation: strict, flexible")]
        mode: Option<ValidationMode>,
        #[arg(long, help = "Fail documents with unknown taxonomy values")]
        strict: bool,
        #[arg(long, help = "Flag unknown taxonomy values as conflicts instead of failing")]
        dry_validation: bool,
        #[arg(long, help = "Naming style: descriptive, compact")]
        style: Option<NamingStyle>,
        #[arg(long, help = "Append the quarter to descriptive filenames")]
        quarterly: bool,
        #[arg(long, help = "Extraction: adaptive, full, first_pages, char_limit")]
        strategy: Option<ExtractionStrategy>,
        #[arg(long, short = 'j', help = "Documents processed in parallel")]
        concurrency: Option<usize>,
        #[arg(long, short, help = "Output format: json, csv, tsv")]
        format: Option<OutputFormat>,
        #[arg(long, help = "Standardization: rules, ai")]
        standards: Option<StandardsMode>,
        #[arg(long, help = "Skip the result cache")]
        no_cache: bool,
        #[arg(long, help = "LLM provider (openai, ollama)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
    },

    /// Inspect taxonomies
    Taxonomy {
        #[command(subcommand)]
        action: TaxonomyAction,
    },

    /// Manage the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum TaxonomyAction {
    /// List available taxonomies
    List,
    /// Print a taxonomy tree
    Show {
        #[arg(help = "Taxonomy name or YAML file (default: configured)")]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cached result count
    Stats,
    /// Remove all cached results
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mdocfiler encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    // stdout carries result records only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let explicit = cli.config.as_deref();

    match cli.command {
        Commands::Classify {
            paths,
            batch,
            taxonomy,
            mode,
            strict,
            dry_validation,
            style,
            quarterly,
            strategy,
            concurrency,
            format,
            standards,
            no_cache,
            provider,
            model,
        } => {
            let summary = docfiler::cli::commands::classify::run(
                explicit,
                ClassifyOptions {
                    paths,
                    batch,
                    taxonomy,
                    mode,
                    strict,
                    dry_validation,
                    style,
                    quarterly,
                    strategy,
                    concurrency,
                    format,
                    standards,
                    no_cache,
                    provider,
                    model,
                },
            )?;
            if !cli.quiet {
                Output::new().summary(&summary);
            }
        }
        Commands::Taxonomy { action } => match action {
            TaxonomyAction::List => docfiler::cli::commands::taxonomy::list()?,
            TaxonomyAction::Show { name } => {
                docfiler::cli::commands::taxonomy::show(explicit, name.as_deref())?;
            }
        },
        Commands::Cache { action } => match action {
            CacheAction::Stats => docfiler::cli::commands::cache::stats()?,
            CacheAction::Clear => docfiler::cli::commands::cache::clear()?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                docfiler::cli::commands::config::show(explicit, &format)?;
            }
            ConfigAction::Path => docfiler::cli::commands::config::path()?,
            ConfigAction::Init { global, force } => {
                docfiler::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
