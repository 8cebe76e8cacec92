use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gendoc::cli::commands;
use gendoc::cli::commands::diff::DiffArgs;
use gendoc::cli::commands::export::ExportArgs;
use gendoc::cli::commands::generate::GenerateArgs;
use gendoc::config::{Config, ConfigLoader};
use gendoc::docs::OutputFormat;
use gendoc::types::Lang;

/// Parse an output format from string
fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    s.parse()
}

/// Parse a label language from string
fn parse_lang(s: &str) -> Result<Lang, String> {
    s.parse()
}

#[derive(Parser)]
#[command(name = "gendoc")]
#[command(
    version,
    about = "Documentation generator with pluggable export backends"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, help = "Load configuration from this file only")]
    config: Option<PathBuf>,

    #[arg(long, value_parser = parse_lang, help = "Label language: de, en (overrides config)")]
    lang: Option<Lang>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate documentation from an input snapshot
    Generate {
        #[arg(long, short, help = "Input JSON file, or - for stdin")]
        input: PathBuf,
        #[arg(
            short = 'f',
            long,
            default_value = "markdown",
            value_parser = parse_output_format,
            help = "Output format: markdown, json"
        )]
        format: OutputFormat,
        #[arg(long, short, help = "Output file (stdout when omitted)")]
        output: Option<PathBuf>,
        #[arg(
            long,
            value_delimiter = ',',
            help = "Code example languages to render, in order"
        )]
        languages: Vec<String>,
    },

    /// Validate an input snapshot
    Validate {
        #[arg(long, short, help = "Input JSON file, or - for stdin")]
        input: PathBuf,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Compare two snapshots and render the changes
    Diff {
        #[arg(long, help = "Old snapshot JSON file")]
        old: PathBuf,
        #[arg(long, help = "New snapshot JSON file")]
        new: PathBuf,
        #[arg(
            short = 'f',
            long,
            default_value = "markdown",
            value_parser = parse_output_format,
            help = "Output format: markdown, json"
        )]
        format: OutputFormat,
        #[arg(long, short, help = "Output file (stdout when omitted)")]
        output: Option<PathBuf>,
    },

    /// Export documentation through a registered backend
    Export {
        #[arg(help = "Exporter name (confluence, markdown, html, pdf, ...)")]
        exporter: String,
        #[arg(long, short, help = "Input JSON snapshot to normalize and export")]
        input: Option<PathBuf>,
        #[arg(long, help = "Raw content file to export as-is")]
        file: Option<PathBuf>,
        #[arg(long, short, help = "Document title")]
        title: Option<String>,
        #[arg(long, help = "Exporter configuration file")]
        exporter_config: Option<PathBuf>,
        #[arg(long, help = "One section/page per category")]
        by_category: bool,
        #[arg(long, value_delimiter = ',', help = "Labels for the exported document")]
        labels: Vec<String>,
        #[arg(long, help = "Validate content and fail closed before exporting")]
        validate: bool,
        #[arg(long, short, help = "Target file for file-producing exporters")]
        output: Option<PathBuf>,
    },

    /// List registered exporters
    Exporters {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
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
        // Extract panic message
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mgendoc encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        eprintln!("\n\x1b[33mPlease report this issue at:\x1b[0m");
        eprintln!("  https://github.com/gendoc/gendoc/issues");
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    // Install panic handler first
    setup_panic_handler();

    // Run the actual CLI
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

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config: Config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(lang) = cli.lang {
        config.lang = lang;
    }

    match cli.command {
        Commands::Generate {
            input,
            format,
            output,
            languages,
        } => {
            commands::generate::run(
                &config,
                GenerateArgs {
                    input,
                    format,
                    output,
                    languages,
                },
            )?;
        }
        Commands::Validate { input, format } => {
            commands::validate::run(&config, &input, &format)?;
        }
        Commands::Diff {
            old,
            new,
            format,
            output,
        } => {
            commands::diff::run(
                &config,
                DiffArgs {
                    old,
                    new,
                    format,
                    output,
                },
            )?;
        }
        Commands::Export {
            exporter,
            input,
            file,
            title,
            exporter_config,
            by_category,
            labels,
            validate,
            output,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::export::run(
                &config,
                ExportArgs {
                    exporter,
                    input,
                    file,
                    title,
                    config_path: exporter_config,
                    by_category,
                    labels,
                    validate,
                    output_file: output,
                },
            ))?;
        }
        Commands::Exporters { format } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::exporters::run(&config, format == "json"))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    commands::config::init_global(force)?;
                } else {
                    commands::config::init_project()?;
                }
            }
        },
    }

    Ok(())
}
