pub mod commands;
pub mod wiring;

use std::path::PathBuf;
use std::process::ExitCode;

use atelier_core::config::{AppConfig, LoadOptions, LogFormat};
use clap::{Parser, Subcommand};
use tracing::Level;

use commands::{filter::FilterArgs, look::LookArgs, recommend::RecommendArgs};

#[derive(Debug, Parser)]
#[command(
    name = "atelier",
    about = "Menswear filtering and recommendation CLI",
    long_about = "Filter and score a menswear catalog, request recommendations, assemble \
                  complete looks, and maintain the recommendation cache.",
    after_help = concat!(
        "Examples:\n",
        "  atelier filter --catalog catalog.json --category suits --color navy\n",
        "  atelier recommend similar-products --catalog catalog.json --product-id s-navy\n",
        "  atelier look --catalog catalog.json --product-id s-navy\n",
        "  atelier cache-prune",
    )
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Path to atelier.toml (defaults to ./atelier.toml or ./config/atelier.toml)"
    )]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Filter and score a catalog file, with suggestions, alternatives and outfits"
    )]
    Filter(FilterArgs),
    #[command(about = "Run one recommendation strategy against a catalog file or the commerce API")]
    Recommend(RecommendArgs),
    #[command(about = "Assemble a complete look around an anchor product")]
    Look(LookArgs),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(
        about = "Apply pending cache database migrations and return structured status output"
    )]
    Migrate,
    #[command(about = "Evict expired entries from the durable recommendation cache")]
    CachePrune {
        #[arg(long, help = "Remove every durable entry, expired or not")]
        all: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    if let Ok(config) =
        AppConfig::load(LoadOptions { config_path: cli.config.clone(), ..LoadOptions::default() })
    {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Filter(args) => commands::filter::run(config_path, &args),
        Command::Recommend(args) => commands::recommend::run(config_path, &args),
        Command::Look(args) => commands::look::run(&args),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(config_path) }
        }
        Command::Migrate => commands::migrate::run(config_path),
        Command::CachePrune { all } => commands::cache_prune::run(config_path, all),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays a single JSON payload.
fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
