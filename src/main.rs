//! scopebank CLI entry point.
//!
//! Parses the command line, assembles the immutable [`Config`], initializes
//! tracing, connects the pool, and dispatches to the matching command. Every
//! failure maps to a stable exit code via [`AppError::exit_code`].

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use scopebank::commands;
use scopebank::config::Config;
use scopebank::error::AppError;
use scopebank::exporter::ExportFormat;
use scopebank::filter::DomainFilter;
use scopebank::store::PgDomainStore;

#[derive(Parser)]
#[command(name = "scopebank")]
#[command(about = "Manage deduplicated recon domain scope lists in PostgreSQL")]
#[command(version)]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Suppress operational logging; command results are still printed
    #[arg(short, long, global = true)]
    silent: bool,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "silent")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add domains from a file or stdin
    Add {
        /// File containing one domain per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Skip domain-format validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Print stored domains
    Print {
        /// Only domains containing this substring
        #[arg(long = "match", value_name = "SUBSTRING", conflicts_with = "regex")]
        contains: Option<String>,

        /// Only domains matching this regex
        #[arg(long)]
        regex: Option<String>,

        /// Lexicographic order instead of insertion order
        #[arg(long)]
        sort: bool,
    },

    /// Count stored domains
    Count {
        /// Only domains containing this substring
        #[arg(long = "match", value_name = "SUBSTRING", conflicts_with = "regex")]
        contains: Option<String>,

        /// Only domains matching this regex
        #[arg(long)]
        regex: Option<String>,
    },

    /// Export stored domains to a file
    Export {
        /// Output file
        #[arg(short, long)]
        file: PathBuf,

        /// Export format
        #[arg(long, value_enum, default_value = "text")]
        format: ExportFormat,

        /// Only domains containing this substring
        #[arg(long = "match", value_name = "SUBSTRING", conflicts_with = "regex")]
        contains: Option<String>,

        /// Only domains matching this regex
        #[arg(long)]
        regex: Option<String>,

        /// Lexicographic order instead of insertion order
        #[arg(long)]
        sort: bool,
    },

    /// Remove domains by name, file list, stdin, or filter
    Remove {
        /// Single domain to remove
        #[arg(short, long, conflicts_with_all = ["file", "contains", "regex"])]
        domain: Option<String>,

        /// File containing domains to remove
        #[arg(short, long, conflicts_with_all = ["contains", "regex"])]
        file: Option<PathBuf>,

        /// Remove domains containing this substring
        #[arg(long = "match", value_name = "SUBSTRING", conflicts_with = "regex")]
        contains: Option<String>,

        /// Remove domains matching this regex
        #[arg(long)]
        regex: Option<String>,
    },

    /// Delete every stored domain
    DeleteAll {
        /// Skip the confirmation prompt
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::load(cli.config.as_deref())
        .map_err(|e| AppError::Config(format!("{e:#}")))?;

    init_tracing(&config, cli.silent, cli.verbose);

    // Compile the filter up front so a bad pattern fails before any store
    // access happens.
    let filter = match &cli.command {
        Commands::Print {
            contains, regex, ..
        }
        | Commands::Count { contains, regex }
        | Commands::Export {
            contains, regex, ..
        }
        | Commands::Remove {
            contains, regex, ..
        } => DomainFilter::from_options(contains.clone(), regex.clone())?,
        _ => None,
    };

    tracing::debug!(target = %config.masked_database_url(), "connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database_url())
        .await
        .map_err(AppError::from)?;

    let store = PgDomainStore::new(pool);
    store.init_schema().await?;

    match cli.command {
        Commands::Add { file, no_validate } => {
            commands::add::run(&store, file, !no_validate).await
        }
        Commands::Print { sort, .. } => commands::print::run(&store, filter, sort).await,
        Commands::Count { .. } => commands::count::run(&store, filter).await,
        Commands::Export {
            file, format, sort, ..
        } => commands::export::run(&store, file, format, filter, sort).await,
        Commands::Remove { domain, file, .. } => {
            commands::remove::run(&store, domain, file, filter).await
        }
        Commands::DeleteAll { confirm } => commands::delete_all::run(&store, confirm).await,
    }
}

/// Initializes the tracing subscriber on stderr so stdout stays reserved for
/// command output. `--silent` turns logging off entirely, `--verbose` forces
/// debug; otherwise the configured level (or `RUST_LOG`) applies.
fn init_tracing(config: &Config, silent: bool, verbose: bool) {
    let filter = if silent {
        EnvFilter::new("off")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.log.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
