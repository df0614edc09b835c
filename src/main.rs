// src/main.rs
use anyhow::Result;
use clap::{Parser, Subcommand};
use nemdata::{cache::inventory::cached_periods, Catalog, Config, Downloader};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "nemdata", version, about = "Download and cache NEM MMSDM tables")]
struct Args {
    /// YAML catalog to use instead of the built-in table list
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download a table for every month between two dates
    Download {
        /// First month, e.g. 2020-01 or 2020-01-15
        #[arg(short, long)]
        start: String,
        /// Last month (inclusive)
        #[arg(short, long)]
        end: String,
        #[arg(short, long)]
        table: String,
        /// Cache root (default: $NEMDATA_HOME or ~/nem-data/data)
        #[arg(long)]
        base_directory: Option<PathBuf>,
        /// Fetch and normalize but do not save the clean artifacts
        #[arg(long)]
        dry_run: bool,
    },
    /// List the tables in the catalog as JSON
    Tables,
    /// List the months of a table already in the cache
    Cached {
        #[arg(short, long)]
        table: String,
        #[arg(long)]
        base_directory: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_yaml_path(path)?,
        None => Catalog::builtin(),
    };

    match args.command {
        Command::Download {
            start,
            end,
            table,
            base_directory,
            dry_run,
        } => {
            let config = Config::resolve(base_directory.as_deref());
            let downloader = Downloader::over_http(catalog, config)?;
            let report = downloader.download(&start, &end, &table, None, dry_run)?;
            for p in &report.periods {
                info!(period = %p.period, outcome = ?p.outcome, rows = p.rows, "period");
            }
            println!(
                "{}: {} rows from {} periods",
                table,
                report.data.num_rows(),
                report.periods.len()
            );
        }
        Command::Tables => {
            println!("{}", serde_json::to_string_pretty(catalog.tables())?);
        }
        Command::Cached {
            table,
            base_directory,
        } => {
            let name = &catalog.find(&table)?.name;
            let config = Config::resolve(base_directory.as_deref());
            for period in cached_periods(&config.base_directory, name)? {
                println!("{period}");
            }
        }
    }
    Ok(())
}
