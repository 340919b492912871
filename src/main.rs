mod config;
mod models;
mod pipeline;
mod ranking;
mod scraper;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::models::RankedMovie;
use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "imdb-etl", about = "IMDb Top 250 rating adjustment ETL", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the chart, adjust ratings, write the ranked CSV
    Run {
        /// Output file (default: <out_dir>/imdb_top_250_adjusted_<timestamp>.csv)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Re-rank an existing CSV from its raw columns (derived columns recomputed)
    Adjust {
        /// Previously written ranking CSV
        input: PathBuf,

        #[arg(short, long)]
        out: PathBuf,
    },

    /// Extract a single saved title page and print the record as JSON
    Extract {
        /// HTML file fetched from a title page
        file: PathBuf,
    },

    /// Print a stored ranking as a table
    Show {
        input: PathBuf,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "imdb_top250_etl=info,warn",
        1 => "imdb_top250_etl=debug,info",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .compact()
        .with_target(false)
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Run { out } => {
            let _t = utils::Timer::start("Top 250 ETL");
            let stats = Pipeline::new(config).run(out).await?;
            info!(
                "Done: {} titles, {} records, {} errors → {:?}",
                stats.titles_discovered, stats.records_extracted, stats.errors, stats.out_path
            );
        }

        Command::Adjust { input, out } => {
            let rows = storage::read_ranked_csv(&input)
                .with_context(|| format!("Failed to read {:?}", input))?;
            let records: Vec<_> = rows.into_iter().map(RankedMovie::into_record).collect();

            let ranked = ranking::adjust_table(&records)?;
            storage::write_ranked_csv(&out, &ranked)?;
            println!("Re-ranked {} rows into {:?}", ranked.len(), out);
        }

        Command::Extract { file } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let record = scraper::extract::extract_record(&html)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Command::Show { input, limit } => {
            let rows = storage::read_ranked_csv(&input)
                .with_context(|| format!("Failed to read {:?}", input))?;

            println!("──────────────────────────────────────────────────────────────────────");
            println!("  {:>4}  {:<36} {:>8} {:>12} {:>6}", "rank", "name", "adj", "votes", "oscars");
            println!("──────────────────────────────────────────────────────────────────────");
            for row in rows.iter().take(limit) {
                println!(
                    "  {:>4}  {:<36} {:>8.1} {:>12} {:>6}",
                    row.rank,
                    utils::truncate(&row.name, 36),
                    row.adjusted_rating,
                    utils::fmt_number(row.votes),
                    row.oscars,
                );
            }
            println!("──────────────────────────────────────────────────────────────────────");
        }
    }

    Ok(())
}
