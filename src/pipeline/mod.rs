//! Pipeline orchestrator: ties scraper → ranking → CSV together.
//!
//! Collection and ranking are strictly two phases: the vote baseline depends
//! on the complete table, so no ranking happens until every title page has
//! been fetched and extracted. A page that fails to fetch or extract is
//! logged and counted, and its siblings proceed.

use crate::config::AppConfig;
use crate::models::MovieRecord;
use crate::ranking;
use crate::scraper::{ImdbScraper, MovieSource};
use crate::storage;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, out: Option<PathBuf>) -> Result<PipelineStats> {
        let scraper = Arc::new(
            ImdbScraper::new(&self.config.scraper).context("Failed to build scraper")?,
        );

        // ── 1. Discover title pages from the chart listing ────────────────────
        info!("=== Step 1: Discovering title pages ===");
        let urls = scraper
            .discover_title_urls()
            .await
            .context("Title discovery failed")?;

        // ── 2. Fetch and extract every title page ─────────────────────────────
        info!("=== Step 2: Extracting {} title pages ===", urls.len());

        let sem = Arc::new(Semaphore::new(self.config.pipeline.concurrency));
        let mut handles = Vec::new();

        for url in &urls {
            let task_url = url.clone();
            let scraper = Arc::clone(&scraper);
            let sem = Arc::clone(&sem);

            let handle = tokio::spawn(async move {
                let _permit = sem.acquire().await?;
                let record = scraper
                    .fetch_title(&task_url)
                    .await
                    .with_context(|| format!("fetch_title({})", task_url))?;
                Ok::<MovieRecord, anyhow::Error>(record)
            });

            handles.push((url.clone(), handle));
        }

        let mut records = Vec::new();
        let mut errors = 0usize;

        for (url, handle) in handles {
            match handle.await {
                Ok(Ok(record)) => records.push(record),
                Ok(Err(e)) => {
                    warn!("{}: {:#}", url, e);
                    errors += 1;
                }
                Err(e) => {
                    error!("Task panic for {}: {}", url, e);
                    errors += 1;
                }
            }
        }

        // ── 3. Adjust and rank the complete table ─────────────────────────────
        info!("=== Step 3: Adjusting {} records ===", records.len());
        let ranked = ranking::adjust_table(&records)?;

        let out_path = match out {
            Some(path) => path,
            None => self.config.output.out_dir.join(format!(
                "imdb_top_250_adjusted_{}.csv",
                Utc::now().format("%Y%m%d_%H%M%S")
            )),
        };
        storage::write_ranked_csv(&out_path, &ranked)?;

        let stats = PipelineStats {
            titles_discovered: urls.len(),
            records_extracted: records.len(),
            errors,
            out_path,
        };

        info!(
            "=== Done: {} titles | {} records | {} errors | {:?} ===",
            stats.titles_discovered, stats.records_extracted, stats.errors, stats.out_path,
        );

        Ok(stats)
    }
}

#[derive(Debug)]
pub struct PipelineStats {
    pub titles_discovered: usize,
    pub records_extracted: usize,
    pub errors: usize,
    pub out_path: PathBuf,
}
