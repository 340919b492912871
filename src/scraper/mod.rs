pub mod extract;
pub mod http_client;

use crate::config::ScraperConfig;
use crate::models::MovieRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use url::Url;

use self::http_client::HttpClient;

static NEXT_PAGE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.flat-button.lister-page-next.next-page").unwrap());

static ANY_LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Hard stop for chart pagination, in case the next-page link ever loops.
const MAX_CHART_PAGES: u32 = 25;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable movie source abstraction.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn discover_title_urls(&self) -> Result<Vec<String>>;
    async fn fetch_title(&self, url: &str) -> Result<MovieRecord>;
}

// ── IMDb chart scraper ────────────────────────────────────────────────────────

pub struct ImdbScraper {
    client: HttpClient,
    base: Url,
    chart_path: String,
}

impl ImdbScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid base URL {:?}", config.base_url))?;

        Ok(Self {
            client: HttpClient::new(config)?,
            base,
            chart_path: config.chart_path.clone(),
        })
    }

    /// Start of the chart listing. e.g. https://www.imdb.com/chart/top/
    fn chart_url(&self) -> Result<Url> {
        self.base
            .join(&self.chart_path)
            .with_context(|| format!("Invalid chart path {:?}", self.chart_path))
    }

    /// Walk the chart listing page by page, collecting each page's URL.
    async fn collect_chart_pages(&self) -> Result<Vec<(String, String)>> {
        let mut pages = Vec::new();
        let mut next = Some(self.chart_url()?.to_string());

        while let Some(url) = next {
            info!("Fetching chart page {} ({})", pages.len() + 1, url);

            let html = self
                .client
                .get_text(&url)
                .await
                .with_context(|| format!("Failed to fetch chart page {}", url))?;

            next = next_page_url(&html, &self.base);
            if next.is_none() {
                debug!("No next-page link — stopping pagination");
            }
            pages.push((url, html));

            if pages.len() as u32 >= MAX_CHART_PAGES {
                warn!("Reached chart page limit ({}), stopping", MAX_CHART_PAGES);
                break;
            }
        }

        Ok(pages)
    }
}

#[async_trait]
impl MovieSource for ImdbScraper {
    async fn discover_title_urls(&self) -> Result<Vec<String>> {
        let pages = self.collect_chart_pages().await?;

        let mut urls = BTreeSet::new();
        for (url, html) in &pages {
            let found = collect_title_urls(html, &self.base);
            debug!("{}: {} title links", url, found.len());
            urls.extend(found);
        }

        info!("Total titles discovered: {}", urls.len());
        Ok(urls.into_iter().collect())
    }

    async fn fetch_title(&self, url: &str) -> Result<MovieRecord> {
        let html = self
            .client
            .get_text(url)
            .await
            .with_context(|| format!("Failed to fetch title page {}", url))?;

        let record = extract::extract_record(&html)
            .with_context(|| format!("Extraction failed for {}", url))?;

        debug!("{}: {:?}", url, record);
        Ok(record)
    }
}

// ── Pure page parsing ─────────────────────────────────────────────────────────

/// Absolute URL of the next listing page, if the page links one.
pub fn next_page_url(html: &str, base: &Url) -> Option<String> {
    let doc = Html::parse_document(html);
    let href = doc
        .select(&NEXT_PAGE_SEL)
        .next()
        .and_then(|a| a.value().attr("href"))?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Every title detail link on a listing page, deduplicated and resolved
/// against the site base.
pub fn collect_title_urls(html: &str, base: &Url) -> BTreeSet<String> {
    let doc = Html::parse_document(html);
    doc.select(&ANY_LINK_SEL)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("/title/tt"))
        .filter_map(|href| base.join(href).ok())
        .map(|u| u.to_string())
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.imdb.com").unwrap()
    }

    #[test]
    fn test_next_page_url() {
        let html = r#"<html><body>
            <a class="flat-button lister-page-next next-page"
               href="/search/title/?groups=top_250&start=51">Next</a>
        </body></html>"#;

        assert_eq!(
            next_page_url(html, &base()).as_deref(),
            Some("https://www.imdb.com/search/title/?groups=top_250&start=51")
        );
    }

    #[test]
    fn test_next_page_url_absent_on_last_page() {
        let html = r#"<html><body><a href="/title/tt0000001/">A title</a></body></html>"#;
        assert_eq!(next_page_url(html, &base()), None);
    }

    #[test]
    fn test_collect_title_urls_filters_and_dedupes() {
        let html = r#"<html><body>
            <a href="/title/tt0111161/">Movie A</a>
            <a href="/title/tt0111161/">Movie A again</a>
            <a href="/title/tt0068646/">Movie B</a>
            <a href="/chart/top/">Chart</a>
            <a href="/name/nm0000122/">A person</a>
        </body></html>"#;

        let urls = collect_title_urls(html, &base());
        assert_eq!(
            urls.into_iter().collect::<Vec<_>>(),
            vec![
                "https://www.imdb.com/title/tt0068646/",
                "https://www.imdb.com/title/tt0111161/",
            ]
        );
    }
}
