use std::collections::HashSet;
use std::time::Duration;

use rand::Rng;
use reqwest::Url;
use tracing::{debug, error, info, warn};

use crate::error::ScrapeError;
use crate::io::fetch::PageFetcher;
use crate::io::html::{TokenKind, find_all_elements, find_element, find_element_from, tokenize};
use crate::models::{Dataset, Episode};
use crate::stages::episode::{parse_episode_page, timestamp};
use crate::stages::parse::TranscriptParser;

/// Configuration for a forum scrape
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Forum index listing the episode topics
    pub base_url: String,
    pub show_name: String,
    /// Pause between episode requests
    pub delay_ms: u64,
    /// Upper bound of the random extra pause added to `delay_ms`
    pub jitter_ms: u64,
    /// Index pages to follow through `rel="next"` links
    pub max_pages: usize,
    /// Stop after this many episodes
    pub limit: Option<usize>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://transcripts.foreverdreaming.org/viewforum.php?f=187".to_string(),
            show_name: "Dexter".to_string(),
            delay_ms: 2500,
            jitter_ms: 500,
            max_pages: 1,
            limit: None,
        }
    }
}

impl ScrapeConfig {
    /// Pause before the next episode request: the fixed delay plus up to
    /// `jitter_ms` of random slack
    pub fn request_pause(&self) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.delay_ms.saturating_add(jitter))
    }
}

/// Episodes scraped in a batch, plus the ones that failed
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub episodes: Vec<Episode>,
    pub failures: Vec<(String, ScrapeError)>,
}

impl ScrapeOutcome {
    /// Assemble the dataset document for the successfully parsed episodes
    pub fn into_dataset(self, source: &str) -> Dataset {
        Dataset::from_episodes(self.episodes, source, timestamp())
    }
}

/// Resolve a link against the page it was found on
pub fn resolve_link(page_url: &str, href: &str) -> Result<String, ScrapeError> {
    let base = Url::parse(page_url).map_err(|e| ScrapeError::InvalidUrl {
        url: page_url.to_string(),
        message: e.to_string(),
    })?;
    let joined = base.join(href).map_err(|e| ScrapeError::InvalidUrl {
        url: href.to_string(),
        message: e.to_string(),
    })?;
    Ok(joined.to_string())
}

/// Episode topic links listed under the "Topics" heading of a forum index
pub fn topic_links(html: &str, page_url: &str) -> Vec<String> {
    let Some(heading) = find_all_elements(html, "h2", None).into_iter().find(|h2| {
        find_element(h2.inner, "a", Some("forum-name")).is_some_and(|a| a.text() == "Topics")
    }) else {
        error!("Could not find \"Topics\" heading at {}", page_url);
        return Vec::new();
    };

    let Some(list) = find_element_from(html, heading.end, "ul", Some("topics")) else {
        error!("Could not find ul.topics after the \"Topics\" heading at {}", page_url);
        return Vec::new();
    };

    let mut links = Vec::new();
    for anchor in find_all_elements(list.inner, "a", Some("topictitle")) {
        let Some(href) = anchor.tag.attr("href") else {
            continue;
        };
        match resolve_link(page_url, href) {
            Ok(link) => links.push(link),
            Err(e) => warn!("Skipping topic link: {}", e),
        }
    }
    if links.is_empty() {
        warn!("No episode links found within topics list at {}", page_url);
    }
    links
}

/// Target of the first `rel="next"` link or anchor on a page
pub fn next_page_link(html: &str, page_url: &str) -> Option<String> {
    tokenize(html).into_iter().find_map(|token| match token.kind {
        TokenKind::Start(tag)
            if matches!(tag.name.as_str(), "a" | "link")
                && tag
                    .attr("rel")
                    .is_some_and(|rel| rel.split_whitespace().any(|r| r == "next")) =>
        {
            let href = tag.attr("href")?;
            resolve_link(page_url, href).ok()
        }
        _ => None,
    })
}

/// Walks a forum index and turns each listed topic into an [`Episode`]
pub struct Scraper<F> {
    fetcher: F,
    parser: TranscriptParser,
    config: ScrapeConfig,
}

impl<F: PageFetcher> Scraper<F> {
    pub fn new(fetcher: F, parser: TranscriptParser, config: ScrapeConfig) -> Self {
        Self {
            fetcher,
            parser,
            config,
        }
    }

    /// Collect episode links across the index pages, deduplicated in order
    pub async fn episode_links(&self) -> Result<Vec<String>, ScrapeError> {
        let mut links = Vec::new();
        let mut seen = HashSet::new();
        let mut visited = HashSet::new();
        let mut page_url = Some(self.config.base_url.clone());
        let mut pages = 0;

        while let Some(url) = page_url.take() {
            if pages >= self.config.max_pages || !visited.insert(url.clone()) {
                break;
            }

            let html = match self.fetcher.fetch(&url).await {
                Ok(html) => html,
                // The first index page is required; later ones end pagination
                Err(e) if pages == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("Stopping pagination at {}: {}", url, e);
                    break;
                }
            };
            pages += 1;

            for link in topic_links(&html, &url) {
                if seen.insert(link.clone()) {
                    links.push(link);
                }
            }
            page_url = next_page_link(&html, &url);
            debug!("Index page {} done, next: {:?}", pages, page_url);
        }

        if let Some(limit) = self.config.limit {
            links.truncate(limit);
        }
        info!("Found {} episode links across {} index page(s)", links.len(), pages);
        Ok(links)
    }

    pub async fn scrape_episode(&self, url: &str) -> Result<Episode, ScrapeError> {
        let html = self.fetcher.fetch(url).await?;
        parse_episode_page(&html, url, &self.parser, &self.config.show_name)
    }

    /// Scrape every listed episode. A failed episode is recorded and skipped.
    pub async fn scrape_all(&self) -> Result<ScrapeOutcome, ScrapeError> {
        let links = self.episode_links().await?;
        let mut outcome = ScrapeOutcome::default();
        if links.is_empty() {
            error!("No episodes found to scrape");
            return Ok(outcome);
        }

        let total = links.len();
        info!("Beginning to scrape {} episodes", total);

        for (idx, link) in links.into_iter().enumerate() {
            if idx > 0 {
                let pause = self.config.request_pause();
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }
            info!("Scraping episode {}/{}: {}", idx + 1, total, link);

            match self.scrape_episode(&link).await {
                Ok(episode) => {
                    info!(
                        "Successfully scraped episode: {} ({} lines)",
                        episode.title,
                        episode.total_lines()
                    );
                    outcome.episodes.push(episode);
                }
                Err(e) => {
                    error!("Error scraping {}: {}", link, e);
                    outcome.failures.push((link, e));
                }
            }
        }

        info!(
            "Scraped {} episodes, {} failed",
            outcome.episodes.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }
}
