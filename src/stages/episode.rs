use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::ScrapeError;
use crate::io::html::{Element, find_element};
use crate::models::{DialogueLine, Episode, EpisodeHeading};
use crate::stages::parse::TranscriptParser;
use crate::stages::segment::segment;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock time in the dataset's timestamp format
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Segment a transcript content block and run it through a fresh parser state
pub fn parse_transcript(parser: &TranscriptParser, content_block: &str) -> Vec<DialogueLine> {
    let lines = segment(content_block);
    debug!("Segmented {} lines", lines.len());
    parser.parse_lines(lines)
}

/// The parts of an episode page the parser needs
#[derive(Debug)]
pub struct EpisodePage<'a> {
    pub title: String,
    pub heading: Option<EpisodeHeading>,
    /// Inner HTML of the transcript block
    pub content: &'a str,
}

/// Locate title, heading and transcript block in an episode page
pub fn read_episode_page<'a>(
    html: &'a str,
    url: &str,
    show_name: &str,
) -> Result<EpisodePage<'a>, ScrapeError> {
    let heading_block = find_element(html, "h3", Some("first"));

    let heading_text = heading_block
        .as_ref()
        .and_then(|h3| find_element(h3.inner, "a", None))
        .map(|a| a.text());
    let heading = heading_text
        .as_deref()
        .and_then(|text| EpisodeHeading::parse(text, show_name));
    if heading.is_none() {
        warn!("Could not read season/episode from heading {:?} at {}", heading_text, url);
    }

    let content = find_element(html, "div", Some("content"))
        .or_else(|| find_element(html, "div", Some("postbody")))
        .ok_or_else(|| ScrapeError::MissingContent(url.to_string()))?;

    let title = find_element(html, "h2", Some("title"))
        .or(heading_block)
        .map(|e: Element| e.text())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url_stem(url));

    Ok(EpisodePage {
        title,
        heading,
        content: content.inner,
    })
}

/// Build an [`Episode`] from a downloaded or saved page
pub fn parse_episode_page(
    html: &str,
    url: &str,
    parser: &TranscriptParser,
    show_name: &str,
) -> Result<Episode, ScrapeError> {
    let page = read_episode_page(html, url, show_name)?;
    let dialogue = parse_transcript(parser, page.content);

    let episode = Episode::new(page.title, url, dialogue, timestamp()).with_heading(page.heading);
    info!(
        "Parsed '{}': {} lines, {} speakers, {} with context",
        episode.title,
        episode.total_lines(),
        episode.unique_speakers(),
        episode.context_line_count()
    );
    Ok(episode)
}

/// Last path segment without its extension
fn url_stem(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

/// Parse saved episode pages concurrently, one blocking task per page.
///
/// A page that cannot be read or parsed is logged and left out; the
/// remaining episodes come back in input order.
pub async fn parse_pages(
    paths: Vec<PathBuf>,
    parser: Arc<TranscriptParser>,
    show_name: &str,
) -> Result<Vec<Episode>> {
    let mut tasks = JoinSet::new();

    for (index, path) in paths.into_iter().enumerate() {
        let parser = Arc::clone(&parser);
        let show_name = show_name.to_string();
        tasks.spawn_blocking(move || {
            let result = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read file: {:?}", path))
                .and_then(|html| {
                    let url = path.to_string_lossy();
                    parse_episode_page(&html, &url, &parser, &show_name).map_err(anyhow::Error::from)
                });
            (index, path, result)
        });
    }

    let mut episodes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, path, result) = joined.context("Parse task panicked")?;
        match result {
            Ok(episode) => episodes.push((index, episode)),
            Err(e) => error!("Failed to parse {:?}: {:#}", path, e),
        }
    }

    episodes.sort_by_key(|(index, _)| *index);
    Ok(episodes.into_iter().map(|(_, episode)| episode).collect())
}
