use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::DialogueLine;

/// Show/season/episode details read from an episode page heading
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeHeading {
    pub show_name: String,
    pub season: String,
    pub episode: String,
}

impl EpisodeHeading {
    /// Parse a forum heading such as `"01x03 - Popping Cherry"` or
    /// `"New Blood: 01x03 - Storm of Fuck"`.
    ///
    /// A subtitle before the colon is appended to the show name.
    pub fn parse(heading: &str, show_name: &str) -> Option<Self> {
        let (numbering, _title) = heading.split_once(" - ")?;

        let (show, season_episode) = match numbering.split_once(':') {
            Some((subtitle, rest)) => (format!("{}: {}", show_name, subtitle.trim()), rest),
            None => (show_name.to_string(), numbering),
        };

        let (season, episode) = season_episode.split_once(['x', 'X'])?;
        let season = season.trim();
        let episode = episode.trim();
        let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if !numeric(season) || !numeric(episode) {
            return None;
        }

        Some(Self {
            show_name: show,
            season: season.to_string(),
            episode: episode.to_string(),
        })
    }
}

/// Per-episode metadata persisted alongside the dialogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    pub scraped_at: String,
    pub total_lines: usize,
    pub unique_speakers: usize,
}

/// A fully parsed episode; immutable once built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub title: String,
    pub url: String,
    pub dialogue: Vec<DialogueLine>,
    pub metadata: EpisodeMetadata,
    /// Heading details, used to fill the dataset metadata
    #[serde(skip)]
    pub heading: Option<EpisodeHeading>,
}

impl Episode {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        dialogue: Vec<DialogueLine>,
        scraped_at: impl Into<String>,
    ) -> Self {
        let metadata = EpisodeMetadata {
            scraped_at: scraped_at.into(),
            total_lines: dialogue.len(),
            unique_speakers: unique_speaker_count(&dialogue),
        };
        Self {
            title: title.into(),
            url: url.into(),
            dialogue,
            metadata,
            heading: None,
        }
    }

    pub fn with_heading(mut self, heading: Option<EpisodeHeading>) -> Self {
        self.heading = heading;
        self
    }

    pub fn total_lines(&self) -> usize {
        self.dialogue.len()
    }

    pub fn unique_speakers(&self) -> usize {
        unique_speaker_count(&self.dialogue)
    }

    /// Number of records that carry any context tokens
    pub fn context_line_count(&self) -> usize {
        self.dialogue.iter().filter(|d| !d.context.is_empty()).count()
    }
}

fn unique_speaker_count(dialogue: &[DialogueLine]) -> usize {
    dialogue
        .iter()
        .filter_map(|d| d.speaker.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

/// Dataset-wide metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub total_episodes: usize,
    pub scraped_at: String,
    pub source: String,
    pub total_dialogue_lines: usize,
    pub unique_speakers: usize,
    pub show_name: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
}

/// The persisted artifact: global metadata plus every parsed episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub metadata: DatasetMetadata,
    pub episodes: Vec<Episode>,
}

impl Dataset {
    /// Assemble a dataset, deriving the global metadata from the episodes
    pub fn from_episodes(
        episodes: Vec<Episode>,
        source: impl Into<String>,
        scraped_at: impl Into<String>,
    ) -> Self {
        let total_dialogue_lines = episodes.iter().map(|e| e.dialogue.len()).sum();
        let unique_speakers = episodes
            .iter()
            .flat_map(|e| e.dialogue.iter())
            .filter_map(|d| d.speaker.as_deref())
            .collect::<HashSet<_>>()
            .len();

        // Most recent heading wins
        let heading = episodes.iter().rev().find_map(|e| e.heading.clone());

        let metadata = DatasetMetadata {
            total_episodes: episodes.len(),
            scraped_at: scraped_at.into(),
            source: source.into(),
            total_dialogue_lines,
            unique_speakers,
            show_name: heading.as_ref().map(|h| h.show_name.clone()),
            season: heading.as_ref().map(|h| h.season.clone()),
            episode: heading.map(|h| h.episode),
        };

        Self { metadata, episodes }
    }
}
