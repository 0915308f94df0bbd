use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use serde_json::Value;

const MAX_SPEAKER_WORDS: usize = 4;
const MAX_SPEAKER_CHARS: usize = 50;

/// Why a speaker name looks suspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// More than four words, probably dialogue taken for a name
    LongName,
    ContainsDigits,
    /// More than fifty characters
    VeryLongName,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct QualityIssue {
    pub flag: QualityFlag,
    pub episode: String,
    pub speaker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frequency {
    pub value: String,
    pub count: usize,
    pub percentage: f64,
}

/// Frequency and quality figures over a dataset document
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetStats {
    /// Context tokens, most frequent first
    pub contexts: Vec<Frequency>,
    /// Speakers by line count, most frequent first
    pub speakers: Vec<Frequency>,
    /// Deduplicated, ordered by flag then episode
    pub issues: Vec<QualityIssue>,
}

impl DatasetStats {
    pub fn top_contexts(&self, n: usize) -> &[Frequency] {
        &self.contexts[..n.min(self.contexts.len())]
    }

    pub fn speakers_with_at_least(&self, min_lines: usize) -> impl Iterator<Item = &Frequency> {
        self.speakers.iter().filter(move |s| s.count >= min_lines)
    }

    pub fn issues_flagged(&self, flag: QualityFlag) -> impl Iterator<Item = &QualityIssue> {
        self.issues.iter().filter(move |i| i.flag == flag)
    }
}

pub fn analyze_dataset(dataset: &Value) -> DatasetStats {
    let mut contexts: HashMap<&str, usize> = HashMap::new();
    let mut speakers: HashMap<&str, usize> = HashMap::new();
    let mut issues = BTreeSet::new();

    let episodes = dataset
        .get("episodes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for episode in episodes {
        let title = episode.get("title").and_then(Value::as_str).unwrap_or("Unknown");
        let dialogue = episode
            .get("dialogue")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for entry in dialogue {
            if let Some(tokens) = entry.get("context").and_then(Value::as_array) {
                for token in tokens.iter().filter_map(Value::as_str) {
                    *contexts.entry(token).or_default() += 1;
                }
            }

            let Some(speaker) = entry.get("speaker").and_then(Value::as_str) else {
                continue;
            };
            *speakers.entry(speaker).or_default() += 1;

            for flag in quality_flags(speaker) {
                issues.insert(QualityIssue {
                    flag,
                    episode: title.to_string(),
                    speaker: speaker.to_string(),
                });
            }
        }
    }

    DatasetStats {
        contexts: ranked(contexts),
        speakers: ranked(speakers),
        issues: issues.into_iter().collect(),
    }
}

fn quality_flags(speaker: &str) -> Vec<QualityFlag> {
    let mut flags = Vec::new();
    if speaker.split_whitespace().count() > MAX_SPEAKER_WORDS {
        flags.push(QualityFlag::LongName);
    }
    if speaker.chars().any(|c| c.is_ascii_digit()) {
        flags.push(QualityFlag::ContainsDigits);
    }
    if speaker.chars().count() > MAX_SPEAKER_CHARS {
        flags.push(QualityFlag::VeryLongName);
    }
    flags
}

fn ranked(counts: HashMap<&str, usize>) -> Vec<Frequency> {
    let total: usize = counts.values().sum();
    let mut ranked: Vec<Frequency> = counts
        .into_iter()
        .map(|(value, count)| Frequency {
            value: value.to_string(),
            count,
            percentage: count as f64 * 100.0 / total as f64,
        })
        .collect();
    // ties broken alphabetically so reports are stable
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    ranked
}
