use std::collections::{HashSet, VecDeque};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::{PairSource, TrainingData, TrainingMetadata, TrainingPair, TrainingStats};

/// Configuration for training-pair derivation
#[derive(Debug, Clone)]
pub struct TrainingPairConfig {
    /// Canonical name whose lines become outputs
    pub target_speaker: String,
    /// Preceding dialogue entries used as input
    pub context_window: usize,
}

impl Default for TrainingPairConfig {
    fn default() -> Self {
        Self {
            target_speaker: "DEXTER".to_string(),
            context_window: 3,
        }
    }
}

struct Turn<'a> {
    speaker: &'a str,
    text: &'a str,
}

/// Turn a dataset document into input/output pairs for the target speaker.
///
/// Each episode keeps its own rolling history; entries without a usable
/// speaker or text are skipped and never enter it.
pub fn derive_training_pairs(
    dataset: &Value,
    config: &TrainingPairConfig,
    source: &str,
) -> TrainingData {
    let target = config.target_speaker.to_uppercase();
    let episodes = dataset
        .get("episodes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if episodes.is_empty() {
        warn!("No episodes found in {}", source);
    }

    let mut pairs = Vec::new();
    let mut with_context = 0;

    for episode in episodes {
        let title = episode.get("title").and_then(Value::as_str).unwrap_or("Unknown");
        let Some(dialogue) = episode.get("dialogue").and_then(Value::as_array) else {
            warn!("Episode '{}' has no dialogue list, skipping", title);
            continue;
        };

        let mut history: VecDeque<Turn> = VecDeque::with_capacity(config.context_window + 1);

        for entry in dialogue {
            let (Some(speaker), Some(text)) = (non_blank(entry, "speaker"), non_blank(entry, "text"))
            else {
                debug!("Skipping entry without speaker or text in '{}'", title);
                continue;
            };

            if speaker.to_uppercase() == target {
                match entry.get("line_number").and_then(Value::as_u64) {
                    Some(line_number) => {
                        if !history.is_empty() {
                            with_context += 1;
                        }
                        pairs.push(TrainingPair {
                            input: render_history(&history),
                            output: text.to_string(),
                            metadata: PairSource {
                                episode: title.to_string(),
                                line_number: line_number as usize,
                            },
                        });
                    }
                    None => warn!("Missing line number in '{}' for: {}", title, text),
                }
            }

            if config.context_window > 0 {
                if history.len() == config.context_window {
                    history.pop_front();
                }
                history.push_back(Turn { speaker, text });
            }
        }
    }

    let stats = compute_stats(&pairs, with_context);
    info!(
        "Derived {} training pairs for {} across {} episodes",
        stats.total_dialogues, target, stats.unique_episodes
    );

    TrainingData {
        metadata: TrainingMetadata {
            stats,
            source: source.to_string(),
        },
        training_pairs: pairs,
    }
}

fn non_blank<'a>(entry: &'a Value, field: &str) -> Option<&'a str> {
    entry
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn render_history(history: &VecDeque<Turn>) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.speaker, turn.text))
        .collect::<Vec<_>>()
        .join(" ")
}

fn compute_stats(pairs: &[TrainingPair], with_context: usize) -> TrainingStats {
    if pairs.is_empty() {
        return TrainingStats::default();
    }
    let words: usize = pairs.iter().map(|p| p.output.split_whitespace().count()).sum();
    let episodes: HashSet<&str> = pairs.iter().map(|p| p.metadata.episode.as_str()).collect();

    TrainingStats {
        total_dialogues: pairs.len(),
        avg_dialogue_length: words as f64 / pairs.len() as f64,
        unique_episodes: episodes.len(),
        dialogues_with_context: with_context,
    }
}
