use serde::{Deserialize, Serialize};

/// Where a training pair came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSource {
    pub episode: String,
    pub line_number: usize,
}

/// An input/output example: preceding dialogue in, target speaker's reply out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPair {
    pub input: String,
    pub output: String,
    pub metadata: PairSource,
}

/// Summary figures over the extracted pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub total_dialogues: usize,
    /// Mean reply length in words
    pub avg_dialogue_length: f64,
    pub unique_episodes: usize,
    pub dialogues_with_context: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub stats: TrainingStats,
    pub source: String,
}

/// The training-pair document written by `pairs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingData {
    pub metadata: TrainingMetadata,
    pub training_pairs: Vec<TrainingPair>,
}
