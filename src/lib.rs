pub mod error;
pub mod heuristics;
pub mod io;
pub mod models;
pub mod stages;

pub use error::{FetchError, ScrapeError};
pub use heuristics::{Lexicon, NameNormalizer, NonSpeakerClassifier};
pub use io::{FetchConfig, HttpFetcher, PageFetcher, read_json_file, save_dataset, write_json_file};
pub use models::{Dataset, DialogueLine, DialogueType, Episode, TrainingData};
pub use stages::{
    BracketMode, ParserConfig, ParserState, ScrapeConfig, Scraper, TrainingPairConfig,
    TranscriptParser, TranscriptValidator, ValidationConfig, analyze_dataset,
    derive_training_pairs, parse_pages,
};
