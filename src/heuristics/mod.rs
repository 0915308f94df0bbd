pub mod names;
pub mod non_speaker;

pub use names::*;
pub use non_speaker::*;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ScrapeError;

/// Name variants of the default series and their canonical identities
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("DEX", "DEXTER"),
    ("DEXTER MORGAN", "DEXTER"),
    ("DEB", "DEBRA"),
    ("DEBRA MORGAN", "DEBRA"),
    ("ANGEL", "BATISTA"),
    ("ANGEL BATISTA", "BATISTA"),
    ("LAGUERTA", "MARIA LAGUERTA"),
    ("MARIA", "MARIA LAGUERTA"),
    ("DOAKES", "JAMES DOAKES"),
    ("SGT DOAKES", "JAMES DOAKES"),
    ("SERGEANT DOAKES", "JAMES DOAKES"),
    ("RITA BENNETT", "RITA"),
    ("RITA MORGAN", "RITA"),
];

/// Stage-direction vocabulary: action verbs, descriptive adjectives and
/// sound nouns seen in bracket text.
const CORE_NON_SPEAKER_WORDS: &[&str] = &[
    // sound cues
    "music", "rings", "ringing", "ring", "click", "clicks", "clicking", "phone", "sound",
    "sounds", "footsteps", "silence", "static", "ambient", "beeping", "beeps", "buzzing",
    "banging", "bangs", "creaking", "squeaking", "clattering", "silverware", "chatter",
    "laughter", "applause", "gunshot", "gunshots", "siren", "sirens", "thunder", "engine",
    "horn", "knock", "knocking", "knocks", "thud", "crash", "splash", "whistle", "echo",
    "radio", "television", "tv", "song", "playing", "plays", "theme",
    // actions
    "opens", "closes", "slams", "breathing", "breathes", "grunting", "grunts", "groaning",
    "groans", "chuckles", "chuckling", "laughing", "laughs", "sighs", "sighing", "scoffs",
    "exhales", "inhales", "gasps", "gasping", "screams", "screaming", "shouting", "shouts",
    "yelling", "yells", "whispers", "whispering", "crying", "cries", "sobbing", "sobs",
    "sniffles", "coughs", "coughing", "clears", "snaps", "speaking", "speaks", "continues",
    "stammers", "mumbles", "muttering", "mutters", "panting", "pants", "moaning", "moans",
    "humming", "hums", "grumbles", "snickers", "giggles", "whimpers", "screeches", "revving",
    "thumping", "rustling", "rumbling", "indistinct", "overlapping", "distant",
    // descriptive adjectives and adverbs
    "background", "dramatic", "suspenseful", "intense", "tense", "heavy", "soft", "loud",
    "quietly", "loudly", "softly", "faintly", "sharply", "nervously", "muffled", "distorted",
    "ominous", "eerie", "upbeat", "somber", "gentle",
    // objects that only appear in stage directions
    "door", "doors", "window", "car", "throat", "fingers",
];

/// Keywords that veto a line-start `[Name]` cue (substring match)
const DEFAULT_CUE_KEYWORDS: &[&str] = &["music", "rings", "click", "sound", "phone"];

fn default_cue_keywords() -> Vec<String> {
    DEFAULT_CUE_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

/// Domain vocabulary for one show: alias table, extra non-speaker words and
/// bracket cue keywords.
///
/// A lexicon file replaces the alias table and cue keywords; its
/// `non_speaker_words` extend the built-in stage-direction vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    /// Name variant -> canonical identity
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Words added to the built-in stage-direction vocabulary
    #[serde(default)]
    pub non_speaker_words: Vec<String>,
    /// Keywords vetoing a bracketed speaker cue
    #[serde(default = "default_cue_keywords")]
    pub cue_keywords: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            non_speaker_words: Vec::new(),
            cue_keywords: default_cue_keywords(),
        }
    }
}

impl Lexicon {
    /// Load a lexicon from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ScrapeError> {
        let content = std::fs::read_to_string(path)?;
        let lexicon = Self::from_json(&content)?;
        info!(
            "Loaded lexicon from {:?}: {} aliases, {} extra non-speaker words",
            path,
            lexicon.aliases.len(),
            lexicon.non_speaker_words.len()
        );
        Ok(lexicon)
    }

    pub fn from_json(json: &str) -> Result<Self, ScrapeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn normalizer(&self) -> Result<NameNormalizer, ScrapeError> {
        let map = AliasMap::from_pairs(self.aliases.iter())?;
        Ok(NameNormalizer::new(map))
    }

    pub fn classifier(&self) -> NonSpeakerClassifier {
        NonSpeakerClassifier::from_words(CORE_NON_SPEAKER_WORDS.iter(), self.non_speaker_words.iter())
    }

    /// Lower-cased cue keywords
    pub fn cue_keywords(&self) -> Vec<String> {
        self.cue_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }
}
