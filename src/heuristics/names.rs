use std::collections::HashMap;

use crate::error::ScrapeError;
use crate::models::{DialogueType, SpeakerInfo};

/// Markers that flag a speaker cue as voice-over
const VOICEOVER_MARKERS: [&str; 3] = ["voiceover", "v.o.", "(vo)"];

/// Case-insensitive lookup from a name variant to its canonical identity
pub trait AliasTable: Send + Sync {
    /// Look up an already upper-cased, trimmed token
    fn lookup(&self, upper: &str) -> Option<&str>;
}

/// Alias table with chains collapsed and canonical names mapped to themselves
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    entries: HashMap<String, String>,
}

impl AliasMap {
    /// Build from `(alias, canonical)` pairs.
    ///
    /// An alias whose target is itself an alias resolves to the end of the
    /// chain; cycles are rejected.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ScrapeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let raw: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (clean(k.as_ref()), clean(v.as_ref())))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect();

        let mut entries = HashMap::with_capacity(raw.len() * 2);
        for alias in raw.keys() {
            let canonical = resolve(&raw, alias)?;
            entries.insert(alias.clone(), canonical);
        }

        let canonicals: Vec<String> = entries.values().cloned().collect();
        for canonical in canonicals {
            entries.entry(canonical.clone()).or_insert(canonical);
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AliasTable for AliasMap {
    fn lookup(&self, upper: &str) -> Option<&str> {
        self.entries.get(upper).map(String::as_str)
    }
}

fn clean(name: &str) -> String {
    name.trim().to_uppercase()
}

fn resolve(raw: &HashMap<String, String>, alias: &str) -> Result<String, ScrapeError> {
    let mut current = alias;
    for _ in 0..=raw.len() {
        match raw.get(current) {
            Some(next) if next != current => current = next,
            _ => return Ok(current.to_string()),
        }
    }
    Err(ScrapeError::InvalidLexicon(format!(
        "alias cycle through '{}'",
        alias
    )))
}

/// Maps raw speaker tokens to canonical identities
pub struct NameNormalizer {
    table: Box<dyn AliasTable>,
}

impl NameNormalizer {
    pub fn new(table: impl AliasTable + 'static) -> Self {
        Self {
            table: Box::new(table),
        }
    }

    /// Canonical form of a name; unknown names come back upper-cased
    pub fn normalize(&self, raw_name: &str) -> String {
        let clean_name = clean(raw_name);
        match self.table.lookup(&clean_name) {
            Some(canonical) => canonical.to_string(),
            None => clean_name,
        }
    }

    /// Whether the token is an exact (case-insensitive) entry in the table
    pub fn is_known(&self, raw_name: &str) -> bool {
        self.table.lookup(&clean(raw_name)).is_some()
    }

    pub fn speaker_info(&self, raw_name: &str) -> SpeakerInfo {
        SpeakerInfo {
            original_name: raw_name.to_string(),
            normalized_name: self.normalize(raw_name),
            dialogue_type: dialogue_type_of(raw_name),
        }
    }
}

impl std::fmt::Debug for NameNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameNormalizer").finish_non_exhaustive()
    }
}

/// Voice-over if the cue carries any voice-over marker
pub fn dialogue_type_of(raw_name: &str) -> DialogueType {
    let lower = raw_name.to_lowercase();
    if VOICEOVER_MARKERS.iter().any(|m| lower.contains(m)) {
        DialogueType::Voiceover
    } else {
        DialogueType::Spoken
    }
}
