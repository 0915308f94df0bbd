use std::collections::HashSet;

/// A set of lower-cased words that mark text as action or sound
pub trait Vocabulary: Send + Sync {
    fn contains(&self, lower_word: &str) -> bool;
}

impl Vocabulary for HashSet<String> {
    fn contains(&self, lower_word: &str) -> bool {
        HashSet::contains(self, lower_word)
    }
}

/// Decides whether bracket text names a speaker or describes an action/sound.
///
/// Any single vocabulary word disqualifies the whole phrase, so ambiguous
/// bracket content ends up as context rather than as a speaker.
pub struct NonSpeakerClassifier {
    vocabulary: Box<dyn Vocabulary>,
}

impl NonSpeakerClassifier {
    pub fn new(vocabulary: impl Vocabulary + 'static) -> Self {
        Self {
            vocabulary: Box::new(vocabulary),
        }
    }

    /// Build from a base word list plus caller-supplied extras
    pub fn from_words<I, J, S, T>(base: I, extra: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let words: HashSet<String> = base
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .chain(extra.into_iter().map(|w| w.as_ref().trim().to_lowercase()))
            .filter(|w| !w.is_empty())
            .collect();
        Self::new(words)
    }

    pub fn is_likely_speaker(&self, candidate: &str) -> bool {
        // whole whitespace-separated words; `(laughing)` is not `laughing`
        !candidate
            .split_whitespace()
            .any(|word| self.vocabulary.contains(&word.to_lowercase()))
    }
}

impl std::fmt::Debug for NonSpeakerClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonSpeakerClassifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::Lexicon;

    fn classifier() -> NonSpeakerClassifier {
        Lexicon::default().classifier()
    }

    #[test]
    fn test_names_are_likely_speakers() {
        let c = classifier();
        assert!(c.is_likely_speaker("DEXTER"));
        assert!(c.is_likely_speaker("Rita"));
        assert!(c.is_likely_speaker("Angel Batista"));
    }

    #[test]
    fn test_actions_and_sounds_are_not_speakers() {
        let c = classifier();
        assert!(!c.is_likely_speaker("Heavy Breathing"));
        assert!(!c.is_likely_speaker("Door Opens"));
        assert!(!c.is_likely_speaker("grunts"));
        assert!(!c.is_likely_speaker("LAUGHING"));
        assert!(!c.is_likely_speaker("phone rings"));
    }

    #[test]
    fn test_single_word_disqualifies_phrase() {
        let c = classifier();
        assert!(!c.is_likely_speaker("Dexter sighs"));
        assert!(!c.is_likely_speaker("Deb laughing"));
    }

    #[test]
    fn test_words_match_whole() {
        let c = classifier();
        assert!(c.is_likely_speaker("Deb (laughing)"));
        assert!(c.is_likely_speaker("Phone,"));
        assert!(!c.is_likely_speaker("PHONE Rings"));
    }

    #[test]
    fn test_extra_words() {
        let c = NonSpeakerClassifier::from_words(["music"], ["Whispering", " echoing "]);
        assert!(!c.is_likely_speaker("whispering"));
        assert!(!c.is_likely_speaker("ECHOING"));
        assert!(c.is_likely_speaker("Harrison"));
    }

    #[test]
    fn test_empty_candidate() {
        assert!(classifier().is_likely_speaker(""));
    }
}
