use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::ScrapeError;
use crate::heuristics::{Lexicon, NameNormalizer, NonSpeakerClassifier};
use crate::models::{DialogueLine, DialogueType};

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));
static EMPTY_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*\]").expect("Invalid empty bracket regex"));
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("Invalid dash regex"));
static EDGE_DASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s*|\s*-\s*$").expect("Invalid edge dash regex"));

/// `[Name] trailing text`, anchored at line start
static BRACKETED_SPEAKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]+)\](.*)$").expect("Invalid bracketed speaker regex"));

/// `This is Name, ...`: the name is a run of capitalised words
static DIRECT_INTRODUCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^This is ([A-Z][\w'.-]*(?:\s+[A-Z][\w'.-]*)*)(?:[,:]|\s|$)")
        .expect("Invalid introduction regex")
});

/// Per-episode parser state. Create a fresh one for every episode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserState {
    /// Speaker presumed to own unattributed lines
    pub current_speaker: Option<String>,
    /// Context tokens not yet attached to a record
    pub context_buffer: Vec<String>,
}

impl ParserState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.current_speaker = None;
        self.context_buffer.clear();
    }

    /// Drain pending context for attachment to a record
    pub fn take_context(&mut self) -> Vec<String> {
        std::mem::take(&mut self.context_buffer)
    }
}

/// Line classification rules, evaluated in order; the first rule that
/// claims a line decides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Any `[...]` on the line: speaker names and context from the bracket,
    /// dialogue from the text after it
    BracketScan,
    /// Whole-cue `[Name] text` at line start
    BracketedSpeakerLine,
    /// `This is Name, ...`
    DirectIntroduction,
    /// Unmarked text belongs to the current speaker
    CarryForward,
    /// Short `Label: value` lines become context
    ContextLabel,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::BracketScan => "bracket_scan",
            Rule::BracketedSpeakerLine => "bracketed_speaker_line",
            Rule::DirectIntroduction => "direct_introduction",
            Rule::CarryForward => "carry_forward",
            Rule::ContextLabel => "context_label",
        }
    }
}

/// Where bracketed speaker cues are looked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BracketMode {
    /// Brackets anywhere on the line are scanned for names and context
    #[default]
    Anywhere,
    /// Only a whole `[Name]` cue at line start introduces a speaker
    Leading,
}

impl BracketMode {
    pub fn rules(&self) -> Vec<Rule> {
        match self {
            BracketMode::Anywhere => vec![
                Rule::BracketScan,
                Rule::BracketedSpeakerLine,
                Rule::DirectIntroduction,
                Rule::CarryForward,
                Rule::ContextLabel,
            ],
            BracketMode::Leading => vec![
                Rule::BracketedSpeakerLine,
                Rule::DirectIntroduction,
                Rule::CarryForward,
                Rule::ContextLabel,
            ],
        }
    }
}

/// Configuration for the transcript parser
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Rules in evaluation order
    pub rules: Vec<Rule>,
    /// Maximum words before the first colon for a context label line
    pub max_label_words: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::for_mode(BracketMode::default())
    }
}

impl ParserConfig {
    pub fn for_mode(mode: BracketMode) -> Self {
        Self {
            rules: mode.rules(),
            max_label_words: 2,
        }
    }
}

/// What a rule decided about a line
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// The line produced a record
    Emit(DialogueLine),
    /// The line was consumed without producing a record
    Absorbed,
    /// Not this rule's line; try the next
    Pass,
}

/// Collapse whitespace, drop emphasis underscores, empty brackets and stray dashes
pub fn clean_text(text: &str) -> String {
    let text = WHITESPACE_RUN.replace_all(text, " ");
    let text = text.replace('_', "");
    let text = EMPTY_BRACKETS.replace_all(&text, "");
    let text = DASH_RUN.replace_all(&text, "-");
    let text = EDGE_DASHES.replace_all(&text, "");
    text.trim().to_string()
}

/// The transcript line-parsing state machine.
///
/// The parser itself is immutable; all per-episode state lives in the
/// [`ParserState`] the caller passes in, so one parser can serve many
/// episodes concurrently.
#[derive(Debug)]
pub struct TranscriptParser {
    normalizer: NameNormalizer,
    classifier: NonSpeakerClassifier,
    cue_keywords: Vec<String>,
    config: ParserConfig,
}

impl TranscriptParser {
    pub fn new(
        normalizer: NameNormalizer,
        classifier: NonSpeakerClassifier,
        cue_keywords: Vec<String>,
        config: ParserConfig,
    ) -> Self {
        Self {
            normalizer,
            classifier,
            cue_keywords,
            config,
        }
    }

    pub fn from_lexicon(lexicon: &Lexicon, config: ParserConfig) -> Result<Self, ScrapeError> {
        Ok(Self::new(
            lexicon.normalizer()?,
            lexicon.classifier(),
            lexicon.cue_keywords(),
            config,
        ))
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub fn rules(&self) -> &[Rule] {
        &self.config.rules
    }

    /// Parse one segmented line, emitting at most one record
    pub fn parse_line(
        &self,
        state: &mut ParserState,
        raw_text: &str,
        line_number: usize,
    ) -> Option<DialogueLine> {
        let text = clean_text(raw_text);
        if text.is_empty() {
            return None;
        }

        for rule in &self.config.rules {
            match self.apply_rule(*rule, state, &text, line_number) {
                RuleOutcome::Emit(line) => {
                    debug!("line {}: {} emitted a record", line_number, rule.name());
                    return Some(line);
                }
                RuleOutcome::Absorbed => {
                    debug!("line {}: {} absorbed the line", line_number, rule.name());
                    return None;
                }
                RuleOutcome::Pass => {}
            }
        }

        debug!("line {}: no rule matched {:?}", line_number, text);
        None
    }

    /// Parse every line of one episode with a fresh state
    pub fn parse_lines<I, S>(&self, lines: I) -> Vec<DialogueLine>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = ParserState::new();
        lines
            .into_iter()
            .enumerate()
            .filter_map(|(i, line)| self.parse_line(&mut state, line.as_ref(), i + 1))
            .collect()
    }

    /// Apply one rule to an already cleaned line
    pub fn apply_rule(
        &self,
        rule: Rule,
        state: &mut ParserState,
        text: &str,
        line_number: usize,
    ) -> RuleOutcome {
        match rule {
            Rule::BracketScan => self.bracket_scan(state, text, line_number),
            Rule::BracketedSpeakerLine => self.bracketed_speaker_line(state, text, line_number),
            Rule::DirectIntroduction => self.direct_introduction(state, text, line_number),
            Rule::CarryForward => carry_forward(state, text, line_number),
            Rule::ContextLabel => self.context_label(text, line_number),
        }
    }

    fn bracket_scan(&self, state: &mut ParserState, text: &str, line_number: usize) -> RuleOutcome {
        // Only a `]` after the first `[` closes the bracket
        let Some(open) = text.find('[') else {
            return RuleOutcome::Pass;
        };
        let Some(close) = text[open..].find(']').map(|i| open + i) else {
            return RuleOutcome::Pass;
        };

        let content = text[open + 1..close].trim();
        let remainder = text[close + 1..].trim();

        let mut words: Vec<&str> = content.split_whitespace().collect();
        if !content.is_empty() && self.normalizer.is_known(content) {
            state.current_speaker = Some(self.normalizer.normalize(content));
            words.clear();
        } else if let Some(pos) = words.iter().position(|w| self.normalizer.is_known(w)) {
            state.current_speaker = Some(self.normalizer.normalize(words[pos]));
            words.remove(pos);
        }
        state
            .context_buffer
            .extend(words.into_iter().map(str::to_string));

        if remainder.is_empty() {
            return RuleOutcome::Absorbed;
        }

        let line = DialogueLine::dialogue(
            state.current_speaker.clone(),
            remainder,
            DialogueType::Spoken,
            line_number,
        )
        .with_context(state.take_context());
        RuleOutcome::Emit(line)
    }

    fn bracketed_speaker_line(
        &self,
        state: &mut ParserState,
        text: &str,
        line_number: usize,
    ) -> RuleOutcome {
        let Some(caps) = BRACKETED_SPEAKER.captures(text) else {
            return RuleOutcome::Pass;
        };
        let candidate = caps[1].trim();
        let remainder = caps[2].trim();

        let lower = candidate.to_lowercase();
        if self.cue_keywords.iter().any(|k| lower.contains(k.as_str()))
            || !self.classifier.is_likely_speaker(candidate)
        {
            return RuleOutcome::Pass;
        }

        let info = self.normalizer.speaker_info(candidate);
        state.current_speaker = Some(info.normalized_name.clone());

        if remainder.is_empty() {
            // Name cue on its own line; context waits for the dialogue
            return RuleOutcome::Absorbed;
        }

        let line = DialogueLine::dialogue(
            Some(info.normalized_name),
            remainder,
            info.dialogue_type,
            line_number,
        )
        .with_original_speaker(info.original_name)
        .with_context(state.take_context());
        RuleOutcome::Emit(line)
    }

    fn direct_introduction(
        &self,
        state: &mut ParserState,
        text: &str,
        line_number: usize,
    ) -> RuleOutcome {
        let Some(caps) = DIRECT_INTRODUCTION.captures(text) else {
            return RuleOutcome::Pass;
        };

        let info = self.normalizer.speaker_info(introduced_name(&caps[1]));
        state.current_speaker = Some(info.normalized_name.clone());

        let line = DialogueLine::dialogue(
            Some(info.normalized_name),
            text,
            info.dialogue_type,
            line_number,
        )
        .with_original_speaker(info.original_name)
        .with_context(state.take_context());
        RuleOutcome::Emit(line)
    }

    fn context_label(&self, text: &str, line_number: usize) -> RuleOutcome {
        match text.split_once(':') {
            Some((label, _)) if label.split_whitespace().count() <= self.config.max_label_words => {
                RuleOutcome::Emit(DialogueLine::context_only(vec![text.to_string()], line_number))
            }
            _ => RuleOutcome::Pass,
        }
    }
}

/// Drop a trailing period and a possessive from an introduced name
fn introduced_name(raw: &str) -> &str {
    let name = raw.trim_end_matches('.');
    name.strip_suffix("'s")
        .or_else(|| name.strip_suffix('\''))
        .unwrap_or(name)
}

fn carry_forward(state: &mut ParserState, text: &str, line_number: usize) -> RuleOutcome {
    let Some(speaker) = state.current_speaker.clone() else {
        return RuleOutcome::Pass;
    };

    let line = DialogueLine::dialogue(Some(speaker.clone()), text, DialogueType::Spoken, line_number)
        .with_original_speaker(speaker)
        .with_context(state.take_context());
    RuleOutcome::Emit(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> TranscriptParser {
        TranscriptParser::from_lexicon(&Lexicon::default(), ParserConfig::default()).unwrap()
    }

    fn leading_parser() -> TranscriptParser {
        TranscriptParser::from_lexicon(&Lexicon::default(), ParserConfig::for_mode(BracketMode::Leading))
            .unwrap()
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Hello   _there_  "), "Hello there");
        assert_eq!(clean_text("[ ] Wait -- what?"), "Wait - what?");
        assert_eq!(clean_text("- Dexter -"), "Dexter");
        assert_eq!(clean_text("--"), "");
        assert_eq!(clean_text("\t\n"), "");
    }

    #[test]
    fn test_empty_line_changes_nothing() {
        let p = parser();
        let mut state = ParserState {
            current_speaker: Some("DEXTER".to_string()),
            context_buffer: vec!["music".to_string()],
        };
        let before = state.clone();
        assert!(p.parse_line(&mut state, " __ [] ", 1).is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn test_bracketed_name_with_dialogue() {
        let p = parser();
        let mut state = ParserState::new();
        let line = p.parse_line(&mut state, "[DEXTER] Tonight's the night.", 1).unwrap();

        assert_eq!(line.speaker.as_deref(), Some("DEXTER"));
        assert_eq!(line.text.as_deref(), Some("Tonight's the night."));
        assert_eq!(line.dialogue_type, Some(DialogueType::Spoken));
        assert!(line.context.is_empty());
        assert_eq!(state.current_speaker.as_deref(), Some("DEXTER"));
    }

    #[test]
    fn test_bracket_only_action_goes_to_context() {
        let p = parser();
        let mut state = ParserState::new();
        assert!(p.parse_line(&mut state, "[Heavy Breathing]", 1).is_none());
        assert_eq!(state.context_buffer, vec!["Heavy", "Breathing"]);
        assert!(state.current_speaker.is_none());
    }

    #[test]
    fn test_carry_forward() {
        let p = parser();
        let mut state = ParserState {
            current_speaker: Some("DEXTER".to_string()),
            context_buffer: Vec::new(),
        };
        let line = p.parse_line(&mut state, "I have a plan.", 2).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("DEXTER"));
        assert_eq!(line.text.as_deref(), Some("I have a plan."));
        assert_eq!(line.dialogue_type, Some(DialogueType::Spoken));
        assert_eq!(line.line_number, 2);
    }

    #[test]
    fn test_pending_context_is_drained_into_next_record() {
        let p = parser();
        let mut state = ParserState {
            current_speaker: Some("DEXTER".to_string()),
            context_buffer: vec!["grunting".to_string()],
        };
        let line = p.parse_line(&mut state, "Hold still.", 3).unwrap();
        assert_eq!(line.context, vec!["grunting"]);
        assert!(state.context_buffer.is_empty());
    }

    #[test]
    fn test_context_accumulates_across_silent_lines() {
        let p = parser();
        let mut state = ParserState::new();
        assert!(p.parse_line(&mut state, "[door opens]", 1).is_none());
        assert!(p.parse_line(&mut state, "[footsteps]", 2).is_none());
        let line = p.parse_line(&mut state, "[Deb] What the hell?", 3).unwrap();

        assert_eq!(line.speaker.as_deref(), Some("DEBRA"));
        assert_eq!(line.context, vec!["door", "opens", "footsteps"]);
        assert!(state.context_buffer.is_empty());
    }

    #[test]
    fn test_name_and_action_in_one_bracket() {
        let p = parser();
        let mut state = ParserState::new();
        let line = p.parse_line(&mut state, "[Rita sighs] Not again.", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("RITA"));
        assert_eq!(line.context, vec!["sighs"]);
    }

    #[test]
    fn test_only_first_name_in_bracket_is_taken() {
        let p = parser();
        let mut state = ParserState::new();
        let line = p.parse_line(&mut state, "[Deb and Dex] Hey.", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("DEBRA"));
        assert_eq!(line.context, vec!["and", "Dex"]);
    }

    #[test]
    fn test_multi_word_alias_in_bracket() {
        let p = parser();
        let mut state = ParserState::new();
        let line = p.parse_line(&mut state, "[Sergeant Doakes] Morgan.", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("JAMES DOAKES"));
        assert!(line.context.is_empty());
    }

    #[test]
    fn test_names_match_exactly() {
        let p = parser();
        let mut state = ParserState::new();
        // "ANGELA" must not match the "ANGEL" alias
        let line = p.parse_line(&mut state, "[Angela] Hi there.", 1).unwrap();
        assert!(line.speaker.is_none());
        assert!(line.dialogue_type.is_none());
        assert_eq!(line.context, vec!["Angela"]);
    }

    #[test]
    fn test_bracket_after_text() {
        let p = parser();
        let mut state = ParserState {
            current_speaker: Some("DEXTER".to_string()),
            context_buffer: Vec::new(),
        };
        // Text before the bracket is dropped; the text after it is dialogue
        let line = p.parse_line(&mut state, "Wait [Deb] stop it.", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("DEBRA"));
        assert_eq!(line.text.as_deref(), Some("stop it."));

        // A bracket closing the line yields no dialogue
        assert!(p.parse_line(&mut state, "Look at that [laughs]", 2).is_none());
        assert_eq!(state.context_buffer, vec!["laughs"]);
    }

    #[test]
    fn test_reversed_brackets() {
        let p = parser();
        let mut state = ParserState {
            current_speaker: Some("RITA".to_string()),
            context_buffer: Vec::new(),
        };
        // no bracket pair, so the whole line carries forward
        let line = p.parse_line(&mut state, "odd] text [here", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("RITA"));
        assert_eq!(line.text.as_deref(), Some("odd] text [here"));
        assert!(line.context.is_empty());
    }

    #[test]
    fn test_reversed_brackets_without_speaker() {
        let p = parser();
        let mut state = ParserState::new();
        assert!(p.parse_line(&mut state, "][", 1).is_none());
        assert!(p.parse_line(&mut state, "Then ] she [ left", 2).is_none());
        assert_eq!(state, ParserState::new());
    }

    #[test]
    fn test_stray_close_before_bracket_pair() {
        let p = parser();
        let mut state = ParserState::new();
        let line = p.parse_line(&mut state, "oops] [Debra] Move!", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("DEBRA"));
        assert_eq!(line.text.as_deref(), Some("Move!"));
    }

    #[test]
    fn test_speaker_persists() {
        let p = parser();
        let mut state = ParserState::new();
        p.parse_line(&mut state, "[Batista] Hey, man.", 1);
        assert!(p.parse_line(&mut state, "[phone rings]", 2).is_none());
        let line = p.parse_line(&mut state, "Who calls at this hour?", 3).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("BATISTA"));
        assert_eq!(line.context, vec!["phone", "rings"]);
    }

    #[test]
    fn test_direct_introduction() {
        let p = parser();
        let mut state = ParserState::new();
        let line = p
            .parse_line(&mut state, "This is Dexter, your new neighbor.", 1)
            .unwrap();
        assert_eq!(line.speaker.as_deref(), Some("DEXTER"));
        assert_eq!(line.original_speaker.as_deref(), Some("Dexter"));
        assert_eq!(line.text.as_deref(), Some("This is Dexter, your new neighbor."));
        assert_eq!(state.current_speaker.as_deref(), Some("DEXTER"));
    }

    #[test]
    fn test_direct_introduction_beats_carry_forward() {
        let p = parser();
        let mut state = ParserState {
            current_speaker: Some("RITA".to_string()),
            context_buffer: vec!["knock".to_string()],
        };
        let line = p.parse_line(&mut state, "This is Sergeant Doakes speaking", 4).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("JAMES DOAKES"));
        assert_eq!(line.context, vec!["knock"]);
    }

    #[test]
    fn test_introduction_ending_the_sentence() {
        let p = parser();
        let mut state = ParserState::new();
        let line = p.parse_line(&mut state, "This is Deb.", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("DEBRA"));
        assert_eq!(line.text.as_deref(), Some("This is Deb."));
    }

    #[test]
    fn test_possessive_introduction() {
        let p = parser();
        let mut state = ParserState::new();
        let line = p.parse_line(&mut state, "This is Doakes' car.", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("JAMES DOAKES"));
        assert_eq!(line.original_speaker.as_deref(), Some("Doakes"));

        let line = p.parse_line(&mut state, "This is Rita's house.", 2).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("RITA"));
    }

    #[test]
    fn test_apostrophe_inside_introduced_name() {
        let p = parser();
        let mut state = ParserState::new();
        let line = p.parse_line(&mut state, "This is O'Brien.", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("O'BRIEN"));
        assert_eq!(introduced_name("Masuka's"), "Masuka");
    }

    #[test]
    fn test_lowercase_introduction_is_not_a_cue() {
        let p = parser();
        let mut state = ParserState::new();
        assert!(p.parse_line(&mut state, "This is a nightmare.", 1).is_none());
    }

    #[test]
    fn test_context_label_line() {
        let p = parser();
        let mut state = ParserState::new();
        let line = p.parse_line(&mut state, "Population: 12", 5).unwrap();
        assert!(line.speaker.is_none());
        assert!(line.text.is_none());
        assert_eq!(line.context, vec!["Population: 12"]);
        assert!(state.current_speaker.is_none());
    }

    #[test]
    fn test_long_label_is_not_context() {
        let p = parser();
        let mut state = ParserState::new();
        assert!(p.parse_line(&mut state, "He said it slowly: no", 1).is_none());
    }

    #[test]
    fn test_unmatched_line_without_speaker() {
        let p = parser();
        let mut state = ParserState::new();
        assert!(p.parse_line(&mut state, "Somewhere in Miami.", 1).is_none());
        assert!(state.context_buffer.is_empty());
    }

    #[test]
    fn test_parse_lines_numbers_are_increasing() {
        let p = parser();
        let lines = [
            "[Heavy Breathing]",
            "[DEXTER] Tonight's the night.",
            "",
            "And it's going to happen again and again.",
            "Somewhere: else",
            "[Deb] Dex!",
        ];
        let records = p.parse_lines(lines);
        let numbers: Vec<usize> = records.iter().map(|r| r.line_number).collect();
        assert_eq!(numbers, vec![2, 4, 5, 6]);
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(records[0].context, vec!["Heavy", "Breathing"]);
        // carry-forward wins over the label rule once a speaker is known
        assert_eq!(records[2].speaker.as_deref(), Some("DEXTER"));
    }

    #[test]
    fn test_leading_mode_accepts_unknown_names() {
        let p = leading_parser();
        let mut state = ParserState::new();
        let line = p.parse_line(&mut state, "[Harrison] Daddy?", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("HARRISON"));
        assert_eq!(line.original_speaker.as_deref(), Some("Harrison"));
    }

    #[test]
    fn test_leading_mode_voiceover() {
        let p = leading_parser();
        let mut state = ParserState::new();
        let line = p.parse_line(&mut state, "[Dexter V.O.] I'm a very neat monster.", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("DEXTER V.O."));
        assert_eq!(line.dialogue_type, Some(DialogueType::Voiceover));
    }

    #[test]
    fn test_leading_mode_rejects_sound_cues() {
        let p = leading_parser();
        let mut state = ParserState {
            current_speaker: Some("DEXTER".to_string()),
            context_buffer: Vec::new(),
        };
        // cue keyword (substring) and vocabulary word both veto the cue
        let line = p.parse_line(&mut state, "[Soundtrack] la la", 1).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("DEXTER"));
        assert_eq!(line.text.as_deref(), Some("[Soundtrack] la la"));

        let line = p.parse_line(&mut state, "[Sighs] Fine.", 2).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("DEXTER"));
    }

    #[test]
    fn test_leading_mode_name_cue_alone_keeps_context() {
        let p = leading_parser();
        let mut state = ParserState {
            current_speaker: None,
            context_buffer: vec!["music".to_string()],
        };
        assert!(p.parse_line(&mut state, "[Rita Bennett]", 1).is_none());
        assert_eq!(state.current_speaker.as_deref(), Some("RITA"));
        assert_eq!(state.context_buffer, vec!["music"]);

        let line = p.parse_line(&mut state, "Hi, honey.", 2).unwrap();
        assert_eq!(line.speaker.as_deref(), Some("RITA"));
        assert_eq!(line.context, vec!["music"]);
    }

    #[test]
    fn test_rules_apply_independently() {
        let p = parser();
        let mut state = ParserState::new();
        assert_eq!(
            p.apply_rule(Rule::CarryForward, &mut state, "Hello.", 1),
            RuleOutcome::Pass
        );
        assert_eq!(
            p.apply_rule(Rule::DirectIntroduction, &mut state, "Hello.", 1),
            RuleOutcome::Pass
        );
        match p.apply_rule(Rule::BracketedSpeakerLine, &mut state, "[Masuka] Nice.", 1) {
            RuleOutcome::Emit(line) => assert_eq!(line.speaker.as_deref(), Some("MASUKA")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_state_reset() {
        let mut state = ParserState {
            current_speaker: Some("DEXTER".to_string()),
            context_buffer: vec!["music".to_string()],
        };
        state.reset();
        assert_eq!(state, ParserState::new());
    }
}
