use serde::{Deserialize, Serialize};

/// How a line of dialogue was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueType {
    /// Spoken on screen
    Spoken,
    /// Narration or off-screen voice
    Voiceover,
}

impl DialogueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueType::Spoken => "spoken",
            DialogueType::Voiceover => "voiceover",
        }
    }
}

/// A single emitted record of a parsed transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    /// Canonical speaker identity; absent for pure context records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Speaker token as it appeared in the source, before normalization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_speaker: Option<String>,
    /// Spoken or voice-over content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Delivery type; present only alongside a speaker
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub dialogue_type: Option<DialogueType>,
    /// Stage directions and sound cues accumulated since the previous record
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    /// 1-based position within the episode's line sequence
    pub line_number: usize,
}

impl DialogueLine {
    /// A record of dialogue text, optionally attributed to a speaker
    pub fn dialogue(
        speaker: Option<String>,
        text: impl Into<String>,
        dialogue_type: DialogueType,
        line_number: usize,
    ) -> Self {
        // The type only means something once a speaker is known
        let dialogue_type = speaker.as_ref().map(|_| dialogue_type);
        Self {
            speaker,
            original_speaker: None,
            text: Some(text.into()),
            dialogue_type,
            context: Vec::new(),
            line_number,
        }
    }

    /// A record carrying only context, e.g. a scene label
    pub fn context_only(context: Vec<String>, line_number: usize) -> Self {
        Self {
            speaker: None,
            original_speaker: None,
            text: None,
            dialogue_type: None,
            context,
            line_number,
        }
    }

    pub fn with_original_speaker(mut self, original: impl Into<String>) -> Self {
        self.original_speaker = Some(original.into());
        self
    }

    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = context;
        self
    }

    /// Whether this record attributes text to a speaker
    pub fn is_attributed(&self) -> bool {
        self.speaker.is_some() && self.text.is_some()
    }

    /// Whether this record carries context and nothing else
    pub fn is_context_only(&self) -> bool {
        self.text.is_none() && !self.context.is_empty()
    }
}

/// Result of looking up a raw speaker token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakerInfo {
    pub original_name: String,
    pub normalized_name: String,
    #[serde(rename = "type")]
    pub dialogue_type: DialogueType,
}
