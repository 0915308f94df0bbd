use std::collections::HashSet;

use serde_json::{Map, Value};

const GLOBAL_METADATA_FIELDS: &[&str] = &[
    "total_episodes",
    "scraped_at",
    "source",
    "total_dialogue_lines",
    "unique_speakers",
    "show_name",
    "season",
    "episode",
];
const EPISODE_FIELDS: &[&str] = &["title", "url", "dialogue", "metadata"];
const EPISODE_METADATA_FIELDS: &[&str] = &["scraped_at", "total_lines", "unique_speakers"];
const DIALOGUE_TYPES: &[&str] = &["spoken", "voiceover"];

/// Configuration for dataset validation
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Repeats of the same speaker tolerated before warning about a
    /// possibly missed attribution
    pub max_same_speaker_run: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_same_speaker_run: 5,
        }
    }
}

/// Outcome of validating a dataset. Errors reject it, warnings do not.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Structural and consistency checks over a finished dataset document.
/// Purely observational: the dataset is never modified.
#[derive(Debug, Clone, Default)]
pub struct TranscriptValidator {
    config: ValidationConfig,
}

impl TranscriptValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, dataset: &Value) -> ValidationReport {
        let (Some(metadata), Some(episodes)) = (
            dataset.get("metadata").and_then(Value::as_object),
            dataset.get("episodes"),
        ) else {
            return ValidationReport::from_findings(
                vec!["Invalid dataset structure: missing metadata or episodes".to_string()],
                vec![],
            );
        };

        let mut findings = Findings::default();

        let missing: Vec<&str> = GLOBAL_METADATA_FIELDS
            .iter()
            .copied()
            .filter(|f| !metadata.contains_key(*f))
            .collect();
        if !missing.is_empty() {
            findings.errors.push(format!(
                "Invalid global metadata: missing {}",
                missing.join(", ")
            ));
        }

        let Some(episodes) = episodes.as_array() else {
            findings.errors.push("Invalid dataset structure: episodes is not a list".to_string());
            return findings.into_report();
        };

        for (index, episode) in episodes.iter().enumerate() {
            let location = Location::new(metadata, index);
            self.validate_episode(episode, &location, &mut findings);
        }

        findings.into_report()
    }

    fn validate_episode(&self, episode: &Value, loc: &Location, findings: &mut Findings) {
        let Some(episode) = episode.as_object() else {
            findings.error(loc, "episode is not an object");
            return;
        };

        let mut complete = true;
        for field in EPISODE_FIELDS {
            if !episode.contains_key(*field) {
                findings.error(loc, format!("Missing required field '{}'", field));
                complete = false;
            }
        }
        if !complete {
            return;
        }

        if !episode["title"].as_str().is_some_and(|t| !t.is_empty()) {
            findings.error(loc, "Invalid or empty title");
        }

        validate_episode_metadata(&episode["metadata"], loc, findings);
        self.validate_dialogue(&episode["dialogue"], loc, findings);
    }

    fn validate_dialogue(&self, dialogue: &Value, loc: &Location, findings: &mut Findings) {
        let Some(dialogue) = dialogue.as_array() else {
            findings.error(loc, "dialogue is not a list");
            return;
        };
        if dialogue.is_empty() {
            findings.warning(loc, "Empty dialogue list");
            return;
        }

        let mut line_numbers = HashSet::new();
        let mut current_speaker: Option<&Value> = None;
        let mut repeats = 0usize;

        for (position, entry) in dialogue.iter().enumerate() {
            let Some(entry) = entry.as_object() else {
                findings.error(loc, format!("Dialogue entry at position {} is not an object", position));
                continue;
            };

            let line = match entry.get("line_number") {
                None => {
                    findings.error(loc, format!("Missing line number at position {}", position));
                    format!("position {}", position)
                }
                Some(number) => {
                    if !line_numbers.insert(number.to_string()) {
                        findings.error(loc, format!("Duplicate line number {}", number));
                    }
                    number.to_string()
                }
            };

            let (Some(speaker), Some(_), Some(kind)) =
                (entry.get("speaker"), entry.get("text"), entry.get("type"))
            else {
                findings.warning(loc, format!("Missing required dialogue fields at line {}", line));
                continue;
            };

            if current_speaker == Some(speaker) {
                repeats += 1;
                if repeats > self.config.max_same_speaker_run {
                    findings.warning(
                        loc,
                        format!("Possible missing speaker attribution around line {}", line),
                    );
                }
            } else {
                current_speaker = Some(speaker);
                repeats = 0;
            }

            if !kind.as_str().is_some_and(|k| DIALOGUE_TYPES.contains(&k)) {
                findings.warning(loc, format!("Invalid dialogue type {} at line {}", kind, line));
            }
        }
    }
}

/// Validate with the default configuration
pub fn validate_dataset(dataset: &Value) -> ValidationReport {
    TranscriptValidator::default().validate(dataset)
}

fn validate_episode_metadata(metadata: &Value, loc: &Location, findings: &mut Findings) {
    let Some(metadata) = metadata.as_object() else {
        findings.error(loc, "metadata is not an object");
        return;
    };

    if let Some(field) = EPISODE_METADATA_FIELDS
        .iter()
        .find(|f| !metadata.contains_key(**f))
    {
        findings.error(loc, format!("Missing metadata field '{}'", field));
        return;
    }

    for field in ["total_lines", "unique_speakers"] {
        // as_u64 rejects negatives and floats
        if metadata[field].as_u64().is_none() {
            findings.error(loc, format!("Invalid {} count", field));
        }
    }
}

/// Prefix identifying an episode in findings
struct Location {
    prefix: String,
}

impl Location {
    fn new(metadata: &Map<String, Value>, index: usize) -> Self {
        let field = |name: &str| match metadata.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "?".to_string(),
            Some(other) => other.to_string(),
        };
        Self {
            prefix: format!(
                "Show: {}, Season: {}, Episode#: {}, Episode {}",
                field("show_name"),
                field("season"),
                field("episode"),
                index
            ),
        }
    }
}

#[derive(Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Findings {
    fn error(&mut self, loc: &Location, message: impl AsRef<str>) {
        self.errors.push(format!("{}: {}", loc.prefix, message.as_ref()));
    }

    fn warning(&mut self, loc: &Location, message: impl AsRef<str>) {
        self.warnings.push(format!("{}: {}", loc.prefix, message.as_ref()));
    }

    fn into_report(self) -> ValidationReport {
        ValidationReport::from_findings(self.errors, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_dataset() -> Value {
        json!({
            "metadata": {
                "total_episodes": 1,
                "scraped_at": "2024-01-01 00:00:00",
                "source": "https://forum/viewforum.php?f=187",
                "total_dialogue_lines": 1,
                "unique_speakers": 1,
                "show_name": "Dexter",
                "season": "01",
                "episode": "01"
            },
            "episodes": [{
                "title": "01x01 - Dexter",
                "url": "https://forum/viewtopic.php?t=1",
                "dialogue": [
                    {"speaker": "DEXTER", "text": "Tonight's the night.", "type": "spoken", "line_number": 1}
                ],
                "metadata": {"scraped_at": "2024-01-01 00:00:00", "total_lines": 1, "unique_speakers": 1}
            }]
        })
    }

    fn entry(speaker: &str, line_number: usize) -> Value {
        json!({"speaker": speaker, "text": "...", "type": "spoken", "line_number": line_number})
    }

    #[test]
    fn test_minimal_dataset_is_valid() {
        let report = validate_dataset(&minimal_dataset());
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_line_numbers() {
        let mut data = minimal_dataset();
        data["episodes"][0]["dialogue"] = json!([entry("DEXTER", 5), entry("DEBRA", 5)]);

        let report = validate_dataset(&data);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Duplicate line number 5"));
        assert!(report.errors[0].starts_with("Show: Dexter, Season: 01, Episode#: 01, Episode 0"));
    }

    #[test]
    fn test_missing_top_level() {
        let report = validate_dataset(&json!({"episodes": []}));
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("missing metadata or episodes"));

        let report = validate_dataset(&json!([1, 2]));
        assert!(!report.is_valid);
    }

    #[test]
    fn test_missing_global_metadata_fields() {
        let mut data = minimal_dataset();
        let metadata = data["metadata"].as_object_mut().unwrap();
        metadata.remove("season");
        metadata.remove("source");

        let report = validate_dataset(&data);
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("source"));
        assert!(report.errors[0].contains("season"));
    }

    #[test]
    fn test_null_metadata_values_are_present() {
        let mut data = minimal_dataset();
        data["metadata"]["show_name"] = Value::Null;
        let report = validate_dataset(&data);
        assert!(report.is_valid);
    }

    #[test]
    fn test_missing_episode_field() {
        let mut data = minimal_dataset();
        data["episodes"][0].as_object_mut().unwrap().remove("url");
        let report = validate_dataset(&data);
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("Missing required field 'url'"));
    }

    #[test]
    fn test_empty_title_and_negative_counts() {
        let mut data = minimal_dataset();
        data["episodes"][0]["title"] = json!("");
        data["episodes"][0]["metadata"]["total_lines"] = json!(-1);
        data["episodes"][0]["metadata"]["unique_speakers"] = json!(1.5);

        let report = validate_dataset(&data);
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors.iter().any(|e| e.contains("empty title")));
        assert!(report.errors.iter().any(|e| e.contains("Invalid total_lines count")));
        assert!(report.errors.iter().any(|e| e.contains("Invalid unique_speakers count")));
    }

    #[test]
    fn test_missing_episode_metadata_field() {
        let mut data = minimal_dataset();
        data["episodes"][0]["metadata"].as_object_mut().unwrap().remove("scraped_at");
        let report = validate_dataset(&data);
        assert!(report.errors[0].contains("Missing metadata field 'scraped_at'"));
    }

    #[test]
    fn test_warnings_do_not_reject() {
        let mut data = minimal_dataset();
        data["episodes"][0]["dialogue"] = json!([
            {"context": ["Population: 12"], "line_number": 1},
            {"speaker": "DEXTER", "text": "Hi.", "type": "whispered", "line_number": 2}
        ]);

        let report = validate_dataset(&data);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("Missing required dialogue fields at line 1"));
        assert!(report.warnings[1].contains("Invalid dialogue type \"whispered\""));
    }

    #[test]
    fn test_empty_dialogue_warns() {
        let mut data = minimal_dataset();
        data["episodes"][0]["dialogue"] = json!([]);
        let report = validate_dataset(&data);
        assert!(report.is_valid);
        assert!(report.warnings[0].contains("Empty dialogue list"));
    }

    #[test]
    fn test_missing_line_number_is_error() {
        let mut data = minimal_dataset();
        data["episodes"][0]["dialogue"] = json!([{"speaker": "DEXTER", "text": "Hi.", "type": "spoken"}]);
        let report = validate_dataset(&data);
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("Missing line number at position 0"));
    }

    #[test]
    fn test_long_same_speaker_run_warns() {
        let mut data = minimal_dataset();
        let dialogue: Vec<Value> = (1..=7).map(|n| entry("DEXTER", n)).collect();
        data["episodes"][0]["dialogue"] = Value::Array(dialogue);

        let report = validate_dataset(&data);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("around line 7"));
    }

    #[test]
    fn test_speaker_change_resets_run() {
        let mut data = minimal_dataset();
        let mut dialogue: Vec<Value> = (1..=6).map(|n| entry("DEXTER", n)).collect();
        dialogue.push(entry("DEBRA", 7));
        dialogue.extend((8..=13).map(|n| entry("DEXTER", n)));
        data["episodes"][0]["dialogue"] = Value::Array(dialogue);

        assert!(validate_dataset(&data).warnings.is_empty());
    }

    #[test]
    fn test_configurable_run_threshold() {
        let mut data = minimal_dataset();
        let dialogue: Vec<Value> = (1..=3).map(|n| entry("RITA", n)).collect();
        data["episodes"][0]["dialogue"] = Value::Array(dialogue);

        let validator = TranscriptValidator::new(ValidationConfig {
            max_same_speaker_run: 1,
        });
        let report = validator.validate(&data);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("around line 3"));
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let data = minimal_dataset();
        let before = data.clone();
        let _ = validate_dataset(&data);
        assert_eq!(data, before);
    }
}
