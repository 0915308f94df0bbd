use crate::io::html::{ChildNode, child_nodes};

/// Characters that end a complete line
const LINE_TERMINATORS: &[char] = &['.', '!', '?', '"', '\'', ')', '}', ']'];

/// Whether a buffered line ends a sentence rather than wrapping mid-sentence
pub fn is_complete_line(text: &str) -> bool {
    let trimmed = text.trim_end();
    trimmed.ends_with("...") || trimmed.ends_with(LINE_TERMINATORS)
}

/// Turn a transcript content block into logical lines.
///
/// Source pages hard-wrap dialogue with `<br>` independently of sentence
/// boundaries, so a break after an incomplete sentence joins the text with
/// whatever follows it.
pub fn segment(content_block: &str) -> Vec<String> {
    segment_nodes(&child_nodes(content_block))
}

pub fn segment_nodes(nodes: &[ChildNode]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for node in nodes {
        match node {
            ChildNode::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    current.push(text);
                }
            }
            ChildNode::LineBreak => {
                if current.is_empty() {
                    continue;
                }
                let text = current.join(" ");
                current.clear();

                if is_complete_line(&text) {
                    pending.push(text);
                    lines.push(pending.join(" "));
                    pending.clear();
                } else {
                    pending.push(text);
                }
            }
            ChildNode::Element => {}
        }
    }

    if !current.is_empty() {
        pending.push(current.join(" "));
    }
    if !pending.is_empty() {
        lines.push(pending.join(" "));
    }

    lines.retain(|line| !line.trim().is_empty());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_line_detection() {
        assert!(is_complete_line("Tonight's the night."));
        assert!(is_complete_line("What?  "));
        assert!(is_complete_line("[Heavy Breathing]"));
        assert!(is_complete_line("And then..."));
        assert!(is_complete_line("\"Hello\""));
        assert!(!is_complete_line("I think that"));
        assert!(!is_complete_line("Population:"));
    }

    #[test]
    fn test_simple_lines() {
        let lines = segment("[DEXTER] Tonight's the night.<br>I have a plan.<br>");
        assert_eq!(lines, vec!["[DEXTER] Tonight's the night.", "I have a plan."]);
    }

    #[test]
    fn test_wrapped_sentence_is_joined() {
        let lines = segment("I have a plan that<br>\nnobody will see<br>\ncoming.<br>Next line!<br>");
        assert_eq!(lines, vec!["I have a plan that nobody will see coming.", "Next line!"]);
    }

    #[test]
    fn test_trailing_text_is_flushed() {
        assert_eq!(segment("One.<br>Two without end"), vec!["One.", "Two without end"]);
        assert_eq!(segment("Dangling<br>"), vec!["Dangling"]);
        assert_eq!(segment("Dangling<br>tail"), vec!["Dangling tail"]);
    }

    #[test]
    fn test_blank_breaks_are_ignored() {
        let lines = segment("<br><br>Hello.<br><br>   <br>World.");
        assert_eq!(lines, vec!["Hello.", "World."]);
    }

    #[test]
    fn test_nested_elements_are_skipped() {
        let lines = segment("Hello.<br><div class=\"signature\">sig</div>Bye.<br>");
        assert_eq!(lines, vec!["Hello.", "Bye."]);
    }

    #[test]
    fn test_empty_block() {
        assert!(segment("").is_empty());
    }
}
