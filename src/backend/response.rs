//! Sanitizing structured replies from the backend.
//!
//! Models often wrap JSON in markdown fences or surround it with prose. All
//! tools parse replies through this module so the handling stays in one place.

use crate::error::{Result, StudyBoxError};
use serde::de::DeserializeOwned;

/// Remove a surrounding markdown code fence (```` ```json ... ``` ````), if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parse a JSON array of records out of a model reply.
///
/// Accepts fenced or bare JSON, and JSON embedded in surrounding prose.
/// An empty array counts as malformed: the caller asked for records.
pub fn parse_json_array<T: DeserializeOwned>(reply: &str) -> Result<Vec<T>> {
    let cleaned = strip_code_fences(reply);

    let records: Vec<T> = match serde_json::from_str(cleaned) {
        Ok(records) => records,
        Err(first_err) => {
            let start = cleaned.find('[');
            let end = cleaned.rfind(']');
            match (start, end) {
                (Some(start), Some(end)) if end > start => {
                    serde_json::from_str(&cleaned[start..=end]).map_err(|e| malformed(e, reply))?
                }
                _ => return Err(malformed(first_err, reply)),
            }
        }
    };

    if records.is_empty() {
        return Err(StudyBoxError::MalformedResponse(
            "reply contained an empty list".to_string(),
        ));
    }

    Ok(records)
}

fn malformed(err: serde_json::Error, reply: &str) -> StudyBoxError {
    StudyBoxError::MalformedResponse(format!(
        "{}. Reply was: {}",
        err,
        reply.chars().take(200).collect::<String>()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Card {
        #[serde(rename = "Q")]
        q: String,
        #[serde(rename = "A")]
        a: String,
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
        assert_eq!(strip_code_fences("```json\n[1]"), "[1]");
    }

    #[test]
    fn test_parse_unfenced() {
        let cards: Vec<Card> = parse_json_array(r#"[{"Q": "What is RAM?", "A": "Memory"}]"#).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].a, "Memory");
    }

    #[test]
    fn test_parse_fenced() {
        let reply = "```json\n[{\"Q\": \"One\", \"A\": \"1\"}, {\"Q\": \"Two\", \"A\": \"2\"}]\n```";
        let cards: Vec<Card> = parse_json_array(reply).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].q, "Two");
    }

    #[test]
    fn test_parse_with_surrounding_prose() {
        let reply = r#"Here are your flashcards:

[{"Q": "Cell", "A": "Basic unit of life"}]

Good luck!"#;
        let cards: Vec<Card> = parse_json_array(reply).unwrap();
        assert_eq!(cards[0].q, "Cell");
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_json_array::<Card>("Sorry, I can't help with that.").unwrap_err();
        assert!(matches!(err, StudyBoxError::MalformedResponse(_)));

        let err = parse_json_array::<Card>(r#"[{"Q": "missing answer"}]"#).unwrap_err();
        assert!(matches!(err, StudyBoxError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_empty_list_is_malformed() {
        let err = parse_json_array::<Card>("```json\n[]\n```").unwrap_err();
        assert!(matches!(err, StudyBoxError::MalformedResponse(_)));
    }
}
