use serde::de::DeserializeOwned;

use crate::error::{LlmError, LlmResult};

/// Locate the outermost JSON object in a completion.
///
/// Models frequently wrap the object in a ```json fence or a sentence of prose;
/// this takes everything from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Extract and deserialize the JSON object in a completion.
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> LlmResult<T> {
    let json = extract_json_object(text).ok_or_else(|| {
        let preview: String = text.chars().take(200).collect();
        LlmError::InvalidResponse(format!("no JSON object in reply: {}", preview))
    })?;
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        sentiment: String,
        confidence: f64,
    }

    #[test]
    fn test_plain_object() {
        let reply: Reply = parse_json_reply(r#"{"sentiment": "positive", "confidence": 0.9}"#).unwrap();
        assert_eq!(reply.sentiment, "positive");
    }

    #[test]
    fn test_fenced_object() {
        let text = "```json\n{\"sentiment\": \"negative\", \"confidence\": 0.4}\n```";
        let reply: Reply = parse_json_reply(text).unwrap();
        assert_eq!(reply, Reply { sentiment: "negative".into(), confidence: 0.4 });
    }

    #[test]
    fn test_prose_around_object() {
        let text = "Sure! Here is the analysis: {\"sentiment\": \"neutral\", \"confidence\": 0.5} Hope it helps.";
        assert!(parse_json_reply::<Reply>(text).is_ok());
    }

    #[test]
    fn test_no_object() {
        assert!(extract_json_object("I cannot help with that").is_none());
        assert!(extract_json_object("} backwards {").is_none());
        assert!(matches!(
            parse_json_reply::<Reply>("nothing here"),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_wrong_shape() {
        assert!(matches!(
            parse_json_reply::<Reply>(r#"{"label": "positive"}"#),
            Err(LlmError::Serialization(_))
        ));
    }
}
