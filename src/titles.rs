//! Title lists (genres, recommended games) are stored as JSON text.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// An incoming title list: a JSON array of strings, or a string that itself
/// holds one. Any other shape is rejected by `into_titles`.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct TitlesInput(Value);

impl TitlesInput {
    pub fn into_titles(self, field: &str) -> Result<Vec<String>, ApiError> {
        let parsed = match self.0 {
            Value::String(raw) => serde_json::from_str::<Vec<String>>(&raw),
            other => serde_json::from_value::<Vec<String>>(other),
        };
        parsed.map_err(|_| ApiError::BadRequest(format!("{field} must be a JSON array of strings")))
    }

    /// Normalizes the input to the stored JSON encoding.
    pub fn encode(self, field: &str) -> Result<String, ApiError> {
        let titles = self.into_titles(field)?;
        serde_json::to_string(&titles).map_err(|e| ApiError::Internal(e.into()))
    }
}

/// Decodes a stored list; absent or malformed JSON reads as empty.
pub fn decode(stored: Option<&str>) -> Vec<String> {
    stored
        .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> TitlesInput {
        serde_json::from_value(value).expect("deserialize titles input")
    }

    #[test]
    fn list_input_keeps_order() {
        let encoded = input(json!(["RPG", "Action"])).encode("genre_titles").unwrap();
        assert_eq!(encoded, r#"["RPG","Action"]"#);
        assert_eq!(decode(Some(&encoded)), vec!["RPG", "Action"]);
    }

    #[test]
    fn string_input_must_be_strict_json() {
        let titles = input(json!(r#"["Portal 2", "Hades"]"#))
            .into_titles("recommendation_titles")
            .unwrap();
        assert_eq!(titles, vec!["Portal 2", "Hades"]);

        let err = input(json!("['RPG', 'Action']"))
            .into_titles("genre_titles")
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = input(json!("__import__('os')")).encode("genre_titles").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn non_string_lists_name_the_field() {
        for value in [json!(42), json!([1, 2]), json!({"a": "b"}), json!(null)] {
            match input(value).into_titles("genre_titles") {
                Err(ApiError::BadRequest(msg)) => {
                    assert_eq!(msg, "genre_titles must be a JSON array of strings")
                }
                other => panic!("expected bad request, got {other:?}"),
            }
        }
    }

    #[test]
    fn decode_falls_back_to_empty() {
        assert!(decode(None).is_empty());
        assert!(decode(Some("not json")).is_empty());
        assert!(decode(Some(r#"{"a":1}"#)).is_empty());
    }
}
