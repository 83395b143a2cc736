//! Parsing and validation of model output.
//!
//! Models wrap JSON in reasoning blocks and Markdown fences often enough that
//! the raw content is normalized before it reaches serde.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::schema::{AdaptationPlan, Insight, LearningPath, ProficiencyProfile, Question, Review};

/// Why a model response was rejected.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OutputError {
    #[error("response is empty")]
    Empty,

    #[error("response is not valid JSON: {0}")]
    Json(String),

    #[error("response does not match the expected shape: {0}")]
    Shape(String),

    #[error("response failed validation: {0}")]
    Invalid(String),
}

impl From<ValidationErrors> for OutputError {
    fn from(errors: ValidationErrors) -> Self {
        OutputError::Invalid(errors.to_string())
    }
}

/// A type an agent can be asked to produce.
pub trait AgentOutput: Sized + Send + 'static {
    /// JSON Schema embedded in the agent's instructions.
    fn output_schema() -> Value;

    /// Convert an already decoded JSON document into a validated value.
    fn from_value(value: Value) -> Result<Self, OutputError>;

    /// Parse raw model content.
    fn parse(content: &str) -> Result<Self, OutputError> {
        let json = extract_json(content)?;
        let value: Value =
            serde_json::from_str(json).map_err(|e| OutputError::Json(e.to_string()))?;
        Self::from_value(value)
    }
}

fn decode<T: DeserializeOwned + Validate>(value: Value) -> Result<T, OutputError> {
    let parsed: T = serde_json::from_value(value).map_err(|e| OutputError::Shape(e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null)
}

macro_rules! single_output {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AgentOutput for $ty {
                fn output_schema() -> Value {
                    schema_value::<$ty>()
                }

                fn from_value(value: Value) -> Result<Self, OutputError> {
                    decode(value)
                }
            }
        )*
    };
}

single_output!(ProficiencyProfile, AdaptationPlan, LearningPath, Review);

/// Envelope for list outputs; JSON-object response mode cannot return a bare
/// array.
#[derive(Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[allow(dead_code)]
struct Items<T> {
    items: Vec<T>,
}

fn decode_list<T: DeserializeOwned + Validate>(value: Value) -> Result<Vec<T>, OutputError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) if map.is_empty() => items,
            _ => {
                return Err(OutputError::Shape(
                    "expected an object with a single \"items\" array".to_string(),
                ))
            }
        },
        other => {
            return Err(OutputError::Shape(format!(
                "expected an array, got {}",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            decode::<T>(item).map_err(|e| match e {
                OutputError::Shape(msg) => OutputError::Shape(format!("items[{}]: {}", i, msg)),
                OutputError::Invalid(msg) => OutputError::Invalid(format!("items[{}]: {}", i, msg)),
                other => other,
            })
        })
        .collect()
}

impl AgentOutput for Vec<Insight> {
    fn output_schema() -> Value {
        schema_value::<Items<Insight>>()
    }

    fn from_value(value: Value) -> Result<Self, OutputError> {
        decode_list(value)
    }
}

impl AgentOutput for Vec<Question> {
    fn output_schema() -> Value {
        schema_value::<Items<Question>>()
    }

    fn from_value(value: Value) -> Result<Self, OutputError> {
        decode_list(value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Strip reasoning blocks and code fences, returning the JSON payload.
pub fn extract_json(content: &str) -> Result<&str, OutputError> {
    let mut text = content.trim();

    // Reasoning models emit <think>...</think> ahead of the answer.
    if let Some(end) = text.rfind("</think>") {
        text = text[end + "</think>".len()..].trim();
    }

    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        text = rest.trim_start();
        if let Some(end) = text.rfind("```") {
            text = text[..end].trim();
        }
    }

    if text.is_empty() {
        return Err(OutputError::Empty);
    }

    // Tolerate prose around a single JSON document.
    if !text.starts_with('{') && !text.starts_with('[') {
        let start = text.find(&['{', '['][..]);
        let end = text.rfind(&['}', ']'][..]);
        if let (Some(start), Some(end)) = (start, end) {
            if start < end {
                return Ok(&text[start..=end]);
            }
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question_json(correct: &str) -> Value {
        json!({
            "questionType": "MULTIPLE_CHOICE",
            "questionText": "Which keyword moves a value?",
            "options": ["move", "copy"],
            "correctAnswer": correct,
            "answerFeedbacks": {"move": "Right", "copy": "No"}
        })
    }

    #[test]
    fn test_extract_json_strips_fences_and_thinking() {
        let raw = "<think>plan the answer</think>\n```json\n{\"summary\": \"ok\"}\n```";
        assert_eq!(extract_json(raw).unwrap(), "{\"summary\": \"ok\"}");

        let prose = "Here you go: {\"a\": 1} hope it helps";
        assert_eq!(extract_json(prose).unwrap(), "{\"a\": 1}");

        assert!(matches!(extract_json("  \n"), Err(OutputError::Empty)));
    }

    #[test]
    fn test_parse_review() {
        let review = Review::parse(r#"{"summary": "Good", "strengths": ["loops"]}"#).unwrap();
        assert_eq!(review.summary, "Good");
        assert_eq!(review.strengths, vec!["loops"]);
        assert!(review.weaknesses.is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_fields_and_bad_json() {
        assert!(matches!(
            Review::parse(r#"{"summary": "x", "score": 3}"#),
            Err(OutputError::Shape(_))
        ));
        assert!(matches!(
            Review::parse(r#"{"summary": "#),
            Err(OutputError::Json(_))
        ));
    }

    #[test]
    fn test_list_accepts_envelope_and_bare_array() {
        let envelope = json!({"items": [question_json("move")]}).to_string();
        let bare = json!([question_json("copy")]).to_string();

        assert_eq!(Vec::<Question>::parse(&envelope).unwrap().len(), 1);
        assert_eq!(Vec::<Question>::parse(&bare).unwrap()[0].correct_answer, "copy");
    }

    #[test]
    fn test_list_reports_failing_item() {
        let content = json!({"items": [question_json("move"), question_json("borrow")]}).to_string();
        match Vec::<Question>::parse(&content) {
            Err(OutputError::Invalid(msg)) => assert!(msg.starts_with("items[1]")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_output_schema_describes_wire_names() {
        let schema = Vec::<Insight>::output_schema().to_string();
        assert!(schema.contains("\"items\""));
        assert!(schema.contains("aiMetadata"));
        assert!(schema.contains("questionType"));

        let plan = AdaptationPlan::output_schema().to_string();
        assert!(plan.contains("numberOfInsightsToGenerate"));
        assert!(plan.contains("REINFORCE_WEAKNESSES"));
    }
}
