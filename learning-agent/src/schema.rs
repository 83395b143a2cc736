//! Data contracts for the learning service.
//!
//! Every type is camelCase on the wire and rejects unknown fields. Inbound
//! request types carry `validator` constraints; types produced by a model also
//! derive `JsonSchema` so agents can describe the expected output.

use std::collections::{BTreeMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

pub const DEFAULT_INSIGHT_COUNT: u8 = 6;
pub const UNKNOWN_TOPIC: &str = "Unknown Topic";

/// Upper bound on [`Insight::title`], in characters.
pub const INSIGHT_TITLE_MAX_CHARS: usize = 100;

/// The first `max` characters of `text`, cut on a char boundary.
pub fn clip_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
}

/// Pedagogical focus of an adaptation plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdaptationFocus {
    ReinforceWeaknesses,
    ExploreStrengths,
    #[default]
    MaintainPace,
    Accelerate,
}

// ---------------------------------------------------------------------------
// Performance data
// ---------------------------------------------------------------------------

/// An answer from an initial assessment. Correctness is unknown at this point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = "validate_question_id"))]
pub struct AssessmentAnswer {
    pub question_id: i64,
    #[validate(length(min = 3, max = 500))]
    pub question_text: String,
    #[validate(custom = "validate_option_lengths")]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 120))]
    pub selected_answer: String,
}

/// A graded answer to an insight question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserAnswerDetail {
    pub question_id: i64,
    pub question_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub selected_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InsightPerformance {
    pub insight_id: i64,
    pub insight_title: String,
    #[serde(default)]
    pub questions_answered: Vec<UserAnswerDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times_shown: Option<u32>,
}

/// Learner performance for one topic, as sent by the platform.
///
/// Every field is optional; the analysis stage only runs when there is
/// something to analyze (see [`PerformanceSnapshot::has_assessment_answers`]
/// and [`PerformanceSnapshot::has_insight_performance`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PerformanceSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_level: Option<i32>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    #[validate]
    pub assessment_answers: Vec<AssessmentAnswer>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub insights_performance: Vec<InsightPerformance>,
}

impl PerformanceSnapshot {
    pub fn has_assessment_answers(&self) -> bool {
        !self.assessment_answers.is_empty()
    }

    pub fn has_insight_performance(&self) -> bool {
        !self.insights_performance.is_empty()
    }
}

/// Optional lists arrive as `null` from some clients.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Derived, request-scoped values
// ---------------------------------------------------------------------------

/// Summary of a learner's strengths and weaknesses in one context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProficiencyProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_context: Option<String>,
    /// Free-text band such as Beginner, Intermediate or Advanced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 50))]
    pub overall_understanding_level: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_observations: Option<String>,
}

/// Instructions steering insight generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdaptationPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_topic_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_level: Option<i32>,
    #[serde(default)]
    pub focus: AdaptationFocus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_instructions_for_insight_generation: Option<String>,
    #[serde(default = "default_insight_count")]
    #[validate(range(min = 6, max = 10))]
    pub number_of_insights_to_generate: u8,
}

fn default_insight_count() -> u8 {
    DEFAULT_INSIGHT_COUNT
}

impl AdaptationPlan {
    /// Plan used when no performance data exists or analysis fails.
    pub fn standard(topic: &str, level: i32) -> Self {
        Self {
            next_topic_name: Some(topic.to_string()),
            next_level: Some(level),
            focus: AdaptationFocus::MaintainPace,
            specific_instructions_for_insight_generation: Some(format!(
                "Generate standard introductory insights for {} at level {}.",
                topic, level
            )),
            number_of_insights_to_generate: DEFAULT_INSIGHT_COUNT,
        }
    }
}

// ---------------------------------------------------------------------------
// Generated content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = "validate_correct_answer"))]
pub struct Question {
    pub question_type: QuestionType,
    #[validate(length(min = 5, max = 500))]
    pub question_text: String,
    #[validate(length(min = 1))]
    pub options: Vec<String>,
    pub correct_answer: String,
    /// Feedback text keyed by option.
    #[serde(default)]
    pub answer_feedbacks: BTreeMap<String, String>,
}

/// A short self-contained learning unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Insight {
    #[validate(length(min = 3, max = 100))]
    pub title: String,
    #[validate(length(min = 100, max = 5000))]
    pub explanation: String,
    #[serde(default)]
    pub ai_metadata: BTreeMap<String, Value>,
    #[serde(default)]
    #[validate]
    pub questions: Vec<Question>,
}

/// Ordered curriculum for a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LearningPath {
    pub domain_name: String,
    #[validate(length(min = 10, max = 20), custom = "validate_unique_topics")]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Review {
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LearningPathRequest {
    pub domain_name: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    #[validate]
    pub user_topic_performance_data: Option<PerformanceSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InsightsRequest {
    pub domain_name: String,
    pub topic_name: String,
    pub level: i32,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    #[validate]
    pub user_topic_performance_data: Option<PerformanceSnapshot>,
}

/// A candidate in a next-insight selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InsightCandidate {
    pub insight_id: i64,
    #[validate(length(min = 3, max = 120))]
    pub title: String,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub times_shown: Option<u32>,
}

impl InsightCandidate {
    pub fn relevance(&self) -> f64 {
        self.relevance_score.unwrap_or(0.0)
    }

    pub fn shown(&self) -> u32 {
        self.times_shown.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NextInsightRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub topic_progress_id: Option<i64>,
    #[validate]
    pub uncompleted_insights: Vec<InsightCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NextInsightResponse {
    pub insight_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub topic_progress_id: Option<i64>,
    #[validate(custom = "validate_non_empty_map")]
    pub performance_data: BTreeMap<String, Value>,
}

impl ReviewRequest {
    /// `topicName` from the performance data. Numbers and booleans are
    /// stringified; missing, blank or structured values give [`UNKNOWN_TOPIC`].
    pub fn topic_name(&self) -> String {
        match self.performance_data.get("topicName") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => UNKNOWN_TOPIC.to_string(),
        }
    }

    /// `level` from the performance data, accepting numbers and numeric
    /// strings; anything else yields 1.
    pub fn level(&self) -> i32 {
        match self.performance_data.get("level") {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .and_then(|l| i32::try_from(l).ok())
                .unwrap_or(1),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(1),
            _ => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Custom validators
// ---------------------------------------------------------------------------

fn validate_question_id(answer: &AssessmentAnswer) -> Result<(), ValidationError> {
    if answer.question_id > 0 {
        return Ok(());
    }
    let mut err = ValidationError::new("range");
    err.message = Some("questionId must be greater than 0".into());
    Err(err)
}

#[allow(clippy::ptr_arg)]
fn validate_option_lengths(options: &Vec<String>) -> Result<(), ValidationError> {
    for option in options {
        let len = option.chars().count();
        if !(1..=120).contains(&len) {
            let mut err = ValidationError::new("length");
            err.message = Some("each option must be 1 to 120 characters".into());
            return Err(err);
        }
    }
    Ok(())
}

#[allow(clippy::ptr_arg)]
fn validate_unique_topics(topics: &Vec<String>) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(topics.len());
    for topic in topics {
        if topic.trim().is_empty() {
            let mut err = ValidationError::new("empty_topic");
            err.message = Some("topic names must not be blank".into());
            return Err(err);
        }
        if !seen.insert(topic.trim().to_lowercase()) {
            let mut err = ValidationError::new("duplicate_topic");
            err.message = Some(format!("topic '{}' appears more than once", topic).into());
            return Err(err);
        }
    }
    Ok(())
}

fn validate_correct_answer(question: &Question) -> Result<(), ValidationError> {
    if question.options.iter().any(|o| o == &question.correct_answer) {
        return Ok(());
    }
    let mut err = ValidationError::new("correct_answer");
    err.message = Some(
        format!(
            "correctAnswer '{}' is not one of the options",
            question.correct_answer
        )
        .into(),
    );
    Err(err)
}

fn validate_non_empty_map(map: &BTreeMap<String, Value>) -> Result<(), ValidationError> {
    if map.is_empty() {
        let mut err = ValidationError::new("empty");
        err.message = Some("performanceData must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn long_text(n: usize) -> String {
        "x".repeat(n)
    }

    fn question(correct: &str) -> Question {
        Question {
            question_type: QuestionType::MultipleChoice,
            question_text: "Which one is right?".to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            correct_answer: correct.to_string(),
            answer_feedbacks: BTreeMap::new(),
        }
    }

    #[test]
    fn test_plan_defaults_when_fields_missing() {
        let plan: AdaptationPlan = serde_json::from_value(json!({})).unwrap();
        assert_eq!(plan.focus, AdaptationFocus::MaintainPace);
        assert_eq!(plan.number_of_insights_to_generate, 6);
        assert!(plan.next_topic_name.is_none());
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_plan_insight_count_bounds() {
        let plan: AdaptationPlan =
            serde_json::from_value(json!({"numberOfInsightsToGenerate": 11})).unwrap();
        assert!(plan.validate().is_err());

        let plan: AdaptationPlan = serde_json::from_value(
            json!({"focus": "REINFORCE_WEAKNESSES", "numberOfInsightsToGenerate": 10}),
        )
        .unwrap();
        assert_eq!(plan.focus, AdaptationFocus::ReinforceWeaknesses);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_standard_plan() {
        let plan = AdaptationPlan::standard("Rust Ownership", 2);
        assert_eq!(plan.next_topic_name.as_deref(), Some("Rust Ownership"));
        assert_eq!(plan.next_level, Some(2));
        assert_eq!(plan.focus, AdaptationFocus::MaintainPace);
        assert_eq!(
            plan.specific_instructions_for_insight_generation.as_deref(),
            Some("Generate standard introductory insights for Rust Ownership at level 2.")
        );
    }

    #[test]
    fn test_question_correct_answer_must_be_an_option() {
        assert!(question("A").validate().is_ok());
        assert!(question("C").validate().is_err());
    }

    #[test]
    fn test_insight_explanation_length() {
        let mut insight = Insight {
            title: "Borrowing".to_string(),
            explanation: long_text(99),
            ai_metadata: BTreeMap::new(),
            questions: vec![],
        };
        assert!(insight.validate().is_err());

        insight.explanation = long_text(100);
        assert!(insight.validate().is_ok());

        insight.questions.push(question("nope"));
        assert!(insight.validate().is_err());
    }

    #[test]
    fn test_learning_path_topic_count_and_uniqueness() {
        let topics: Vec<String> = (1..=10).map(|i| format!("Topic {}", i)).collect();
        let mut path = LearningPath {
            domain_name: "Python".to_string(),
            topics,
        };
        assert!(path.validate().is_ok());

        path.topics[9] = "topic 1".to_string();
        assert!(path.validate().is_err());

        path.topics.truncate(9);
        assert!(path.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<LearningPathRequest, _> =
            serde_json::from_value(json!({"domainName": "Python", "extra": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_snapshot_presence_checks() {
        let snapshot: PerformanceSnapshot = serde_json::from_value(json!({
            "assessmentAnswers": [],
            "insightsPerformance": [{"insightId": 1, "insightTitle": "Loops"}]
        }))
        .unwrap();
        assert!(!snapshot.has_assessment_answers());
        assert!(snapshot.has_insight_performance());
        assert!(!PerformanceSnapshot::default().has_insight_performance());
    }

    #[test]
    fn test_assessment_answer_constraints() {
        let answer: AssessmentAnswer = serde_json::from_value(json!({
            "questionId": 0,
            "questionText": "What is a closure?",
            "options": ["A function", ""],
            "selectedAnswer": "A function"
        }))
        .unwrap();
        let errors = answer.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("__all__"));
        assert!(fields.contains_key("options"));
    }

    #[test]
    fn test_review_request_topic_and_level() {
        let request: ReviewRequest = serde_json::from_value(json!({
            "performanceData": {"topicName": "Sorting", "level": "3"}
        }))
        .unwrap();
        assert_eq!(request.topic_name(), "Sorting");
        assert_eq!(request.level(), 3);

        let request: ReviewRequest =
            serde_json::from_value(json!({"performanceData": {"score": 0.4}})).unwrap();
        assert_eq!(request.topic_name(), UNKNOWN_TOPIC);
        assert_eq!(request.level(), 1);
    }

    #[test]
    fn test_review_request_stringifies_scalar_topic() {
        let request: ReviewRequest =
            serde_json::from_value(json!({"performanceData": {"topicName": 5}})).unwrap();
        assert_eq!(request.topic_name(), "5");

        let request: ReviewRequest =
            serde_json::from_value(json!({"performanceData": {"topicName": ["a"]}})).unwrap();
        assert_eq!(request.topic_name(), UNKNOWN_TOPIC);

        let request: ReviewRequest =
            serde_json::from_value(json!({"performanceData": {"topicName": "  "}})).unwrap();
        assert_eq!(request.topic_name(), UNKNOWN_TOPIC);
    }

    #[test]
    fn test_clip_chars_respects_char_boundaries() {
        assert_eq!(clip_chars("ownership", 5), "owner");
        assert_eq!(clip_chars("short", 50), "short");
        assert_eq!(clip_chars("ééé", 2), "éé");
        assert_eq!(clip_chars("", 3), "");
    }

    #[test]
    fn test_review_request_requires_performance_data() {
        let request: ReviewRequest =
            serde_json::from_value(json!({"performanceData": {}})).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_insight_wire_shape() {
        let insight = Insight {
            title: "Iterators".to_string(),
            explanation: long_text(120),
            ai_metadata: BTreeMap::from([("mode".to_string(), json!("mock"))]),
            questions: vec![Question {
                question_type: QuestionType::TrueFalse,
                question_text: "Iterators are lazy.".to_string(),
                options: vec!["True".to_string(), "False".to_string()],
                correct_answer: "True".to_string(),
                answer_feedbacks: BTreeMap::new(),
            }],
        };

        let value = serde_json::to_value(&insight).unwrap();
        assert_eq!(value["aiMetadata"]["mode"], "mock");
        assert_eq!(value["questions"][0]["questionType"], "TRUE_FALSE");
        assert_eq!(value["questions"][0]["correctAnswer"], "True");

        let back: Insight = serde_json::from_value(value).unwrap();
        assert_eq!(back, insight);
    }

    fn round_trip<T>(value: &T) -> (Value, T)
    where
        T: Serialize + serde::de::DeserializeOwned,
    {
        let wire = serde_json::to_value(value).unwrap();
        let back = serde_json::from_value(wire.clone()).unwrap();
        (wire, back)
    }

    #[test]
    fn test_learning_path_round_trip() {
        let path = LearningPath {
            domain_name: "Statistics".to_string(),
            topics: (1..=12).map(|i| format!("Unit {}", i)).collect(),
        };
        let (wire, back) = round_trip(&path);
        assert_eq!(wire["domainName"], "Statistics");
        assert_eq!(wire["topics"][11], "Unit 12");
        assert_eq!(back, path);
    }

    #[test]
    fn test_review_round_trip() {
        let review = Review {
            summary: "Strong grasp of sorting.".to_string(),
            strengths: vec!["merge sort".to_string()],
            weaknesses: vec!["heap invariants".to_string(), "stability".to_string()],
        };
        let (wire, back) = round_trip(&review);
        assert_eq!(wire["weaknesses"][1], "stability");
        assert_eq!(back, review);
    }

    #[test]
    fn test_next_insight_response_round_trip() {
        let response = NextInsightResponse { insight_id: 42 };
        let (wire, back) = round_trip(&response);
        assert_eq!(wire, json!({"insightId": 42}));
        assert_eq!(back, response);
    }

    #[test]
    fn test_question_round_trip_keeps_feedback() {
        let mut q = question("B");
        q.answer_feedbacks = BTreeMap::from([
            ("A".to_string(), "Close, but A copies the value.".to_string()),
            ("B".to_string(), "Right, B moves it.".to_string()),
        ]);
        let (wire, back) = round_trip(&q);
        assert_eq!(wire["questionType"], "MULTIPLE_CHOICE");
        assert_eq!(wire["answerFeedbacks"]["B"], "Right, B moves it.");
        assert_eq!(back, q);
    }
}
