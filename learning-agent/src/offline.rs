//! Deterministic content for running without model access.
//!
//! Used for local development and demos: every operation succeeds instantly
//! and returns the same output for the same input.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::engine::{LearningEngine, PipelineError};
use crate::schema::{
    clip_chars, Insight, InsightsRequest, LearningPath, LearningPathRequest, Question,
    QuestionType, Review, ReviewRequest, INSIGHT_TITLE_MAX_CHARS,
};

const PATH_STAGES: [&str; 10] = [
    "Foundations",
    "Key Concepts",
    "Core Techniques",
    "Guided Practice",
    "Common Pitfalls",
    "Real-World Application",
    "Deep Dive",
    "Project Workshop",
    "Reflection and Review",
    "Next Steps",
];

const STEP_SUFFIX_CHARS: usize = ": Step 10".len();

/// Engine returning canned content.
#[derive(Debug, Default, Clone)]
pub struct OfflineEngine;

impl OfflineEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn learning_path(domain: &str) -> LearningPath {
        LearningPath {
            domain_name: domain.to_string(),
            topics: PATH_STAGES
                .iter()
                .map(|stage| format!("{} - {}", domain, stage))
                .collect(),
        }
    }

    pub fn questions(topic: &str) -> Vec<Question> {
        let topic = clip_chars(topic, INSIGHT_TITLE_MAX_CHARS);
        let options = [
            "It introduces the core idea",
            "It is unrelated background information",
            "It lists tools only",
            "It summarises the entire course",
        ];
        let feedback = [
            "Correct, the insight is built around one central idea.",
            "The background supports the main idea rather than replacing it.",
            "Tools come later; this step sets up the idea first.",
            "The insight zooms in on one concept, not the whole course.",
        ];

        let multiple_choice = Question {
            question_type: QuestionType::MultipleChoice,
            question_text: format!("Which statement best captures the key lesson from '{}'?", topic),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: options[0].to_string(),
            answer_feedbacks: options
                .iter()
                .zip(feedback)
                .map(|(o, f)| (o.to_string(), f.to_string()))
                .collect(),
        };

        let true_false = Question {
            question_type: QuestionType::TrueFalse,
            question_text: format!(
                "True or False: Practising the ideas from '{}' in short sessions helps build confidence.",
                topic
            ),
            options: vec!["True".to_string(), "False".to_string()],
            correct_answer: "True".to_string(),
            answer_feedbacks: BTreeMap::from([
                ("True".to_string(), "Short, deliberate practice reinforces new ideas.".to_string()),
                ("False".to_string(), "Small practice blocks are the recommended way to consolidate.".to_string()),
            ]),
        };

        vec![multiple_choice, true_false]
    }

    pub fn insights(domain: &str, topic: &str, level: i32) -> Vec<Insight> {
        // Room for the ": Step n" suffix.
        let topic = clip_chars(topic, INSIGHT_TITLE_MAX_CHARS - STEP_SUFFIX_CHARS);
        let steps = [
            format!(
                "Start with the core vocabulary of {}. Repeat short examples until the mechanics feel natural, then add complexity.",
                topic
            ),
            "Connect the idea to something you already know. A good analogy frees working memory and makes the new concept stick."
                .to_string(),
            "Finish by explaining the topic aloud in your own words. Teaching it, even to yourself, exposes gaps before the next level."
                .to_string(),
        ];

        steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let n = i + 1;
                Insight {
                    title: format!("{}: Step {}", topic, n),
                    explanation: format!(
                        "Level {} insight {} for {} is about deliberate practice. {} Reading this takes about a minute and prepares you for the next activity.",
                        level, n, topic, step
                    ),
                    ai_metadata: BTreeMap::from([
                        ("mode".to_string(), json!("mock")),
                        ("level".to_string(), json!(level)),
                        ("domain".to_string(), json!(domain)),
                    ]),
                    questions: Self::questions(topic),
                }
            })
            .collect()
    }

    pub fn review(topic: &str, level: i32) -> Review {
        Review {
            summary: format!(
                "You reviewed {} at level {} by revisiting the core idea, applying it in a short exercise and restating it in your own words. \
                 Keeping this rhythm lets long-term memory consolidate the new patterns.",
                topic, level
            ),
            strengths: vec![
                format!("Consistent engagement with {}", topic),
                "Reflects after every session".to_string(),
            ],
            weaknesses: vec![
                "Pause for a quick self-test before moving on".to_string(),
                "Write down one actionable takeaway per study block".to_string(),
            ],
        }
    }
}

#[async_trait]
impl LearningEngine for OfflineEngine {
    fn mode(&self) -> &'static str {
        "offline"
    }

    async fn generate_learning_path(
        &self,
        request: &LearningPathRequest,
    ) -> Result<LearningPath, PipelineError> {
        debug!(domain = %request.domain_name, "Serving offline learning path");
        Ok(Self::learning_path(&request.domain_name))
    }

    async fn generate_insights(&self, request: &InsightsRequest) -> Result<Vec<Insight>, PipelineError> {
        debug!(topic = %request.topic_name, "Serving offline insights");
        Ok(Self::insights(&request.domain_name, &request.topic_name, request.level))
    }

    async fn generate_review(&self, request: &ReviewRequest) -> Result<Review, PipelineError> {
        Ok(Self::review(&request.topic_name(), request.level()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_offline_learning_path_is_valid() {
        let path = OfflineEngine::learning_path("Python");
        assert_eq!(path.topics.len(), 10);
        assert_eq!(path.topics[0], "Python - Foundations");
        assert_eq!(path.topics[9], "Python - Next Steps");
        assert!(path.validate().is_ok());
    }

    #[test]
    fn test_offline_insights_are_valid() {
        let insights = OfflineEngine::insights("Languages", "Spanish Greetings", 2);
        assert_eq!(insights.len(), 3);
        for (i, insight) in insights.iter().enumerate() {
            assert_eq!(insight.title, format!("Spanish Greetings: Step {}", i + 1));
            assert_eq!(insight.ai_metadata["mode"], "mock");
            assert_eq!(insight.ai_metadata["level"], 2);
            assert_eq!(insight.questions.len(), 2);
            assert!(insight.validate().is_ok(), "{:?}", insight.validate());
        }
    }

    #[test]
    fn test_offline_insights_clip_long_topics() {
        for topic in ["t".repeat(120), "é".repeat(120)] {
            for insight in OfflineEngine::insights("Rust", &topic, 1) {
                assert!(insight.title.chars().count() <= 100, "{}", insight.title);
                assert!(insight.validate().is_ok(), "{:?}", insight.validate());
            }
        }
    }

    #[tokio::test]
    async fn test_offline_review_uses_performance_data() {
        let request: ReviewRequest = serde_json::from_value(json!({
            "performanceData": {"topicName": "Fractions", "level": 4}
        }))
        .unwrap();

        let review = OfflineEngine::new().generate_review(&request).await.unwrap();
        assert!(review.summary.starts_with("You reviewed Fractions at level 4"));
        assert_eq!(review.strengths.len(), 2);
        assert_eq!(review.weaknesses.len(), 2);
    }
}
