//! Adaptive content-generation pipeline.
//!
//! ```text
//!  performance data ──► Analyzer ──► Planner ──► InsightWriter ──► QuestionWriter (per insight)
//!         │                │            │              │
//!         │ (absent)       │ (fails)    │ (fails)      │ (empty)
//!         ▼                ▼            ▼              ▼
//!     standard plan ◄──────┴────────────┘       "Key Concepts of {topic}"
//! ```
//!
//! Stages run strictly in order within a request. The only fan-out is
//! question enrichment, which runs one call per insight concurrently and keeps
//! failures local to the insight.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agent::{Agent, AgentConfig};
use crate::chain::FallbackChain;
use crate::engine::{LearningEngine, PipelineError};
use crate::prompts::AgentRole;
use crate::schema::{
    clip_chars, AdaptationPlan, Insight, InsightsRequest, LearningPath, LearningPathRequest,
    PerformanceSnapshot, ProficiencyProfile, Question, Review, ReviewRequest,
    INSIGHT_TITLE_MAX_CHARS,
};

/// The six agents a pipeline drives.
pub struct Agents {
    pub analyzer: Agent<ProficiencyProfile>,
    pub planner: Agent<AdaptationPlan>,
    pub curriculum: Agent<LearningPath>,
    pub insight_writer: Agent<Vec<Insight>>,
    pub question_writer: Agent<Vec<Question>>,
    pub reviewer: Agent<Review>,
}

impl Agents {
    /// Planner and Curriculum use `planning`; everything else uses `content`.
    pub fn new(planning: Arc<FallbackChain>, content: Arc<FallbackChain>, config: AgentConfig) -> Self {
        Self {
            analyzer: Agent::new(AgentRole::Analyzer, content.clone(), config.clone()),
            planner: Agent::new(AgentRole::Planner, planning.clone(), config.clone()),
            curriculum: Agent::new(AgentRole::Curriculum, planning, config.clone()),
            insight_writer: Agent::new(AgentRole::InsightWriter, content.clone(), config.clone()),
            question_writer: Agent::new(AgentRole::QuestionWriter, content.clone(), config.clone()),
            reviewer: Agent::new(AgentRole::Reviewer, content, config),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzerInput<'a> {
    #[serde(flatten)]
    performance: &'a PerformanceSnapshot,
    analyzed_context: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlannerInput<'a> {
    user_proficiency_profile: &'a ProficiencyProfile,
    current_topic_name: &'a str,
    current_level: i32,
    domain_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CurriculumInput<'a> {
    domain_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_proficiency_profile: Option<&'a ProficiencyProfile>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsightWriterInput<'a> {
    domain_name: &'a str,
    topic_name: &'a str,
    level: i32,
    user_id: Option<i64>,
    content_adaptation_plan: &'a AdaptationPlan,
}

#[derive(Serialize)]
struct QuestionWriterInput<'a> {
    title: &'a str,
    explanation: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewerInput<'a> {
    topic_name: &'a str,
    level: i32,
    performance_data: &'a BTreeMap<String, Value>,
}

const FALLBACK_TITLE_PREFIX: &str = "Key Concepts of ";

/// Insight returned when the writer produces nothing. Long topic names are
/// clipped so the title stays within bounds.
pub fn fallback_insight(topic: &str) -> Insight {
    let topic = clip_chars(topic, INSIGHT_TITLE_MAX_CHARS - FALLBACK_TITLE_PREFIX.len());
    Insight {
        title: format!("{}{}", FALLBACK_TITLE_PREFIX, topic),
        explanation: format!(
            "Understanding {} is important. This section will cover fundamental aspects. \
             Ensure to review related materials if needed.",
            topic
        ),
        ai_metadata: BTreeMap::new(),
        questions: Vec::new(),
    }
}

/// Live pipeline over hosted models.
pub struct LearningPipeline {
    agents: Agents,
}

impl LearningPipeline {
    pub fn new(agents: Agents) -> Self {
        Self { agents }
    }

    /// Analyzer then Planner. `None` means the standard plan applies.
    async fn adapt(
        &self,
        request: &InsightsRequest,
        performance: &PerformanceSnapshot,
    ) -> Option<AdaptationPlan> {
        let snapshot = PerformanceSnapshot {
            user_id: request.user_id.or(performance.user_id),
            domain_name: Some(request.domain_name.clone()),
            topic_name: Some(request.topic_name.clone()),
            current_level: Some(request.level),
            ..performance.clone()
        };
        let input = AnalyzerInput {
            performance: &snapshot,
            analyzed_context: format!("Topic {}, Level {}", request.topic_name, request.level),
        };

        let profile = match self.agents.analyzer.run(&input).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Analysis failed, using standard plan");
                return None;
            }
        };

        let input = PlannerInput {
            user_proficiency_profile: &profile,
            current_topic_name: &request.topic_name,
            current_level: request.level,
            domain_name: &request.domain_name,
        };

        match self.agents.planner.run(&input).await {
            Ok(plan) => {
                debug!(focus = ?plan.focus, count = plan.number_of_insights_to_generate, "Adaptation plan ready");
                Some(plan)
            }
            Err(e) => {
                warn!(error = %e, "Planning failed, using standard plan");
                None
            }
        }
    }

    /// Attach generated questions to `insight`; on failure it gets none.
    pub async fn enrich_insight(&self, mut insight: Insight) -> Insight {
        let input = QuestionWriterInput {
            title: &insight.title,
            explanation: &insight.explanation,
        };

        match self.agents.question_writer.run(&input).await {
            Ok(questions) => insight.questions = questions,
            Err(e) => {
                warn!(insight = %insight.title, error = %e, "Question generation failed");
                insight.questions = Vec::new();
            }
        }
        insight
    }
}

#[async_trait]
impl LearningEngine for LearningPipeline {
    fn mode(&self) -> &'static str {
        "live"
    }

    async fn generate_learning_path(
        &self,
        request: &LearningPathRequest,
    ) -> Result<LearningPath, PipelineError> {
        let span = info_span!("learning_path", run_id = %Uuid::new_v4(), domain = %request.domain_name);

        async move {
            let assessed = request
                .user_topic_performance_data
                .as_ref()
                .filter(|p| p.has_assessment_answers());

            let profile = match assessed {
                Some(performance) => {
                    let snapshot = PerformanceSnapshot {
                        user_id: request.user_id.or(performance.user_id),
                        domain_name: Some(request.domain_name.clone()),
                        topic_name: None,
                        current_level: None,
                        ..performance.clone()
                    };
                    let input = AnalyzerInput {
                        performance: &snapshot,
                        analyzed_context: format!("InitialAssessment for domain {}", request.domain_name),
                    };
                    match self.agents.analyzer.run(&input).await {
                        Ok(profile) => Some(profile),
                        Err(e) => {
                            warn!(error = %e, "Assessment analysis failed, continuing without profile");
                            None
                        }
                    }
                }
                None => None,
            };

            let input = CurriculumInput {
                domain_name: &request.domain_name,
                user_proficiency_profile: profile.as_ref(),
            };
            let mut path = self.agents.curriculum.run(&input).await?;
            path.domain_name = request.domain_name.clone();

            info!(topics = path.topics.len(), personalized = profile.is_some(), "Learning path generated");
            Ok(path)
        }
        .instrument(span)
        .await
    }

    async fn generate_insights(&self, request: &InsightsRequest) -> Result<Vec<Insight>, PipelineError> {
        let span = info_span!(
            "insights",
            run_id = %Uuid::new_v4(),
            topic = %request.topic_name,
            level = request.level
        );

        async move {
            let performance = request
                .user_topic_performance_data
                .as_ref()
                .filter(|p| p.has_assessment_answers() || p.has_insight_performance());

            let plan = match performance {
                Some(performance) => self.adapt(request, performance).await,
                None => None,
            }
            .unwrap_or_else(|| AdaptationPlan::standard(&request.topic_name, request.level));

            let input = InsightWriterInput {
                domain_name: &request.domain_name,
                topic_name: plan.next_topic_name.as_deref().unwrap_or(&request.topic_name),
                level: plan.next_level.unwrap_or(request.level),
                user_id: request.user_id,
                content_adaptation_plan: &plan,
            };

            let mut insights = self.agents.insight_writer.run(&input).await?;
            if insights.is_empty() {
                warn!("Insight writer returned nothing, using fallback insight");
                insights.push(fallback_insight(&request.topic_name));
            }

            let enriched = join_all(insights.into_iter().map(|i| self.enrich_insight(i))).await;

            info!(
                insights = enriched.len(),
                questions = enriched.iter().map(|i| i.questions.len()).sum::<usize>(),
                "Insights generated"
            );
            Ok(enriched)
        }
        .instrument(span)
        .await
    }

    async fn generate_review(&self, request: &ReviewRequest) -> Result<Review, PipelineError> {
        let topic = request.topic_name();
        let level = request.level();
        let span = info_span!("review", run_id = %Uuid::new_v4(), topic = %topic, level);

        async move {
            let input = ReviewerInput {
                topic_name: &topic,
                level,
                performance_data: &request.performance_data,
            };
            let review = self.agents.reviewer.run(&input).await?;
            info!("Review generated");
            Ok(review)
        }
        .instrument(span)
        .await
    }
}
