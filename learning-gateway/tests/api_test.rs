//! End-to-end tests of the HTTP surface against fake engines.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use learning_agent::chain::ChainExhausted;
use learning_agent::schema::{
    Insight, InsightsRequest, LearningPath, LearningPathRequest, Review, ReviewRequest,
};
use learning_agent::{AgentError, LearningEngine, OfflineEngine, PipelineError};
use learning_gateway::{create_router, AppState};

/// Engine returning fixed content, or failing every call.
#[derive(Default)]
struct FakeEngine {
    fail: bool,
    calls: AtomicU32,
}

impl FakeEngine {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn outcome<T>(&self, value: T) -> Result<T, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PipelineError::Agent(AgentError::ChainExhausted {
                agent: "curriculum",
                source: ChainExhausted {
                    chain: "planning".to_string(),
                    failures: Vec::new(),
                },
            }));
        }
        Ok(value)
    }
}

#[async_trait]
impl LearningEngine for FakeEngine {
    fn mode(&self) -> &'static str {
        "fake"
    }

    async fn generate_learning_path(
        &self,
        request: &LearningPathRequest,
    ) -> Result<LearningPath, PipelineError> {
        self.outcome(LearningPath {
            domain_name: request.domain_name.clone(),
            topics: (1..=10).map(|i| format!("Topic {}", i)).collect(),
        })
    }

    async fn generate_insights(&self, request: &InsightsRequest) -> Result<Vec<Insight>, PipelineError> {
        self.outcome(OfflineEngine::insights(
            &request.domain_name,
            &request.topic_name,
            request.level,
        ))
    }

    async fn generate_review(&self, request: &ReviewRequest) -> Result<Review, PipelineError> {
        self.outcome(OfflineEngine::review(&request.topic_name(), request.level()))
    }
}

async fn call(engine: Arc<FakeEngine>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let app = create_router(AppState::new(engine));

    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(engine: Arc<FakeEngine>, uri: &str, body: Value) -> (StatusCode, Value) {
    call(engine, "POST", uri, Some(body)).await
}

#[tokio::test]
async fn test_root_reports_ok() {
    let (status, body) = call(Arc::default(), "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, body) = call(Arc::default(), "GET", "/api/ai/nothing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Not Found");
}

#[tokio::test]
async fn test_learning_path_success() {
    let (status, body) = post(
        Arc::default(),
        "/api/ai/generate-learning-path",
        json!({"domainName": "Python"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let mut keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["domainName", "topics"]);
    assert_eq!(body["domainName"], "Python");
    assert_eq!(body["topics"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_learning_path_missing_domain_is_422() {
    let engine = Arc::new(FakeEngine::default());
    let (status, body) = post(engine.clone(), "/api/ai/generate-learning-path", json!({})).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_array());
    assert!(body["detail"][0]["msg"].as_str().unwrap().contains("domainName"));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_learning_path_rejects_unknown_fields() {
    let (status, _) = post(
        Arc::default(),
        "/api/ai/generate-learning-path",
        json!({"domainName": "Python", "difficulty": "hard"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_learning_path_failure_is_500_with_detail() {
    let (status, body) = post(
        Arc::new(FakeEngine::failing()),
        "/api/ai/generate-learning-path",
        json!({"domainName": "Python"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Failed to generate learning path: "));
    assert!(detail.contains("planning"));
}

#[tokio::test]
async fn test_invalid_nested_assessment_answer_is_422() {
    let (status, body) = post(
        Arc::default(),
        "/api/ai/generate-learning-path",
        json!({
            "domainName": "Python",
            "userTopicPerformanceData": {"assessmentAnswers": [{
                "questionId": 1,
                "questionText": "Q?",
                "options": ["yes"],
                "selectedAnswer": "yes"
            }]}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["detail"][0]["loc"],
        json!(["body", "userTopicPerformanceData", "assessmentAnswers", "0", "questionText"])
    );
}

#[tokio::test]
async fn test_generate_insights_success() {
    let (status, body) = post(
        Arc::default(),
        "/api/ai/generate-insights",
        json!({"domainName": "Languages", "topicName": "Greetings", "level": 1}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let insights = body.as_array().unwrap();
    assert!(!insights.is_empty());
    for insight in insights {
        let object = insight.as_object().unwrap();
        for key in ["title", "explanation", "aiMetadata", "questions"] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(insight["questions"][0]["questionType"], "MULTIPLE_CHOICE");
    }
}

#[tokio::test]
async fn test_generate_insights_rejects_non_integer_level() {
    let (status, _) = post(
        Arc::default(),
        "/api/ai/generate-insights",
        json!({"domainName": "Languages", "topicName": "Greetings", "level": "one"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_generate_insights_failure_is_500() {
    let (status, body) = post(
        Arc::new(FakeEngine::failing()),
        "/api/ai/generate-insights",
        json!({"domainName": "Languages", "topicName": "Greetings", "level": 1}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Failed to generate insights: "));
}

#[tokio::test]
async fn test_malformed_json_is_422() {
    let app = create_router(AppState::new(Arc::new(FakeEngine::default())));
    let request = Request::builder()
        .method("POST")
        .uri("/api/ai/generate-insights")
        .header("content-type", "application/json")
        .body(Body::from("{\"domainName\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_next_insight_prefers_least_shown() {
    let (status, body) = post(
        Arc::default(),
        "/api/ai/get-next-insight",
        json!({
            "userId": 1,
            "uncompletedInsights": [
                {"insightId": 11, "title": "Closures", "relevanceScore": 0.9, "timesShown": 4},
                {"insightId": 12, "title": "Iterators", "relevanceScore": 0.2, "timesShown": 1},
                {"insightId": 13, "title": "Traits", "relevanceScore": 0.5}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"insightId": 13}));
}

#[tokio::test]
async fn test_next_insight_empty_list_is_400() {
    let (status, body) = post(
        Arc::default(),
        "/api/ai/get-next-insight",
        json!({"uncompletedInsights": []}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("no uncompleted insights"));
}

#[tokio::test]
async fn test_next_insight_relevance_out_of_range_is_422() {
    let (status, _) = post(
        Arc::default(),
        "/api/ai/get-next-insight",
        json!({"uncompletedInsights": [{"insightId": 1, "title": "Loops", "relevanceScore": 1.5}]}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_generate_review_success() {
    let (status, body) = post(
        Arc::default(),
        "/api/ai/generate-review",
        json!({"userId": 5, "performanceData": {"topicName": "Fractions", "level": 2}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let mut keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["strengths", "summary", "weaknesses"]);
    assert!(body["summary"].as_str().unwrap().contains("Fractions"));
}

#[tokio::test]
async fn test_generate_review_empty_performance_data_is_422() {
    let engine = Arc::new(FakeEngine::default());
    let (status, body) = post(
        engine.clone(),
        "/api/ai/generate-review",
        json!({"performanceData": {}}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["loc"], json!(["body", "performanceData"]));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generate_review_failure_is_500() {
    let (status, body) = post(
        Arc::new(FakeEngine::failing()),
        "/api/ai/generate-review",
        json!({"performanceData": {"score": 3}}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Failed to generate review: "));
}

#[tokio::test]
async fn test_offline_engine_serves_learning_path() {
    let app = create_router(AppState::new(Arc::new(OfflineEngine::new())));
    let request = Request::builder()
        .method("POST")
        .uri("/api/ai/generate-learning-path")
        .header("content-type", "application/json")
        .body(Body::from(json!({"domainName": "Chemistry"}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let topics = body["topics"].as_array().unwrap();
    assert_eq!(topics.len(), 10);
    assert!(topics.iter().all(|t| t.as_str().unwrap().starts_with("Chemistry")));
}
