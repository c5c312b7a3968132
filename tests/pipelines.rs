//! End-to-end runs of both processors through the public API, with a
//! scripted model in place of the HTTP provider.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use insight_pipelines::config::AppConfig;
use insight_pipelines::llm::{ConfigurationError, ModelClient, PromptMessages, ProviderError};
use insight_pipelines::pipeline::{
    Classification, FeedbackProcessor, InterviewProcessor, InterviewResult,
};

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

/// Answers by keyword in the system message and records every prompt.
struct KeywordModel {
    answers: Vec<(&'static str, Result<&'static str, ProviderError>)>,
    seen: Mutex<Vec<PromptMessages>>,
}

impl KeywordModel {
    fn new(answers: Vec<(&'static str, Result<&'static str, ProviderError>)>) -> Arc<Self> {
        Arc::new(Self {
            answers,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<PromptMessages> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for KeywordModel {
    fn model(&self) -> &str {
        "scripted/keyword"
    }

    async fn invoke(&self, messages: &PromptMessages) -> Result<String, ProviderError> {
        self.seen.lock().unwrap().push(messages.clone());
        self.answers
            .iter()
            .find(|(keyword, _)| messages.system.contains(keyword))
            .map(|(_, answer)| answer.clone().map(str::to_string))
            .unwrap_or(Err(ProviderError::EmptyResponse))
    }
}

const TRANSCRIPT: &str = "\
00:00 Interviewer: Thanks for joining. Can you walk me through your background?
00:12 Candidate: Sure. I'm a data engineer at Northwind, six years in,
00:30 mostly Spark and Airflow. I studied at TU Delft.
01:05 Interviewer: What was your hardest project?
01:10 Candidate: Migrating our batch jobs to streaming.   It took a year.
";

fn assert_interview_shape(result: &InterviewResult) {
    let value = serde_json::to_value(result).unwrap();
    assert!(value["summary"].is_string());
    assert!(value["highlights"].is_array());
    assert!(value["lowlights"].is_array());
    assert!(value["key_named_entities"].is_object());
    assert!(value["processing_time"].is_number());
    assert!(value["success"].is_boolean());
}

// ---------------------------------------------------------------------------
// Interview
// ---------------------------------------------------------------------------

#[tokio::test]
async fn interview_end_to_end() {
    let model = KeywordModel::new(vec![
        ("concise summary", Ok("Experienced data engineer with streaming background.")),
        (
            "highlights",
            Ok(r#"{"highlights": ["Led a streaming migration"], "lowlights": ["Long timeline"]}"#),
        ),
        (
            "candidate information",
            Ok(r#"{"role": "Data engineer", "current_company": "Northwind", "experience_years": 6}"#),
        ),
    ]);
    let processor = InterviewProcessor::with_client(model.clone());

    let result = processor.process_interview(TRANSCRIPT).await;

    assert_interview_shape(&result);
    assert!(result.success);
    assert_eq!(result.model, "scripted/keyword");
    assert_eq!(result.highlights, vec!["Led a streaming migration"]);
    assert_eq!(result.key_named_entities["current_company"], "Northwind");
    assert_eq!(result.key_named_entities["experience_years"], "6");

    let seen = model.seen();
    assert_eq!(seen.len(), 3);
    assert!(seen
        .iter()
        .all(|m| m.user.contains("01:10 Candidate: Migrating our batch jobs to streaming. It took a year.")));
}

#[tokio::test]
async fn interview_non_json_highlights_keep_other_stages() {
    let model = KeywordModel::new(vec![
        ("concise summary", Ok("A summary.")),
        ("highlights", Ok("Sure! The candidate was great.")),
        ("candidate information", Ok(r#"{"role": "Data engineer"}"#)),
    ]);
    let processor = InterviewProcessor::with_client(model);

    let result = processor.process_interview(TRANSCRIPT).await;

    assert_interview_shape(&result);
    assert!(result.success);
    assert_eq!(result.summary, "A summary.");
    assert_eq!(
        result.highlights,
        vec!["Unable to extract highlights due to parsing error"]
    );
    assert_eq!(
        result.lowlights,
        vec!["Unable to extract lowlights due to parsing error"]
    );
    assert_eq!(result.key_named_entities["role"], "Data engineer");
}

#[tokio::test]
async fn interview_rejects_short_and_long_transcripts() {
    let model = KeywordModel::new(Vec::new());
    let processor = InterviewProcessor::with_client(model.clone());

    let short = processor.process_interview(&"x".repeat(30)).await;
    assert!(!short.success);
    assert_eq!(
        short.error.as_deref(),
        Some("Input validation failed: transcript must be at least 50 characters long")
    );
    assert_interview_shape(&short);

    let long = processor.process_interview(&"y".repeat(50_001)).await;
    assert!(!long.success);
    assert!(long
        .error
        .unwrap()
        .ends_with("transcript must be less than 50,000 characters"));

    assert!(model.seen().is_empty());
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feedback_positive_scenario() {
    let model = KeywordModel::new(vec![
        ("Classify customer feedback", Ok("positive")),
        ("positive feedback", Ok("Thank you! We're thrilled you enjoy it.")),
    ]);
    let processor = FeedbackProcessor::with_client(model);

    let result = processor
        .process_feedback("TestProduct", "This product works perfectly, I love it!")
        .await;

    assert!(result.success);
    assert_eq!(result.classification, Classification::Positive);
    assert!(!result.response.is_empty());
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["classification"], "positive");
    assert!(value.get("error").is_none());
}

#[tokio::test]
async fn feedback_empty_product_name() {
    let model = KeywordModel::new(Vec::new());
    let processor = FeedbackProcessor::with_client(model.clone());

    let result = processor.process_feedback("", "Great product").await;

    assert!(!result.success);
    assert_eq!(result.classification, Classification::Escalate);
    assert!(result.response.starts_with("We apologize"));
    assert!(result
        .error
        .unwrap()
        .starts_with("Input validation failed: "));
    assert!(model.seen().is_empty());
}

#[tokio::test]
async fn feedback_response_is_never_empty() {
    // every call fails: classification escalates, reply is canned
    let model = KeywordModel::new(vec![("", Err(ProviderError::Timeout))]);
    let processor = FeedbackProcessor::with_client(model);

    let result = processor.process_feedback("Widget", "It exploded").await;

    assert!(!result.success);
    assert_eq!(result.classification, Classification::Escalate);
    assert!(result.response.contains("Widget"));
    assert!(!result.response.is_empty());
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn missing_api_key_is_a_configuration_error() {
    let mut config = AppConfig::default();
    config.llm.api_key = None;
    config.llm.api_key_env = "INSIGHT_PIPELINES_TEST_UNSET_KEY".into();

    let err = InterviewProcessor::from_config(&config, None).unwrap_err();
    assert!(matches!(err, ConfigurationError::MissingApiKey { .. }));
    assert_eq!(
        err.to_string(),
        "INSIGHT_PIPELINES_TEST_UNSET_KEY must be configured in environment"
    );
    assert!(FeedbackProcessor::from_config(&config, None).is_err());
}

#[test]
fn processors_build_from_a_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(
        &path,
        r#"
[llm]
api_key = "sk-test"
api_key_env = "INSIGHT_PIPELINES_TEST_UNSET_KEY"
default_model = "openai/gpt-4-turbo"

[feedback]
max_tokens = 256
temperature = 0.1
"#,
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    let interview = InterviewProcessor::from_config(&config, None).unwrap();
    assert_eq!(interview.model(), "openai/gpt-4-turbo");

    let feedback = FeedbackProcessor::from_config(&config, Some("anthropic/claude-3-haiku")).unwrap();
    assert_eq!(feedback.model(), "anthropic/claude-3-haiku");
}
