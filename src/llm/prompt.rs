//! Prompt templates for the interview and feedback stages.
//!
//! A [`PromptTemplate`] pairs a fixed system instruction with a user-message
//! template.  Placeholders are written `{name}` and are filled from a
//! [`PipelineRequest`] by [`PromptTemplate::render`], which yields the
//! `(system, user)` pair sent to any OpenAI-compatible chat endpoint.
//! Braces that do not name a request field (such as the JSON examples in
//! the extraction prompts) are left untouched.

use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Interview instructions
// ---------------------------------------------------------------------------

pub const SUMMARY_SYSTEM: &str = "\
You are an expert interview analyst. Create a comprehensive but concise summary of the interview transcript.

Focus on:
- Overall interview flow and structure
- Key topics discussed
- Candidate's main responses and approaches
- Interview outcome and general impression

Keep the summary between 150-300 words. Be objective and professional.";

pub const SUMMARY_USER: &str = "\
Interview Transcript:
{transcript}

Summary:";

pub const HIGHLIGHTS_SYSTEM: &str = "\
You are an expert interview analyst. Extract key highlights (positive findings) and lowlights (concerning or off-track findings) from the interview.

Return your response in this exact JSON format:
{
  \"highlights\": [\"highlight 1\", \"highlight 2\", \"highlight 3\"],
  \"lowlights\": [\"lowlight 1\", \"lowlight 2\"]
}

Highlights should include:
- Strong technical skills demonstrated
- Good problem-solving approaches
- Positive behavioral indicators
- Relevant experience mentioned

Lowlights should include:
- Knowledge gaps or weaknesses
- Poor communication or unclear responses
- Red flags or concerning behaviors
- Off-topic or irrelevant responses

Provide 3-5 highlights and 1-3 lowlights. Be specific and actionable.";

pub const ENTITIES_SYSTEM: &str = "\
You are an expert interview analyst. Extract key candidate information and tangible details from the interview transcript.

Return your response in this exact JSON format:
{
  \"role\": \"position they're applying for or current role\",
  \"current_company\": \"their current or most recent company\",
  \"experience_years\": \"years of relevant experience\",
  \"key_skills\": \"main technical skills mentioned\",
  \"education\": \"educational background if mentioned\",
  \"location\": \"location if mentioned\",
  \"other_details\": \"any other relevant tangible information\"
}

Only include information that is explicitly mentioned in the transcript. Use \"Not mentioned\" for fields where no information is provided. Be factual and avoid assumptions.";

/// Shared by the highlights and entities stages.
pub const JSON_EXTRACTION_USER: &str = "\
Interview Transcript:
{transcript}

JSON Response:";

// ---------------------------------------------------------------------------
// Feedback instructions
// ---------------------------------------------------------------------------

pub const CLASSIFICATION_SYSTEM: &str = "\
Classify customer feedback into one category:
- positive: satisfied/happy
- negative: dissatisfied/complaining
- neutral: questions/unclear
- escalate: threats/severe issues

Respond with ONLY the category name.";

pub const CLASSIFICATION_USER: &str = "\
Product: {product_name}
Feedback: {feedback}

Category:";

pub const POSITIVE_SYSTEM: &str = "Generate a brief, friendly response to positive feedback. \
Thank the customer and encourage future engagement. Keep response under 100 words.";

pub const NEGATIVE_SYSTEM: &str = "Generate a brief, empathetic response to negative feedback. \
Apologize, offer help, and provide next steps. Keep response under 100 words.";

pub const NEUTRAL_SYSTEM: &str = "Generate a brief response to neutral feedback. \
Thank them and ask for more details. Keep response under 100 words.";

pub const ESCALATION_SYSTEM: &str = "Generate a brief escalation response. \
Acknowledge the concern and explain human agent will follow up. Keep response under 100 words.";

pub const FALLBACK_SYSTEM: &str = "Generate a brief fallback response acknowledging feedback \
and providing general assistance. Keep under 100 words.";

/// Shared by every response-generation stage.
pub const RESPONSE_USER: &str = "\
Product: {product_name}
Feedback: {feedback}

Response:";

// ---------------------------------------------------------------------------
// PipelineRequest
// ---------------------------------------------------------------------------

/// Named text fields a template is rendered against.
///
/// Built once per invocation and never mutated afterwards.
///
/// ```rust
/// use insight_pipelines::llm::PipelineRequest;
///
/// let request = PipelineRequest::new()
///     .with("product_name", "TestProduct")
///     .with("feedback", "Works perfectly!");
/// assert_eq!(request.get("product_name"), Some("TestProduct"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineRequest {
    text_fields: BTreeMap<String, String>,
}

impl PipelineRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) one field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.text_fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.text_fields.get(name).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.text_fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

// ---------------------------------------------------------------------------
// PromptMessages / PromptTemplate
// ---------------------------------------------------------------------------

/// A rendered `(system, user)` chat message pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessages {
    pub system: String,
    pub user: String,
}

/// A fixed system instruction plus a user-message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    system: &'static str,
    user: &'static str,
}

impl PromptTemplate {
    pub const fn new(system: &'static str, user: &'static str) -> Self {
        Self { system, user }
    }

    pub fn system(&self) -> &'static str {
        self.system
    }

    pub fn user(&self) -> &'static str {
        self.user
    }

    /// Fill `{name}` placeholders in both messages from `request`.
    ///
    /// Field values are inserted verbatim and are not themselves scanned for
    /// placeholders.
    pub fn render(&self, request: &PipelineRequest) -> PromptMessages {
        PromptMessages {
            system: fill(self.system, request),
            user: fill(self.user, request),
        }
    }
}

fn fill(template: &str, request: &PipelineRequest) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let value = after
            .find('}')
            .and_then(|close| request.get(&after[..close]).map(|value| (close, value)));

        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback_request() -> PipelineRequest {
        PipelineRequest::new()
            .with("product_name", "TestProduct")
            .with("feedback", "This product is excellent and works perfectly!")
    }

    #[test]
    fn renders_feedback_fields() {
        let template = PromptTemplate::new(CLASSIFICATION_SYSTEM, CLASSIFICATION_USER);
        let messages = template.render(&feedback_request());

        assert_eq!(messages.system, CLASSIFICATION_SYSTEM);
        assert_eq!(
            messages.user,
            "Product: TestProduct\nFeedback: This product is excellent and works perfectly!\n\nCategory:"
        );
    }

    #[test]
    fn json_examples_survive_rendering() {
        let template = PromptTemplate::new(HIGHLIGHTS_SYSTEM, JSON_EXTRACTION_USER);
        let request = PipelineRequest::new().with("transcript", "00:01 hello there");
        let messages = template.render(&request);

        assert!(messages.system.contains("\"highlights\": [\"highlight 1\""));
        assert!(messages.system.starts_with("You are an expert interview analyst."));
        assert!(messages.user.contains("00:01 hello there"));
        assert!(messages.user.ends_with("JSON Response:"));
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let template = PromptTemplate::new("sys {missing}", "a {transcript} b {other} {");
        let request = PipelineRequest::new().with("transcript", "T");
        let messages = template.render(&request);

        assert_eq!(messages.system, "sys {missing}");
        assert_eq!(messages.user, "a T b {other} {");
    }

    #[test]
    fn values_are_not_rescanned() {
        let template = PromptTemplate::new("", "{feedback}");
        let request = PipelineRequest::new()
            .with("feedback", "literal {product_name}")
            .with("product_name", "X");

        assert_eq!(template.render(&request).user, "literal {product_name}");
    }

    #[test]
    fn response_template_uses_product_and_feedback() {
        let template = PromptTemplate::new(POSITIVE_SYSTEM, RESPONSE_USER);
        let messages = template.render(&feedback_request().with("classification", "positive"));

        assert!(messages.user.starts_with("Product: TestProduct\n"));
        assert!(messages.user.ends_with("Response:"));
    }

    #[test]
    fn request_fields_are_sorted_and_replaceable() {
        let request = PipelineRequest::new()
            .with("b", "2")
            .with("a", "1")
            .with("b", "3");
        let fields: Vec<_> = request.fields().collect();
        assert_eq!(fields, vec![("a", "1"), ("b", "3")]);
    }

    #[test]
    fn response_instructions_are_distinct() {
        let all = [
            POSITIVE_SYSTEM,
            NEGATIVE_SYSTEM,
            NEUTRAL_SYSTEM,
            ESCALATION_SYSTEM,
            FALLBACK_SYSTEM,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert!(!a.contains(b) && !b.contains(a));
            }
        }
    }
}
