//! A stage = prompt template + model call + output parser.
//!
//! Stages are plain configuration: they hold no per-request state, so one
//! instance is built per processor and shared by every request.

use crate::llm::client::{ModelClient, ProviderError};
use crate::llm::parser::{OutputParser, StageOutput};
use crate::llm::prompt::{PipelineRequest, PromptMessages, PromptTemplate};

/// Raw and parsed output of one stage run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub raw_text: String,
    pub parsed: StageOutput,
    /// `true` when `parsed` is the parser's placeholder.
    pub parse_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    name: &'static str,
    template: PromptTemplate,
    parser: OutputParser,
}

impl Stage {
    pub fn new(name: &'static str, template: PromptTemplate, parser: OutputParser) -> Self {
        Self {
            name,
            template,
            parser,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parser(&self) -> &OutputParser {
        &self.parser
    }

    pub fn render(&self, request: &PipelineRequest) -> PromptMessages {
        self.template.render(request)
    }

    /// Render, invoke the model and parse.
    ///
    /// # Errors
    ///
    /// Only provider failures are returned; malformed output is absorbed by
    /// the parser.
    pub async fn run(
        &self,
        client: &dyn ModelClient,
        request: &PipelineRequest,
    ) -> Result<StageResult, ProviderError> {
        let messages = self.render(request);
        log::debug!(
            "stage '{}': invoking {} (user message {} chars)",
            self.name,
            client.model(),
            messages.user.len()
        );

        let raw_text = client.invoke(&messages).await?;
        let (parsed, parse_error) = self.parser.parse(&raw_text);
        if parse_error {
            log::warn!("stage '{}': output did not parse, using placeholder", self.name);
        }

        Ok(StageResult {
            raw_text,
            parsed,
            parse_error,
        })
    }
}
