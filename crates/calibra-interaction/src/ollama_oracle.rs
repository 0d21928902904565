//! Chat-completion oracle backed by an Ollama-compatible API.

use async_trait::async_trait;
use calibra_core::config::{MAX_LEVEL, MIN_LEVEL};
use calibra_core::error::{CalibraError, Result};
use calibra_core::oracle::{
    AnswerContext, GeneratedQuestion, Oracle, OracleSource, QuestionContext, ScoredEvaluation,
};
use calibra_core::session::{Evaluation, Subscores};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::OracleConfig;
use crate::parser::{parse_evaluation_response, parse_question_response};
use crate::prompts::{evaluation_prompt, question_prompt};

const QUESTION_TEMPERATURE: f64 = 0.7;
const EVALUATION_TEMPERATURE: f64 = 0.3;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Oracle that talks to an Ollama `/api/chat` endpoint.
///
/// Every failure mode (connection, timeout, non-2xx status, unparseable
/// body) surfaces as [`CalibraError::Dependency`] so the caller can
/// substitute a local fallback.
pub struct OllamaOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

impl OllamaOracle {
    pub fn new(config: OracleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CalibraError::dependency(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OracleConfig::from_env())
    }

    /// Sends one non-streaming chat request and returns the reply text.
    async fn chat(&self, prompt: &str, temperature: f64) -> Result<String> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: ChatOptions { temperature },
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CalibraError::dependency(format!("oracle request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "oracle returned error status");
            return Err(CalibraError::dependency(format!(
                "oracle returned status {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CalibraError::dependency(format!("invalid oracle response body: {e}")))?;

        debug!(chars = parsed.message.content.len(), "oracle reply received");
        Ok(parsed.message.content)
    }
}

#[async_trait]
impl Oracle for OllamaOracle {
    async fn generate_question(&self, context: &QuestionContext) -> Result<GeneratedQuestion> {
        let prompt = question_prompt(context);
        let reply = self.chat(&prompt, QUESTION_TEMPERATURE).await?;

        let parsed = parse_question_response(&reply).ok_or_else(|| {
            CalibraError::dependency("oracle reply contained no question text")
        })?;

        Ok(GeneratedQuestion {
            text: parsed.text,
            category: context.category,
            level: context.level,
            estimated_minutes: parsed.estimated_minutes,
            topics: parsed.topics,
            context: parsed.context,
            source: OracleSource::Model,
        })
    }

    async fn evaluate(&self, context: &AnswerContext) -> Result<ScoredEvaluation> {
        let prompt = evaluation_prompt(context);
        let reply = self.chat(&prompt, EVALUATION_TEMPERATURE).await?;

        let parsed = parse_evaluation_response(&reply).ok_or_else(|| {
            CalibraError::dependency("oracle reply contained no overall score")
        })?;

        Ok(ScoredEvaluation {
            evaluation: Evaluation {
                overall_score: parsed.overall_score,
                subscores: Subscores {
                    correctness: parsed.correctness,
                    depth: parsed.depth,
                    clarity: parsed.clarity,
                    relevance: parsed.relevance,
                },
                feedback: parsed.feedback,
                level_recommendation: parsed.recommendation,
                level_adjustment: parsed.recommendation.delta(context.level, MIN_LEVEL, MAX_LEVEL),
                strengths: parsed.strengths,
                improvements: parsed.improvements,
            },
            source: OracleSource::Model,
        })
    }
}
