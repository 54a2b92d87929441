//! Remote summarization with graceful degradation.
//!
//! ## Why a never-failing adapter?
//!
//! The poster is the product; a summary is one ingredient. If the endpoint
//! is down, the key is missing, or one section's call times out, the right
//! outcome is a poster with a readable placeholder in that slot, not an
//! aborted run. So this adapter converts every failure mode into one of two
//! deterministic sentinel texts and reports the degradation as data in
//! [`SectionSummary::outcome`]. Nothing in this module returns an error to
//! the pipeline, and nothing retries; one request per section, one chance.
//!
//! Blank section text short-circuits to the not-found sentinel before any
//! request is built. There is no point asking a model to summarize nothing,
//! and skipping the call keeps missing-section behavior identical whether
//! or not the network is reachable.
//!
//! Batched mode sends the whole (budget-truncated) paper once and asks for
//! a JSON object keyed by section name. Missing keys degrade per section;
//! an unparsable response degrades all of them.

use crate::config::PosterConfig;
use crate::error::PosterError;
use crate::output::{SectionSummary, SummaryOutcome};
use crate::pipeline::sanitize;
use crate::prompts;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

// ── Sentinels ───────────────────────────────────────────────────────────

/// Placeholder when a section heading was never found in the text.
pub fn not_found_sentinel(name: &str) -> String {
    format!("[No {name} section found in the paper.]")
}

/// Placeholder when the remote call failed for any reason.
pub fn failure_sentinel(name: &str) -> String {
    format!("[{name} summary unavailable.]")
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

// ── Client ──────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
enum CallError {
    #[error("no API key configured and OPENAI_API_KEY is unset")]
    MissingKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response contained no choices")]
    EmptyChoices,
}

/// One section's input to the summarizer: the name shown on the poster and
/// the text the segmenter carved out (possibly empty).
#[derive(Debug, Clone)]
pub struct SectionInput {
    pub name: String,
    pub text: String,
}

/// Chat-completion client over an OpenAI-compatible endpoint.
pub struct Summarizer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    system_prompt: Option<String>,
    input_budget: usize,
    batch: bool,
}

impl Summarizer {
    pub fn new(config: &PosterConfig) -> Result<Self, PosterError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .user_agent(concat!("pdf2poster/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PosterError::Internal(format!("http client: {e}")))?;
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty());
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            input_budget: config.summary_input_budget,
            batch: config.batch_summaries,
        })
    }

    /// Summarize every requested section. `full_text` backs batched mode;
    /// per-section mode uses each input's own text.
    pub async fn summarize_sections(
        &self,
        inputs: &[SectionInput],
        full_text: &str,
    ) -> Vec<SectionSummary> {
        if self.batch {
            return self.summarize_batched(inputs, full_text).await;
        }
        let mut out = Vec::with_capacity(inputs.len());
        for input in inputs {
            out.push(self.summarize_section(&input.name, &input.text).await);
        }
        out
    }

    /// Summarize one section. Always returns a drawable summary.
    pub async fn summarize_section(&self, name: &str, text: &str) -> SectionSummary {
        if text.trim().is_empty() {
            debug!(section = name, "empty section text, skipping remote call");
            return SectionSummary {
                name: name.to_string(),
                text: not_found_sentinel(name),
                outcome: SummaryOutcome::NotFound,
            };
        }

        let excerpt = truncate_chars(text, self.input_budget);
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: self.system_prompt(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: prompts::section_user_prompt(name, excerpt),
            },
        ];

        match self.chat(messages, None).await {
            Ok(content) => {
                let cleaned = sanitize::clean_summary(&content);
                if cleaned.is_empty() {
                    warn!(section = name, "model returned empty text");
                    return SectionSummary {
                        name: name.to_string(),
                        text: failure_sentinel(name),
                        outcome: SummaryOutcome::Failed,
                    };
                }
                SectionSummary {
                    name: name.to_string(),
                    text: cleaned,
                    outcome: SummaryOutcome::Summarized,
                }
            }
            Err(err) => {
                warn!(section = name, error = %err, "summary call failed");
                SectionSummary {
                    name: name.to_string(),
                    text: failure_sentinel(name),
                    outcome: SummaryOutcome::Failed,
                }
            }
        }
    }

    async fn summarize_batched(
        &self,
        inputs: &[SectionInput],
        full_text: &str,
    ) -> Vec<SectionSummary> {
        let names: Vec<&str> = inputs.iter().map(|i| i.name.as_str()).collect();
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: prompts::batched_system_prompt(&names),
            },
            ChatMessage {
                role: "user".to_string(),
                content: prompts::batched_user_prompt(truncate_chars(full_text, self.input_budget)),
            },
        ];
        let format = Some(ResponseFormat {
            kind: "json_object".to_string(),
        });

        match self.chat(messages, format).await {
            Ok(content) => match parse_batched_response(&content, &names) {
                Some(summaries) => summaries,
                None => {
                    warn!("batched response was not the expected JSON object");
                    names
                        .iter()
                        .map(|name| SectionSummary {
                            name: name.to_string(),
                            text: failure_sentinel(name),
                            outcome: SummaryOutcome::Failed,
                        })
                        .collect()
                }
            },
            Err(err) => {
                warn!(error = %err, "batched summary call failed");
                names
                    .iter()
                    .map(|name| SectionSummary {
                        name: name.to_string(),
                        text: failure_sentinel(name),
                        outcome: SummaryOutcome::Failed,
                    })
                    .collect()
            }
        }
    }

    fn system_prompt(&self) -> String {
        self.system_prompt
            .clone()
            .unwrap_or_else(|| prompts::DEFAULT_SYSTEM_PROMPT.to_string())
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        response_format: Option<ResponseFormat>,
    ) -> Result<String, CallError> {
        let key = self.api_key.as_deref().ok_or(CallError::MissingKey)?;
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: 0.2,
            max_tokens: Some(300),
            response_format,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(%url, model = %self.model, "sending chat completion request");
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, 200).to_string(),
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(CallError::EmptyChoices)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Cut `text` to at most `budget` characters on a character boundary.
fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parse the batched JSON object into per-section summaries. `None` means
/// the response was not usable at all.
fn parse_batched_response(content: &str, names: &[&str]) -> Option<Vec<SectionSummary>> {
    let stripped = sanitize::strip_code_fences(content);
    let map: HashMap<String, String> = serde_json::from_str(stripped.trim()).ok()?;

    Some(
        names
            .iter()
            .map(|name| {
                let value = map.get(*name).map(|v| sanitize::clean_summary(v));
                match value {
                    Some(text) if !text.is_empty() => SectionSummary {
                        name: name.to_string(),
                        text,
                        outcome: SummaryOutcome::Summarized,
                    },
                    _ => SectionSummary {
                        name: name.to_string(),
                        text: not_found_sentinel(name),
                        outcome: SummaryOutcome::NotFound,
                    },
                }
            })
            .collect(),
    )
}
