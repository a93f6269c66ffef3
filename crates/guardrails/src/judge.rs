//! LLM judge: a second model call that grades a candidate answer.
//!
//! The judge never fails the pipeline. Unparseable output and failed calls
//! both degrade to a conservative verdict that forces a repair.

use compliance_llm::{complete_with_timeout, LlmClient, LlmRequest};
use compliance_prompt::{build_prompt, PromptDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Characters of each passage shown to the judge.
pub const JUDGE_PASSAGE_CHARS: usize = 400;

/// Structured verdict returned by the judge model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeResult {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub needs_fix: bool,
    #[serde(default)]
    pub violations: Vec<String>,
    #[serde(default)]
    pub critique: String,
}

/// Why judge output could not be turned into a [`JudgeResult`].
#[derive(Debug, Error)]
pub enum JudgeParseError {
    #[error("judge returned an empty response")]
    Empty,

    #[error("judge response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl JudgeResult {
    /// A passing verdict.
    pub fn pass() -> Self {
        Self {
            ok: true,
            needs_fix: false,
            violations: Vec::new(),
            critique: String::new(),
        }
    }

    /// Verdict substituted when the judge output cannot be parsed.
    pub fn parse_error() -> Self {
        Self {
            ok: false,
            needs_fix: true,
            violations: vec!["parse_error".to_string()],
            critique: "Judge response could not be parsed as JSON.".to_string(),
        }
    }

    /// Verdict substituted when the judge call itself failed.
    pub fn unavailable(reason: &str) -> Self {
        Self {
            ok: false,
            needs_fix: true,
            violations: vec!["judge_unavailable".to_string()],
            critique: format!("Judge call failed: {}", reason),
        }
    }

    /// Parse raw judge output, tolerating a surrounding Markdown code fence.
    pub fn parse(raw: &str) -> Result<Self, JudgeParseError> {
        let body = strip_code_fence(raw.trim());
        if body.is_empty() {
            return Err(JudgeParseError::Empty);
        }
        Ok(serde_json::from_str(body)?)
    }

    /// True when the verdict demands a rewrite.
    pub fn requires_fix(&self) -> bool {
        self.needs_fix || !self.ok
    }

    /// Compact JSON for captions and logs.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an info string such as `json`
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Number passages `[i]` and cut each to [`JUDGE_PASSAGE_CHARS`] characters.
pub fn judge_passages<S: AsRef<str>>(passages: &[S]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let clipped: String = text.as_ref().chars().take(JUDGE_PASSAGE_CHARS).collect();
            format!("[{}] {}", i + 1, clipped)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// LLM judge bound to a client, model and prompt.
pub struct Judge {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl Judge {
    pub fn new(client: Arc<dyn LlmClient>, prompt: PromptDefinition, model: impl Into<String>) -> Self {
        Self {
            client,
            prompt,
            model: model.into(),
            temperature: 0.2,
            max_tokens: 800,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Grade `answer` against the retrieved passages.
    pub async fn evaluate<S: AsRef<str>>(&self, answer: &str, passages: &[S]) -> JudgeResult {
        let mut variables = HashMap::new();
        variables.insert("passages".to_string(), judge_passages(passages));
        variables.insert("answer".to_string(), answer.to_string());

        let built = match build_prompt(&self.prompt, variables) {
            Ok(built) => built,
            Err(e) => {
                tracing::warn!("Judge prompt failed to render: {}", e);
                return JudgeResult::unavailable(&e.to_string());
            }
        };

        let mut request = LlmRequest::new(built.user, &self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let raw = match complete_with_timeout(self.client.as_ref(), &request, self.timeout).await {
            Ok(response) => response.content,
            Err(e) => {
                tracing::warn!("Judge call failed, assuming the answer needs a fix: {}", e);
                return JudgeResult::unavailable(&e.to_string());
            }
        };

        match JudgeResult::parse(&raw) {
            Ok(result) => {
                tracing::debug!(
                    "Judge verdict: ok={} needs_fix={} violations={:?}",
                    result.ok,
                    result.needs_fix,
                    result.violations
                );
                result
            }
            Err(e) => {
                tracing::warn!("{}", e);
                JudgeResult::parse_error()
            }
        }
    }
}
