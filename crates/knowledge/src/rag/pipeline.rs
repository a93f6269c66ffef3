//! Answer pipeline orchestration.
//!
//! Retrieve, generate, check, repair at most once, enforce citations, log.
//! LLM failures during generate or repair become a visible
//! [`Outcome::Failed`]; only configuration errors are returned as `Err`.

use crate::config::{validate_retrieval, KnowledgeConfig};
use crate::knowledge_base::KnowledgeBase;
use crate::rag::citations::{ensure_citations, format_citations};
use crate::rag::history::HistorySink;
use crate::rag::types::{AnswerReport, AskOptions, FailureStage, LogEntry, Outcome};
use crate::types::SearchResult;
use compliance_core::{AppError, AppResult};
use compliance_guardrails::{GuardrailVerdict, Guardrails};
use compliance_llm::{complete_with_timeout, LlmClient, LlmRequest};
use compliance_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Sampling and deadline settings shared by generate and repair.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl GenerationSettings {
    pub fn from_config(config: &KnowledgeConfig, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.llm_timeout(),
        }
    }
}

/// Everything the pipeline needs to produce answers with an LLM.
pub struct LlmStages {
    client: Arc<dyn LlmClient>,
    answer_prompt: PromptDefinition,
    repair_prompt: PromptDefinition,
    guardrails: Guardrails,
    settings: GenerationSettings,
}

impl LlmStages {
    pub fn new(
        client: Arc<dyn LlmClient>,
        answer_prompt: PromptDefinition,
        repair_prompt: PromptDefinition,
        guardrails: Guardrails,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            client,
            answer_prompt,
            repair_prompt,
            guardrails,
            settings,
        }
    }

    async fn complete(
        &self,
        prompt: &PromptDefinition,
        variables: HashMap<String, String>,
    ) -> AppResult<String> {
        let built = build_prompt(prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.settings.model)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response =
            complete_with_timeout(self.client.as_ref(), &request, self.settings.timeout).await?;
        if response.content.trim().is_empty() {
            return Err(AppError::Llm(format!(
                "{} returned an empty completion",
                self.client.provider_name()
            )));
        }
        Ok(response.content)
    }

    async fn generate(&self, question: &str, passages: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("passages".to_string(), passages.to_string());
        self.complete(&self.answer_prompt, variables).await
    }

    async fn repair(
        &self,
        question: &str,
        passages: &str,
        draft: &str,
        verdict: &GuardrailVerdict,
    ) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("passages".to_string(), passages.to_string());
        variables.insert("draft".to_string(), draft.to_string());
        variables.insert("violations".to_string(), violation_summary(verdict));
        variables.insert("critique".to_string(), verdict.judge.critique.clone());
        self.complete(&self.repair_prompt, variables).await
    }
}

/// Passages as given to the answer and repair prompts.
pub fn answer_passages(passages: &[SearchResult]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("Passage [{}]: {}", i + 1, p.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// PII kinds, policy phrases and judge violations in one list.
fn violation_summary(verdict: &GuardrailVerdict) -> String {
    let items: Vec<String> = verdict
        .pii_hits
        .iter()
        .map(|kind| format!("pii:{}", kind))
        .chain(verdict.policy_hits.iter().map(|p| format!("policy:{}", p)))
        .chain(verdict.judge.violations.iter().cloned())
        .collect();
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

pub struct AnswerPipeline {
    knowledge: Arc<KnowledgeBase>,
    stages: Option<LlmStages>,
    history: Arc<dyn HistorySink>,
    citation_markers: Vec<String>,
}

impl AnswerPipeline {
    /// A pipeline that can only return passages until an LLM is attached.
    pub fn new(knowledge: Arc<KnowledgeBase>, history: Arc<dyn HistorySink>) -> Self {
        Self {
            knowledge,
            stages: None,
            history,
            citation_markers: KnowledgeConfig::default().citation_markers,
        }
    }

    pub fn with_llm(mut self, stages: LlmStages) -> Self {
        self.stages = Some(stages);
        self
    }

    pub fn with_citation_markers(mut self, markers: Vec<String>) -> Self {
        self.citation_markers = markers;
        self
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    pub fn history(&self) -> &Arc<dyn HistorySink> {
        &self.history
    }

    pub fn has_llm(&self) -> bool {
        self.stages.is_some()
    }

    /// Run one question to a terminal outcome.
    pub async fn run(&self, question: &str, options: &AskOptions) -> AppResult<Outcome> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(Outcome::EmptyQuestion);
        }
        validate_retrieval(options.alpha, options.top_k)?;

        tracing::info!(
            "Retrieving for question ({} chars), alpha={} k={}",
            question.chars().count(),
            options.alpha,
            options.top_k
        );
        let passages = self
            .knowledge
            .search(question, &options.rank_options())
            .await;
        if passages.is_empty() {
            tracing::info!("No passages found");
            return Ok(Outcome::NoResults);
        }
        if !options.use_llm {
            return Ok(Outcome::Passages(passages));
        }

        let stages = self.stages.as_ref().ok_or_else(|| {
            AppError::Config(
                "No LLM provider configured; set credentials or ask with --no-llm".to_string(),
            )
        })?;

        let passage_block = answer_passages(&passages);
        let texts: Vec<&str> = passages.iter().map(|p| p.chunk.text.as_str()).collect();

        tracing::info!("Generating answer from {} passages", passages.len());
        let draft = match stages.generate(question, &passage_block).await {
            Ok(draft) => draft,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("Answer generation failed: {}", e);
                return Ok(Outcome::Failed {
                    stage: FailureStage::Generate,
                    message: e.to_string(),
                    passages,
                });
            }
        };

        let verdict = stages.guardrails.check(&draft, &texts).await;
        tracing::info!("Guardrail decision: needs_fix={}", verdict.needs_fix());

        let (answer, repaired) = if verdict.needs_fix() {
            match stages
                .repair(question, &passage_block, &draft, &verdict)
                .await
            {
                Ok(repaired) => (repaired, true),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Answer repair failed: {}", e);
                    return Ok(Outcome::Failed {
                        stage: FailureStage::Repair,
                        message: e.to_string(),
                        passages,
                    });
                }
            }
        } else {
            (draft.clone(), false)
        };

        let citations = format_citations(&passages);
        let answer = ensure_citations(&answer, &citations, &self.citation_markers);

        let report = AnswerReport {
            question: question.to_string(),
            answer,
            draft_answer: draft,
            citations,
            verdict,
            repaired,
            passages,
        };

        if let Err(e) = self.history.append(&LogEntry::from_report(&report)) {
            tracing::warn!("Failed to record answer in history: {}", e);
        }

        Ok(Outcome::Answered(Box::new(report)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_guardrails::{JudgeResult, PiiKind};
    use std::collections::BTreeSet;

    #[test]
    fn test_violation_summary() {
        let clean = GuardrailVerdict::new(BTreeSet::new(), Vec::new(), JudgeResult::pass());
        assert_eq!(violation_summary(&clean), "-");

        let dirty = GuardrailVerdict::new(
            BTreeSet::from([PiiKind::Card]),
            vec!["guaranteed".to_string()],
            JudgeResult::parse_error(),
        );
        assert_eq!(
            violation_summary(&dirty),
            "pii:card, policy:guaranteed, parse_error"
        );
    }
}
