//! Session context tying configuration, index, pipeline and history.
//!
//! Opening a session preloads the corpus and builds the index once; every
//! question in the session reuses it.

use crate::config::{uploads_dir, KnowledgeConfig};
use crate::embeddings::create_backend;
use crate::ingest::{document_from_path, file_uri, load_corpus, store_upload, validate_upload};
use crate::knowledge_base::KnowledgeBase;
use crate::rag::{AnswerPipeline, AskOptions, GenerationSettings, HistorySink, LlmStages, Outcome};
use crate::types::KnowledgeStats;
use compliance_core::{AppError, AppResult};
use compliance_guardrails::{load_policy, Guardrails, Judge, PiiDetector};
use compliance_llm::LlmClient;
use compliance_prompt::{load_prompt, ANSWER_PROMPT_ID, JUDGE_PROMPT_ID, REPAIR_PROMPT_ID};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A chat client and the model to ask for.
#[derive(Clone)]
pub struct LlmBinding {
    pub client: Arc<dyn LlmClient>,
    pub model: String,
}

impl LlmBinding {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

pub struct ComplianceSession {
    workspace: PathBuf,
    config: KnowledgeConfig,
    pipeline: AnswerPipeline,
}

impl ComplianceSession {
    /// Preload the corpus, build the index and wire the pipeline.
    ///
    /// Without an `llm` binding the session answers in passages-only mode.
    pub async fn open(
        workspace: &Path,
        config: KnowledgeConfig,
        llm: Option<LlmBinding>,
        history: Arc<dyn HistorySink>,
    ) -> AppResult<Self> {
        config.validate()?;

        let backend = create_backend(&config.embedding);
        let knowledge = Arc::new(KnowledgeBase::from_config(&config, backend));

        let documents = load_corpus(&config.corpus_paths(workspace));
        knowledge.add_documents(documents).await;
        knowledge.build().await?;

        let mut pipeline = AnswerPipeline::new(Arc::clone(&knowledge), history)
            .with_citation_markers(config.citation_markers.clone());

        if let Some(llm) = llm {
            pipeline = pipeline.with_llm(Self::llm_stages(workspace, &config, llm)?);
        }

        Ok(Self {
            workspace: workspace.to_path_buf(),
            config,
            pipeline,
        })
    }

    fn llm_stages(
        workspace: &Path,
        config: &KnowledgeConfig,
        llm: LlmBinding,
    ) -> AppResult<LlmStages> {
        let answer_prompt = load_prompt(workspace, ANSWER_PROMPT_ID)?;
        let judge_prompt = load_prompt(workspace, JUDGE_PROMPT_ID)?;
        let repair_prompt = load_prompt(workspace, REPAIR_PROMPT_ID)?;

        let policy = load_policy(&config.policy_file(workspace));
        tracing::debug!("Policy holds {} phrases", policy.forbidden_phrases.len());

        let judge = Judge::new(Arc::clone(&llm.client), judge_prompt, &llm.model)
            .with_timeout(config.llm_timeout())
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens);
        let guardrails = Guardrails::new(PiiDetector::new()?, policy, judge);

        Ok(LlmStages::new(
            llm.client,
            answer_prompt,
            repair_prompt,
            guardrails,
            GenerationSettings::from_config(config, llm.model),
        ))
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        self.pipeline.knowledge()
    }

    pub fn has_llm(&self) -> bool {
        self.pipeline.has_llm()
    }

    /// Default per-question options from configuration.
    pub fn ask_options(&self) -> AskOptions {
        AskOptions::from_config(&self.config)
    }

    pub async fn ask(&self, question: &str, options: &AskOptions) -> AppResult<Outcome> {
        self.pipeline.run(question, options).await
    }

    /// Copy files into the uploads directory, add them and rebuild.
    ///
    /// Every file is read before any is copied, so a rejected batch leaves
    /// both the uploads directory and the index untouched. Returns the ids
    /// of the documents added.
    pub async fn ingest(&self, paths: &[PathBuf]) -> AppResult<Vec<String>> {
        let mut staged = Vec::with_capacity(paths.len());
        for path in paths {
            validate_upload(path)?;
            let doc = document_from_path(path).ok_or_else(|| {
                AppError::Knowledge(format!("No text could be extracted from {:?}", path))
            })?;
            staged.push((path, doc));
        }

        let uploads = uploads_dir(&self.workspace);
        let mut documents = Vec::with_capacity(staged.len());
        for (path, mut doc) in staged {
            let stored = store_upload(&uploads, path)?;
            doc.source_uri = file_uri(&stored);
            documents.push(doc);
        }

        let ids: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();
        self.knowledge().add_documents(documents).await;
        self.knowledge().build().await?;

        tracing::info!("Ingested {} documents", ids.len());
        Ok(ids)
    }

    pub async fn stats(&self) -> KnowledgeStats {
        self.knowledge().stats().await
    }
}
