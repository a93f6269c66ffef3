//! Prompt system for the Compliance Assistant.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions (answer, judge, repair)
//! - Built-in defaults with per-workspace overrides
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{
    builtin_prompt, list_prompts, load_prompt, ANSWER_PROMPT_ID, JUDGE_PROMPT_ID,
    REPAIR_PROMPT_ID,
};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec, PromptSource};
