//! Post-generation safety checks for compliance answers.
//!
//! - [`pii`]: regex registry for personal identifiers
//! - [`policy`]: forbidden-phrase policy loaded from YAML
//! - [`judge`]: LLM judge with a conservative fallback verdict
//! - [`verdict`]: the combined [`GuardrailVerdict`] and its needs-fix rule
//!
//! Guardrail hits are expected outcomes, not errors: they route the answer
//! to the repair pass.

pub mod checker;
pub mod judge;
pub mod pii;
pub mod policy;
pub mod verdict;

pub use checker::Guardrails;
pub use judge::{judge_passages, Judge, JudgeParseError, JudgeResult, JUDGE_PASSAGE_CHARS};
pub use pii::{format_kinds, PiiDetector, PiiKind};
pub use policy::{load_policy, violates, Policy};
pub use verdict::GuardrailVerdict;
