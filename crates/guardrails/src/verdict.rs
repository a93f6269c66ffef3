use crate::judge::JudgeResult;
use crate::pii::{format_kinds, PiiKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Combined outcome of all guardrail checks on one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    pub ok: bool,
    pub pii_hits: BTreeSet<PiiKind>,
    pub policy_hits: Vec<String>,
    pub judge: JudgeResult,
}

impl GuardrailVerdict {
    pub fn new(pii_hits: BTreeSet<PiiKind>, policy_hits: Vec<String>, judge: JudgeResult) -> Self {
        let needs_fix = !pii_hits.is_empty() || !policy_hits.is_empty() || judge.requires_fix();
        Self {
            ok: !needs_fix,
            pii_hits,
            policy_hits,
            judge,
        }
    }

    /// Whether the answer must go through the repair pass.
    pub fn needs_fix(&self) -> bool {
        !self.ok
    }

    /// One-line summary shown under an answer.
    pub fn caption(&self) -> String {
        let policy = if self.policy_hits.is_empty() {
            "-".to_string()
        } else {
            self.policy_hits.join(",")
        };
        format!(
            "Guardrails: PII={}, policy={}, judge={}",
            format_kinds(&self.pii_hits),
            policy,
            self.judge.to_json()
        )
    }
}
