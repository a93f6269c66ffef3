//! Runs every guardrail against a generated answer.

use crate::judge::Judge;
use crate::pii::PiiDetector;
use crate::policy::{violates, Policy};
use crate::verdict::GuardrailVerdict;

/// PII detector, policy and judge bundled for the answer pipeline.
pub struct Guardrails {
    detector: PiiDetector,
    policy: Policy,
    judge: Judge,
}

impl Guardrails {
    pub fn new(detector: PiiDetector, policy: Policy, judge: Judge) -> Self {
        Self {
            detector,
            policy,
            judge,
        }
    }

    /// Check an answer. The local checks and the judge are independent;
    /// none of them can fail the call.
    pub async fn check<S: AsRef<str>>(&self, answer: &str, passages: &[S]) -> GuardrailVerdict {
        let pii_hits = self.detector.detect(answer);
        let policy_hits = violates(answer, &self.policy);
        let judge = self.judge.evaluate(answer, passages).await;

        let verdict = GuardrailVerdict::new(pii_hits, policy_hits, judge);
        tracing::info!(
            "Guardrails: pii={} policy={} judge_ok={} needs_fix={}",
            verdict.pii_hits.len(),
            verdict.policy_hits.len(),
            verdict.judge.ok,
            verdict.needs_fix()
        );
        verdict
    }
}
