//! Declarative forbidden-phrase policy.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Policy document: an ordered list of phrases an answer must not contain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub forbidden_phrases: Vec<String>,
}

impl Policy {
    pub fn new(forbidden_phrases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            forbidden_phrases: forbidden_phrases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.forbidden_phrases.is_empty()
    }
}

/// Load a policy from YAML.
///
/// Never fails: a missing, unreadable or malformed file yields an empty
/// policy and a warning.
pub fn load_policy(path: &Path) -> Policy {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!("Policy file {:?} unreadable, using empty policy: {}", path, e);
            return Policy::default();
        }
    };

    // An empty document parses as null
    if contents.trim().is_empty() {
        return Policy::default();
    }

    match serde_yaml::from_str::<Policy>(&contents) {
        Ok(policy) => {
            tracing::debug!(
                "Loaded policy {:?} ({} phrases)",
                path,
                policy.forbidden_phrases.len()
            );
            policy
        }
        Err(e) => {
            tracing::warn!("Policy file {:?} is malformed, using empty policy: {}", path, e);
            Policy::default()
        }
    }
}

/// Forbidden phrases present in `text`, case-insensitive, in declared order.
pub fn violates(text: &str, policy: &Policy) -> Vec<String> {
    let haystack = text.to_lowercase();
    policy
        .forbidden_phrases
        .iter()
        .filter(|phrase| {
            let needle = phrase.trim().to_lowercase();
            !needle.is_empty() && haystack.contains(&needle)
        })
        .cloned()
        .collect()
}
