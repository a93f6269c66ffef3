//! Regex-based detection of personal identifiers.
//!
//! The patterns are deliberately over-inclusive: any three or four digit
//! run counts as a CVV. Only presence is reported, never positions.

use compliance_core::{AppError, AppResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of personal identifier.
///
/// Ordering follows the detector registry, so sets iterate
/// card, cvv, phone, email, passport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PiiKind {
    Card,
    Cvv,
    Phone,
    Email,
    Passport,
}

impl PiiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Cvv => "cvv",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Passport => "passport",
        }
    }
}

impl fmt::Display for PiiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PATTERNS: [(PiiKind, &str); 5] = [
    (PiiKind::Card, r"\b(?:\d[ -]*?){13,19}\b"),
    (PiiKind::Cvv, r"\b\d{3,4}\b"),
    (PiiKind::Phone, r"\+?\d[\d \-]{7,}\d"),
    (PiiKind::Email, r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
    (PiiKind::Passport, r"\b\d{2}\s?\d{2}\s?\d{6}\b"),
];

/// Compiled PII pattern registry.
#[derive(Debug, Clone)]
pub struct PiiDetector {
    patterns: Vec<(PiiKind, Regex)>,
}

impl PiiDetector {
    pub fn new() -> AppResult<Self> {
        let patterns = PATTERNS
            .iter()
            .map(|(kind, pattern)| {
                Regex::new(pattern)
                    .map(|re| (*kind, re))
                    .map_err(|e| AppError::Guardrail(format!("Invalid {} pattern: {}", kind, e)))
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Kinds whose pattern matches anywhere in `text`.
    pub fn detect(&self, text: &str) -> BTreeSet<PiiKind> {
        self.patterns
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(kind, _)| *kind)
            .collect()
    }
}

/// Join kinds for display, `-` when there are none.
pub fn format_kinds(kinds: &BTreeSet<PiiKind>) -> String {
    if kinds.is_empty() {
        return "-".to_string();
    }
    kinds
        .iter()
        .map(PiiKind::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> BTreeSet<PiiKind> {
        PiiDetector::new().unwrap().detect(text)
    }

    #[test]
    fn test_email_detected() {
        assert!(detect("contact me at jane.doe@example.com").contains(&PiiKind::Email));
    }

    #[test]
    fn test_plain_text_is_clean() {
        assert!(detect("the weather is nice").is_empty());
    }

    #[test]
    fn test_card_number_with_separators() {
        let hits = detect("card 4111 1111 1111 1111 on file");
        assert!(hits.contains(&PiiKind::Card));
        // the groups of four also look like CVVs
        assert!(hits.contains(&PiiKind::Cvv));
    }

    #[test]
    fn test_sixteen_digit_run() {
        let hits = detect("number 4111111111111111");
        assert!(hits.contains(&PiiKind::Card));
        assert!(hits.contains(&PiiKind::Phone));
    }

    #[test]
    fn test_cvv_over_inclusive() {
        assert_eq!(detect("limit is 500 units"), BTreeSet::from([PiiKind::Cvv]));
    }

    #[test]
    fn test_phone() {
        assert!(detect("call +7 495 123-45-67").contains(&PiiKind::Phone));
    }

    #[test]
    fn test_passport_groups() {
        assert!(detect("passport 45 08 123456").contains(&PiiKind::Passport));
    }

    #[test]
    fn test_registry_order_and_format() {
        let hits = detect("mail a@b.io, code 123");
        let kinds: Vec<_> = hits.iter().copied().collect();
        assert_eq!(kinds, vec![PiiKind::Cvv, PiiKind::Email]);
        assert_eq!(format_kinds(&hits), "cvv,email");
        assert_eq!(format_kinds(&BTreeSet::new()), "-");
    }
}
