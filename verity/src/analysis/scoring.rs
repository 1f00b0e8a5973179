use serde::{Deserialize, Serialize};

use crate::analysis::types::{Finding, Severity};

/// Upper bound of the risk score and of the consistency penalty.
pub const MAX_SCORE: u32 = 100;

/// Aggregate view of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_contradictions: usize,
    pub high_severity: usize,
    pub medium_severity: usize,
    pub low_severity: usize,
    pub risk_score: u32,
}

/// Sum of severity weights, capped at [`MAX_SCORE`] for any number of terms.
fn capped_total(weights: impl IntoIterator<Item = u32>) -> u32 {
    weights
        .into_iter()
        .fold(0u32, u32::saturating_add)
        .min(MAX_SCORE)
}

pub struct RiskScorer;

impl RiskScorer {
    /// Weighted severity total, capped at [`MAX_SCORE`].
    pub fn penalty(findings: &[Finding]) -> u32 {
        capped_total(findings.iter().map(|f| f.severity.weight()))
    }

    pub fn summarize(findings: &[Finding]) -> Summary {
        let count = |severity: Severity| findings.iter().filter(|f| f.severity == severity).count();

        Summary {
            total_contradictions: findings.len(),
            high_severity: count(Severity::High),
            medium_severity: count(Severity::Medium),
            low_severity: count(Severity::Low),
            risk_score: Self::penalty(findings),
        }
    }

    /// `100 - penalty` over cross-document findings.
    pub fn consistency_score(findings: &[Finding]) -> u32 {
        MAX_SCORE - Self::penalty(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{Category, Claim, LogicalClaim, Span, Statement};

    fn finding(severity: Severity) -> Finding {
        let statement = Statement {
            id: 0,
            sentence_index: 0,
            text: "The audit happened.".to_string(),
            span: Span { start: 0, end: 19 },
            subject: "audit".to_string(),
            claim: Claim::Logical(LogicalClaim {
                predicate: "occur".to_string(),
                negated: false,
                negation_marker: None,
            }),
        };
        Finding {
            category: Category::Logical,
            severity,
            statement1: statement.clone(),
            statement2: statement,
            description: String::new(),
            confidence: 0.9,
            verified: true,
            votes: Vec::new(),
        }
    }

    #[test]
    fn test_empty_findings_score_zero() {
        let summary = RiskScorer::summarize(&[]);
        assert_eq!(summary.total_contradictions, 0);
        assert_eq!(summary.risk_score, 0);
        assert_eq!(RiskScorer::consistency_score(&[]), 100);
    }

    #[test]
    fn test_weighted_counts() {
        let findings = vec![
            finding(Severity::High),
            finding(Severity::Medium),
            finding(Severity::Low),
        ];
        let summary = RiskScorer::summarize(&findings);
        assert_eq!(summary.high_severity, 1);
        assert_eq!(summary.medium_severity, 1);
        assert_eq!(summary.low_severity, 1);
        assert_eq!(summary.risk_score, 50);
        assert_eq!(RiskScorer::consistency_score(&findings), 50);
    }

    #[test]
    fn test_score_is_capped() {
        let findings: Vec<Finding> = (0..4).map(|_| finding(Severity::High)).collect();
        assert_eq!(RiskScorer::summarize(&findings).risk_score, 100);
        assert_eq!(RiskScorer::consistency_score(&findings), 0);
    }

    #[test]
    fn test_score_monotone_in_findings() {
        let mut findings = Vec::new();
        let mut previous = 0;
        for severity in [Severity::Low, Severity::Medium, Severity::High, Severity::High] {
            findings.push(finding(severity));
            let score = RiskScorer::summarize(&findings).risk_score;
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_total_saturates_instead_of_overflowing() {
        assert_eq!(capped_total([u32::MAX, 30, 15]), MAX_SCORE);
        assert_eq!(capped_total([30, 15, 5]), 50);
        assert_eq!(capped_total(std::iter::empty()), 0);
    }
}
