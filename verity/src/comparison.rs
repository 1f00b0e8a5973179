use crate::analysis::contradiction::ContradictionDetector;
use crate::analysis::scoring::RiskScorer;
use crate::analysis::verification::VerificationCoordinator;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::ComparisonResult;
use crate::pipeline::{self, ensure_text};

/// Analyses two documents and checks them against each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentComparator;

impl DocumentComparator {
    pub fn new() -> Self {
        Self
    }

    pub async fn compare(
        &self,
        document1: &str,
        document2: &str,
        config: &AnalysisConfig,
    ) -> Result<ComparisonResult> {
        ensure_text(document1, "document 1")?;
        ensure_text(document2, "document 2")?;
        config.validate()?;

        let (left, right) = tokio::join!(
            pipeline::run(document1, config),
            pipeline::run(document2, config)
        );
        let (left, right) = (left?, right?);

        let detection = ContradictionDetector::new(config.numeric_tolerance)
            .detect_across(&left.statements, &right.statements);
        if detection.is_degraded() {
            tracing::warn!(
                failures = detection.failures.len(),
                "Cross-document detection skipped buckets"
            );
        }

        let verification = VerificationCoordinator::new(config.numeric_tolerance)
            .verify_all(&detection.candidates, config.enable_triple_verification)
            .await;
        let consistency_score = RiskScorer::consistency_score(&verification.findings);

        tracing::info!(
            cross_findings = verification.findings.len(),
            consistency_score,
            "Comparison complete"
        );

        Ok(ComparisonResult {
            document1_analysis: left.result,
            document2_analysis: right.result,
            cross_document_findings: verification.findings,
            consistency_score,
        })
    }
}
