use crate::analysis::contradiction::ContradictionDetector;
use crate::analysis::extractor::StatementExtractor;
use crate::analysis::scoring::RiskScorer;
use crate::analysis::types::Statement;
use crate::analysis::verification::VerificationCoordinator;
use crate::comparison::DocumentComparator;
use crate::config::AnalysisConfig;
use crate::error::{Result, VerityError};
use crate::forensic::{ForensicAnchor, Stage};
use crate::models::{AnalysisResult, ComparisonResult};

/// Result of one pipeline run, with the statements kept for cross-document
/// comparison.
#[derive(Debug, Clone)]
pub(crate) struct PipelineRun {
    pub result: AnalysisResult,
    pub statements: Vec<Statement>,
}

pub(crate) fn ensure_text(text: &str, label: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(VerityError::Input(format!("{label} is empty")));
    }
    Ok(())
}

/// Single-document analysis pipeline:
/// extraction -> detection -> verification -> scoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    pub async fn analyze(&self, text: &str, config: &AnalysisConfig) -> Result<AnalysisResult> {
        ensure_text(text, "document")?;
        config.validate()?;
        Ok(run(text, config).await?.result)
    }

    pub async fn compare_documents(
        &self,
        document1: &str,
        document2: &str,
        config: &AnalysisConfig,
    ) -> Result<ComparisonResult> {
        DocumentComparator::new()
            .compare(document1, document2, config)
            .await
    }
}

/// Run every stage over validated input.
pub(crate) async fn run(text: &str, config: &AnalysisConfig) -> Result<PipelineRun> {
    let mut anchor = config
        .generate_forensic_hash
        .then(|| ForensicAnchor::begin(text));

    tracing::info!(
        chars = text.chars().count(),
        sensitivity = %config.sensitivity_level,
        verification = config.enable_triple_verification,
        "Starting analysis"
    );

    let statements = StatementExtractor::new(config.sensitivity_level).extract(text);
    tracing::debug!(statements = statements.len(), "Extraction complete");
    if let Some(anchor) = anchor.as_mut() {
        anchor.record(Stage::Extraction, &statements, &[])?;
    }

    let detection = ContradictionDetector::new(config.numeric_tolerance).detect(&statements);
    if detection.is_degraded() {
        tracing::warn!(
            failures = detection.failures.len(),
            "Detection completed with skipped buckets"
        );
    }
    if let Some(anchor) = anchor.as_mut() {
        anchor.record(Stage::Detection, &detection.candidates, &detection.failures)?;
    }

    let verification = VerificationCoordinator::new(config.numeric_tolerance)
        .verify_all(&detection.candidates, config.enable_triple_verification)
        .await;
    tracing::debug!(
        candidates = detection.candidates.len(),
        findings = verification.findings.len(),
        "Verification complete"
    );
    if let Some(anchor) = anchor.as_mut() {
        anchor.record(Stage::Verification, &verification.findings, &verification.failures)?;
    }

    let findings = verification.findings;
    let summary = RiskScorer::summarize(&findings);
    if let Some(anchor) = anchor.as_mut() {
        anchor.record(Stage::Scoring, &summary, &[])?;
    }

    let document_hash = anchor.as_ref().map(|a| a.document_digest().clone());
    let forensic_data = anchor.map(|a| a.seal(&findings)).transpose()?;

    tracing::info!(
        findings = findings.len(),
        risk_score = summary.risk_score,
        "Analysis complete"
    );

    Ok(PipelineRun {
        result: AnalysisResult {
            document_hash,
            findings,
            summary,
            forensic_data,
        },
        statements,
    })
}
