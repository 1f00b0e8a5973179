//! Contradiction detection over free text.
//!
//! A document is split into atomic statements, statements about the same
//! subject are compared by category rules, each candidate is checked by
//! three independent strategies, and the surviving findings are scored.
//! Every stage is recorded in a SHA-256 hash-chained audit trail.

pub mod analysis;
pub mod comparison;
pub mod config;
pub mod error;
pub mod forensic;
pub mod input;
pub mod models;
pub mod pipeline;
pub mod report;

pub use analysis::{Category, Finding, Severity, Summary};
pub use comparison::DocumentComparator;
pub use config::{AnalysisConfig, Config, OutputFormat, SensitivityLevel};
pub use error::{Result, StageFailure, VerityError};
pub use forensic::{ChainIntegrityError, Digest, ForensicAnchor, ForensicData};
pub use input::read_document;
pub use models::{AnalysisResult, ComparisonResult};
pub use pipeline::Analyzer;

/// Analyse a single document.
pub async fn analyze(text: &str, config: &AnalysisConfig) -> Result<AnalysisResult> {
    Analyzer::new().analyze(text, config).await
}

/// Analyse two documents and the contradictions between them.
pub async fn compare_documents(
    document1: &str,
    document2: &str,
    config: &AnalysisConfig,
) -> Result<ComparisonResult> {
    DocumentComparator::new()
        .compare(document1, document2, config)
        .await
}

/// Recompute the audit chain of a finished analysis.
pub fn verify_result(result: &AnalysisResult) -> std::result::Result<(), ChainIntegrityError> {
    ForensicAnchor::verify(result)
}
