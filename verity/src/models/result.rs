use serde::{Deserialize, Serialize};

use crate::analysis::scoring::Summary;
use crate::analysis::types::Finding;
use crate::forensic::{Digest, ForensicData};

/// Output of a single-document analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// SHA-256 of the input text; `None` when forensic hashing is off.
    pub document_hash: Option<Digest>,
    pub findings: Vec<Finding>,
    pub summary: Summary,
    pub forensic_data: Option<ForensicData>,
}

impl AnalysisResult {
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    /// True when any audit entry was recorded as degraded.
    pub fn is_degraded(&self) -> bool {
        self.forensic_data
            .as_ref()
            .is_some_and(|f| f.audit_trail.iter().any(|e| e.status.is_degraded()))
    }
}

/// Output of a two-document comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub document1_analysis: AnalysisResult,
    pub document2_analysis: AnalysisResult,
    /// Findings whose first statement is from document 1 and second from
    /// document 2.
    pub cross_document_findings: Vec<Finding>,
    /// `100 - min(100, weighted cross-document findings)`.
    pub consistency_score: u32,
}
