use serde::{Deserialize, Serialize};

use crate::analysis::types::{Category, Finding};
use crate::error::{Result, StageFailure};
use crate::forensic::chain::{
    verify_chain, AuditEntry, AuditTrail, ChainIntegrityError, Stage, StageStatus,
};
use crate::forensic::digest::Digest;
use crate::models::AnalysisResult;

/// Integrity summary of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrity {
    pub document_hash: Digest,
    pub chain_head: Digest,
    /// Whether the trail verified when it was sealed.
    pub verified: bool,
}

/// Per-finding evidence: digests of both statements and of the finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    pub finding_index: usize,
    #[serde(rename = "type")]
    pub category: Category,
    pub statement1_digest: Digest,
    pub statement2_digest: Digest,
    pub finding_digest: Digest,
}

impl EvidenceRecord {
    fn for_finding(index: usize, finding: &Finding) -> Result<Self> {
        Ok(Self {
            finding_index: index,
            category: finding.category,
            statement1_digest: Digest::of_json(&finding.statement1)?,
            statement2_digest: Digest::of_json(&finding.statement2)?,
            finding_digest: Digest::of_json(finding)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForensicData {
    pub integrity: Integrity,
    pub evidence_chain: Vec<EvidenceRecord>,
    pub audit_trail: Vec<AuditEntry>,
}

/// Records stage digests while a pipeline runs and seals them into
/// [`ForensicData`].
#[derive(Debug, Clone)]
pub struct ForensicAnchor {
    document: Digest,
    last_output: Digest,
    trail: AuditTrail,
}

impl ForensicAnchor {
    /// Start a trail for `text`. The document digest is the first input.
    pub fn begin(text: &str) -> Self {
        let document = Digest::of_bytes(text.as_bytes());
        Self {
            last_output: document.clone(),
            document,
            trail: AuditTrail::new(),
        }
    }

    pub fn document_digest(&self) -> &Digest {
        &self.document
    }

    /// Append an entry for `stage`. Its input is the previous stage's output.
    pub fn record<T: Serialize + ?Sized>(
        &mut self,
        stage: Stage,
        output: &T,
        failures: &[StageFailure],
    ) -> Result<()> {
        let output_digest = Digest::of_json(output)?;
        let entry = self.trail.append(
            stage,
            self.last_output.clone(),
            output_digest.clone(),
            StageStatus::from_failures(failures),
        );
        tracing::debug!(
            stage = %entry.stage,
            sequence = entry.sequence,
            chain = %entry.chain_digest,
            degraded = entry.status.is_degraded(),
            "Audit entry recorded"
        );
        self.last_output = output_digest;
        Ok(())
    }

    pub fn seal(self, findings: &[Finding]) -> Result<ForensicData> {
        let evidence_chain = findings
            .iter()
            .enumerate()
            .map(|(i, f)| EvidenceRecord::for_finding(i, f))
            .collect::<Result<Vec<_>>>()?;

        let verified = self.trail.verify().is_ok();
        Ok(ForensicData {
            integrity: Integrity {
                document_hash: self.document,
                chain_head: self.trail.head(),
                verified,
            },
            evidence_chain,
            audit_trail: self.trail.into_entries(),
        })
    }

    /// Recompute every digest of a finished result and check it against
    /// what was recorded.
    pub fn verify(result: &AnalysisResult) -> Result<(), ChainIntegrityError> {
        let forensic = result
            .forensic_data
            .as_ref()
            .ok_or(ChainIntegrityError::MissingForensicData)?;
        let integrity = &forensic.integrity;

        if let Some(recorded) = &result.document_hash {
            if *recorded != integrity.document_hash {
                return Err(ChainIntegrityError::DocumentMismatch {
                    expected: integrity.document_hash.clone(),
                    recorded: recorded.clone(),
                });
            }
        }

        let trail = &forensic.audit_trail;
        verify_chain(trail)?;

        if trail[0].input_digest != integrity.document_hash {
            return Err(ChainIntegrityError::ChainLinkBroken {
                sequence: trail[0].sequence,
                expected: integrity.document_hash.clone(),
                actual: trail[0].input_digest.clone(),
            });
        }

        let encode = |e: crate::error::VerityError| ChainIntegrityError::Encoding(e.to_string());
        check_output(trail, Stage::Verification, Digest::of_json(&result.findings).map_err(encode)?)?;
        check_output(trail, Stage::Scoring, Digest::of_json(&result.summary).map_err(encode)?)?;

        if forensic.evidence_chain.len() != result.findings.len() {
            return Err(ChainIntegrityError::EvidenceMismatch {
                index: forensic.evidence_chain.len().min(result.findings.len()),
                reason: format!(
                    "{} records for {} findings",
                    forensic.evidence_chain.len(),
                    result.findings.len()
                ),
            });
        }
        for (i, (record, finding)) in forensic
            .evidence_chain
            .iter()
            .zip(&result.findings)
            .enumerate()
        {
            let expected = EvidenceRecord::for_finding(i, finding).map_err(encode)?;
            if *record != expected {
                return Err(ChainIntegrityError::EvidenceMismatch {
                    index: i,
                    reason: "digests do not match the finding".to_string(),
                });
            }
        }

        let computed = trail
            .last()
            .map(|e| e.chain_digest.clone())
            .unwrap_or_else(Digest::genesis);
        if integrity.chain_head != computed {
            return Err(ChainIntegrityError::HeadMismatch {
                recorded: integrity.chain_head.clone(),
                computed,
            });
        }

        Ok(())
    }
}

fn check_output(
    trail: &[AuditEntry],
    stage: Stage,
    computed: Digest,
) -> Result<(), ChainIntegrityError> {
    let Some(entry) = trail.iter().find(|e| e.stage == stage) else {
        return Err(ChainIntegrityError::OutputMismatch {
            stage,
            recorded: Digest::genesis(),
            computed,
        });
    };
    if entry.output_digest != computed {
        return Err(ChainIntegrityError::OutputMismatch {
            stage,
            recorded: entry.output_digest.clone(),
            computed,
        });
    }
    Ok(())
}
