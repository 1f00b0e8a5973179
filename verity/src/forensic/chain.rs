use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StageFailure;
use crate::forensic::digest::Digest;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extraction,
    Detection,
    Verification,
    Scoring,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [
        Stage::Extraction,
        Stage::Detection,
        Stage::Verification,
        Stage::Scoring,
    ];
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extraction => write!(f, "extraction"),
            Self::Detection => write!(f, "detection"),
            Self::Verification => write!(f, "verification"),
            Self::Scoring => write!(f, "scoring"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum StageStatus {
    Completed,
    Degraded { notes: Vec<String> },
}

impl StageStatus {
    pub fn from_failures(failures: &[StageFailure]) -> Self {
        if failures.is_empty() {
            Self::Completed
        } else {
            Self::Degraded {
                notes: failures.iter().map(ToString::to_string).collect(),
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// One link of the audit chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub sequence: u64,
    pub stage: Stage,
    pub input_digest: Digest,
    pub output_digest: Digest,
    /// `SHA256(previous chain digest ‖ input ‖ output)`.
    pub chain_digest: Digest,
    pub status: StageStatus,
}

// ---------------------------------------------------------------------------
// ChainIntegrityError
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainIntegrityError {
    #[error("result carries no forensic data")]
    MissingForensicData,

    #[error("audit trail is empty")]
    EmptyTrail,

    #[error("document hash {recorded} does not match integrity record {expected}")]
    DocumentMismatch { expected: Digest, recorded: Digest },

    #[error("non-monotonic sequence: {sequence} after {previous}")]
    NonMonotonicSequence { sequence: u64, previous: u64 },

    #[error("entry {sequence}: expected stage {expected}, found {found}")]
    StageOrder {
        sequence: u64,
        expected: Stage,
        found: Stage,
    },

    #[error("entry {sequence}: input {actual} does not continue from {expected}")]
    ChainLinkBroken {
        sequence: u64,
        expected: Digest,
        actual: Digest,
    },

    #[error("entry {sequence}: chain digest {recorded} should be {computed}")]
    DigestMismatch {
        sequence: u64,
        recorded: Digest,
        computed: Digest,
    },

    #[error("{stage} output {recorded} does not match recomputed {computed}")]
    OutputMismatch {
        stage: Stage,
        recorded: Digest,
        computed: Digest,
    },

    #[error("evidence record {index}: {reason}")]
    EvidenceMismatch { index: usize, reason: String },

    #[error("chain head {recorded} does not match last entry {computed}")]
    HeadMismatch { recorded: Digest, computed: Digest },

    #[error("cannot re-encode result: {0}")]
    Encoding(String),
}

// ---------------------------------------------------------------------------
// AuditTrail
// ---------------------------------------------------------------------------

/// Append-only, hash-linked record of stage executions.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chain digest of the last entry, or genesis when empty.
    pub fn head(&self) -> Digest {
        self.entries
            .last()
            .map(|e| e.chain_digest.clone())
            .unwrap_or_else(Digest::genesis)
    }

    pub fn append(
        &mut self,
        stage: Stage,
        input_digest: Digest,
        output_digest: Digest,
        status: StageStatus,
    ) -> &AuditEntry {
        let chain_digest = Digest::link(&self.head(), &input_digest, &output_digest);
        let sequence = self.entries.len() as u64;
        self.entries.push(AuditEntry {
            sequence,
            stage,
            input_digest,
            output_digest,
            chain_digest,
            status,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<AuditEntry> {
        self.entries
    }

    pub fn verify(&self) -> Result<(), ChainIntegrityError> {
        verify_chain(&self.entries)
    }
}

/// Check sequence numbers, stage order, input/output linkage and every
/// chain digest of a recorded trail.
pub fn verify_chain(entries: &[AuditEntry]) -> Result<(), ChainIntegrityError> {
    if entries.is_empty() {
        return Err(ChainIntegrityError::EmptyTrail);
    }

    let mut previous_chain = Digest::genesis();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            let prev = &entries[i - 1];
            if entry.sequence <= prev.sequence {
                return Err(ChainIntegrityError::NonMonotonicSequence {
                    sequence: entry.sequence,
                    previous: prev.sequence,
                });
            }
            if entry.input_digest != prev.output_digest {
                return Err(ChainIntegrityError::ChainLinkBroken {
                    sequence: entry.sequence,
                    expected: prev.output_digest.clone(),
                    actual: entry.input_digest.clone(),
                });
            }
        }

        if let Some(expected) = Stage::ORDER.get(i) {
            if entry.stage != *expected {
                return Err(ChainIntegrityError::StageOrder {
                    sequence: entry.sequence,
                    expected: *expected,
                    found: entry.stage,
                });
            }
        }

        let computed = Digest::link(&previous_chain, &entry.input_digest, &entry.output_digest);
        if entry.chain_digest != computed {
            return Err(ChainIntegrityError::DigestMismatch {
                sequence: entry.sequence,
                recorded: entry.chain_digest.clone(),
                computed,
            });
        }
        previous_chain = computed;
    }

    Ok(())
}
