mod anchor;
mod chain;
mod digest;

pub use anchor::{EvidenceRecord, ForensicAnchor, ForensicData, Integrity};
pub use chain::{verify_chain, AuditEntry, AuditTrail, ChainIntegrityError, Stage, StageStatus};
pub use digest::Digest;
