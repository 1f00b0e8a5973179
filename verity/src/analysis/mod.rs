pub mod contradiction;
pub mod extractor;
pub mod scoring;
pub mod segment;
pub mod types;
pub mod utils;
pub mod verification;

pub use contradiction::{ContradictionDetector, DetectionOutcome};
pub use extractor::StatementExtractor;
pub use scoring::{RiskScorer, Summary};
pub use types::{
    Category, Claim, ContradictionCandidate, Finding, Severity, Statement, StrategyId,
    VerificationVote,
};
pub use verification::{VerificationCoordinator, VerificationOutcome, VerificationStrategy};
