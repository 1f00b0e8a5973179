use std::sync::Arc;

use regex::Regex;
use tokio::task::JoinSet;

use crate::analysis::contradiction::ContradictionDetector;
use crate::analysis::extractor::{qualifiers, StatementExtractor};
use crate::analysis::types::{
    Category, Claim, ContradictionCandidate, Finding, Statement, StrategyId, VerificationVote,
};
use crate::analysis::utils::{content_words, fuzzy_overlap_score, mentions_all};
use crate::config::SensitivityLevel;
use crate::error::StageFailure;

/// Votes required to accept a candidate.
pub const MAJORITY: usize = 2;

/// Confidence assigned to every finding when verification is disabled.
pub const UNVERIFIED_CONFIDENCE: f64 = 0.3;

/// Confidence a strategy reports when it finds no conflict.
const DISSENT_CONFIDENCE: f64 = 0.6;

/// An independent check of a contradiction candidate.
///
/// Implementations must be pure: the same candidate always yields the same
/// vote.
pub trait VerificationStrategy: Send + Sync {
    fn id(&self) -> StrategyId;

    fn evaluate(
        &self,
        candidate: &ContradictionCandidate,
    ) -> Result<VerificationVote, StageFailure>;
}

/// Portion of a statement's sentence that follows its claim, read back from
/// the end of the sentence. Falls back to the whole sentence when the claim
/// marker cannot be located.
fn claim_tail(statement: &Statement) -> &str {
    let pivot = match &statement.claim {
        Claim::Numerical(n) => Some(n.raw.as_str()),
        Claim::Temporal(t) => Some(t.marker.as_str()),
        Claim::Certainty(c) => Some(c.marker.as_str()),
        Claim::Logical(l) => l.negation_marker.as_deref(),
    };
    pivot
        .and_then(|p| {
            let escaped = regex::escape(p).replace(' ', r"\s+");
            Regex::new(&format!(r"(?i)(?:^|\W){escaped}(?:\W|$)")).ok()
        })
        .and_then(|re| re.find(&statement.text).map(|m| m.end()))
        .map_or(statement.text.as_str(), |end| &statement.text[end..])
}

/// Re-reads the pair later statement first with the widest patterns,
/// re-detects it, and checks that whatever trails each claim does not bind
/// it to a different rate, weekday or year.
pub struct ReverseOrderCheck {
    extractor: StatementExtractor,
    detector: ContradictionDetector,
}

impl ReverseOrderCheck {
    pub fn new(detector: ContradictionDetector) -> Self {
        Self {
            extractor: StatementExtractor::new(SensitivityLevel::High),
            detector,
        }
    }

    fn reread(&self, statement: &Statement, id: usize, category: Category) -> Option<Statement> {
        self.extractor
            .extract_claims(&statement.text)
            .into_iter()
            .find(|(_, claim)| claim.category() == category)
            .map(|(subject, claim)| Statement {
                id,
                subject,
                claim,
                ..statement.clone()
            })
    }

    fn dissent(&self, rationale: String) -> VerificationVote {
        VerificationVote {
            strategy: self.id(),
            agrees: false,
            confidence: DISSENT_CONFIDENCE,
            rationale,
        }
    }
}

impl VerificationStrategy for ReverseOrderCheck {
    fn id(&self) -> StrategyId {
        StrategyId::ReverseOrder
    }

    fn evaluate(
        &self,
        candidate: &ContradictionCandidate,
    ) -> Result<VerificationVote, StageFailure> {
        let category = candidate.category;
        let (Some(later), Some(earlier)) = (
            self.reread(&candidate.second, 0, category),
            self.reread(&candidate.first, 1, category),
        ) else {
            return Ok(self.dissent(format!(
                "re-reading does not recover both {category} claims"
            )));
        };

        let redetected = self.detector.detect(&[later.clone(), earlier.clone()]);
        if let Some(failure) = redetected.failures.into_iter().next() {
            return Err(failure);
        }
        let Some(conflict) = redetected.candidates.into_iter().next().map(|c| c.conflict) else {
            return Ok(self.dissent(format!(
                "no conflict when re-read in reverse order ('{}' vs '{}')",
                later.subject, earlier.subject
            )));
        };

        let trailing = qualifiers(claim_tail(&later));
        if let Some(clash) = trailing.clash(&qualifiers(claim_tail(&earlier))) {
            return Ok(self.dissent(format!("claims are qualified differently ({clash})")));
        }

        Ok(VerificationVote {
            strategy: self.id(),
            agrees: true,
            confidence: conflict.strength,
            rationale: format!("conflict holds in reverse order: {}", conflict.description),
        })
    }
}

/// Checks that both statements talk about the same subject, make different
/// claims about it, and bind those claims to the same rate, weekday and year.
pub struct SubjectAlignmentCheck;

impl SubjectAlignmentCheck {
    fn dissent(&self, rationale: String) -> VerificationVote {
        VerificationVote {
            strategy: self.id(),
            agrees: false,
            confidence: DISSENT_CONFIDENCE,
            rationale,
        }
    }
}

impl VerificationStrategy for SubjectAlignmentCheck {
    fn id(&self) -> StrategyId {
        StrategyId::SubjectAlignment
    }

    fn evaluate(
        &self,
        candidate: &ContradictionCandidate,
    ) -> Result<VerificationVote, StageFailure> {
        let (a, b) = (&candidate.first, &candidate.second);
        if a.category() != candidate.category || b.category() != candidate.category {
            return Err(StageFailure::new(
                "verification/subject-alignment",
                format!(
                    "candidate {:?} carries statements of another category",
                    candidate.pair_key()
                ),
            ));
        }

        let aligned = mentions_all(&a.text, &a.subject)
            && mentions_all(&b.text, &b.subject)
            && mentions_all(&a.text, &b.subject)
            && mentions_all(&b.text, &a.subject);
        if !aligned {
            return Ok(self.dissent(format!(
                "statements do not both mention '{}' and '{}'",
                a.subject, b.subject
            )));
        }

        if a.claim == b.claim {
            return Ok(self.dissent(format!(
                "both statements make the same claim about '{}'",
                a.subject
            )));
        }

        if let Some(clash) = qualifiers(&a.text).clash(&qualifiers(&b.text)) {
            return Ok(self.dissent(format!(
                "'{}' is qualified differently in each statement ({clash})",
                a.subject
            )));
        }

        let overlap = fuzzy_overlap_score(
            &content_words(&a.text).join(" "),
            &content_words(&b.text).join(" "),
        );
        Ok(VerificationVote {
            strategy: self.id(),
            agrees: true,
            confidence: 0.7 + 0.3 * overlap,
            rationale: format!(
                "both statements concern '{}' and claim different things",
                a.subject
            ),
        })
    }
}

/// Re-extracts both sentences with the narrowest patterns and re-applies
/// the rule to what it finds.
pub struct StrictLexicalCheck {
    extractor: StatementExtractor,
    detector: ContradictionDetector,
}

impl StrictLexicalCheck {
    pub fn new(detector: ContradictionDetector) -> Self {
        Self {
            extractor: StatementExtractor::new(SensitivityLevel::Low),
            detector,
        }
    }

    fn reextract(&self, statement: &Statement) -> Option<Statement> {
        self.extractor
            .extract_claims(&statement.text)
            .into_iter()
            .find(|(subject, claim)| {
                claim.category() == statement.category() && *subject == statement.subject
            })
            .map(|(subject, claim)| Statement {
                subject,
                claim,
                ..statement.clone()
            })
    }
}

impl VerificationStrategy for StrictLexicalCheck {
    fn id(&self) -> StrategyId {
        StrategyId::StrictLexical
    }

    fn evaluate(
        &self,
        candidate: &ContradictionCandidate,
    ) -> Result<VerificationVote, StageFailure> {
        let (Some(a), Some(b)) = (
            self.reextract(&candidate.first),
            self.reextract(&candidate.second),
        ) else {
            return Ok(VerificationVote {
                strategy: self.id(),
                agrees: false,
                confidence: 0.5,
                rationale: format!(
                    "narrow patterns do not recognise both {} claims",
                    candidate.category
                ),
            });
        };

        Ok(match self.detector.compare(candidate.category, &a, &b)? {
            Some(conflict) => VerificationVote {
                strategy: self.id(),
                agrees: true,
                confidence: conflict.strength,
                rationale: format!("narrow patterns confirm: {}", conflict.description),
            },
            None => VerificationVote {
                strategy: self.id(),
                agrees: false,
                confidence: DISSENT_CONFIDENCE,
                rationale: "narrow patterns read the claims as consistent".to_string(),
            },
        })
    }
}

/// Votes collected for one candidate, in strategy order.
#[derive(Debug, Clone, Default)]
pub struct Verdict {
    pub votes: Vec<VerificationVote>,
    pub failures: Vec<StageFailure>,
}

impl Verdict {
    pub fn agreeing(&self) -> usize {
        self.votes.iter().filter(|v| v.agrees).count()
    }

    pub fn accepted(&self) -> bool {
        self.agreeing() >= MAJORITY
    }

    /// Mean confidence of the agreeing votes.
    pub fn confidence(&self) -> f64 {
        let agreeing: Vec<f64> = self
            .votes
            .iter()
            .filter(|v| v.agrees)
            .map(|v| v.confidence)
            .collect();
        if agreeing.is_empty() {
            return 0.0;
        }
        agreeing.iter().sum::<f64>() / agreeing.len() as f64
    }
}

/// Findings that survived verification, plus strategy failures.
#[derive(Debug, Clone, Default)]
pub struct VerificationOutcome {
    pub findings: Vec<Finding>,
    pub failures: Vec<StageFailure>,
}

fn failed_vote(strategy: StrategyId, failure: &StageFailure) -> VerificationVote {
    VerificationVote {
        strategy,
        agrees: false,
        confidence: 0.0,
        rationale: format!("strategy failed: {failure}"),
    }
}

fn finding_from(
    candidate: &ContradictionCandidate,
    votes: Vec<VerificationVote>,
    confidence: f64,
    verified: bool,
) -> Finding {
    Finding {
        category: candidate.category,
        severity: candidate.severity(),
        statement1: candidate.first.clone(),
        statement2: candidate.second.clone(),
        description: candidate.conflict.description.clone(),
        confidence,
        verified,
        votes,
    }
}

/// Runs the verification strategies for each candidate and applies the
/// majority vote.
pub struct VerificationCoordinator {
    strategies: Vec<Arc<dyn VerificationStrategy>>,
}

impl VerificationCoordinator {
    pub fn new(numeric_tolerance: f64) -> Self {
        let detector = ContradictionDetector::new(numeric_tolerance);
        Self::with_strategies(vec![
            Arc::new(ReverseOrderCheck::new(detector)),
            Arc::new(SubjectAlignmentCheck),
            Arc::new(StrictLexicalCheck::new(detector)),
        ])
    }

    pub fn with_strategies(strategies: Vec<Arc<dyn VerificationStrategy>>) -> Self {
        Self { strategies }
    }

    /// Evaluate one candidate with every strategy in parallel.
    pub async fn verify(&self, candidate: &ContradictionCandidate) -> Verdict {
        let shared = Arc::new(candidate.clone());
        let mut tasks = JoinSet::new();

        for strategy in &self.strategies {
            let strategy = Arc::clone(strategy);
            let candidate = Arc::clone(&shared);
            tasks.spawn(async move { (strategy.id(), strategy.evaluate(&candidate)) });
        }

        let mut verdict = Verdict::default();
        let mut failed: Vec<(StrategyId, StageFailure)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(vote))) => verdict.votes.push(vote),
                Ok((id, Err(failure))) => {
                    tracing::warn!(strategy = %id, error = %failure, "Verification strategy failed");
                    verdict.votes.push(failed_vote(id, &failure));
                    failed.push((id, failure));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Verification task aborted");
                }
            }
        }

        // A task that died without reporting still owes a vote.
        for strategy in &self.strategies {
            let id = strategy.id();
            if !verdict.votes.iter().any(|v| v.strategy == id) {
                let failure = StageFailure::new(
                    format!("verification/{id}"),
                    "strategy produced no vote",
                );
                verdict.votes.push(failed_vote(id, &failure));
                failed.push((id, failure));
            }
        }

        // Completion order varies between runs; the recorded order must not.
        verdict.votes.sort_by_key(|v| v.strategy);
        failed.sort_by(|(x, a), (y, b)| {
            x.cmp(y).then_with(|| a.to_string().cmp(&b.to_string()))
        });
        verdict.failures = failed.into_iter().map(|(_, failure)| failure).collect();
        verdict
    }

    /// Verify every candidate, in order. With `triple_verification` off the
    /// candidates pass straight through as unverified findings.
    pub async fn verify_all(
        &self,
        candidates: &[ContradictionCandidate],
        triple_verification: bool,
    ) -> VerificationOutcome {
        let mut outcome = VerificationOutcome::default();

        if !triple_verification {
            tracing::debug!(
                candidates = candidates.len(),
                "Verification disabled; passing candidates through"
            );
            outcome.findings = candidates
                .iter()
                .map(|c| finding_from(c, Vec::new(), UNVERIFIED_CONFIDENCE, false))
                .collect();
            return outcome;
        }

        for candidate in candidates {
            let verdict = self.verify(candidate).await;
            let accepted = verdict.accepted();
            tracing::debug!(
                category = %candidate.category,
                first = candidate.first.id,
                second = candidate.second.id,
                agreeing = verdict.agreeing(),
                accepted,
                "Candidate verified"
            );

            let confidence = verdict.confidence();
            outcome.failures.extend(verdict.failures);
            if accepted {
                outcome
                    .findings
                    .push(finding_from(candidate, verdict.votes, confidence, true));
            }
        }

        outcome
    }
}
