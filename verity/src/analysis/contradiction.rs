use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::types::{
    Category, CertaintyClaim, CertaintyRegister, Claim, ConflictDescriptor,
    ContradictionCandidate, LogicalClaim, NumericClaim, Statement, TemporalAnchor, TemporalClaim,
};
use crate::analysis::utils::fuzzy_word_match;
use crate::error::StageFailure;

/// Candidates produced by one detection pass, plus any rule failures that
/// caused a bucket to be skipped.
#[derive(Debug, Clone, Default)]
pub struct DetectionOutcome {
    pub candidates: Vec<ContradictionCandidate>,
    pub failures: Vec<StageFailure>,
}

impl DetectionOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

type BucketKey = (Category, String);

fn bucket(statements: &[Statement]) -> BTreeMap<BucketKey, Vec<&Statement>> {
    let mut buckets: BTreeMap<BucketKey, Vec<&Statement>> = BTreeMap::new();
    for statement in statements {
        buckets
            .entry((statement.category(), statement.subject.clone()))
            .or_default()
            .push(statement);
    }
    buckets
}

/// Rule-based contradiction detector.
///
/// Statements are only compared inside a `(category, subject)` bucket, so the
/// cost is quadratic in the bucket size rather than in the document size.
/// The rules lean towards flagging; verification removes false positives.
#[derive(Debug, Clone, Copy)]
pub struct ContradictionDetector {
    numeric_tolerance: f64,
}

impl ContradictionDetector {
    pub fn new(numeric_tolerance: f64) -> Self {
        Self { numeric_tolerance }
    }

    /// Compare every pair of statements that share a category and subject.
    pub fn detect(&self, statements: &[Statement]) -> DetectionOutcome {
        let mut outcome = DetectionOutcome::default();
        let mut seen = BTreeSet::new();

        for ((category, subject), members) in bucket(statements) {
            let mut found = Vec::new();
            let mut failed = None;

            'bucket: for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    let (first, second) = if a.id <= b.id { (*a, *b) } else { (*b, *a) };
                    match self.compare(category, first, second) {
                        Ok(Some(conflict)) => found.push(ContradictionCandidate {
                            category,
                            first: first.clone(),
                            second: second.clone(),
                            conflict,
                        }),
                        Ok(None) => {}
                        Err(failure) => {
                            failed = Some(failure);
                            break 'bucket;
                        }
                    }
                }
            }

            // A failed bucket contributes no candidates.
            if let Some(failure) = failed {
                tracing::warn!(
                    %category,
                    %subject,
                    error = %failure,
                    discarded = found.len(),
                    "Category rule failed; skipping bucket"
                );
                outcome.failures.push(failure);
                continue;
            }
            for candidate in found {
                if seen.insert(candidate.pair_key()) {
                    outcome.candidates.push(candidate);
                }
            }
        }

        tracing::debug!(
            statements = statements.len(),
            candidates = outcome.candidates.len(),
            failures = outcome.failures.len(),
            "Detection pass complete"
        );
        outcome
    }

    /// Compare statements of two documents. Only `(left, right)` pairs that
    /// share a category and subject are considered; `left` is always first.
    pub fn detect_across(&self, left: &[Statement], right: &[Statement]) -> DetectionOutcome {
        let mut outcome = DetectionOutcome::default();
        let mut seen = BTreeSet::new();
        let right_buckets = bucket(right);

        for ((category, subject), members) in bucket(left) {
            let Some(others) = right_buckets.get(&(category, subject.clone())) else {
                continue;
            };
            let mut found = Vec::new();
            let mut failed = None;

            'bucket: for a in &members {
                for b in others {
                    match self.compare(category, a, b) {
                        Ok(Some(conflict)) => found.push(ContradictionCandidate {
                            category,
                            first: (*a).clone(),
                            second: (*b).clone(),
                            conflict,
                        }),
                        Ok(None) => {}
                        Err(failure) => {
                            failed = Some(failure);
                            break 'bucket;
                        }
                    }
                }
            }

            if let Some(failure) = failed {
                tracing::warn!(
                    %category,
                    %subject,
                    error = %failure,
                    discarded = found.len(),
                    "Cross-document rule failed; skipping bucket"
                );
                outcome.failures.push(failure);
                continue;
            }
            for candidate in found {
                // Ids restart per document, so the pair is ordered.
                if seen.insert((category, candidate.first.id, candidate.second.id)) {
                    outcome.candidates.push(candidate);
                }
            }
        }

        outcome
    }

    /// Apply the rule for `category` to an ordered pair of statements.
    ///
    /// Returns `Ok(None)` when the pair is consistent and a `StageFailure`
    /// when the rule cannot evaluate it.
    pub fn compare(
        &self,
        category: Category,
        a: &Statement,
        b: &Statement,
    ) -> Result<Option<ConflictDescriptor>, StageFailure> {
        match (category, &a.claim, &b.claim) {
            (Category::Temporal, Claim::Temporal(x), Claim::Temporal(y)) => {
                Ok(temporal_conflict(&a.subject, x, y))
            }
            (Category::Numerical, Claim::Numerical(x), Claim::Numerical(y)) => {
                self.numeric_conflict(&a.subject, x, y)
            }
            (Category::Logical, Claim::Logical(x), Claim::Logical(y)) => {
                Ok(logical_conflict(&a.subject, x, y))
            }
            (Category::Certainty, Claim::Certainty(x), Claim::Certainty(y)) => {
                Ok(certainty_conflict(&a.subject, x, y))
            }
            _ => Err(StageFailure::new(
                format!("detection/{category}"),
                format!(
                    "statements {} and {} do not both carry {category} claims",
                    a.id, b.id
                ),
            )),
        }
    }

    /// Detect two different values assigned to the same quantity.
    ///
    /// Examples:
    /// - "The payment amount was $50,000" vs "The payment amount is $75,000"
    /// - "The fee was 5%" vs "The fee was 7%"
    fn numeric_conflict(
        &self,
        subject: &str,
        a: &NumericClaim,
        b: &NumericClaim,
    ) -> Result<Option<ConflictDescriptor>, StageFailure> {
        if !a.value.is_finite() || !b.value.is_finite() {
            return Err(StageFailure::new(
                "detection/numerical",
                format!(
                    "non-finite value for '{subject}' ({} / {})",
                    a.raw, b.raw
                ),
            ));
        }

        let units_compatible = match (&a.unit, &b.unit) {
            (Some(x), Some(y)) => x == y,
            _ => true,
        };
        if !units_compatible {
            return Ok(None);
        }

        let difference = (a.value - b.value).abs();
        if difference <= self.numeric_tolerance || difference == 0.0 {
            return Ok(None);
        }

        let scale = a.value.abs().max(b.value.abs());
        let relative = if scale > 0.0 { difference / scale } else { 1.0 };

        Ok(Some(ConflictDescriptor {
            description: format!("'{subject}' is given as {} and as {}", a.raw, b.raw),
            strength: 0.6 + 0.4 * relative.min(1.0),
        }))
    }
}

impl Default for ContradictionDetector {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Day number (or ordinal position for named events) of an anchor.
fn anchor_pivot(anchor: &TemporalAnchor) -> i64 {
    match anchor {
        TemporalAnchor::Date(date) => i64::from(chrono::Datelike::num_days_from_ce(date)),
        TemporalAnchor::Event(_) => 0,
    }
}

fn anchors_comparable(a: &TemporalAnchor, b: &TemporalAnchor) -> bool {
    match (a, b) {
        (TemporalAnchor::Date(_), TemporalAnchor::Date(_)) => true,
        (TemporalAnchor::Event(x), TemporalAnchor::Event(y)) => x == y,
        _ => false,
    }
}

/// Detect temporal placements that cannot both hold.
///
/// Examples:
/// - "before January 15, 2024" vs "after January 20, 2024"
/// - "before the audit" vs "after the audit"
fn temporal_conflict(
    subject: &str,
    a: &TemporalClaim,
    b: &TemporalClaim,
) -> Option<ConflictDescriptor> {
    if !anchors_comparable(&a.anchor, &b.anchor) {
        return None;
    }

    let (a_lo, a_hi) = a.relation.interval(anchor_pivot(&a.anchor));
    let (b_lo, b_hi) = b.relation.interval(anchor_pivot(&b.anchor));

    let lo = match (a_lo, b_lo) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    };
    let hi = match (a_hi, b_hi) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    };

    match (lo, hi) {
        (Some(lo), Some(hi)) if lo > hi => Some(ConflictDescriptor {
            description: format!(
                "'{subject}' is placed {} {} and {} {}",
                a.relation, a.anchor, b.relation, b.anchor
            ),
            strength: if a.anchor == b.anchor { 0.95 } else { 0.9 },
        }),
        _ => None,
    }
}

fn predicates_overlap(a: &str, b: &str) -> bool {
    a == b || fuzzy_word_match(a, b)
}

/// Detect an assertion and its negation for the same subject.
///
/// Examples:
/// - "The meeting occurred" vs "The meeting did not happen"
/// - "John attended the hearing" vs "John never attended the hearing"
fn logical_conflict(
    subject: &str,
    a: &LogicalClaim,
    b: &LogicalClaim,
) -> Option<ConflictDescriptor> {
    if a.negated == b.negated || !predicates_overlap(&a.predicate, &b.predicate) {
        return None;
    }

    let (positive, negative) = if a.negated { (b, a) } else { (a, b) };
    Some(ConflictDescriptor {
        description: format!(
            "'{subject}' is asserted to {} and denied ({})",
            positive.predicate,
            negative.negation_marker.as_deref().unwrap_or("negated")
        ),
        strength: 0.9,
    })
}

/// Detect a definite claim against a hedged one for the same subject.
fn certainty_conflict(
    subject: &str,
    a: &CertaintyClaim,
    b: &CertaintyClaim,
) -> Option<ConflictDescriptor> {
    use CertaintyRegister::*;

    let hedged = match (a.register, b.register) {
        (Definite, Possible) | (Possible, Definite) => Possible,
        (Definite, Uncertain) | (Uncertain, Definite) => Uncertain,
        _ => return None,
    };

    Some(ConflictDescriptor {
        description: format!(
            "'{subject}' is stated with certainty ('{}') and as {hedged} ('{}')",
            if a.register == Definite { &a.marker } else { &b.marker },
            if a.register == Definite { &b.marker } else { &a.marker },
        ),
        strength: match hedged {
            Uncertain => 0.8,
            _ => 0.7,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extractor::StatementExtractor;
    use crate::analysis::types::{Span, TemporalRelation};
    use crate::config::SensitivityLevel;
    use chrono::NaiveDate;

    fn detector() -> ContradictionDetector {
        ContradictionDetector::default()
    }

    fn statements(text: &str) -> Vec<Statement> {
        StatementExtractor::new(SensitivityLevel::Medium).extract(text)
    }

    fn statement(id: usize, subject: &str, claim: Claim) -> Statement {
        Statement {
            id,
            sentence_index: id,
            text: format!("statement {id}"),
            span: Span { start: 0, end: 0 },
            subject: subject.to_string(),
            claim,
        }
    }

    fn numeric(value: f64, unit: Option<&str>) -> Claim {
        Claim::Numerical(NumericClaim {
            value,
            unit: unit.map(str::to_string),
            raw: value.to_string(),
        })
    }

    fn temporal(relation: TemporalRelation, y: i32, m: u32, d: u32) -> Claim {
        Claim::Temporal(TemporalClaim {
            anchor: TemporalAnchor::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            relation,
            marker: relation.to_string(),
        })
    }

    // =======================================================================
    // Temporal rule
    // =======================================================================

    #[test]
    fn test_temporal_disjoint_dates_conflict() {
        let found = detector().detect(&statements(
            "The meeting occurred before January 15, 2024. \
             The agreement was signed after January 15, 2024. \
             John confirmed the meeting happened after January 20, 2024.",
        ));
        let temporal: Vec<_> = found
            .candidates
            .iter()
            .filter(|c| c.category == Category::Temporal)
            .collect();
        assert_eq!(temporal.len(), 1);
        assert_eq!(temporal[0].first.subject, "meeting");
        assert!(found.failures.is_empty());
    }

    #[test]
    fn test_temporal_overlapping_windows_do_not_conflict() {
        let a = statement(0, "audit", temporal(TemporalRelation::Before, 2024, 1, 20));
        let b = statement(1, "audit", temporal(TemporalRelation::After, 2024, 1, 15));
        assert!(detector().detect(&[a, b]).candidates.is_empty());
    }

    #[test]
    fn test_temporal_same_anchor_opposite_directions() {
        let a = statement(0, "audit", temporal(TemporalRelation::Before, 2024, 1, 15));
        let b = statement(1, "audit", temporal(TemporalRelation::After, 2024, 1, 15));
        let found = detector().detect(&[a, b]);
        assert_eq!(found.candidates.len(), 1);
        assert!((found.candidates[0].conflict.strength - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_temporal_during_vs_before_same_day() {
        let a = statement(0, "audit", temporal(TemporalRelation::During, 2024, 1, 15));
        let b = statement(1, "audit", temporal(TemporalRelation::Before, 2024, 1, 15));
        assert_eq!(detector().detect(&[a, b]).candidates.len(), 1);
    }

    #[test]
    fn test_temporal_event_anchors() {
        let found = detector().detect(&statements(
            "The payment was made before the audit. The payment was made after the audit.",
        ));
        assert_eq!(found.candidates.len(), 1);
        assert_eq!(found.candidates[0].category, Category::Temporal);
    }

    #[test]
    fn test_temporal_different_events_not_comparable() {
        let found = detector().detect(&statements(
            "The payment was made before the audit. The payment was made after the review.",
        ));
        assert!(found
            .candidates
            .iter()
            .all(|c| c.category != Category::Temporal));
    }

    // =======================================================================
    // Numerical rule
    // =======================================================================

    #[test]
    fn test_numeric_different_values_conflict() {
        let found = detector().detect(&statements(
            "The total payment amount was $50,000. \
             The contract states the payment amount is $75,000.",
        ));
        assert_eq!(found.candidates.len(), 1);
        let candidate = &found.candidates[0];
        assert_eq!(candidate.category, Category::Numerical);
        assert_eq!(candidate.first.subject, "payment amount");
        assert!(candidate.conflict.description.contains("$50,000"));
    }

    #[test]
    fn test_numeric_equal_values_no_conflict() {
        let a = statement(0, "fee", numeric(100.0, Some("USD")));
        let b = statement(1, "fee", numeric(100.0, Some("USD")));
        assert!(detector().detect(&[a, b]).candidates.is_empty());
    }

    #[test]
    fn test_numeric_within_tolerance() {
        let a = statement(0, "fee", numeric(100.0, None));
        let b = statement(1, "fee", numeric(100.4, None));
        assert!(ContradictionDetector::new(0.5)
            .detect(&[a.clone(), b.clone()])
            .candidates
            .is_empty());
        assert_eq!(detector().detect(&[a, b]).candidates.len(), 1);
    }

    #[test]
    fn test_numeric_incompatible_units() {
        let a = statement(0, "fee", numeric(100.0, Some("USD")));
        let b = statement(1, "fee", numeric(90.0, Some("EUR")));
        assert!(detector().detect(&[a, b]).candidates.is_empty());
    }

    #[test]
    fn test_numeric_non_finite_degrades_bucket_only() {
        let a = statement(0, "fee", numeric(f64::INFINITY, None));
        let b = statement(1, "fee", numeric(10.0, None));
        let c = statement(2, "rent", numeric(10.0, None));
        let d = statement(3, "rent", numeric(20.0, None));

        let found = detector().detect(&[a, b, c, d]);
        assert!(found.is_degraded());
        assert_eq!(found.failures.len(), 1);
        assert_eq!(found.failures[0].stage, "detection/numerical");
        // The healthy bucket is still compared.
        assert_eq!(found.candidates.len(), 1);
        assert_eq!(found.candidates[0].first.subject, "rent");
    }

    // =======================================================================
    // Logical rule
    // =======================================================================

    #[test]
    fn test_logical_negation_conflict() {
        let found = detector().detect(&statements(
            "The meeting took place. The meeting did not occur.",
        ));
        assert_eq!(found.candidates.len(), 1);
        assert_eq!(found.candidates[0].category, Category::Logical);
        assert!(found.candidates[0].conflict.description.contains("did not"));
    }

    #[test]
    fn test_logical_both_positive_no_conflict() {
        let found = detector().detect(&statements(
            "The meeting took place. The meeting happened.",
        ));
        assert!(found.candidates.is_empty());
    }

    #[test]
    fn test_logical_different_predicates_no_conflict() {
        let found = detector().detect(&statements(
            "John attended the hearing. John never signed the hearing.",
        ));
        assert!(found
            .candidates
            .iter()
            .all(|c| c.category != Category::Logical));
    }

    // =======================================================================
    // Certainty rule
    // =======================================================================

    #[test]
    fn test_certainty_definite_vs_possible() {
        let found = detector().detect(&statements(
            "The witness definitely saw the car. The witness possibly saw the car.",
        ));
        let certainty: Vec<_> = found
            .candidates
            .iter()
            .filter(|c| c.category == Category::Certainty)
            .collect();
        assert_eq!(certainty.len(), 1);
        assert_eq!(certainty[0].severity(), crate::analysis::types::Severity::Medium);
    }

    #[test]
    fn test_certainty_two_hedges_no_conflict() {
        let found = detector().detect(&statements(
            "The witness possibly saw the car. The witness might have seen the car.",
        ));
        assert!(found
            .candidates
            .iter()
            .all(|c| c.category != Category::Certainty));
    }

    // =======================================================================
    // Bucketing, ordering and failures
    // =======================================================================

    #[test]
    fn test_no_statements_no_candidates() {
        let found = detector().detect(&[]);
        assert!(found.candidates.is_empty());
        assert!(!found.is_degraded());
    }

    #[test]
    fn test_different_subjects_never_paired() {
        let a = statement(0, "fee", numeric(1.0, None));
        let b = statement(1, "rent", numeric(2.0, None));
        assert!(detector().detect(&[a, b]).candidates.is_empty());
    }

    #[test]
    fn test_candidate_pairs_are_ordered_and_unique() {
        let a = statement(0, "fee", numeric(1.0, None));
        let b = statement(1, "fee", numeric(2.0, None));
        let c = statement(2, "fee", numeric(3.0, None));
        let found = detector().detect(&[c, a, b]);
        assert_eq!(found.candidates.len(), 3);
        for candidate in &found.candidates {
            assert!(candidate.first.id < candidate.second.id);
        }
        let keys: BTreeSet<_> = found.candidates.iter().map(|c| c.pair_key()).collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_failed_bucket_drops_earlier_candidates() {
        let ordered = [
            statement(0, "fee", numeric(10.0, None)),
            statement(1, "fee", numeric(20.0, None)),
            statement(2, "fee", numeric(f64::INFINITY, None)),
        ];
        let found = detector().detect(&ordered);
        assert!(found.is_degraded());
        assert!(found.candidates.is_empty());

        let mut reversed = ordered.to_vec();
        reversed.reverse();
        let found = detector().detect(&reversed);
        assert!(found.is_degraded());
        assert!(found.candidates.is_empty());
    }

    #[test]
    fn test_detect_across_failed_bucket_drops_earlier_candidates() {
        let left = vec![
            statement(0, "fee", numeric(10.0, None)),
            statement(1, "fee", numeric(f64::NAN, None)),
        ];
        let right = vec![statement(0, "fee", numeric(20.0, None))];
        let found = detector().detect_across(&left, &right);
        assert_eq!(found.failures.len(), 1);
        assert!(found.candidates.is_empty());
    }

    #[test]
    fn test_mismatched_payload_is_stage_failure() {
        let a = statement(0, "fee", numeric(1.0, None));
        let b = statement(1, "fee", temporal(TemporalRelation::Before, 2024, 1, 1));
        let err = detector().compare(Category::Numerical, &a, &b).unwrap_err();
        assert_eq!(err.stage, "detection/numerical");
    }

    #[test]
    fn test_detect_across_only_pairs_left_with_right() {
        let left = vec![
            statement(0, "fee", numeric(1.0, None)),
            statement(1, "fee", numeric(2.0, None)),
        ];
        let right = vec![statement(0, "fee", numeric(3.0, None))];
        let found = detector().detect_across(&left, &right);
        // Within-left pair (1.0 vs 2.0) is not considered.
        assert_eq!(found.candidates.len(), 2);
        for candidate in &found.candidates {
            assert_eq!(candidate.second.claim, numeric(3.0, None));
        }
    }
}
