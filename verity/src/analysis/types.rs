use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The four ways two statements can contradict each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Temporal,
    Numerical,
    Logical,
    Certainty,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Temporal,
        Category::Numerical,
        Category::Logical,
        Category::Certainty,
    ];

    pub fn severity(&self) -> Severity {
        match self {
            Self::Temporal | Self::Numerical | Self::Logical => Severity::High,
            Self::Certainty => Severity::Medium,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Temporal => write!(f, "temporal"),
            Self::Numerical => write!(f, "numerical"),
            Self::Logical => write!(f, "logical"),
            Self::Certainty => write!(f, "certainty"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Weight of one finding of this severity in risk and consistency scores.
    pub fn weight(&self) -> u32 {
        match self {
            Self::High => 30,
            Self::Medium => 15,
            Self::Low => 5,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// What a temporal claim is positioned against.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum TemporalAnchor {
    Date(NaiveDate),
    /// A named event, e.g. "audit" in "before the audit".
    Event(String),
}

impl std::fmt::Display for TemporalAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%B %-d, %Y")),
            Self::Event(name) => write!(f, "the {name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemporalRelation {
    Before,
    OnOrBefore,
    During,
    OnOrAfter,
    After,
}

impl TemporalRelation {
    /// Inclusive bounds of the instants this relation admits around `pivot`.
    /// `None` means unbounded on that side.
    pub fn interval(&self, pivot: i64) -> (Option<i64>, Option<i64>) {
        match self {
            Self::Before => (None, pivot.checked_sub(1)),
            Self::OnOrBefore => (None, Some(pivot)),
            Self::During => (Some(pivot), Some(pivot)),
            Self::OnOrAfter => (Some(pivot), None),
            Self::After => (pivot.checked_add(1), None),
        }
    }
}

impl std::fmt::Display for TemporalRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::OnOrBefore => write!(f, "on or before"),
            Self::During => write!(f, "during"),
            Self::OnOrAfter => write!(f, "on or after"),
            Self::After => write!(f, "after"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalClaim {
    pub anchor: TemporalAnchor,
    pub relation: TemporalRelation,
    /// The marker phrase as written, e.g. "prior to".
    pub marker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericClaim {
    pub value: f64,
    pub unit: Option<String>,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalClaim {
    /// Normalized occurrence/presence predicate, e.g. "occurred".
    pub predicate: String,
    pub negated: bool,
    pub negation_marker: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertaintyRegister {
    Definite,
    Possible,
    Uncertain,
}

impl std::fmt::Display for CertaintyRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Definite => write!(f, "definite"),
            Self::Possible => write!(f, "possible"),
            Self::Uncertain => write!(f, "uncertain"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertaintyClaim {
    pub register: CertaintyRegister,
    pub marker: String,
}

/// Category-specific payload of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum Claim {
    Temporal(TemporalClaim),
    Numerical(NumericClaim),
    Logical(LogicalClaim),
    Certainty(CertaintyClaim),
}

impl Claim {
    pub fn category(&self) -> Category {
        match self {
            Self::Temporal(_) => Category::Temporal,
            Self::Numerical(_) => Category::Numerical,
            Self::Logical(_) => Category::Logical,
            Self::Certainty(_) => Category::Certainty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// An atomic claim extracted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    /// Position in the extractor's output sequence.
    pub id: usize,
    pub sentence_index: usize,
    pub text: String,
    pub span: Span,
    /// Entity, quantity label or event the claim is about.
    pub subject: String,
    pub claim: Claim,
}

impl Statement {
    pub fn category(&self) -> Category {
        self.claim.category()
    }
}

/// Raw output of a category rule for a conflicting pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDescriptor {
    pub description: String,
    /// How clear-cut the conflict is, in [0, 1].
    pub strength: f64,
}

/// An unverified potential contradiction between two statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContradictionCandidate {
    pub category: Category,
    pub first: Statement,
    pub second: Statement,
    pub conflict: ConflictDescriptor,
}

impl ContradictionCandidate {
    /// Identity used for deduplication: category plus the unordered id pair.
    pub fn pair_key(&self) -> (Category, usize, usize) {
        let (a, b) = (self.first.id, self.second.id);
        (self.category, a.min(b), a.max(b))
    }

    pub fn severity(&self) -> Severity {
        self.category.severity()
    }
}

/// Identifier of a verification strategy. The declaration order is the
/// order in which votes are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyId {
    ReverseOrder,
    SubjectAlignment,
    StrictLexical,
}

impl StrategyId {
    pub const ALL: [StrategyId; 3] = [
        StrategyId::ReverseOrder,
        StrategyId::SubjectAlignment,
        StrategyId::StrictLexical,
    ];
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReverseOrder => write!(f, "reverse-order"),
            Self::SubjectAlignment => write!(f, "subject-alignment"),
            Self::StrictLexical => write!(f, "strict-lexical"),
        }
    }
}

/// One strategy's verdict on a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationVote {
    pub strategy: StrategyId,
    pub agrees: bool,
    pub confidence: f64,
    pub rationale: String,
}

/// A candidate that survived verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    #[serde(rename = "type")]
    pub category: Category,
    pub severity: Severity,
    pub statement1: Statement,
    pub statement2: Statement,
    pub description: String,
    pub confidence: f64,
    pub verified: bool,
    pub votes: Vec<VerificationVote>,
}

impl Finding {
    pub fn agreeing_votes(&self) -> usize {
        self.votes.iter().filter(|v| v.agrees).count()
    }
}
