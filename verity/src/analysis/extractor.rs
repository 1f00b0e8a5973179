use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::analysis::segment::SentenceSplitter;
use crate::analysis::types::{
    CertaintyClaim, CertaintyRegister, Claim, LogicalClaim, NumericClaim, Span, Statement,
    TemporalAnchor, TemporalClaim, TemporalRelation,
};
use crate::analysis::utils::{is_stopword, normalize_term};
use crate::config::SensitivityLevel;

// ===========================================================================
// Lexicons
// ===========================================================================

/// Temporal markers: (phrase, relation, minimum sensitivity, allows an event anchor).
const TEMPORAL_MARKERS: &[(&str, TemporalRelation, SensitivityLevel, bool)] = &[
    ("before", TemporalRelation::Before, SensitivityLevel::Low, true),
    ("after", TemporalRelation::After, SensitivityLevel::Low, true),
    ("during", TemporalRelation::During, SensitivityLevel::Medium, true),
    ("on", TemporalRelation::During, SensitivityLevel::Medium, false),
    ("prior to", TemporalRelation::Before, SensitivityLevel::Medium, true),
    ("since", TemporalRelation::OnOrAfter, SensitivityLevel::Medium, true),
    ("by", TemporalRelation::OnOrBefore, SensitivityLevel::High, false),
    ("until", TemporalRelation::OnOrBefore, SensitivityLevel::High, true),
    ("following", TemporalRelation::After, SensitivityLevel::High, true),
    ("preceding", TemporalRelation::Before, SensitivityLevel::High, true),
    ("earlier than", TemporalRelation::Before, SensitivityLevel::High, true),
    ("later than", TemporalRelation::After, SensitivityLevel::High, true),
];

/// Occurrence/presence predicates: (form, lemma, minimum sensitivity).
/// Synonyms share a lemma so "happened" and "took place" align with "occur".
const PREDICATES: &[(&str, &str, SensitivityLevel)] = &[
    ("occurred", "occur", SensitivityLevel::Low),
    ("occur", "occur", SensitivityLevel::Low),
    ("occurs", "occur", SensitivityLevel::Low),
    ("happened", "occur", SensitivityLevel::Low),
    ("happen", "occur", SensitivityLevel::Low),
    ("happens", "occur", SensitivityLevel::Low),
    ("took place", "occur", SensitivityLevel::Low),
    ("take place", "occur", SensitivityLevel::Low),
    ("exist", "exist", SensitivityLevel::Low),
    ("exists", "exist", SensitivityLevel::Low),
    ("existed", "exist", SensitivityLevel::Low),
    ("attended", "attend", SensitivityLevel::Low),
    ("attend", "attend", SensitivityLevel::Low),
    ("signed", "sign", SensitivityLevel::Low),
    ("sign", "sign", SensitivityLevel::Low),
    ("paid", "pay", SensitivityLevel::Low),
    ("pay", "pay", SensitivityLevel::Low),
    ("received", "receive", SensitivityLevel::Low),
    ("receive", "receive", SensitivityLevel::Low),
    ("present", "present", SensitivityLevel::Low),
    ("delivered", "deliver", SensitivityLevel::Medium),
    ("deliver", "deliver", SensitivityLevel::Medium),
    ("approved", "approve", SensitivityLevel::Medium),
    ("approve", "approve", SensitivityLevel::Medium),
    ("completed", "complete", SensitivityLevel::Medium),
    ("complete", "complete", SensitivityLevel::Medium),
    ("sent", "send", SensitivityLevel::Medium),
    ("send", "send", SensitivityLevel::Medium),
    ("visited", "visit", SensitivityLevel::Medium),
    ("visit", "visit", SensitivityLevel::Medium),
    ("met", "meet", SensitivityLevel::Medium),
    ("saw", "see", SensitivityLevel::Medium),
    ("see", "see", SensitivityLevel::Medium),
    ("agreed", "agree", SensitivityLevel::Medium),
    ("agree", "agree", SensitivityLevel::Medium),
    ("knew", "know", SensitivityLevel::High),
    ("called", "call", SensitivityLevel::High),
    ("call", "call", SensitivityLevel::High),
    ("informed", "inform", SensitivityLevel::High),
    ("inform", "inform", SensitivityLevel::High),
    ("reported", "report", SensitivityLevel::High),
    ("report", "report", SensitivityLevel::High),
];

/// Negation patterns that flip an occurrence predicate.
#[derive(Debug, Clone, Copy)]
enum NegationPattern {
    /// "doesn't", "does not"
    DoesNot,
    /// "don't", "do not"
    DoNot,
    /// "didn't", "did not"
    DidNot,
    /// "isn't", "is not", "aren't", "are not"
    IsNot,
    /// "wasn't", "was not", "weren't", "were not"
    WasNot,
    /// "hasn't", "has not", "haven't", "have not", "hadn't", "had not"
    HasNot,
    /// "won't", "will not"
    WillNot,
    /// "can't", "cannot"
    Cannot,
    /// "never"
    Never,
    /// "no longer"
    NoLonger,
    /// "failed to"
    FailedTo,
    /// "not"
    Not,
}

impl NegationPattern {
    /// All negation phrases this pattern matches (lowercase).
    fn phrases(&self) -> &'static [&'static str] {
        match self {
            Self::DoesNot => &["doesn't", "does not"],
            Self::DoNot => &["don't", "do not"],
            Self::DidNot => &["didn't", "did not"],
            Self::IsNot => &["isn't", "is not", "aren't", "are not"],
            Self::WasNot => &["wasn't", "was not", "weren't", "were not"],
            Self::HasNot => &[
                "hasn't", "has not", "haven't", "have not", "hadn't", "had not",
            ],
            Self::WillNot => &["won't", "will not"],
            Self::Cannot => &["can't", "cannot", "can not"],
            Self::Never => &["never"],
            Self::NoLonger => &["no longer"],
            Self::FailedTo => &["failed to"],
            Self::Not => &["not"],
        }
    }

    fn min_sensitivity(&self) -> SensitivityLevel {
        match self {
            Self::FailedTo | Self::NoLonger => SensitivityLevel::Medium,
            _ => SensitivityLevel::Low,
        }
    }

    /// All known negation patterns.
    fn all() -> &'static [NegationPattern] {
        &[
            NegationPattern::DoesNot,
            NegationPattern::DoNot,
            NegationPattern::DidNot,
            NegationPattern::IsNot,
            NegationPattern::WasNot,
            NegationPattern::HasNot,
            NegationPattern::WillNot,
            NegationPattern::Cannot,
            NegationPattern::Never,
            NegationPattern::NoLonger,
            NegationPattern::FailedTo,
            NegationPattern::Not,
        ]
    }
}

/// Certainty lexicon: (phrase, register, minimum sensitivity).
const CERTAINTY_MARKERS: &[(&str, CertaintyRegister, SensitivityLevel)] = &[
    ("definitely", CertaintyRegister::Definite, SensitivityLevel::Low),
    ("certainly", CertaintyRegister::Definite, SensitivityLevel::Low),
    ("confirmed", CertaintyRegister::Definite, SensitivityLevel::Low),
    ("undoubtedly", CertaintyRegister::Definite, SensitivityLevel::Low),
    ("clearly", CertaintyRegister::Definite, SensitivityLevel::Low),
    ("absolutely", CertaintyRegister::Definite, SensitivityLevel::Medium),
    ("without doubt", CertaintyRegister::Definite, SensitivityLevel::Medium),
    ("always", CertaintyRegister::Definite, SensitivityLevel::Medium),
    ("proven", CertaintyRegister::Definite, SensitivityLevel::Medium),
    ("verified", CertaintyRegister::Definite, SensitivityLevel::Medium),
    ("confirms", CertaintyRegister::Definite, SensitivityLevel::Medium),
    ("certain", CertaintyRegister::Definite, SensitivityLevel::Medium),
    ("known", CertaintyRegister::Definite, SensitivityLevel::High),
    ("obviously", CertaintyRegister::Definite, SensitivityLevel::High),
    ("surely", CertaintyRegister::Definite, SensitivityLevel::High),
    ("indeed", CertaintyRegister::Definite, SensitivityLevel::High),
    ("possibly", CertaintyRegister::Possible, SensitivityLevel::Low),
    ("might", CertaintyRegister::Possible, SensitivityLevel::Low),
    ("perhaps", CertaintyRegister::Possible, SensitivityLevel::Low),
    ("maybe", CertaintyRegister::Possible, SensitivityLevel::Low),
    ("may", CertaintyRegister::Possible, SensitivityLevel::Medium),
    ("could", CertaintyRegister::Possible, SensitivityLevel::Medium),
    ("probably", CertaintyRegister::Possible, SensitivityLevel::Medium),
    ("likely", CertaintyRegister::Possible, SensitivityLevel::Medium),
    ("potentially", CertaintyRegister::Possible, SensitivityLevel::Medium),
    ("presumably", CertaintyRegister::Possible, SensitivityLevel::High),
    ("apparently", CertaintyRegister::Possible, SensitivityLevel::High),
    ("uncertain", CertaintyRegister::Uncertain, SensitivityLevel::Low),
    ("unsure", CertaintyRegister::Uncertain, SensitivityLevel::Low),
    ("unclear", CertaintyRegister::Uncertain, SensitivityLevel::Low),
    ("not sure", CertaintyRegister::Uncertain, SensitivityLevel::Medium),
    ("not certain", CertaintyRegister::Uncertain, SensitivityLevel::Medium),
    ("allegedly", CertaintyRegister::Uncertain, SensitivityLevel::Medium),
    ("reportedly", CertaintyRegister::Uncertain, SensitivityLevel::Medium),
    ("unknown", CertaintyRegister::Uncertain, SensitivityLevel::Medium),
    ("seems", CertaintyRegister::Uncertain, SensitivityLevel::Medium),
    ("appears", CertaintyRegister::Uncertain, SensitivityLevel::Medium),
    ("believe", CertaintyRegister::Uncertain, SensitivityLevel::High),
    ("believed", CertaintyRegister::Uncertain, SensitivityLevel::High),
    ("think", CertaintyRegister::Uncertain, SensitivityLevel::High),
    ("suspected", CertaintyRegister::Uncertain, SensitivityLevel::High),
    ("rumored", CertaintyRegister::Uncertain, SensitivityLevel::High),
];

/// Words that link a quantity label to its value ("amount *was* $5").
const LINKING_WORDS: &[&str] = &[
    "was", "is", "were", "are", "be", "been", "of", "at", "to", "totaled", "totalled", "totals",
    "equals", "equaled", "amounted", "amounts", "came", "show", "shows", "showed", "state",
    "states", "stated", "say", "says", "said", "reads", "reported",
    "listed", "indicate", "indicates", "indicated", "recorded", "approximately", "about", "around", "roughly", "nearly", "almost", "over",
    "under", "exactly", "only", "just", "precisely", "for", "by", "as", "paid", "received",
];

/// Adjectives skipped when building a quantity label.
const LABEL_MODIFIERS: &[&str] = &[
    "total", "overall", "final", "entire", "full", "actual", "initial", "original", "agreed",
    "stated", "new", "old", "same", "exact",
];

/// Words that end a noun phrase.
const PHRASE_BREAKERS: &[&str] = &[
    "before", "after", "during", "since", "until", "prior", "following", "preceding", "never",
    "paid", "met", "saw", "sent", "took", "knew", "show", "shows", "says", "said", "states",
    "confirms", "may", "might", "could", "will", "would", "should", "can", "cannot", "must",
    "earlier", "later", "present", "happen", "occur", "exists",
];

const UNIT_WORDS: &[(&str, &str)] = &[
    ("dollars", "USD"),
    ("dollar", "USD"),
    ("usd", "USD"),
    ("euros", "EUR"),
    ("euro", "EUR"),
    ("eur", "EUR"),
    ("pounds", "GBP"),
    ("gbp", "GBP"),
    ("percent", "percent"),
    ("days", "day"),
    ("day", "day"),
    ("hours", "hour"),
    ("hour", "hour"),
    ("minutes", "minute"),
    ("weeks", "week"),
    ("months", "month"),
    ("years", "year"),
    ("kg", "kg"),
    ("km", "km"),
    ("miles", "mile"),
    ("people", "person"),
    ("persons", "person"),
    ("employees", "employee"),
    ("units", "unit"),
    ("items", "item"),
    ("shares", "share"),
    ("pages", "page"),
];

const SPELLED_NUMBERS: &[(&str, f64)] = &[
    ("one", 1.0),
    ("two", 2.0),
    ("three", 3.0),
    ("four", 4.0),
    ("five", 5.0),
    ("six", 6.0),
    ("seven", 7.0),
    ("eight", 8.0),
    ("nine", 9.0),
    ("ten", 10.0),
    ("eleven", 11.0),
    ("twelve", 12.0),
    ("twenty", 20.0),
    ("fifty", 50.0),
    ("hundred", 100.0),
];

const MONTHS: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const MONTH_WORDS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec",
];

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "his", "her", "their", "its", "our",
];

const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Units a bare "a"/"an" turns into a rate ("$40 an hour").
const RATE_UNITS: &[&str] = &["hour", "day", "week", "month", "year", "annum", "night"];

// ===========================================================================
// Compiled patterns
// ===========================================================================

const MONTH_PATTERN: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?i)\b(?:(?P<mname>{m})\.?\s+(?P<mday>\d{{1,2}})(?:st|nd|rd|th)?,?\s+(?P<myear>\d{{4}})|(?P<dday>\d{{1,2}})(?:st|nd|rd|th)?\s+(?P<dname>{m})\.?,?\s+(?P<dyear>\d{{4}})|(?P<iy>\d{{4}})-(?P<im>\d{{1,2}})-(?P<id>\d{{1,2}})|(?P<um>\d{{1,2}})/(?P<ud>\d{{1,2}})/(?P<uy>\d{{4}}))\b",
        m = MONTH_PATTERN
    );
    Regex::new(&pattern).expect("date pattern is valid")
});

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(?P<cur>[$€£])\s?)?(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)(?:\s?(?P<suffix>%|percent\b|k\b|thousand\b|million\b|billion\b))?",
    )
    .expect("number pattern is valid")
});

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\p{L}[\p{L}\p{M}'’\-]*").expect("word pattern is valid")
});

static EVENT_ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:the|a|an)\s+(?P<event>\p{L}[\p{L}\-]*)").expect("event pattern is valid")
});

static YEAR_CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:in|for|during|fiscal|fy)\s+(?P<year>\d{4})\b")
        .expect("year context pattern is valid")
});

/// Sensitivity-specific pattern set, compiled once per level.
struct PatternSet {
    temporal: Regex,
    predicate: Regex,
    certainty: Regex,
    negation: Regex,
    spelled_number: Regex,
}

fn alternation<'a>(phrases: impl Iterator<Item = &'a str>) -> String {
    let mut phrases: Vec<&str> = phrases.collect();
    // Longest first so "not certain" wins over "certain" at the same position.
    phrases.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    phrases.dedup();
    phrases
        .iter()
        .map(|p| regex::escape(p).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}

impl PatternSet {
    fn build(level: SensitivityLevel) -> Self {
        let temporal = alternation(
            TEMPORAL_MARKERS
                .iter()
                .filter(|(_, _, min, _)| *min <= level)
                .map(|(p, _, _, _)| *p),
        );
        let predicate = alternation(
            PREDICATES
                .iter()
                .filter(|(_, _, min)| *min <= level)
                .map(|(p, _, _)| *p),
        );
        let certainty = alternation(
            CERTAINTY_MARKERS
                .iter()
                .filter(|(_, _, min)| *min <= level)
                .map(|(p, _, _)| *p),
        );
        let negation = alternation(
            NegationPattern::all()
                .iter()
                .filter(|p| p.min_sensitivity() <= level)
                .flat_map(|p| p.phrases().iter().copied()),
        );
        let spelled_number = alternation(SPELLED_NUMBERS.iter().map(|(w, _)| *w));

        let compile = |alts: &str| {
            Regex::new(&format!(r"(?i)\b(?P<m>{alts})\b")).expect("lexicon pattern is valid")
        };

        Self {
            temporal: Regex::new(&format!(r"(?i)\b(?P<m>{temporal})\s+"))
                .expect("temporal pattern is valid"),
            predicate: compile(&predicate),
            certainty: compile(&certainty),
            negation: compile(&negation),
            spelled_number: compile(&spelled_number),
        }
    }
}

static PATTERNS: LazyLock<[PatternSet; 3]> = LazyLock::new(|| {
    [
        PatternSet::build(SensitivityLevel::Low),
        PatternSet::build(SensitivityLevel::Medium),
        PatternSet::build(SensitivityLevel::High),
    ]
});

fn patterns(level: SensitivityLevel) -> &'static PatternSet {
    match level {
        SensitivityLevel::Low => &PATTERNS[0],
        SensitivityLevel::Medium => &PATTERNS[1],
        SensitivityLevel::High => &PATTERNS[2],
    }
}

// ===========================================================================
// Sentence scanning helpers
// ===========================================================================

#[derive(Debug, Clone)]
struct Word<'a> {
    text: &'a str,
    lower: String,
    start: usize,
    end: usize,
}

impl Word<'_> {
    fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(|c| c.is_uppercase())
    }

    fn breaks_phrase(&self) -> bool {
        let w = self.lower.as_str();
        is_stopword(w)
            || DETERMINERS.contains(&w)
            || PHRASE_BREAKERS.contains(&w)
            || LINKING_WORDS.contains(&w)
            || is_lexicon_word(w)
            || (w.len() > 4 && w.ends_with("ed"))
            || w.ends_with("n't")
    }
}

fn words(text: &str) -> Vec<Word<'_>> {
    WORD_RE
        .find_iter(text)
        .map(|m| Word {
            text: m.as_str(),
            lower: m.as_str().to_lowercase().replace('’', "'"),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

#[derive(Debug, Clone)]
struct DateMention {
    start: usize,
    end: usize,
    date: NaiveDate,
}

fn is_month_word(word: &str) -> bool {
    MONTH_WORDS.contains(&word.trim_end_matches('.'))
}

/// True for single-word entries of the predicate and certainty lexicons.
fn is_lexicon_word(word: &str) -> bool {
    PREDICATES.iter().any(|(form, ..)| *form == word)
        || CERTAINTY_MARKERS.iter().any(|(marker, ..)| *marker == word)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.to_lowercase().chars().take(3).collect();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

fn parse_date(caps: &regex::Captures<'_>) -> Option<NaiveDate> {
    let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());
    let year = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<i32>().ok());

    if let Some(month) = caps.name("mname") {
        return NaiveDate::from_ymd_opt(year("myear")?, month_number(month.as_str())?, num("mday")?);
    }
    if let Some(month) = caps.name("dname") {
        return NaiveDate::from_ymd_opt(year("dyear")?, month_number(month.as_str())?, num("dday")?);
    }
    if caps.name("iy").is_some() {
        return NaiveDate::from_ymd_opt(year("iy")?, num("im")?, num("id")?);
    }
    NaiveDate::from_ymd_opt(year("uy")?, num("um")?, num("ud")?)
}

fn find_dates(text: &str) -> Vec<DateMention> {
    DATE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let date = parse_date(&caps)?;
            Some(DateMention {
                start: whole.start(),
                end: whole.end(),
                date,
            })
        })
        .collect()
}

/// Replace date mentions with spaces so their digits are not read as
/// quantities and "May" is not read as a modal. Byte offsets are preserved.
fn blank_dates(text: &str, dates: &[DateMention]) -> String {
    let mut out = text.to_string();
    for date in dates {
        out.replace_range(date.start..date.end, &" ".repeat(date.end - date.start));
    }
    out
}

/// Head noun of the noun phrase introduced by the determiner at `det_index`.
/// The phrase never extends past byte offset `limit`.
fn phrase_head(words: &[Word<'_>], det_index: usize, limit: usize) -> Option<String> {
    let mut head = None;
    for word in words.iter().skip(det_index + 1).take(3) {
        if word.end > limit || word.breaks_phrase() || is_month_word(&word.lower) {
            break;
        }
        head = Some(normalize_term(&word.lower));
    }
    head.filter(|h| h.len() > 1)
}

/// Find the subject a claim at `[anchor_start, anchor_end)` is about.
///
/// The closest determiner phrase before the anchor wins, then the first one
/// after it. Wider sensitivity falls back to a proper name and finally to the
/// first content word.
fn find_subject(
    words: &[Word<'_>],
    anchor_start: usize,
    anchor_end: usize,
    level: SensitivityLevel,
    exclude: Option<&str>,
) -> Option<String> {
    let accept = |candidate: Option<String>| candidate.filter(|c| Some(c.as_str()) != exclude);

    let before = words
        .iter()
        .enumerate()
        .filter(|(_, w)| w.end <= anchor_start && DETERMINERS.contains(&w.lower.as_str()))
        .filter_map(|(i, _)| phrase_head(words, i, anchor_start))
        .filter(|h| Some(h.as_str()) != exclude)
        .last();
    if let Some(subject) = before {
        return Some(subject);
    }

    let after = words
        .iter()
        .enumerate()
        .filter(|(_, w)| w.start >= anchor_end && DETERMINERS.contains(&w.lower.as_str()))
        .filter_map(|(i, _)| phrase_head(words, i, usize::MAX))
        .find(|h| Some(h.as_str()) != exclude);
    if let Some(subject) = after {
        return Some(subject);
    }

    if level >= SensitivityLevel::Medium {
        let proper = words
            .iter()
            .find(|w| {
                w.is_capitalized() && !w.breaks_phrase() && !is_month_word(&w.lower)
            })
            .map(|w| normalize_term(&w.lower));
        if let Some(subject) = accept(proper) {
            return Some(subject);
        }
    }

    if level == SensitivityLevel::High {
        let first = words
            .iter()
            .find(|w| !w.breaks_phrase() && w.lower.len() > 2)
            .map(|w| normalize_term(&w.lower));
        return accept(first);
    }

    None
}

// ===========================================================================
// Qualifiers
// ===========================================================================

/// Context that narrows what a claim is about: a rate ("per hour"), a
/// weekday ("on Monday") or a year ("in 2023").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualifiers {
    pub rate: Option<String>,
    pub weekday: Option<String>,
    pub year: Option<i32>,
}

impl Qualifiers {
    /// First qualifier both sides set to different values, rendered as
    /// `"<kind>: <ours> vs <theirs>"`. A qualifier present on one side only
    /// does not clash.
    pub fn clash(&self, other: &Self) -> Option<String> {
        fn differ<T: PartialEq + std::fmt::Display>(
            kind: &str,
            a: &Option<T>,
            b: &Option<T>,
        ) -> Option<String> {
            match (a, b) {
                (Some(x), Some(y)) if x != y => Some(format!("{kind}: {x} vs {y}")),
                _ => None,
            }
        }

        differ("rate", &self.rate, &other.rate)
            .or_else(|| differ("weekday", &self.weekday, &other.weekday))
            .or_else(|| differ("year", &self.year, &other.year))
    }
}

/// Read the qualifiers of a sentence fragment. Full dates are ignored; they
/// are temporal anchors, not qualifiers.
pub fn qualifiers(text: &str) -> Qualifiers {
    let dates = find_dates(text);
    let blanked = blank_dates(text, &dates);
    let words = words(&blanked);
    let mut found = Qualifiers::default();

    for pair in words.windows(2) {
        let (lead, unit) = (pair[0].lower.as_str(), normalize_term(&pair[1].lower));
        let is_rate = matches!(lead, "per" | "each" | "every")
            || (matches!(lead, "a" | "an") && RATE_UNITS.contains(&unit.as_str()));
        if found.rate.is_none() && is_rate && !is_stopword(&unit) {
            found.rate = Some(unit);
        }
    }

    found.weekday = words
        .iter()
        .find(|w| WEEKDAYS.contains(&w.lower.as_str()))
        .map(|w| w.lower.clone());

    found.year = YEAR_CONTEXT_RE
        .captures_iter(&blanked)
        .filter_map(|c| c.name("year")?.as_str().parse::<i32>().ok())
        .find(|y| (1800..=2199).contains(y));

    found
}

// ===========================================================================
// Extractor
// ===========================================================================

/// Lexical statement extractor.
///
/// Segments text into sentences and pulls out at most one temporal,
/// numerical, logical and certainty claim per sentence. Extraction never
/// fails; sentences without recognisable claims contribute nothing.
#[derive(Debug, Clone, Copy)]
pub struct StatementExtractor {
    sensitivity: SensitivityLevel,
    splitter: SentenceSplitter,
}

impl StatementExtractor {
    pub fn new(sensitivity: SensitivityLevel) -> Self {
        Self {
            sensitivity,
            splitter: SentenceSplitter::new(),
        }
    }

    /// Extract all statements from `text`, in document order.
    pub fn extract(&self, text: &str) -> Vec<Statement> {
        let mut statements = Vec::new();

        for sentence in self.splitter.split(text) {
            for (subject, claim) in self.extract_claims(&sentence.text) {
                let statement = Statement {
                    id: statements.len(),
                    sentence_index: sentence.index,
                    text: sentence.text.clone(),
                    span: Span {
                        start: sentence.char_start,
                        end: sentence.char_end,
                    },
                    subject,
                    claim,
                };
                tracing::trace!(
                    id = statement.id,
                    category = %statement.category(),
                    subject = %statement.subject,
                    "Extracted statement"
                );
                statements.push(statement);
            }
        }

        statements
    }

    /// Extract `(subject, claim)` pairs from one sentence, in category order.
    pub fn extract_claims(&self, sentence: &str) -> Vec<(String, Claim)> {
        let dates = find_dates(sentence);
        let blanked = blank_dates(sentence, &dates);
        let words = words(&blanked);

        let mut claims = Vec::new();
        if let Some(found) = self.temporal_claim(sentence, &words, &dates) {
            claims.push(found);
        }
        if let Some(found) = self.numeric_claim(&blanked, &words) {
            claims.push(found);
        }
        if let Some(found) = self.logical_claim(&blanked, &words) {
            claims.push(found);
        }
        if let Some(found) = self.certainty_claim(&blanked, &words) {
            claims.push(found);
        }
        claims
    }

    fn temporal_claim(
        &self,
        sentence: &str,
        words: &[Word<'_>],
        dates: &[DateMention],
    ) -> Option<(String, Claim)> {
        let set = patterns(self.sensitivity);

        for caps in set.temporal.captures_iter(sentence) {
            let (Some(whole), Some(marker)) = (caps.get(0), caps.name("m")) else {
                continue;
            };
            let marker_text = marker.as_str().to_lowercase();
            let marker_key = marker_text.split_whitespace().collect::<Vec<_>>().join(" ");
            let Some(&(_, relation, _, allows_event)) =
                TEMPORAL_MARKERS.iter().find(|(p, ..)| *p == marker_key)
            else {
                continue;
            };

            let anchor = if let Some(date) = dates.iter().find(|d| d.start == whole.end()) {
                Some((TemporalAnchor::Date(date.date), date.end))
            } else if allows_event {
                EVENT_ANCHOR_RE
                    .captures(&sentence[whole.end()..])
                    .and_then(|ev| ev.name("event").map(|m| (m, ev.get(0).map(|g| g.end()))))
                    .and_then(|(m, end)| {
                        let name = normalize_term(m.as_str());
                        if is_stopword(&name) || is_month_word(&name) {
                            None
                        } else {
                            Some((TemporalAnchor::Event(name), whole.end() + end.unwrap_or(0)))
                        }
                    })
            } else {
                None
            };

            let Some((anchor, anchor_end)) = anchor else {
                continue;
            };

            let exclude = match &anchor {
                TemporalAnchor::Event(name) => Some(name.as_str()),
                TemporalAnchor::Date(_) => None,
            };
            let Some(subject) =
                find_subject(words, marker.start(), anchor_end, self.sensitivity, exclude)
            else {
                continue;
            };

            return Some((
                subject,
                Claim::Temporal(TemporalClaim {
                    anchor,
                    relation,
                    marker: marker_key,
                }),
            ));
        }

        None
    }

    fn numeric_claim(&self, blanked: &str, words: &[Word<'_>]) -> Option<(String, Claim)> {
        for caps in NUMBER_RE.captures_iter(blanked) {
            let (Some(whole), Some(num)) = (caps.get(0), caps.name("num")) else {
                continue;
            };
            // Must not be glued to a preceding word or number ("A4", "v2.1").
            if blanked[..whole.start()]
                .chars()
                .last()
                .is_some_and(|c| c.is_alphanumeric() || c == '.' || c == ',')
            {
                continue;
            }

            let currency = caps.name("cur").map(|c| c.as_str());
            let suffix = caps.name("suffix").map(|s| s.as_str().to_lowercase());
            let digits = num.as_str();

            let is_year = currency.is_none()
                && suffix.is_none()
                && digits.len() == 4
                && digits.parse::<u32>().is_ok_and(|y| (1800..=2199).contains(&y));
            if is_year {
                continue;
            }

            let Ok(mut value) = digits.replace(',', "").parse::<f64>() else {
                continue;
            };
            let mut unit = currency.map(|c| match c {
                "€" => "EUR".to_string(),
                "£" => "GBP".to_string(),
                _ => "USD".to_string(),
            });
            match suffix.as_deref() {
                Some("%") | Some("percent") => unit = Some("percent".to_string()),
                Some("k") | Some("thousand") => value *= 1_000.0,
                Some("million") => value *= 1_000_000.0,
                Some("billion") => value *= 1_000_000_000.0,
                _ => {}
            }

            let following: Vec<&Word<'_>> = words.iter().filter(|w| w.start >= whole.end()).collect();
            if unit.is_none() {
                unit = following.first().and_then(|w| {
                    UNIT_WORDS
                        .iter()
                        .find(|(word, _)| *word == w.lower)
                        .map(|(_, u)| u.to_string())
                });
            }

            if self.sensitivity == SensitivityLevel::Low && unit.is_none() {
                continue;
            }

            let Some(label) = quantity_label(words, whole.start(), &following) else {
                continue;
            };

            return Some((
                label,
                Claim::Numerical(NumericClaim {
                    value,
                    unit,
                    raw: whole.as_str().trim().to_string(),
                }),
            ));
        }

        if self.sensitivity == SensitivityLevel::High {
            let set = patterns(self.sensitivity);
            if let Some(m) = set.spelled_number.captures(blanked).and_then(|c| c.name("m")) {
                let lower = m.as_str().to_lowercase();
                let value = SPELLED_NUMBERS.iter().find(|(w, _)| *w == lower)?.1;
                let following: Vec<&Word<'_>> = words.iter().filter(|w| w.start >= m.end()).collect();
                let unit = following.first().and_then(|w| {
                    UNIT_WORDS
                        .iter()
                        .find(|(word, _)| *word == w.lower)
                        .map(|(_, u)| u.to_string())
                });
                let label = quantity_label(words, m.start(), &following)?;
                return Some((
                    label,
                    Claim::Numerical(NumericClaim {
                        value,
                        unit,
                        raw: m.as_str().to_string(),
                    }),
                ));
            }
        }

        None
    }

    fn logical_claim(&self, blanked: &str, words: &[Word<'_>]) -> Option<(String, Claim)> {
        let set = patterns(self.sensitivity);
        let predicate = set.predicate.captures(blanked)?.name("m")?;
        let form = predicate
            .as_str()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let lemma = PREDICATES.iter().find(|(f, ..)| *f == form)?.1;

        let negation_marker = set
            .negation
            .captures(&blanked[..predicate.start()].replace('’', "'"))
            .and_then(|c| c.name("m").map(|m| m.as_str().to_lowercase()));

        let subject = find_subject(
            words,
            predicate.start(),
            predicate.end(),
            self.sensitivity,
            None,
        )?;

        Some((
            subject,
            Claim::Logical(LogicalClaim {
                predicate: lemma.to_string(),
                negated: negation_marker.is_some(),
                negation_marker,
            }),
        ))
    }

    fn certainty_claim(&self, blanked: &str, words: &[Word<'_>]) -> Option<(String, Claim)> {
        let set = patterns(self.sensitivity);
        let marker = set.certainty.captures(blanked)?.name("m")?;
        let key = marker
            .as_str()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let register = CERTAINTY_MARKERS.iter().find(|(p, ..)| *p == key)?.1;
        let subject = find_subject(words, marker.start(), marker.end(), self.sensitivity, None)?;

        Some((
            subject,
            Claim::Certainty(CertaintyClaim {
                register,
                marker: key,
            }),
        ))
    }
}

impl Default for StatementExtractor {
    fn default() -> Self {
        Self::new(SensitivityLevel::default())
    }
}

/// Label for a number starting at `number_start`: the last two content
/// words before it once linking verbs and modifiers are dropped, or the
/// first content word after it.
fn quantity_label(
    words: &[Word<'_>],
    number_start: usize,
    following: &[&Word<'_>],
) -> Option<String> {
    let preceding: Vec<&Word<'_>> = words.iter().filter(|w| w.end <= number_start).collect();

    let mut end = preceding.len();
    while end > 0 && LINKING_WORDS.contains(&preceding[end - 1].lower.as_str()) {
        end -= 1;
    }

    let mut label: Vec<String> = Vec::new();
    for word in preceding[..end].iter().rev() {
        let lower = word.lower.as_str();
        if LABEL_MODIFIERS.contains(&lower) {
            continue;
        }
        if is_stopword(lower) || DETERMINERS.contains(&lower) || word.breaks_phrase() {
            break;
        }
        label.push(normalize_term(lower));
        if label.len() == 2 {
            break;
        }
    }

    if label.is_empty() {
        return following
            .iter()
            .find(|w| !w.breaks_phrase() && w.lower.len() > 1)
            .map(|w| normalize_term(&w.lower));
    }

    label.reverse();
    Some(label.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> StatementExtractor {
        StatementExtractor::new(SensitivityLevel::Medium)
    }

    fn claims_of(text: &str) -> Vec<(String, Claim)> {
        extractor().extract_claims(text)
    }

    // =======================================================================
    // Temporal extraction
    // =======================================================================

    #[test]
    fn test_temporal_before_date() {
        let claims = claims_of("The meeting occurred before January 15, 2024.");
        let (subject, claim) = &claims[0];
        assert_eq!(subject, "meeting");
        match claim {
            Claim::Temporal(t) => {
                assert_eq!(t.relation, TemporalRelation::Before);
                assert_eq!(
                    t.anchor,
                    TemporalAnchor::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
                );
            }
            other => panic!("expected temporal claim, got {other:?}"),
        }
    }

    #[test]
    fn test_temporal_subject_after_verb_phrase() {
        let claims = claims_of("John confirmed the meeting happened after January 20, 2024.");
        let temporal = claims
            .iter()
            .find(|(_, c)| matches!(c, Claim::Temporal(_)))
            .unwrap();
        assert_eq!(temporal.0, "meeting");
    }

    #[test]
    fn test_temporal_event_anchor() {
        let claims = claims_of("The payment was made before the audit.");
        match &claims[0] {
            (subject, Claim::Temporal(t)) => {
                assert_eq!(subject, "payment");
                assert_eq!(t.anchor, TemporalAnchor::Event("audit".to_string()));
            }
            other => panic!("expected temporal claim, got {other:?}"),
        }
    }

    #[test]
    fn test_temporal_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        for text in [
            "The audit ended before March 5, 2024.",
            "The audit ended before 5 March 2024.",
            "The audit ended before 2024-03-05.",
            "The audit ended before 03/05/2024.",
            "The audit ended before Mar. 5th, 2024.",
        ] {
            let claims = claims_of(text);
            match claims.first() {
                Some((_, Claim::Temporal(t))) => {
                    assert_eq!(t.anchor, TemporalAnchor::Date(expected), "for {text}")
                }
                other => panic!("expected temporal claim for {text}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_temporal_markers_widen_with_sensitivity() {
        let text = "The transfer happened following the board vote.";
        let low = StatementExtractor::new(SensitivityLevel::Low).extract_claims(text);
        let high = StatementExtractor::new(SensitivityLevel::High).extract_claims(text);
        assert!(!low.iter().any(|(_, c)| matches!(c, Claim::Temporal(_))));
        assert!(high.iter().any(|(_, c)| matches!(c, Claim::Temporal(_))));
    }

    // =======================================================================
    // Numerical extraction
    // =======================================================================

    #[test]
    fn test_numeric_currency_label() {
        let claims = claims_of("The total payment amount was $50,000.");
        match &claims[0] {
            (label, Claim::Numerical(n)) => {
                assert_eq!(label, "payment amount");
                assert_eq!(n.value, 50_000.0);
                assert_eq!(n.unit.as_deref(), Some("USD"));
            }
            other => panic!("expected numerical claim, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_label_after_linking_verb() {
        let claims = claims_of("The contract states the payment amount is $75,000.");
        let (label, _) = claims
            .iter()
            .find(|(_, c)| matches!(c, Claim::Numerical(_)))
            .unwrap();
        assert_eq!(label, "payment amount");
    }

    #[test]
    fn test_numeric_ignores_dates_and_years() {
        let claims = claims_of("The meeting occurred before January 15, 2024.");
        assert!(!claims.iter().any(|(_, c)| matches!(c, Claim::Numerical(_))));
        let claims = claims_of("The company was founded in 1998.");
        assert!(!claims.iter().any(|(_, c)| matches!(c, Claim::Numerical(_))));
    }

    #[test]
    fn test_numeric_suffix_scaling() {
        let claims = claims_of("The settlement was $1.5 million.");
        match &claims[0] {
            (_, Claim::Numerical(n)) => assert_eq!(n.value, 1_500_000.0),
            other => panic!("expected numerical claim, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_low_requires_unit() {
        let text = "The headcount was 40.";
        let low = StatementExtractor::new(SensitivityLevel::Low).extract_claims(text);
        let medium = extractor().extract_claims(text);
        assert!(low.is_empty());
        assert!(matches!(medium[0].1, Claim::Numerical(_)));
        assert_eq!(medium[0].0, "headcount");
    }

    #[test]
    fn test_spelled_numbers_only_at_high() {
        let text = "The crew numbered five people.";
        let medium = extractor().extract_claims(text);
        let high = StatementExtractor::new(SensitivityLevel::High).extract_claims(text);
        assert!(!medium.iter().any(|(_, c)| matches!(c, Claim::Numerical(_))));
        assert!(high.iter().any(|(_, c)| matches!(c, Claim::Numerical(_))));
    }

    // =======================================================================
    // Logical extraction
    // =======================================================================

    #[test]
    fn test_logical_positive_and_negated() {
        let positive = claims_of("The meeting took place.");
        let negative = claims_of("The meeting did not happen.");
        match (&positive[0], &negative[0]) {
            ((s1, Claim::Logical(a)), (s2, Claim::Logical(b))) => {
                assert_eq!(s1, "meeting");
                assert_eq!(s2, "meeting");
                assert_eq!(a.predicate, b.predicate);
                assert!(!a.negated);
                assert!(b.negated);
                assert_eq!(b.negation_marker.as_deref(), Some("did not"));
            }
            other => panic!("expected logical claims, got {other:?}"),
        }
    }

    #[test]
    fn test_logical_contraction_negation() {
        let claims = claims_of("John didn't attend the hearing.");
        match &claims[0] {
            (subject, Claim::Logical(l)) => {
                assert_eq!(subject, "hearing");
                assert!(l.negated);
            }
            other => panic!("expected logical claim, got {other:?}"),
        }
    }

    // =======================================================================
    // Certainty extraction
    // =======================================================================

    #[test]
    fn test_certainty_registers() {
        let definite = claims_of("The witness definitely saw the car.");
        let possible = claims_of("The witness possibly saw the car.");
        let uncertain = claims_of("It is unclear whether the witness saw the car.");

        let register = |claims: &[(String, Claim)]| {
            claims.iter().find_map(|(s, c)| match c {
                Claim::Certainty(c) => Some((s.clone(), c.register)),
                _ => None,
            })
        };
        assert_eq!(
            register(&definite),
            Some(("witness".to_string(), CertaintyRegister::Definite))
        );
        assert_eq!(
            register(&possible),
            Some(("witness".to_string(), CertaintyRegister::Possible))
        );
        assert_eq!(
            register(&uncertain),
            Some(("witness".to_string(), CertaintyRegister::Uncertain))
        );
    }

    #[test]
    fn test_not_certain_is_uncertain() {
        let claims = claims_of("The clerk is not certain the filing arrived.");
        let found = claims.iter().find_map(|(_, c)| match c {
            Claim::Certainty(c) => Some(c.register),
            _ => None,
        });
        assert_eq!(found, Some(CertaintyRegister::Uncertain));
    }

    // =======================================================================
    // Whole-document extraction
    // =======================================================================

    #[test]
    fn test_extract_assigns_sequential_ids_and_spans() {
        let text = "The meeting occurred before January 15, 2024. The fee was $20.";
        let statements = extractor().extract(text);
        assert!(statements.len() >= 2);
        for (i, s) in statements.iter().enumerate() {
            assert_eq!(s.id, i);
            let slice: String = text.chars().skip(s.span.start).take(s.span.end - s.span.start).collect();
            assert_eq!(slice, s.text);
        }
    }

    #[test]
    fn test_extract_unmatched_text_yields_nothing() {
        let statements = extractor().extract("Hello there. Nice weather we have.");
        assert!(statements.is_empty());
    }

    #[test]
    fn test_extract_is_deterministic() {
        let text = "The payment amount was $10. The payment amount was $12.";
        assert_eq!(extractor().extract(text), extractor().extract(text));
    }

    // =======================================================================
    // Qualifiers
    // =======================================================================

    #[test]
    fn test_qualifiers_rate_weekday_year() {
        let found = qualifiers("The store sold 3 units per day on Monday in 2023.");
        assert_eq!(found.rate.as_deref(), Some("day"));
        assert_eq!(found.weekday.as_deref(), Some("monday"));
        assert_eq!(found.year, Some(2023));

        let hourly = qualifiers("The fee was $40 an hour.");
        assert_eq!(hourly.rate.as_deref(), Some("hour"));
    }

    #[test]
    fn test_qualifiers_skip_full_dates() {
        let found = qualifiers("The audit ended before March 5, 2024.");
        assert_eq!(found, Qualifiers::default());
    }

    #[test]
    fn test_qualifier_clash_needs_both_sides() {
        let hourly = qualifiers("The fee was $10 per hour.");
        let monthly = qualifiers("The fee was $400 per month.");
        let bare = qualifiers("The fee was $12.");
        assert_eq!(
            hourly.clash(&monthly).as_deref(),
            Some("rate: hour vs month")
        );
        assert_eq!(hourly.clash(&bare), None);
        assert_eq!(hourly.clash(&qualifiers("The fee was $12 per hour.")), None);

        let y2023 = qualifiers("The budget was $5,000 in 2023.");
        let y2024 = qualifiers("The budget was $7,000 in 2024.");
        assert!(y2023.clash(&y2024).is_some());
    }
}
