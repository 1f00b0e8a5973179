/// Function words that never act as a subject key or a quantity label.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "and", "or", "but", "of", "to", "in",
    "on", "at", "by", "for", "with", "from", "as", "it", "its", "he", "she", "they", "we", "i",
    "you", "his", "her", "their", "our", "my", "your", "was", "were", "is", "are", "be", "been",
    "being", "has", "have", "had", "do", "does", "did", "not", "no", "there", "which", "who",
    "whom", "what", "when", "where", "then", "than", "also", "all", "any", "some", "both",
];

/// Returns true if the lower-cased word is a function word.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Lower-case a word, strip surrounding punctuation and fold a simple
/// plural ("payments" -> "payment", but "witness" stays).
pub fn normalize_term(word: &str) -> String {
    let lower = word
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if is_stopword(&lower) {
        return lower;
    }
    if lower.len() > 3
        && lower.ends_with('s')
        && !lower.ends_with("ss")
        && !lower.ends_with("us")
        && !lower.ends_with("is")
    {
        lower[..lower.len() - 1].to_string()
    } else {
        lower
    }
}

/// Normalized content words of a text, in order of appearance.
pub fn content_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize_term)
        .filter(|w| w.len() > 1 && !is_stopword(w) && !w.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

/// Share of words two texts have in common, from 0.0 to 1.0. Words match
/// when one is a prefix of the other (at least 3 chars), so "occur" and
/// "occurred" count as the same word.
pub fn fuzzy_overlap_score(a: &str, b: &str) -> f64 {
    let words_a: Vec<&str> = a.split_whitespace().filter(|w| w.len() > 1).collect();
    let words_b: Vec<&str> = b.split_whitespace().filter(|w| w.len() > 1).collect();

    if words_a.is_empty() && words_b.is_empty() {
        return 1.0;
    }
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let mut matched_a = 0usize;
    for wa in &words_a {
        if words_b.iter().any(|wb| fuzzy_word_match(wa, wb)) {
            matched_a += 1;
        }
    }

    let mut matched_b = 0usize;
    for wb in &words_b {
        if words_a.iter().any(|wa| fuzzy_word_match(wa, wb)) {
            matched_b += 1;
        }
    }

    let total_unique = words_a.len() + words_b.len() - matched_a.min(matched_b);
    let total_matched = matched_a.max(matched_b);

    total_matched as f64 / total_unique as f64
}

pub fn fuzzy_word_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let min_len = a.len().min(b.len());
    if min_len < 3 {
        return false;
    }
    a.starts_with(b) || b.starts_with(a)
}

/// Returns true if every word of `phrase` fuzzily occurs somewhere in `text`.
pub fn mentions_all(text: &str, phrase: &str) -> bool {
    let words: Vec<String> = text.split_whitespace().map(normalize_term).collect();
    phrase
        .split_whitespace()
        .map(normalize_term)
        .all(|needle| words.iter().any(|w| fuzzy_word_match(w, &needle)))
}
