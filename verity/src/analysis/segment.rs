use unicode_segmentation::UnicodeSegmentation;

/// Abbreviations whose trailing period does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "Sr.", "Jr.", "vs.", "etc.", "i.e.", "e.g.", "Inc.",
    "Ltd.", "Corp.", "Co.", "No.", "Vol.", "Ch.", "Fig.", "Eq.", "Sec.", "St.", "Jan.", "Feb.",
    "Mar.", "Apr.", "Jun.", "Jul.", "Aug.", "Sep.", "Sept.", "Oct.", "Nov.", "Dec.",
];

/// A sentence-like unit of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub index: usize,
    pub text: String,
    /// Offsets into the source, in Unicode scalar values.
    pub char_start: usize,
    pub char_end: usize,
}

/// Splits raw text into sentence-like units on `.`, `!`, `?` and newlines.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceSplitter;

impl SentenceSplitter {
    pub fn new() -> Self {
        Self
    }

    pub fn split(&self, text: &str) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        let mut current = String::new();
        let mut current_start: Option<usize> = None;
        let mut chars_seen = 0usize;

        let graphemes: Vec<&str> = text.graphemes(true).collect();

        for (i, grapheme) in graphemes.iter().enumerate() {
            let width = grapheme.chars().count();

            if current_start.is_none() && !grapheme.trim().is_empty() {
                current_start = Some(chars_seen);
            }
            if current_start.is_some() {
                current.push_str(grapheme);
            }
            chars_seen += width;

            let next = graphemes.get(i + 1).copied();
            if current_start.is_some() && self.is_sentence_boundary(&current, next) {
                self.push_sentence(&mut sentences, &current, current_start, chars_seen);
                current.clear();
                current_start = None;
            }
        }

        if current_start.is_some() {
            self.push_sentence(&mut sentences, &current, current_start, chars_seen);
        }

        sentences
    }

    fn push_sentence(
        &self,
        sentences: &mut Vec<Sentence>,
        raw: &str,
        start: Option<usize>,
        end: usize,
    ) {
        let Some(start) = start else {
            return;
        };
        let trimmed = raw.trim_end();
        if trimmed.is_empty() {
            return;
        }
        let trailing = raw[trimmed.len()..].chars().count();
        sentences.push(Sentence {
            index: sentences.len(),
            text: trimmed.to_string(),
            char_start: start,
            char_end: end - trailing,
        });
    }

    fn is_sentence_boundary(&self, text: &str, next: Option<&str>) -> bool {
        let Some(last_char) = text.chars().last() else {
            return false;
        };

        if last_char == '\n' {
            return true;
        }

        if !matches!(last_char, '.' | '!' | '?') {
            return false;
        }

        if last_char == '.' {
            // Decimal point: "$1.5 million"
            let prev_is_digit = text
                .chars()
                .rev()
                .nth(1)
                .is_some_and(|c| c.is_ascii_digit());
            let next_is_digit = next
                .and_then(|g| g.chars().next())
                .is_some_and(|c| c.is_ascii_digit());
            if prev_is_digit && next_is_digit {
                return false;
            }

            if let Some(last_word) = text.split_whitespace().last() {
                if ABBREVIATIONS.contains(&last_word) {
                    return false;
                }
            }
        }

        true
    }
}
