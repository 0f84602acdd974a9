//! Fixed pattern library
//!
//! Recognizers are applied in declaration order; earlier ones claim text
//! first. The SSN recognizer refuses any candidate that also has the 3-3-4
//! phone shape, so phone numbers are never tagged as SSNs.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use veil_core::PiiCategory;

// $ € £ ¥ ₹ ₽ ₿ ¢ ₩ ₪ ₫ ฿ ₱ ₴ ₸ ₺ ₼ ₾
const CURRENCY_SYMBOLS: &str = r"[\$\x{20AC}\x{00A3}\x{00A5}\x{20B9}\x{20BD}\x{20BF}\x{00A2}\x{20A9}\x{20AA}\x{20AB}\x{0E3F}\x{20B1}\x{20B4}\x{20B8}\x{20BA}\x{20BC}\x{20BE}]";

const AMOUNT: &str = r"\d[\d,]*(?:\.\d{1,2})?";

/// A compiled matcher with an optional prefix it must not start with
pub struct Recognizer {
    regex: Regex,
    exclude: Option<Regex>,
}

impl Recognizer {
    fn new(pattern: &str) -> Self {
        Self {
            regex: Regex::new(pattern).expect("built-in pattern must compile"),
            exclude: None,
        }
    }

    /// Reject matches whose text, from the match start on, matches `pattern`
    fn excluding(mut self, pattern: &str) -> Self {
        let anchored = format!("^(?:{})", pattern);
        self.exclude = Some(Regex::new(&anchored).expect("built-in pattern must compile"));
        self
    }

    /// Byte ranges of all non-overlapping matches, left to right
    pub fn find_ranges(&self, text: &str) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut at = 0;

        while at <= text.len() {
            let Some(m) = self.regex.find_at(text, at) else {
                break;
            };

            if let Some(exclude) = &self.exclude
                && exclude.is_match(&text[m.start()..])
            {
                // a rejected start is never retried; move one character on
                at = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
                continue;
            }

            ranges.push(m.range());
            at = if m.end() > m.start() {
                m.end()
            } else {
                m.end() + 1
            };
        }

        ranges
    }

    pub fn is_match(&self, text: &str) -> bool {
        !self.find_ranges(text).is_empty()
    }
}

/// Currency symbol before or after a number, optional single space between
pub static FINANCIAL: LazyLock<Recognizer> = LazyLock::new(|| {
    Recognizer::new(&format!(
        r"(?:{sym}\s?{amount}|{amount}\s?{sym})",
        sym = CURRENCY_SYMBOLS,
        amount = AMOUNT
    ))
});

/// PII recognizers in application order
pub static PII_RECOGNIZERS: LazyLock<Vec<(PiiCategory, Recognizer)>> = LazyLock::new(|| {
    vec![
        (
            PiiCategory::CreditCard,
            Recognizer::new(r"\b(?:\d{4}[-.\s]?){3}\d{4}\b"),
        ),
        (
            PiiCategory::Email,
            Recognizer::new(r"(?i)\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
        ),
        (
            PiiCategory::IpAddress,
            Recognizer::new(
                r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
            ),
        ),
        (
            PiiCategory::Ssn,
            Recognizer::new(r"\b\d{3}[-.\s]?\d{2}[-.\s]?\d{4}\b")
                .excluding(r"\d{3}[-.\s]?\d{3}[-.\s]?\d{4}"),
        ),
        (
            PiiCategory::Phone,
            Recognizer::new(r"\b(?:\+?1[-.\s]?)?(?:\(?\d{3}\)?[-.\s]?)?\d{3}[-.\s]?\d{4}\b"),
        ),
        (
            PiiCategory::Date,
            Recognizer::new(
                r"\b(?:\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}|\d{4}[/\-]\d{1,2}[/\-]\d{1,2})\b",
            ),
        ),
    ]
});

/// Recognizer for one PII category
pub fn recognizer(category: PiiCategory) -> &'static Recognizer {
    PII_RECOGNIZERS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, r)| r)
        .expect("every category has a recognizer")
}
