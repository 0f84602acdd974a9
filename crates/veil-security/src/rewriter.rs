//! Text rewriter
//!
//! Substitution runs in a fixed order: keywords (longest first), PII
//! categories in recognizer order, then financial amounts. Text already
//! replaced by an earlier step is never matched again within the same
//! rewrite.

use std::collections::HashMap;
use std::ops::Range;

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use tracing::{debug, trace};
use veil_core::{Error, PiiCategory, ProcessingStats, Result, TextEdit, apply_edits};

use crate::patterns::{FINANCIAL, PII_RECOGNIZERS, Recognizer};

/// Feature switches for one processing call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteFlags {
    pub financial: bool,
    pub pii: bool,
}

/// Case-insensitive keyword matchers, longest keyword first
pub struct KeywordSet {
    entries: Vec<(Regex, String)>,
}

impl KeywordSet {
    /// Compile a keyword -> placeholder map
    pub fn new(map: &IndexMap<String, String>) -> Result<Self> {
        let mut keywords: Vec<(&String, &String)> = map.iter().collect();
        // stable sort keeps insertion order among equal lengths
        keywords.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

        let entries = keywords
            .into_iter()
            .map(|(keyword, placeholder)| {
                let regex = RegexBuilder::new(&regex::escape(keyword))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| Error::KeywordValidation(format!("{}: {}", keyword, e)))?;
                Ok((regex, placeholder.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Compiled {} keyword matchers", entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-call memoization: identical raw values share one placeholder
#[derive(Debug, Default)]
pub struct SessionState {
    keywords_replaced: usize,
    financial: HashMap<String, String>,
    pii: HashMap<PiiCategory, HashMap<String, String>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn financial_placeholder(&mut self, value: &str) -> String {
        let next = self.financial.len() + 1;
        self.financial
            .entry(value.to_string())
            .or_insert_with(|| format!("[AMOUNT_{}]", next))
            .clone()
    }

    fn pii_placeholder(&mut self, category: PiiCategory, value: &str) -> String {
        let values = self.pii.entry(category).or_default();
        let next = values.len() + 1;
        values
            .entry(value.to_string())
            .or_insert_with(|| format!("[{}_{}]", category.label(), next))
            .clone()
    }

    /// Run `f` without adding to the keyword count.
    ///
    /// For text that repeats content already counted, such as the fallback
    /// copy of a text box.
    pub fn uncounted<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let counted = self.keywords_replaced;
        let out = f(self);
        self.keywords_replaced = counted;
        out
    }

    /// Counts accumulated so far
    pub fn stats(&self) -> ProcessingStats {
        ProcessingStats {
            keywords_replaced: self.keywords_replaced,
            financial_replaced: self.financial.len(),
            pii_replaced: self
                .pii
                .iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(category, values)| (*category, values.len()))
                .collect(),
        }
    }
}

/// One piece of the fragment and the source bytes it stands for
struct Part {
    text: String,
    origin: Range<usize>,
    replaced: bool,
}

/// Text split into pieces still open to matching and pieces already replaced
struct Segments {
    parts: Vec<Part>,
}

impl Segments {
    fn new(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: text.to_string(),
                origin: 0..text.len(),
                replaced: false,
            }],
        }
    }

    /// Replace matches found in open pieces; returns the number replaced
    fn substitute(
        &mut self,
        mut find: impl FnMut(&str) -> Vec<Range<usize>>,
        mut replacement: impl FnMut(&str) -> String,
    ) -> usize {
        let mut count = 0;
        let mut parts = Vec::with_capacity(self.parts.len());

        for part in self.parts.drain(..) {
            if part.replaced {
                parts.push(part);
                continue;
            }

            let ranges = find(&part.text);
            if ranges.is_empty() {
                parts.push(part);
                continue;
            }

            // open parts are verbatim source, so offsets carry over
            let base = part.origin.start;
            let open = |range: Range<usize>| Part {
                text: part.text[range.clone()].to_string(),
                origin: base + range.start..base + range.end,
                replaced: false,
            };

            let mut last = 0;
            for range in ranges {
                if range.start > last {
                    parts.push(open(last..range.start));
                }
                parts.push(Part {
                    text: replacement(&part.text[range.clone()]),
                    origin: base + range.start..base + range.end,
                    replaced: true,
                });
                last = range.end;
                count += 1;
            }
            if last < part.text.len() {
                parts.push(open(last..part.text.len()));
            }
        }

        self.parts = parts;
        count
    }

    fn into_edits(self) -> Vec<TextEdit> {
        self.parts
            .into_iter()
            .filter(|part| part.replaced)
            .map(|part| TextEdit::new(part.origin, part.text))
            .collect()
    }
}

/// Rewrites text fragments with a fixed keyword set and flags
pub struct Rewriter {
    keywords: KeywordSet,
    flags: RewriteFlags,
}

impl Rewriter {
    pub fn new(keywords: KeywordSet, flags: RewriteFlags) -> Self {
        Self { keywords, flags }
    }

    pub fn flags(&self) -> RewriteFlags {
        self.flags
    }

    /// Rewrite one fragment, recording replacements in `session`
    pub fn rewrite(&self, text: &str, session: &mut SessionState) -> String {
        apply_edits(text, &self.edits(text, session))
    }

    /// Replacements for one fragment, sorted by position in `text`
    pub fn edits(&self, text: &str, session: &mut SessionState) -> Vec<TextEdit> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut segments = Segments::new(text);

        for (regex, placeholder) in &self.keywords.entries {
            session.keywords_replaced += segments.substitute(
                |t| regex.find_iter(t).map(|m| m.range()).collect(),
                |_| placeholder.clone(),
            );
        }

        if self.flags.pii {
            for (category, recognizer) in PII_RECOGNIZERS.iter() {
                segments.substitute(
                    |t| recognizer.find_ranges(t),
                    |value| session.pii_placeholder(*category, value),
                );
            }
        }

        if self.flags.financial {
            let financial: &Recognizer = &FINANCIAL;
            segments.substitute(
                |t| financial.find_ranges(t),
                |value| session.financial_placeholder(value),
            );
        }

        let edits = segments.into_edits();
        if !edits.is_empty() {
            trace!("Rewrote fragment with {} replacements", edits.len());
        }
        edits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword_map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn rewriter(pairs: &[(&str, &str)], flags: RewriteFlags) -> Rewriter {
        Rewriter::new(KeywordSet::new(&keyword_map(pairs)).unwrap(), flags)
    }

    const PII: RewriteFlags = RewriteFlags {
        financial: false,
        pii: true,
    };

    #[test]
    fn test_empty_text_is_noop() {
        let rewriter = rewriter(&[("Acme", "[REDACTED_1]")], PII);
        let mut session = SessionState::new();
        assert_eq!(rewriter.rewrite("", &mut session), "");
        assert_eq!(session.stats(), ProcessingStats::default());
    }

    #[test]
    fn test_longest_keyword_first() {
        let rewriter = rewriter(
            &[("Acme", "[REDACTED_1]"), ("Acme Corporation", "[REDACTED_2]")],
            RewriteFlags::default(),
        );
        let mut session = SessionState::new();
        let out = rewriter.rewrite("Acme Corporation Inc", &mut session);
        assert_eq!(out, "[REDACTED_2] Inc");
        assert_eq!(session.stats().keywords_replaced, 1);
    }

    #[test]
    fn test_keywords_case_insensitive_substring() {
        let rewriter = rewriter(&[("acme", "[REDACTED_1]")], RewriteFlags::default());
        let mut session = SessionState::new();
        let out = rewriter.rewrite("ACME and Acme and SuperAcmeCo", &mut session);
        assert_eq!(out, "[REDACTED_1] and [REDACTED_1] and Super[REDACTED_1]Co");
        assert_eq!(session.stats().keywords_replaced, 3);
    }

    #[test]
    fn test_keyword_metacharacters_are_literal() {
        let rewriter = rewriter(&[("C++ (beta)", "[REDACTED_1]")], RewriteFlags::default());
        let mut session = SessionState::new();
        assert_eq!(
            rewriter.rewrite("We use C++ (beta) daily", &mut session),
            "We use [REDACTED_1] daily"
        );
    }

    #[test]
    fn test_placeholders_are_not_rematched() {
        // "red" would otherwise hit inside "[REDACTED_1]"
        let rewriter = rewriter(
            &[("Acme", "[REDACTED_1]"), ("red", "[REDACTED_2]")],
            RewriteFlags::default(),
        );
        let mut session = SessionState::new();
        let out = rewriter.rewrite("Acme is red", &mut session);
        assert_eq!(out, "[REDACTED_1] is [REDACTED_2]");
        assert_eq!(session.stats().keywords_replaced, 2);
    }

    #[test]
    fn test_pii_memoized_within_session() {
        let rewriter = rewriter(&[], PII);
        let mut session = SessionState::new();

        let first = rewriter.rewrite("a@x.com, b@y.org, a@x.com", &mut session);
        assert_eq!(first, "[EMAIL_1], [EMAIL_2], [EMAIL_1]");

        // same value in a later fragment of the same call
        let second = rewriter.rewrite("reply to a@x.com", &mut session);
        assert_eq!(second, "reply to [EMAIL_1]");

        let stats = session.stats();
        assert_eq!(stats.pii_replaced.get(&PiiCategory::Email), Some(&2));
    }

    #[test]
    fn test_fresh_session_restarts_numbering() {
        let rewriter = rewriter(&[], PII);
        let mut first = SessionState::new();
        rewriter.rewrite("b@y.org", &mut first);

        let mut second = SessionState::new();
        assert_eq!(rewriter.rewrite("a@x.com", &mut second), "[EMAIL_1]");
    }

    #[test]
    fn test_ssn_versus_phone() {
        let rewriter = rewriter(&[], PII);
        let mut session = SessionState::new();
        let out = rewriter.rewrite("SSN 123-45-6789, phone 123-456-7890", &mut session);
        assert_eq!(out, "SSN [SSN_1], phone [PHONE_1]");
    }

    #[test]
    fn test_credit_card_claimed_before_phone() {
        let rewriter = rewriter(&[], PII);
        let mut session = SessionState::new();
        let out = rewriter.rewrite("card 4111 1111 1111 1111", &mut session);
        assert_eq!(out, "card [CREDIT_CARD_1]");
        assert!(!session.stats().pii_replaced.contains_key(&PiiCategory::Phone));
    }

    #[test]
    fn test_financial_only_when_enabled() {
        let text = "Total: $1,200.50";
        let plain = rewriter(&[], PII);
        let mut session = SessionState::new();
        assert_eq!(plain.rewrite(text, &mut session), text);

        let financial = rewriter(
            &[],
            RewriteFlags {
                financial: true,
                pii: false,
            },
        );
        let mut session = SessionState::new();
        assert_eq!(financial.rewrite(text, &mut session), "Total: [AMOUNT_1]");
        assert_eq!(
            financial.rewrite("again $1,200.50 and 300€", &mut session),
            "again [AMOUNT_1] and [AMOUNT_2]"
        );
        assert_eq!(session.stats().financial_replaced, 2);
    }

    #[test]
    fn test_keyword_match_hides_pii() {
        let rewriter = rewriter(&[("john@x.com", "[REDACTED_1]")], PII);
        let mut session = SessionState::new();
        assert_eq!(rewriter.rewrite("mail john@x.com", &mut session), "mail [REDACTED_1]");
        assert!(session.stats().pii_replaced.is_empty());
    }

    #[test]
    fn test_contact_line() {
        let rewriter = rewriter(&[("John Doe", "[REDACTED_1]")], PII);
        let mut session = SessionState::new();
        let out = rewriter.rewrite(
            "Contact John Doe at john@x.com or 555-123-4567",
            &mut session,
        );
        assert_eq!(out, "Contact [REDACTED_1] at [EMAIL_1] or [PHONE_1]");

        let stats = session.stats();
        assert_eq!(stats.keywords_replaced, 1);
        assert_eq!(stats.financial_replaced, 0);
        assert_eq!(stats.pii_replaced.len(), 2);
        assert_eq!(stats.pii_replaced[&PiiCategory::Email], 1);
        assert_eq!(stats.pii_replaced[&PiiCategory::Phone], 1);
    }

    #[test]
    fn test_edits_point_into_source() {
        let rewriter = rewriter(&[("Acme", "[REDACTED_1]")], PII);
        let mut session = SessionState::new();
        let text = "Acme\tbob@x.com\nFax";
        let edits = rewriter.edits(text, &mut session);
        assert_eq!(
            edits,
            vec![
                TextEdit::new(0..4, "[REDACTED_1]"),
                TextEdit::new(5..14, "[EMAIL_1]"),
            ]
        );
        assert_eq!(apply_edits(text, &edits), "[REDACTED_1]\t[EMAIL_1]\nFax");
    }

    #[test]
    fn test_tab_and_break_separate_values() {
        let rewriter = rewriter(&[], PII);
        let mut session = SessionState::new();
        let out = rewriter.rewrite("Phone\t5551234567\nFax", &mut session);
        assert_eq!(out, "Phone\t[PHONE_1]\nFax");
    }

    #[test]
    fn test_uncounted_keeps_keyword_count() {
        let rewriter = rewriter(&[("Acme", "[REDACTED_1]")], PII);
        let mut session = SessionState::new();
        rewriter.rewrite("Acme", &mut session);
        let out = session.uncounted(|s| rewriter.rewrite("Acme at a@x.com", s));
        assert_eq!(out, "[REDACTED_1] at [EMAIL_1]");

        let stats = session.stats();
        assert_eq!(stats.keywords_replaced, 1);
        assert_eq!(stats.pii_replaced[&PiiCategory::Email], 1);
    }
}
