use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref PHRASE_RE: Regex = Regex::new(r#""([^"]+)""#).expect("valid regex");
}

/// Boolean query split by role. Terms are verbatim; the ranker normalizes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub must: Vec<String>,
    pub should: Vec<String>,
    pub must_not: Vec<String>,
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    And,
    Or,
    Not,
}

impl ParsedQuery {
    /// Parse `"quoted phrases"` and AND/OR/NOT operators. An operator applies to
    /// every following term until the next operator.
    pub fn parse(raw: &str) -> Self {
        let mut q = ParsedQuery::default();
        q.phrases = PHRASE_RE.captures_iter(raw).map(|c| c[1].to_string()).collect();
        let cleaned = PHRASE_RE.replace_all(raw, " ");

        let mut mode = Mode::And;
        for token in cleaned.split_whitespace() {
            if token.eq_ignore_ascii_case("AND") {
                mode = Mode::And;
            } else if token.eq_ignore_ascii_case("OR") {
                mode = Mode::Or;
            } else if token.eq_ignore_ascii_case("NOT") {
                mode = Mode::Not;
            } else {
                let term = token.to_string();
                match mode {
                    Mode::And => q.must.push(term),
                    Mode::Or => q.should.push(term),
                    Mode::Not => q.must_not.push(term),
                }
            }
        }
        q
    }

    /// Terms that contribute to scoring: must then should.
    pub fn scored_terms(&self) -> impl Iterator<Item = &str> {
        self.must.iter().chain(self.should.iter()).map(|s| s.as_str())
    }

    pub fn has_scored_terms(&self) -> bool { !(self.must.is_empty() && self.should.is_empty()) }

    /// Raw strings used to locate the snippet window.
    pub fn highlight_terms(&self) -> Vec<String> {
        self.phrases.iter().chain(self.must.iter()).chain(self.should.iter()).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty() && self.phrases.is_empty()
    }
}
