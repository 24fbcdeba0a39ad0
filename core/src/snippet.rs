use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetOptions {
    /// Window size in characters, excluding ellipsis markers.
    pub max_len: usize,
    pub ellipsis: String,
    /// Wrap term occurrences in `<em>` tags after cutting the window.
    pub highlight: bool,
}

impl Default for SnippetOptions {
    fn default() -> Self {
        Self { max_len: 200, ellipsis: "...".to_string(), highlight: false }
    }
}

fn term_pattern(term: &str) -> Option<Regex> {
    if term.trim().is_empty() { return None; }
    RegexBuilder::new(&regex::escape(term)).case_insensitive(true).build().ok()
}

/// Character offset of the earliest case-insensitive occurrence of any term.
fn first_match(body: &str, terms: &[String]) -> Option<usize> {
    terms
        .iter()
        .filter_map(|t| term_pattern(t))
        .filter_map(|re| re.find(body).map(|m| m.start()))
        .min()
        .map(|byte_idx| body[..byte_idx].chars().count())
}

pub fn snippet(body: &str, terms: &[String], max_len: usize) -> String {
    snippet_with(body, terms, max_len, "...")
}

/// Cut a window of at most `max_len` characters starting `max_len / 2` before
/// the first term match, truncated at the end of the body, marking cut edges
/// with `ellipsis`.
pub fn snippet_with(body: &str, terms: &[String], max_len: usize, ellipsis: &str) -> String {
    if body.is_empty() { return String::new(); }
    let total = body.chars().count();

    let start = first_match(body, terms).map_or(0, |center| center.saturating_sub(max_len / 2));
    let end = (start + max_len).min(total);

    let mut out = String::new();
    if start > 0 { out.push_str(ellipsis); }
    out.extend(body.chars().skip(start).take(end - start));
    if end < total { out.push_str(ellipsis); }
    out
}

/// Wrap every term occurrence in `<em>` tags in one pass; longer terms win
/// where terms overlap.
pub fn highlight_terms(snippet: &str, terms: &[String]) -> String {
    let mut alts: Vec<&str> = terms.iter().map(|t| t.as_str()).filter(|t| !t.trim().is_empty()).collect();
    if alts.is_empty() { return snippet.to_string(); }
    alts.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    alts.dedup();
    let pattern = alts.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.replace_all(snippet, |caps: &Captures| format!("<em>{}</em>", &caps[0])).into_owned(),
        Err(err) => {
            tracing::debug!(error = %err, "highlight pattern rejected");
            snippet.to_string()
        }
    }
}

pub fn render(body: &str, terms: &[String], opts: &SnippetOptions) -> String {
    let s = snippet_with(body, terms, opts.max_len, &opts.ellipsis);
    if opts.highlight { highlight_terms(&s, terms) } else { s }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn empty_body_is_empty() {
        assert_eq!(snippet("", &terms(&["x"]), 10), "");
    }

    #[test]
    fn short_body_is_returned_whole() {
        assert_eq!(snippet("коротко", &terms(&["коротко"]), 200), "коротко");
        assert_eq!(snippet("short", &[], 200), "short");
    }

    #[test]
    fn no_match_takes_prefix() {
        assert_eq!(snippet("abcdefghij", &terms(&["zzz"]), 4), "abcd...");
    }

    #[test]
    fn match_at_start_has_no_leading_ellipsis() {
        let s = snippet("Rust is fast and safe and fun", &terms(&["rust"]), 10);
        assert_eq!(s, "Rust is fa...");
    }

    #[test]
    fn window_centers_on_earliest_match() {
        let body = "0123456789target0123456789";
        let s = snippet(body, &terms(&["zzz", "TARGET"]), 10);
        assert_eq!(s, "...56789targe...");
    }

    #[test]
    fn window_is_truncated_at_end() {
        let body = "aaaaaaaaaaaaaaaaaaaaend";
        let s = snippet(body, &terms(&["end"]), 6);
        assert_eq!(s, "...aaaend");
        let s = snippet("0123456789abcdefghij", &terms(&["ij"]), 10);
        assert_eq!(s, "...defghij");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let body = "ґґґґґґґґґґ Київ ґґґґґґґґґґ";
        let s = snippet(body, &terms(&["київ"]), 4);
        assert_eq!(s, "...ґ Ки...");
    }

    #[test]
    fn length_is_bounded() {
        let body = "lorem ipsum dolor sit amet ".repeat(20);
        for max_len in [1, 7, 30, 100] {
            for t in ["dolor", "amet", "nothing"] {
                let s = snippet(&body, &terms(&[t]), max_len);
                assert!(s.chars().count() <= max_len + 6);
            }
        }
    }

    #[test]
    fn highlight_wraps_matches() {
        let opts = SnippetOptions { highlight: true, ..Default::default() };
        assert_eq!(render("Rust and rust", &terms(&["rust"]), &opts), "<em>Rust</em> and <em>rust</em>");
    }

    #[test]
    fn overlapping_terms_are_wrapped_once() {
        let opts = SnippetOptions { highlight: true, ..Default::default() };
        assert_eq!(
            render("I like rust lang and rust", &terms(&["rust", "rust lang"]), &opts),
            "I like <em>rust lang</em> and <em>rust</em>"
        );
        assert_eq!(render("rust", &terms(&["rust", "em"]), &opts), "<em>rust</em>");
        assert_eq!(render("a.b axb", &terms(&["a.b", " "]), &opts), "<em>a.b</em> axb");
    }
}
