use crate::capability::{lemmatizer_probes, resolve, Capability, Lemmatizer};
use crate::config::AnalysisConfig;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}\-'’]+").expect("valid regex");
    static ref UK_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "і","в","на","з","до","та","що","не","я","у","за",
            "це","цею","цей","він","вона","вони","ми","ви","їх","її","року","років"
        ];
        words.iter().copied().collect()
    };
    static ref EN_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Built-in stopword list by name ("uk" or "en").
pub fn stopword_list(name: &str) -> Option<&'static HashSet<&'static str>> {
    match name.trim().to_lowercase().as_str() {
        "uk" | "ukrainian" => Some(&*UK_STOPWORDS),
        "en" | "english" => Some(&*EN_STOPWORDS),
        _ => None,
    }
}

/// Turns raw text into the ordered token sequence stored on documents and
/// matched against the index.
pub struct Normalizer {
    stopwords: HashSet<String>,
    lemmatizer: Capability<dyn Lemmatizer>,
}

impl Normalizer {
    pub fn new(stopwords: HashSet<String>, lemmatizer: Capability<dyn Lemmatizer>) -> Self {
        Self { stopwords, lemmatizer }
    }

    pub fn from_config(cfg: &AnalysisConfig) -> Self {
        let mut stopwords: HashSet<String> = HashSet::new();
        for name in &cfg.stopwords {
            match stopword_list(name) {
                Some(list) => stopwords.extend(list.iter().map(|w| w.to_string())),
                None => tracing::warn!(list = %name, "unknown stopword list ignored"),
            }
        }
        stopwords.extend(cfg.extra_stopwords.iter().map(|w| w.to_lowercase()));
        let lemmatizer = resolve("lemmatizer", lemmatizer_probes(&cfg.lemmatizer_languages));
        Self::new(stopwords, lemmatizer)
    }

    pub fn has_lemmatizer(&self) -> bool { self.lemmatizer.is_present() }

    fn is_stopword(&self, token: &str) -> bool { self.stopwords.contains(token) }

    /// NFKC-normalize, split on word characters, lowercase, lemmatize when a
    /// lemmatizer is available, and drop stopwords.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        if text.is_empty() { return Vec::new(); }
        let normalized = text.nfkc().collect::<String>();
        let mut tokens = Vec::new();
        for mat in RE.find_iter(&normalized) {
            let raw = mat.as_str();
            if !raw.chars().any(|c| c.is_alphanumeric()) { continue; }
            // U+2019 and ASCII apostrophe spell the same word
            let lower = raw.replace('\u{2019}', "'").to_lowercase();
            if self.is_stopword(&lower) { continue; }
            let token = match self.lemmatizer.get() {
                Some(lemmatizer) => {
                    let lemma = lemmatizer.lemma(&lower);
                    if lemma.is_empty() || self.is_stopword(&lemma) { continue; }
                    lemma
                }
                None => lower,
            };
            tokens.push(token);
        }
        tokens
    }
}

impl Default for Normalizer {
    fn default() -> Self { Self::from_config(&AnalysisConfig::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::SnowballLemmatizer;
    use std::sync::Arc;

    #[test]
    fn splits_lowercases_and_drops_stopwords() {
        let n = Normalizer::default();
        let t = n.normalize("Київ і Львів, та Харків!");
        assert_eq!(t, vec!["київ", "львів", "харків"]);
    }

    #[test]
    fn keeps_hyphens_apostrophes_and_digits() {
        let n = Normalizer::default();
        let t = n.normalize("Ранок п'ятниці: COVID-19 у 2024");
        assert_eq!(t, vec!["ранок", "п'ятниці", "covid-19", "2024"]);
    }

    #[test]
    fn typographic_apostrophe_matches_ascii() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("п’ятниці"), n.normalize("п'ятниці"));
        assert_eq!(n.normalize("П’ятниці"), vec!["п'ятниці"]);
    }

    #[test]
    fn bare_punctuation_is_not_a_token() {
        let n = Normalizer::default();
        assert!(n.normalize(" - ' -- ").is_empty());
        assert!(n.normalize("").is_empty());
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("rust Rust RUST"), vec!["rust", "rust", "rust"]);
    }

    #[test]
    fn lemmatizer_replaces_lowercase_form() {
        let lemmatizer: Arc<dyn Lemmatizer> = Arc::new(SnowballLemmatizer::for_language("en").unwrap());
        let stop: HashSet<String> = EN_STOPWORDS.iter().map(|w| w.to_string()).collect();
        let n = Normalizer::new(stop, Capability::Present(lemmatizer));
        assert_eq!(n.normalize("The runners were running"), vec!["runner", "run"]);
    }

    #[test]
    fn extra_stopwords_merge_with_named_lists() {
        let cfg = AnalysisConfig {
            stopwords: vec!["uk".into(), "en".into(), "klingon".into()],
            extra_stopwords: vec!["Deal".into()],
            ..Default::default()
        };
        let n = Normalizer::from_config(&cfg);
        assert_eq!(n.normalize("Ukraine signs the deal"), vec!["ukraine", "signs"]);
    }
}
