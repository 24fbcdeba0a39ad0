//! Optional analysis capabilities.
//!
//! A lemmatizer or entity recognizer is never required: the tokenizer and the
//! entity extractor have a complete fallback path. When one is configured, an
//! ordered list of probes is tried once at construction and the first one that
//! loads is kept for the lifetime of the engine.

use anyhow::{anyhow, Context, Result};
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Replaces the lower-cased form of a token with its base form.
pub trait Lemmatizer: Send + Sync {
    fn name(&self) -> &str;
    fn lemma(&self, word: &str) -> String;
}

/// A labeled mention found by a recognizer. Labels are recognizer-native
/// (PERSON, ORG, GPE, ...) and get mapped onto entity categories by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub label: String,
    pub text: String,
}

pub trait EntityRecognizer: Send + Sync {
    fn name(&self) -> &str;
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

/// Resolved state of an optional capability.
pub enum Capability<T: ?Sized> {
    Present(Arc<T>),
    Absent,
}

impl<T: ?Sized> Capability<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Capability::Present(inner) => Some(inner.as_ref()),
            Capability::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool { matches!(self, Capability::Present(_)) }
}

impl<T: ?Sized> Clone for Capability<T> {
    fn clone(&self) -> Self {
        match self {
            Capability::Present(inner) => Capability::Present(Arc::clone(inner)),
            Capability::Absent => Capability::Absent,
        }
    }
}

impl<T: ?Sized> Default for Capability<T> {
    fn default() -> Self { Capability::Absent }
}

pub struct Probe<T: ?Sized> {
    name: String,
    load: Box<dyn FnOnce() -> Result<Arc<T>>>,
}

impl<T: ?Sized> Probe<T> {
    pub fn new(name: impl Into<String>, load: impl FnOnce() -> Result<Arc<T>> + 'static) -> Self {
        Self { name: name.into(), load: Box::new(load) }
    }
}

/// Try each probe in order and keep the first that loads.
pub fn resolve<T: ?Sized>(kind: &str, probes: Vec<Probe<T>>) -> Capability<T> {
    for probe in probes {
        match (probe.load)() {
            Ok(found) => {
                tracing::info!(kind, probe = %probe.name, "capability resolved");
                return Capability::Present(found);
            }
            Err(err) => tracing::debug!(kind, probe = %probe.name, error = %err, "capability probe failed"),
        }
    }
    tracing::info!(kind, "no capability available, using fallback");
    Capability::Absent
}

/// Snowball stemmer used as a lemmatizer.
pub struct SnowballLemmatizer {
    language: String,
    stemmer: Stemmer,
}

impl SnowballLemmatizer {
    pub fn for_language(code: &str) -> Result<Self> {
        let algorithm = match code.trim().to_lowercase().as_str() {
            "ar" | "arabic" => Algorithm::Arabic,
            "da" | "danish" => Algorithm::Danish,
            "nl" | "dutch" => Algorithm::Dutch,
            "en" | "english" => Algorithm::English,
            "fi" | "finnish" => Algorithm::Finnish,
            "fr" | "french" => Algorithm::French,
            "de" | "german" => Algorithm::German,
            "el" | "greek" => Algorithm::Greek,
            "hu" | "hungarian" => Algorithm::Hungarian,
            "it" | "italian" => Algorithm::Italian,
            "no" | "norwegian" => Algorithm::Norwegian,
            "pt" | "portuguese" => Algorithm::Portuguese,
            "ro" | "romanian" => Algorithm::Romanian,
            "ru" | "russian" => Algorithm::Russian,
            "es" | "spanish" => Algorithm::Spanish,
            "sv" | "swedish" => Algorithm::Swedish,
            "ta" | "tamil" => Algorithm::Tamil,
            "tr" | "turkish" => Algorithm::Turkish,
            other => return Err(anyhow!("no snowball stemmer for language {other:?}")),
        };
        Ok(Self { language: code.to_string(), stemmer: Stemmer::create(algorithm) })
    }
}

impl Lemmatizer for SnowballLemmatizer {
    fn name(&self) -> &str { &self.language }

    fn lemma(&self, word: &str) -> String { self.stemmer.stem(word).to_string() }
}

pub fn lemmatizer_probes(languages: &[String]) -> Vec<Probe<dyn Lemmatizer>> {
    languages
        .iter()
        .map(|lang| {
            let code = lang.clone();
            Probe::new(format!("snowball:{lang}"), move || {
                let lemmatizer: Arc<dyn Lemmatizer> = Arc::new(SnowballLemmatizer::for_language(&code)?);
                Ok(lemmatizer)
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazetteerEntry {
    pub text: String,
    pub label: String,
}

/// Dictionary recognizer: reports every known entry that occurs verbatim in the text.
pub struct GazetteerRecognizer {
    name: String,
    entries: Vec<GazetteerEntry>,
}

impl GazetteerRecognizer {
    pub fn new(name: impl Into<String>, entries: Vec<GazetteerEntry>) -> Self {
        let entries = entries.into_iter().filter(|e| !e.text.trim().is_empty()).collect();
        Self { name: name.into(), entries }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open gazetteer {}", path.display()))?;
        let entries: Vec<GazetteerEntry> = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse gazetteer {}", path.display()))?;
        if entries.is_empty() {
            return Err(anyhow!("gazetteer {} has no entries", path.display()));
        }
        Ok(Self::new(path.display().to_string(), entries))
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn name(&self) -> &str { &self.name }

    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let mut hits: Vec<(usize, &GazetteerEntry)> = self
            .entries
            .iter()
            .filter_map(|e| text.find(e.text.as_str()).map(|pos| (pos, e)))
            .collect();
        // stable: entries found at the same offset keep gazetteer order
        hits.sort_by_key(|(pos, _)| *pos);
        Ok(hits
            .into_iter()
            .map(|(_, e)| EntitySpan { label: e.label.clone(), text: e.text.clone() })
            .collect())
    }
}

pub fn recognizer_probes(gazetteer: Option<&Path>) -> Vec<Probe<dyn EntityRecognizer>> {
    let mut probes = Vec::new();
    if let Some(path) = gazetteer {
        let path: PathBuf = path.to_path_buf();
        probes.push(Probe::new(format!("gazetteer:{}", path.display()), move || {
            let recognizer: Arc<dyn EntityRecognizer> = Arc::new(GazetteerRecognizer::from_path(&path)?);
            Ok(recognizer)
        }));
    }
    probes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn first_loading_probe_wins() {
        let probes = lemmatizer_probes(&["uk".to_string(), "ru".to_string(), "en".to_string()]);
        let cap = resolve("lemmatizer", probes);
        assert_eq!(cap.get().map(|l| l.name()), Some("ru"));
    }

    #[test]
    fn no_probes_resolves_absent() {
        let cap: Capability<dyn Lemmatizer> = resolve("lemmatizer", Vec::new());
        assert!(!cap.is_present());
    }

    #[test]
    fn probes_after_success_are_not_run() {
        let calls = Rc::new(Cell::new(0));
        let c1 = Rc::clone(&calls);
        let c2 = Rc::clone(&calls);
        let probes: Vec<Probe<dyn Lemmatizer>> = vec![
            Probe::new("a", move || {
                c1.set(c1.get() + 1);
                let l: Arc<dyn Lemmatizer> = Arc::new(SnowballLemmatizer::for_language("en")?);
                Ok(l)
            }),
            Probe::new("b", move || {
                c2.set(c2.get() + 1);
                Err(anyhow!("should not run"))
            }),
        ];
        assert!(resolve("lemmatizer", probes).is_present());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn snowball_stems_english() {
        let l = SnowballLemmatizer::for_language("en").unwrap();
        assert_eq!(l.lemma("running"), "run");
    }

    #[test]
    fn gazetteer_reports_in_text_order() {
        let g = GazetteerRecognizer::new(
            "test",
            vec![
                GazetteerEntry { text: "Київ".into(), label: "GPE".into() },
                GazetteerEntry { text: "Іван Петренко".into(), label: "PERSON".into() },
                GazetteerEntry { text: "Марс".into(), label: "LOC".into() },
            ],
        );
        let spans = g.recognize("Іван Петренко приїхав у Київ").unwrap();
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Іван Петренко", "Київ"]);
    }

    #[test]
    fn missing_gazetteer_probe_fails_quietly() {
        let probes = recognizer_probes(Some(Path::new("/no/such/gazetteer.json")));
        assert!(!resolve("recognizer", probes).is_present());
    }
}
