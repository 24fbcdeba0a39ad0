use crate::classifier::ClassifierRule;
use crate::rank::ScoringMode;
use crate::snippet::SnippetOptions;
use crate::DocType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Engine configuration. Every field has a default, so a config file only
/// needs to name what it overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub analysis: AnalysisConfig,
    pub classifier: ClassifierConfig,
    pub ranking: RankingConfig,
    pub snippet: SnippetOptions,
}

impl EngineConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut f = File::open(path).with_context(|| format!("open config {}", path.display()))?;
        let mut buf = String::new();
        f.read_to_string(&mut buf)?;
        let cfg: EngineConfig = serde_json::from_str(&buf).with_context(|| format!("parse config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Named stopword lists to merge: "uk", "en".
    pub stopwords: Vec<String>,
    pub extra_stopwords: Vec<String>,
    /// Lower-case substrings that mark a capitalized span as an organization.
    pub org_markers: Vec<String>,
    /// Snowball languages probed in order for a lemmatizer; empty keeps the plain lowercase path.
    pub lemmatizer_languages: Vec<String>,
    /// JSON gazetteer backing the entity recognizer; absent keeps the heuristic path.
    pub entity_gazetteer: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stopwords: vec!["uk".to_string()],
            extra_stopwords: Vec::new(),
            org_markers: [
                "університет", "інститут", "компан", "завод", "фірм", "холдинг", "банк", "телеком",
                "university", "institute", "company", "factory", "firm", "holding", "bank", "telecom",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            lemmatizer_languages: Vec::new(),
            entity_gazetteer: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Evaluated in order; the first rule with a matching keyword wins.
    pub rules: Vec<ClassifierRule>,
    pub default_label: DocType,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let rule = |label, words: &[&str]| ClassifierRule {
            label,
            keywords: words.iter().map(|s| s.to_string()).collect(),
        };
        Self {
            rules: vec![
                rule(
                    DocType::Scientific,
                    &["дослідження", "метод", "експеримент", "аналіз", "research", "experiment", "analysis"],
                ),
                rule(
                    DocType::Opinion,
                    &["думка", "автор вважає", "на мою думку", "колонка", "opinion", "column", "in my view"],
                ),
            ],
            default_label: DocType::News,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub scoring: ScoringMode,
}
