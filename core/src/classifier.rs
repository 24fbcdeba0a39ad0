use crate::config::ClassifierConfig;
use crate::DocType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRule {
    pub label: DocType,
    pub keywords: Vec<String>,
}

impl ClassifierRule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| !k.is_empty() && lowered.contains(k.as_str()))
    }
}

/// Keyword classifier: ordered rules, first match wins, default last.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassifierRule>,
    default_label: DocType,
}

impl Classifier {
    pub fn new(rules: Vec<ClassifierRule>, default_label: DocType) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| ClassifierRule { label: r.label, keywords: r.keywords.iter().map(|k| k.to_lowercase()).collect() })
            .collect();
        Self { rules, default_label }
    }

    pub fn from_config(cfg: &ClassifierConfig) -> Self { Self::new(cfg.rules.clone(), cfg.default_label) }

    pub fn classify(&self, body: &str) -> DocType {
        let lowered = body.to_lowercase();
        self.rules
            .iter()
            .find(|r| r.matches(&lowered))
            .map(|r| r.label)
            .unwrap_or(self.default_label)
    }
}

impl Default for Classifier {
    fn default() -> Self { Self::from_config(&ClassifierConfig::default()) }
}
