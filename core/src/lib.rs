pub mod capability;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod entities;
pub mod index;
pub mod persist;
pub mod query;
pub mod rank;
pub mod snippet;
pub mod tokenizer;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use engine::{SearchEngine, SearchHit, SearchRequest};
pub use index::InvertedIndex;
pub use query::ParsedQuery;

pub type DocId = String;

/// Coarse document label assigned once at ingest by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    #[default]
    News,
    Opinion,
    Scientific,
}

impl DocType {
    pub const ALL: [DocType; 3] = [DocType::News, DocType::Opinion, DocType::Scientific];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::News => "news",
            DocType::Opinion => "opinion",
            DocType::Scientific => "scientific",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        DocType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown doc_type {s:?}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "PER")]
    Per,
    #[serde(rename = "ORG")]
    Org,
    #[serde(rename = "LOC")]
    Loc,
    #[serde(rename = "DATE")]
    Date,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [EntityKind::Per, EntityKind::Org, EntityKind::Loc, EntityKind::Date];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Per => "PER",
            EntityKind::Org => "ORG",
            EntityKind::Loc => "LOC",
            EntityKind::Date => "DATE",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        EntityKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown entity type {s:?}"))
    }
}

/// Entity mentions per category. All four categories are always present;
/// each list keeps first-seen order and holds no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(rename = "PER", default)]
    pub per: Vec<String>,
    #[serde(rename = "ORG", default)]
    pub org: Vec<String>,
    #[serde(rename = "LOC", default)]
    pub loc: Vec<String>,
    #[serde(rename = "DATE", default)]
    pub date: Vec<String>,
}

impl Entities {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, kind: EntityKind) -> &[String] {
        match kind {
            EntityKind::Per => &self.per,
            EntityKind::Org => &self.org,
            EntityKind::Loc => &self.loc,
            EntityKind::Date => &self.date,
        }
    }

    fn get_mut(&mut self, kind: EntityKind) -> &mut Vec<String> {
        match kind {
            EntityKind::Per => &mut self.per,
            EntityKind::Org => &mut self.org,
            EntityKind::Loc => &mut self.loc,
            EntityKind::Date => &mut self.date,
        }
    }

    /// Append a mention unless it is already recorded. Returns whether it was added.
    pub fn add(&mut self, kind: EntityKind, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() { return false; }
        let list = self.get_mut(kind);
        if list.iter().any(|v| v == value) {
            return false;
        }
        list.push(value.to_string());
        true
    }

    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|k| self.get(*k).is_empty())
    }
}

/// An ingested document. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub doc_type: DocType,
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub entities: Entities,
}

/// Ingest payload. Every field is free text; absent fields default to "".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub date: String,
}

impl NewDocument {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { title: title.into(), body: body.into(), ..Default::default() }
    }

    /// Text the analyzers see: title and body joined by a space.
    pub fn analysis_text(&self) -> String {
        format!("{} {}", self.title, self.body).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_serialize_with_all_four_keys() {
        let json = serde_json::to_value(Entities::new()).unwrap();
        for key in ["PER", "ORG", "LOC", "DATE"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn entities_add_dedupes_in_order() {
        let mut e = Entities::new();
        assert!(e.add(EntityKind::Loc, "Київ"));
        assert!(e.add(EntityKind::Loc, "Львів"));
        assert!(!e.add(EntityKind::Loc, "Київ"));
        assert_eq!(e.loc, vec!["Київ", "Львів"]);
    }

    #[test]
    fn document_tolerates_missing_fields() {
        let doc: Document = serde_json::from_str(r#"{"id":"x","title":"t"}"#).unwrap();
        assert_eq!(doc.doc_type, DocType::News);
        assert!(doc.entities.is_empty());
        assert!(doc.tokens.is_empty());
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("Scientific".parse::<DocType>().unwrap(), DocType::Scientific);
        assert_eq!("per".parse::<EntityKind>().unwrap(), EntityKind::Per);
        assert!("blog".parse::<DocType>().is_err());
    }
}
