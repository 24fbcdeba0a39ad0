use crate::index::InvertedIndex;
use crate::query::ParsedQuery;
use crate::tokenizer::Normalizer;
use crate::{DocId, DocType, Document, Entities, EntityKind};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// tf * (ln((N + 1) / (df + 1)) + 1)
    #[default]
    TfIdf,
    /// Plain term-frequency sum.
    TermFrequency,
}

/// Smoothed inverse document frequency. Never below 1 while `df <= num_docs`.
pub fn idf(num_docs: u32, df: u32) -> f64 {
    ((num_docs as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocTypeFilter {
    #[default]
    All,
    Only(DocType),
}

impl DocTypeFilter {
    pub fn accepts(&self, doc_type: DocType) -> bool {
        match self {
            DocTypeFilter::All => true,
            DocTypeFilter::Only(t) => *t == doc_type,
        }
    }
}

impl FromStr for DocTypeFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(DocTypeFilter::All);
        }
        Ok(DocTypeFilter::Only(s.parse()?))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntityFilter {
    #[default]
    All,
    Only(EntityKind),
}

impl EntityFilter {
    /// A document passes a category filter when it has at least one mention in that category.
    pub fn accepts(&self, entities: &Entities) -> bool {
        match self {
            EntityFilter::All => true,
            EntityFilter::Only(kind) => !entities.get(*kind).is_empty(),
        }
    }
}

impl FromStr for EntityFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(EntityFilter::All);
        }
        Ok(EntityFilter::Only(s.parse()?))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub doc_type: DocTypeFilter,
    pub entity_type: EntityFilter,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker {
    mode: ScoringMode,
}

impl Ranker {
    pub fn new(mode: ScoringMode) -> Self { Self { mode } }

    pub fn mode(&self) -> ScoringMode { self.mode }

    /// Score documents against the must and should terms of `query`, apply the
    /// filters and order by score descending, then id ascending.
    ///
    /// Phrases and must_not terms do not take part in scoring.
    pub fn rank(
        &self,
        query: &ParsedQuery,
        filters: &SearchFilters,
        normalizer: &Normalizer,
        index: &InvertedIndex,
        docs: &HashMap<DocId, Document>,
    ) -> Vec<(DocId, f64)> {
        if !query.has_scored_terms() {
            return Vec::new();
        }

        let mut seen: HashSet<String> = HashSet::new();
        let terms: Vec<String> = query
            .scored_terms()
            .flat_map(|raw| normalizer.normalize(raw))
            .filter(|t| seen.insert(t.clone()))
            .collect();

        let n = index.num_docs();
        let mut scores: HashMap<&str, f64> = HashMap::new();
        for term in &terms {
            let Some(plist) = index.postings(term) else { continue };
            let weight = match self.mode {
                ScoringMode::TfIdf => idf(n, plist.len() as u32),
                ScoringMode::TermFrequency => 1.0,
            };
            for (doc_id, tf) in plist {
                *scores.entry(doc_id.as_str()).or_insert(0.0) += *tf as f64 * weight;
            }
        }

        let mut scored: Vec<(DocId, f64)> = scores
            .into_iter()
            .filter_map(|(doc_id, score)| {
                let doc = docs.get(doc_id)?;
                if !filters.doc_type.accepts(doc.doc_type) || !filters.entity_type.accepts(&doc.entities) {
                    return None;
                }
                let len = index.doc_len(doc_id).unwrap_or(0).max(1);
                Some((doc_id.to_string(), score / len as f64))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        tracing::debug!(terms = terms.len(), hits = scored.len(), "ranked query");
        scored
    }
}
