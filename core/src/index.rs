use crate::{DocId, Document};
use std::collections::HashMap;

/// token -> doc id -> term frequency.
///
/// A document is listed under a token iff the token occurs in its token
/// sequence, and the frequency is the exact occurrence count.
#[derive(Debug, Default, Clone)]
pub struct InvertedIndex {
    postings: HashMap<String, HashMap<DocId, u32>>,
    /// Token count per indexed document, used for length normalization.
    doc_lengths: HashMap<DocId, u32>,
    /// Distinct tokens per document, so a re-insert can retract the old entry.
    doc_terms: HashMap<DocId, Vec<String>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, doc: &Document) { self.insert_tokens(&doc.id, &doc.tokens) }

    /// Index a token sequence under `doc_id`, replacing any earlier entry for the same id.
    pub fn insert_tokens(&mut self, doc_id: &str, tokens: &[String]) {
        self.remove(doc_id);

        let mut tf_counts: HashMap<&str, u32> = HashMap::new();
        for token in tokens {
            *tf_counts.entry(token.as_str()).or_insert(0) += 1;
        }
        let mut terms = Vec::with_capacity(tf_counts.len());
        for (term, tf) in tf_counts {
            self.postings.entry(term.to_string()).or_default().insert(doc_id.to_string(), tf);
            terms.push(term.to_string());
        }
        self.doc_terms.insert(doc_id.to_string(), terms);
        self.doc_lengths.insert(doc_id.to_string(), tokens.len() as u32);
    }

    /// Retract a document's contribution. Returns false if it was not indexed.
    pub fn remove(&mut self, doc_id: &str) -> bool {
        let Some(terms) = self.doc_terms.remove(doc_id) else { return false };
        for term in terms {
            if let Some(plist) = self.postings.get_mut(&term) {
                plist.remove(doc_id);
                if plist.is_empty() {
                    self.postings.remove(&term);
                }
            }
        }
        self.doc_lengths.remove(doc_id);
        true
    }

    /// Clear and reindex every document.
    pub fn rebuild<'a, I>(&mut self, docs: I)
    where
        I: IntoIterator<Item = &'a Document>,
    {
        self.postings.clear();
        self.doc_lengths.clear();
        self.doc_terms.clear();
        for doc in docs {
            self.insert(doc);
        }
    }

    pub fn postings(&self, term: &str) -> Option<&HashMap<DocId, u32>> { self.postings.get(term) }

    pub fn tf(&self, term: &str, doc_id: &str) -> u32 {
        self.postings.get(term).and_then(|p| p.get(doc_id)).copied().unwrap_or(0)
    }

    pub fn df(&self, term: &str) -> u32 { self.postings.get(term).map(|p| p.len() as u32).unwrap_or(0) }

    pub fn doc_len(&self, doc_id: &str) -> Option<u32> { self.doc_lengths.get(doc_id).copied() }

    pub fn num_docs(&self) -> u32 { self.doc_lengths.len() as u32 }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn contains(&self, doc_id: &str) -> bool { self.doc_lengths.contains_key(doc_id) }
}
