use crate::classifier::Classifier;
use crate::config::EngineConfig;
use crate::entities::EntityExtractor;
use crate::index::InvertedIndex;
use crate::persist::{DocumentStore, MemoryStore};
use crate::query::ParsedQuery;
use crate::rank::{DocTypeFilter, EntityFilter, Ranker, ScoringMode, SearchFilters};
use crate::snippet::{self, SnippetOptions};
use crate::tokenizer::Normalizer;
use crate::{DocId, DocType, Document, Entities, NewDocument};
use anyhow::{bail, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub doc_type: DocTypeFilter,
    pub entity_type: EntityFilter,
    /// Accepted and carried, not used for filtering yet.
    pub entity_value: Option<String>,
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Default::default() }
    }

    pub fn filters(&self) -> SearchFilters {
        SearchFilters { doc_type: self.doc_type, entity_type: self.entity_type }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DocId,
    pub title: String,
    pub snippet: String,
    pub doc_type: DocType,
    pub entities: Entities,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub num_docs: usize,
    pub num_terms: usize,
    pub scoring: ScoringMode,
    pub lemmatizer: bool,
    pub entity_recognizer: bool,
}

/// Tokenizer, entity extractor and classifier, run once per ingested document.
pub struct Analyzer {
    normalizer: Normalizer,
    extractor: EntityExtractor,
    classifier: Classifier,
}

impl Analyzer {
    pub fn new(normalizer: Normalizer, extractor: EntityExtractor, classifier: Classifier) -> Self {
        Self { normalizer, extractor, classifier }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(
            Normalizer::from_config(&cfg.analysis),
            EntityExtractor::from_config(&cfg.analysis),
            Classifier::from_config(&cfg.classifier),
        )
    }

    pub fn normalizer(&self) -> &Normalizer { &self.normalizer }

    /// Build a document with a fresh id. Tokens and entities come from title and
    /// body together; the label comes from the body.
    pub fn analyze(&self, input: &NewDocument) -> Document {
        let text = input.analysis_text();
        Document {
            id: Uuid::new_v4().to_string(),
            title: input.title.clone(),
            body: input.body.clone(),
            source: input.source.clone(),
            date: input.date.clone(),
            doc_type: self.classifier.classify(&input.body),
            tokens: self.normalizer.normalize(&text),
            entities: self.extractor.extract(&text),
        }
    }
}

#[derive(Default)]
struct Corpus {
    docs: HashMap<DocId, Document>,
    order: Vec<DocId>,
    index: InvertedIndex,
}

impl Corpus {
    fn insert(&mut self, doc: Document) {
        self.index.insert(&doc);
        if self.docs.insert(doc.id.clone(), doc.clone()).is_none() {
            self.order.push(doc.id);
        }
    }

    fn ordered(&self) -> Vec<Document> {
        self.order.iter().filter_map(|id| self.docs.get(id)).cloned().collect()
    }
}

/// Document index and search over an injected store.
///
/// Readers share the corpus lock for a whole search; ingests are serialized
/// and only hold the write lock to publish a document that is already persisted.
pub struct SearchEngine {
    analyzer: Analyzer,
    ranker: Ranker,
    snippet: SnippetOptions,
    store: Arc<dyn DocumentStore>,
    state: RwLock<Corpus>,
    writer: Mutex<()>,
    // set while the store holds data that could not be read; saving would overwrite it
    load_failed: AtomicBool,
}

impl SearchEngine {
    /// Build the engine and load the store. A store that cannot be read leaves
    /// the engine empty and read-only until `reload` succeeds.
    pub fn open(config: EngineConfig, store: Arc<dyn DocumentStore>) -> Self {
        let engine = Self {
            analyzer: Analyzer::from_config(&config),
            ranker: Ranker::new(config.ranking.scoring),
            snippet: config.snippet,
            store,
            state: RwLock::new(Corpus::default()),
            writer: Mutex::new(()),
            load_failed: AtomicBool::new(false),
        };
        if let Err(err) = engine.reload() {
            tracing::warn!(error = %err, "document store unreadable, starting with an empty index");
        }
        engine
    }

    pub fn in_memory(config: EngineConfig) -> Self { Self::open(config, Arc::new(MemoryStore::new())) }

    /// Replace corpus and index with the store's current contents.
    pub fn reload(&self) -> Result<usize> {
        let _guard = self.writer.lock();
        let loaded = match self.store.load_all() {
            Ok(loaded) => loaded,
            Err(err) => {
                self.load_failed.store(true, Ordering::SeqCst);
                return Err(err);
            }
        };
        let mut corpus = Corpus::default();
        for doc in loaded {
            if doc.id.trim().is_empty() {
                tracing::warn!(title = %doc.title, "skipping stored document without id");
                continue;
            }
            corpus.insert(doc);
        }
        let n = corpus.order.len();
        *self.state.write() = corpus;
        self.load_failed.store(false, Ordering::SeqCst);
        tracing::info!(num_docs = n, "index rebuilt from store");
        Ok(n)
    }

    pub fn analyze(&self, input: &NewDocument) -> Document { self.analyzer.analyze(input) }

    pub fn ingest(&self, input: NewDocument) -> Result<Document> {
        let mut docs = self.ingest_batch(vec![input])?;
        Ok(docs.remove(0))
    }

    /// Analyze, persist the whole collection once, then publish to readers.
    /// If the store rejects the snapshot nothing becomes visible.
    pub fn ingest_batch(&self, inputs: Vec<NewDocument>) -> Result<Vec<Document>> {
        let mut new_docs: Vec<Document> = inputs.iter().map(|input| self.analyzer.analyze(input)).collect();

        let _guard = self.writer.lock();
        if self.load_failed.load(Ordering::SeqCst) {
            bail!("document store could not be loaded; refusing to overwrite it until reload succeeds");
        }
        let mut snapshot = {
            let state = self.state.read();
            for doc in new_docs.iter_mut() {
                while state.docs.contains_key(&doc.id) {
                    doc.id = Uuid::new_v4().to_string();
                }
            }
            state.ordered()
        };
        snapshot.extend(new_docs.iter().cloned());
        self.store.save_all(&snapshot)?;

        let mut state = self.state.write();
        for doc in &new_docs {
            state.insert(doc.clone());
            tracing::info!(id = %doc.id, doc_type = %doc.doc_type, tokens = doc.tokens.len(), "document ingested");
        }
        Ok(new_docs)
    }

    pub fn search(&self, req: &SearchRequest) -> Vec<SearchHit> {
        let parsed = ParsedQuery::parse(&req.query);
        if !parsed.has_scored_terms() {
            return Vec::new();
        }
        if let Some(value) = req.entity_value.as_deref().filter(|v| !v.is_empty()) {
            tracing::debug!(entity_value = value, "entity_value does not narrow results");
        }

        let state = self.state.read();
        let ranked = self.ranker.rank(&parsed, &req.filters(), self.analyzer.normalizer(), &state.index, &state.docs);
        let terms = parsed.highlight_terms();
        let limit = req.limit.unwrap_or(usize::MAX);
        ranked
            .into_iter()
            .take(limit)
            .filter_map(|(id, score)| {
                let doc = state.docs.get(&id)?;
                Some(SearchHit {
                    id,
                    title: doc.title.clone(),
                    snippet: snippet::render(&doc.body, &terms, &self.snippet),
                    doc_type: doc.doc_type,
                    entities: doc.entities.clone(),
                    score,
                })
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Document> { self.state.read().docs.get(id).cloned() }

    /// All documents in ingest order.
    pub fn documents(&self) -> Vec<Document> { self.state.read().ordered() }

    pub fn len(&self) -> usize { self.state.read().order.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Whether the last load from the store failed and ingest is blocked.
    pub fn is_read_only(&self) -> bool { self.load_failed.load(Ordering::SeqCst) }

    pub fn stats(&self) -> EngineStats {
        let state = self.state.read();
        EngineStats {
            num_docs: state.order.len(),
            num_terms: state.index.num_terms(),
            scoring: self.ranker.mode(),
            lemmatizer: self.analyzer.normalizer.has_lemmatizer(),
            entity_recognizer: self.analyzer.extractor.has_recognizer(),
        }
    }
}
