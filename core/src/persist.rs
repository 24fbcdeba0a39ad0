//! Whole-collection document stores.
//!
//! Stores have snapshot semantics: `save_all` overwrites the full collection,
//! `load_all` returns it. A missing file is an empty collection.

use crate::Document;
use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

pub trait DocumentStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<Document>>;
    fn save_all(&self, docs: &[Document]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreFormat {
    #[default]
    Json,
    Bincode,
}

impl FromStr for StoreFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(StoreFormat::Json),
            "bincode" | "bin" => Ok(StoreFormat::Bincode),
            other => Err(anyhow!("unknown store format {other:?}")),
        }
    }
}

pub fn open_store<P: AsRef<Path>>(path: P, format: StoreFormat) -> Arc<dyn DocumentStore> {
    match format {
        StoreFormat::Json => Arc::new(JsonFileStore::new(path)),
        StoreFormat::Bincode => Arc::new(BincodeFileStore::new(path)),
    }
}

fn read_file(path: &Path) -> Result<Option<Vec<u8>>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(Some(buf))
}

/// Write to a sibling temp file and rename over the target.
fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }
    let tmp = path.with_extension("tmp");
    let mut f = File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    f.write_all(bytes)?;
    f.sync_all()?;
    fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

/// Pretty-printed JSON array of documents.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl DocumentStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<Document>> {
        let Some(buf) = read_file(&self.path)? else { return Ok(Vec::new()) };
        if buf.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }
        let docs = serde_json::from_slice(&buf).with_context(|| format!("parse {}", self.path.display()))?;
        Ok(docs)
    }

    fn save_all(&self, docs: &[Document]) -> Result<()> {
        let json = serde_json::to_string_pretty(docs)?;
        write_file(&self.path, json.as_bytes())
    }
}

/// Binary snapshot of the document collection.
pub struct BincodeFileStore {
    path: PathBuf,
}

impl BincodeFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl DocumentStore for BincodeFileStore {
    fn load_all(&self) -> Result<Vec<Document>> {
        let Some(buf) = read_file(&self.path)? else { return Ok(Vec::new()) };
        let docs = bincode::deserialize(&buf).with_context(|| format!("decode {}", self.path.display()))?;
        Ok(docs)
    }

    fn save_all(&self, docs: &[Document]) -> Result<()> {
        let bytes = bincode::serialize(docs)?;
        write_file(&self.path, &bytes)
    }
}

/// In-process store, for tests and ephemeral engines.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_documents(docs: Vec<Document>) -> Self { Self { docs: Mutex::new(docs) } }

    pub fn snapshot(&self) -> Vec<Document> { self.docs.lock().clone() }
}

impl DocumentStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Document>> { Ok(self.docs.lock().clone()) }

    fn save_all(&self, docs: &[Document]) -> Result<()> {
        *self.docs.lock() = docs.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocType, Entities, EntityKind};
    use tempfile::tempdir;

    fn sample() -> Document {
        let mut entities = Entities::new();
        entities.add(EntityKind::Date, "2024-07-01");
        Document {
            id: "doc1".into(),
            title: "Університет оголосив набір".into(),
            body: "1 липня 2024 року".into(),
            source: "site.ua".into(),
            date: "2024-07-01".into(),
            doc_type: DocType::News,
            tokens: vec!["університет".into(), "оголосив".into(), "набір".into()],
            entities,
        }
    }

    #[test]
    fn json_store_persists_collection() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data/documents.json"));
        assert!(store.load_all().unwrap().is_empty());
        store.save_all(&[sample()]).unwrap();
        assert_eq!(store.load_all().unwrap(), vec![sample()]);
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"PER\""));
    }

    #[test]
    fn bincode_store_persists_collection() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path().join("docs.bin"), StoreFormat::Bincode);
        store.save_all(&[sample(), sample()]).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("documents.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(JsonFileStore::new(&path).load_all().is_err());
    }

    #[test]
    fn blank_json_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("documents.json");
        fs::write(&path, "\n").unwrap();
        assert!(JsonFileStore::new(&path).load_all().unwrap().is_empty());
    }

    #[test]
    fn store_format_parses() {
        assert_eq!("JSON".parse::<StoreFormat>().unwrap(), StoreFormat::Json);
        assert_eq!("bincode".parse::<StoreFormat>().unwrap(), StoreFormat::Bincode);
        assert!("sled".parse::<StoreFormat>().is_err());
    }
}
