use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docsearch_core::config::EngineConfig;
use docsearch_core::persist::{open_store, StoreFormat};
use docsearch_core::rank::{DocTypeFilter, EntityFilter};
use docsearch_core::{NewDocument, SearchEngine, SearchRequest};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Ingest, analyze and search the document collection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Document collection file
    #[arg(long, default_value = "./data/documents.json")]
    data: String,
    /// Store format: json or bincode
    #[arg(long, default_value = "json")]
    store_format: String,
    /// Engine config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl StoreArgs {
    fn open_engine(&self) -> Result<SearchEngine> {
        let config = EngineConfig::load_or_default(self.config.as_deref())?;
        let format: StoreFormat = self.store_format.parse()?;
        Ok(SearchEngine::open(config, open_store(&self.data, format)))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest JSON/JSONL documents from a file or directory
    Import {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Print the analyzed form of a document without storing it
    Analyze {
        /// JSON file with title and body
        #[arg(long)]
        file: PathBuf,
        /// Engine config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run a query against the stored collection
    Search {
        #[arg(long)]
        query: String,
        #[arg(long, default_value = "all")]
        doc_type: String,
        #[arg(long, default_value = "all")]
        entity_type: String,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Print collection statistics
    Stats {
        #[command(flatten)]
        store: StoreArgs,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Import { input, store } => import(&input, &store),
        Commands::Analyze { file, config } => analyze(&file, config.as_deref()),
        Commands::Search { query, doc_type, entity_type, limit, store } => {
            let req = SearchRequest {
                query,
                doc_type: doc_type.parse::<DocTypeFilter>()?,
                entity_type: entity_type.parse::<EntityFilter>()?,
                entity_value: None,
                limit,
            };
            let engine = store.open_engine()?;
            println!("{}", serde_json::to_string_pretty(&engine.search(&req))?);
            Ok(())
        }
        Commands::Stats { store } => {
            let engine = store.open_engine()?;
            println!("{}", serde_json::to_string_pretty(&engine.stats())?);
            Ok(())
        }
    }
}

fn import(input: &str, store: &StoreArgs) -> Result<()> {
    let files = collect_files(Path::new(input));
    let mut docs: Vec<NewDocument> = Vec::new();
    for file in &files {
        let mut batch = read_documents(file)?;
        tracing::info!(file = %file.display(), docs = batch.len(), "read input");
        docs.append(&mut batch);
    }

    let engine = store.open_engine()?;
    let before = engine.len();
    let ingested = engine.ingest_batch(docs)?;
    tracing::info!(files = files.len(), ingested = ingested.len(), total = before + ingested.len(), data = %store.data, "import complete");
    Ok(())
}

fn analyze(file: &Path, config: Option<&Path>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("open {}", file.display()))?;
    let input: NewDocument = serde_json::from_reader(BufReader::new(f))?;
    let config = EngineConfig::load_or_default(config)?;
    let engine = SearchEngine::in_memory(config);
    println!("{}", serde_json::to_string_pretty(&engine.analyze(&input))?);
    Ok(())
}

fn collect_files(input_path: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    }
    files
}

fn read_documents(file: &Path) -> Result<Vec<NewDocument>> {
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        read_jsonl(file)
    } else {
        read_json(file)
    }
}

fn read_jsonl(file: &Path) -> Result<Vec<NewDocument>> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    let mut docs = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: NewDocument = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

fn read_json(file: &Path) -> Result<Vec<NewDocument>> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let docs = match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<NewDocument>, _>>()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => {
            tracing::warn!(file = %file.display(), "skipping input that is neither an object nor an array");
            Vec::new()
        }
    };
    Ok(docs)
}
