use criterion::{criterion_group, criterion_main, Criterion};
use docsearch_core::config::EngineConfig;
use docsearch_core::tokenizer::Normalizer;
use docsearch_core::{NewDocument, SearchEngine, SearchRequest};

const TEXT: &str = "1 липня 2024 року Київський університет оголосив набір студентів. \
Контактна особа: Іван Петренко. Дослідження показало, що бюджет науки зростає, \
а Національний банк підтримав програму. Ukraine signs deal 2024-05-01 with Kyiv Telecom.";

fn bench_normalize(c: &mut Criterion) {
    let n = Normalizer::default();
    c.bench_function("normalize_paragraph", |b| b.iter(|| n.normalize(TEXT)));
}

fn bench_search(c: &mut Criterion) {
    let engine = SearchEngine::in_memory(EngineConfig::default());
    let docs = (0..500).map(|i| NewDocument::new(format!("Документ {i}"), TEXT.repeat(1 + i % 4))).collect();
    engine.ingest_batch(docs).expect("ingest");
    let req = SearchRequest::new("бюджет OR університет NOT банк");
    c.bench_function("search_500_docs", |b| b.iter(|| engine.search(&req)));
}

criterion_group!(benches, bench_normalize, bench_search);
criterion_main!(benches);
