//! Criterion microbenches for vgenome record parsing and normalization.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - per-image graph parsing (from_graph_str, from_graph_slice)
//! - normalization of a synthetic graph with duplicates and dangling edges
//! - sense resolution against a dictionary

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use vgenome::model::{BBox, Image, Sense, SenseRef};
use vgenome::normalize::{normalize, NormalizeOptions};
use vgenome::record::graph::{from_graph_slice, from_graph_str};
use vgenome::record::{ObjectRecord, RecordSet, RelationshipRecord};
use vgenome::synset::{resolve_graph, SenseDictionary, UnresolvedSensePolicy};

// Include test fixtures at compile time (no file I/O during benchmark)
const GRAPH_FIXTURE: &str = include_str!("../tests/fixtures/dataset/by-id/1.json");

const SENSES: [&str; 4] = ["man.n.01", "tree.n.01", "on.r.01", "near.r.01"];

/// 500 objects (every tenth one repeated) and 2000 edges, a few of them dangling.
fn synthetic_records() -> RecordSet {
    let objects = (0..550u64)
        .map(|i| {
            let id = if i >= 500 { (i - 500) * 10 } else { i };
            ObjectRecord::new(id, BBox::new(i as i64, i as i64, 10, 10), vec![format!("obj{id}")])
                .with_senses(vec![SenseRef::unresolved(SENSES[(i % 2) as usize])])
        })
        .collect();
    let relationships = (0..2000u64)
        .map(|i| {
            let object = if i % 97 == 0 { 10_000 + i } else { (i * 7) % 500 };
            RelationshipRecord::new(i, i % 500, "near", object)
                .with_senses(vec![SenseRef::unresolved(SENSES[2 + (i % 2) as usize])])
        })
        .collect();
    RecordSet {
        objects,
        relationships,
        attributes: Vec::new(),
    }
}

fn image() -> Arc<Image> {
    Arc::new(Image::new(1u64, "1.jpg", 1024, 768))
}

/// Benchmark graph parsing from string.
fn bench_graph_parse_str(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_parse");
    group.throughput(Throughput::Bytes(GRAPH_FIXTURE.len() as u64));

    group.bench_function("from_graph_str", |b| {
        b.iter(|| {
            let records = from_graph_str(black_box(GRAPH_FIXTURE)).unwrap();
            black_box(records)
        })
    });

    group.finish();
}

/// Benchmark graph parsing from byte slice.
fn bench_graph_parse_slice(c: &mut Criterion) {
    let bytes = GRAPH_FIXTURE.as_bytes();
    let mut group = c.benchmark_group("graph_parse");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("from_graph_slice", |b| {
        b.iter(|| {
            let records = from_graph_slice(black_box(bytes)).unwrap();
            black_box(records)
        })
    });

    group.finish();
}

/// Benchmark normalization of a large synthetic record set.
fn bench_normalize(c: &mut Criterion) {
    let records = synthetic_records();
    let image = image();
    let opts = NormalizeOptions::default();

    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Elements(
        (records.objects.len() + records.relationships.len()) as u64,
    ));

    group.bench_function("normalize_synthetic", |b| {
        b.iter(|| {
            let out = normalize(Arc::clone(&image), black_box(records.clone()), &opts);
            black_box(out)
        })
    });

    group.finish();
}

/// Benchmark sense resolution; the graph is built once outside the timed region.
fn bench_resolve(c: &mut Criterion) {
    let graph = normalize(image(), synthetic_records(), &NormalizeOptions::default()).graph;
    let dict: SenseDictionary = SENSES
        .iter()
        .map(|name| Sense::new(*name, "benchmark sense"))
        .collect();

    let mut group = c.benchmark_group("resolve");
    group.bench_function("resolve_graph", |b| {
        b.iter(|| {
            let mut fresh = graph.clone();
            let report = resolve_graph(&mut fresh, &dict, UnresolvedSensePolicy::Fatal).unwrap();
            black_box((fresh, report))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_graph_parse_str,
    bench_graph_parse_slice,
    bench_normalize,
    bench_resolve,
);
criterion_main!(benches);
