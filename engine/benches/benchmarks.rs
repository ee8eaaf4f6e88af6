//! Performance benchmarks for stash-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use stash_engine::{merge, Envelope, Record, RecordCollection, RecordId, SearchHistory};
use std::collections::BTreeSet;

fn make_records(prefix: &str, range: std::ops::Range<usize>) -> RecordCollection {
    range
        .map(|i| {
            Record::new(
                format!("card_{}", i),
                json!({"name": format!("{} {}", prefix, i), "email": format!("c{}@test.com", i)}),
            )
        })
        .collect()
}

fn bench_record_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_collection");

    group.bench_function("insert_1000", |b| {
        b.iter(|| {
            let mut records = RecordCollection::new();
            for i in 0..1000 {
                let _ = records.insert(Record::new(format!("card_{}", i), json!({"n": i})));
            }
            records
        })
    });

    group.bench_function("get", |b| {
        let records = make_records("Card", 0..1000);
        b.iter(|| records.get(black_box("card_500")))
    });

    group.bench_function("remove_middle", |b| {
        let records = make_records("Card", 0..1000);
        b.iter(|| {
            let mut records = records.clone();
            records.remove(black_box("card_500"))
        })
    });

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("half_overlap", size), size, |b, &size| {
            // Remote covers the second half of local plus as many new ids
            let local = make_records("Local", 0..size);
            let remote = make_records("Remote", size / 2..size + size / 2);
            let tombstones: BTreeSet<RecordId> =
                (0..size / 10).map(|i| format!("card_{}", i * 7)).collect();

            b.iter(|| merge(black_box(&local), black_box(&remote), black_box(&tombstones)))
        });
    }

    group.finish();
}

fn bench_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");

    for size in [100, 1000].iter() {
        let records = make_records("Card", 0..*size);

        group.bench_with_input(BenchmarkId::new("encode", size), &records, |b, records| {
            b.iter(|| Envelope::new(black_box(records)).to_bytes())
        });

        let bytes = Envelope::new(&records).to_bytes().unwrap();
        group.bench_with_input(BenchmarkId::new("decode", size), &bytes, |b, bytes| {
            b.iter(|| Envelope::<RecordCollection>::from_bytes(black_box(bytes)))
        });
    }

    group.finish();
}

fn bench_search_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_history");

    group.bench_function("record_query", |b| {
        let mut history = SearchHistory::default();
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            history.record(black_box(&format!("query {}", i % 15)))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_record_collection,
    bench_merge,
    bench_persistence,
    bench_search_history,
);
criterion_main!(benches);
