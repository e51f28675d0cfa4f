//! Performance benchmarks for quotebook-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quotebook_engine::{
    pick_quote_with_rng, reconcile, CategoryFilter, CategoryIndex, ImportBatch, KeyValueStorage,
    MemoryStorage, QuoteRecord, Store, QUOTES_KEY,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

fn records(count: usize, prefix: &str) -> Vec<QuoteRecord> {
    (0..count)
        .map(|i| {
            QuoteRecord::new(format!("{} quote {}", prefix, i), format!("Category {}", i % 10))
                .unwrap()
        })
        .collect()
}

fn bench_store_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_operations");

    group.bench_function("load_1000", |b| {
        let mut storage = MemoryStorage::new();
        storage
            .set(QUOTES_KEY, serde_json::to_string(&records(1000, "Local")).unwrap())
            .unwrap();

        b.iter(|| Store::load(black_box(storage.clone())))
    });

    group.bench_function("add", |b| {
        let mut store = Store::load(MemoryStorage::new());
        let mut id = 0u64;

        b.iter(|| {
            id += 1;
            store
                .add(black_box(&format!("Quote {}", id)), black_box("Bench"))
                .map(|r| r.id)
        })
    });

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for size in [10, 100, 1000] {
        let local = records(size, "Local");
        // Half the remote batch collides with local texts
        let mut remote = records(size / 2, "Local");
        for record in &mut remote {
            record.category = "Server".to_string();
        }
        remote.extend(records(size / 2, "Remote"));

        group.bench_with_input(BenchmarkId::new("server_wins", size), &size, |b, _| {
            b.iter(|| reconcile(black_box(&local), black_box(&remote)))
        });

        let merged = reconcile(&local, &remote).merged;
        group.bench_with_input(BenchmarkId::new("already_merged", size), &size, |b, _| {
            b.iter(|| reconcile(black_box(&merged), black_box(&remote)))
        });
    }

    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import");

    for size in [100, 1000] {
        let payload = json!(records(size, "Imported"));
        let existing = records(size, "Local");

        group.bench_with_input(BenchmarkId::new("validate_merge", size), &size, |b, _| {
            b.iter(|| {
                ImportBatch::from_value(black_box(&payload))
                    .map(|batch| batch.merge_into(black_box(&existing)))
            })
        });
    }

    group.finish();
}

fn bench_categories(c: &mut Criterion) {
    let mut group = c.benchmark_group("categories");
    let records = records(1000, "Local");

    group.bench_function("refresh_1000", |b| {
        let mut index = CategoryIndex::default();
        b.iter(|| index.refresh(black_box(&records)))
    });

    group.bench_function("pick_filtered_1000", |b| {
        let filter = CategoryFilter::parse("Category 3");
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| pick_quote_with_rng(&mut rng, black_box(&records), &filter).is_some())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_store_operations,
    bench_reconcile,
    bench_import,
    bench_categories,
);
criterion_main!(benches);
