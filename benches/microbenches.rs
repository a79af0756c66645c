//! Criterion microbenches for birka's per-mutation work.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - Consensus computation over a batch (compute_consensus)
//! - Batch validation (validate_collection)
//! - Appending to an observed collection (RecordCollection::push)
//! - Record JSON parsing (from_json_str)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use birka::collection::RecordCollection;
use birka::consensus::compute_consensus;
use birka::record::{from_json_str, to_json_string, ImageRecord};
use birka::validation::validate_collection;

const BATCH_SIZE: usize = 200;

/// A batch where roughly one record in seven disagrees on some field.
fn sample_batch() -> Vec<ImageRecord> {
    (0..BATCH_SIZE)
        .map(|i| {
            let mut record = ImageRecord::new(format!("plate{}/well{:03}.tif", i % 4, i), 1024, 1024)
                .with_channels(2)
                .with_channel_names(["DAPI", "GFP"])
                .with_pixel_size_x(0.325)
                .with_pixel_size_y(0.325);
            if i % 7 == 0 {
                record = record.with_dtype("uint8");
            }
            if i % 11 == 0 {
                record = record.with_depth(12).with_pixel_size_z(1.5);
            }
            record
        })
        .collect()
}

fn bench_compute_consensus(c: &mut Criterion) {
    let batch = sample_batch();
    let mut group = c.benchmark_group("consensus");
    group.throughput(Throughput::Elements(batch.len() as u64));

    group.bench_function("compute_consensus", |b| {
        b.iter(|| black_box(compute_consensus(black_box(&batch))))
    });

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let batch = sample_batch();
    let consensus = compute_consensus(&batch);
    let mut group = c.benchmark_group("validation");
    group.throughput(Throughput::Elements(batch.len() as u64));

    group.bench_function("validate_collection", |b| {
        b.iter(|| black_box(validate_collection(black_box(&batch), &consensus, None)))
    });

    group.finish();
}

/// Each push recomputes the consensus, so building a batch is quadratic.
fn bench_collection_push(c: &mut Criterion) {
    let batch = sample_batch();
    let mut group = c.benchmark_group("collection");
    group.throughput(Throughput::Elements(batch.len() as u64));

    group.bench_function("push_batch", |b| {
        b.iter(|| {
            let mut images = RecordCollection::new();
            images.subscribe(|event| {
                black_box(event);
            });
            for record in batch.iter().cloned() {
                images.push(record);
            }
            black_box(images)
        })
    });

    group.finish();
}

fn bench_records_json_parse(c: &mut Criterion) {
    let json = to_json_string(&sample_batch()).unwrap();
    let mut group = c.benchmark_group("records_json");
    group.throughput(Throughput::Bytes(json.len() as u64));

    group.bench_function("from_json_str", |b| {
        b.iter(|| black_box(from_json_str(black_box(&json)).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_compute_consensus,
    bench_validate,
    bench_collection_push,
    bench_records_json_parse
);
criterion_main!(benches);
