use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dimfilter::filter::{SerializedFilter, SerializedFilterSet};
use dimfilter::index::Accessor;
use dimfilter::types::{Record, Value};
use dimfilter::{ChartAdapter, DimensionalAdapter, Reducer, RemoteMultiAdapter};

fn create_records(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let mut r = Record::new();
            r.insert("dim1".to_string(), Value::from(i as i64));
            r.insert("bucket".to_string(), Value::from((i % 50) as i64));
            r.insert("amount".to_string(), Value::from(1.5 + (i % 7) as f64));
            r
        })
        .collect()
}

fn create_adapter(count: usize) -> RemoteMultiAdapter {
    let adapter = DimensionalAdapter::builder("bench", create_records(count))
        .filter_dimension("dim1", Accessor::field("dim1"))
        .filter_dimension("bucket", Accessor::field("bucket"))
        .chart_on("bucket")
        .reducer(Reducer::Sum(Accessor::field("amount")))
        .build()
        .unwrap();
    RemoteMultiAdapter::new(adapter)
}

fn filter_set(high: i64) -> SerializedFilterSet {
    let mut set = SerializedFilterSet::new();
    set.insert(
        "dim1".to_string(),
        SerializedFilter::new("RangedFilter", vec![0, high]),
    );
    set
}

fn bench_restore_and_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("restore_and_compute");

    for size in [1_000, 10_000, 100_000].iter() {
        let adapter = create_adapter(*size);
        let set = filter_set(*size as i64 / 2);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(adapter.restore_and_compute(&set).unwrap()));
        });
    }

    group.finish();
}

fn bench_compute_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_chart_data");

    for size in [1_000, 10_000, 100_000].iter() {
        let adapter = create_adapter(*size);
        adapter.restore_and_compute(&filter_set(*size as i64 / 2)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(adapter.compute_chart_data()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_restore_and_compute, bench_compute_only);
criterion_main!(benches);
