use criterion::{Criterion, black_box, criterion_group, criterion_main};

use polistore::adapter::SqliteAdapter;
use polistore::filter::{Filter, LoadFilter};
use polistore::model::MemoryModel;
use polistore::rule;

fn seeded_adapter(rows: usize) -> SqliteAdapter {
    let adapter = SqliteAdapter::open_in_memory("policy_rule").unwrap();
    let rules: Vec<Vec<String>> = (0..rows)
        .map(|i| {
            vec![
                format!("user{}", i % 64),
                format!("data{i}"),
                "read".to_string(),
            ]
        })
        .collect();
    adapter.add_policies("p", &rules).unwrap();
    adapter
}

fn bench_row_codec(c: &mut Criterion) {
    let policy_rule = vec![
        "alice".to_string(),
        "data1".to_string(),
        "read".to_string(),
        String::new(),
    ];
    c.bench_function("rule_to_row", |b| {
        b.iter(|| rule::to_row(black_box(&policy_rule)))
    });
}

fn bench_unfiltered_load(c: &mut Criterion) {
    let adapter = seeded_adapter(512);
    c.bench_function("load_512_rules", |b| {
        b.iter(|| {
            let mut model = MemoryModel::new();
            adapter.load_policy(&mut model).unwrap();
            black_box(model.len())
        })
    });
}

fn bench_filtered_load(c: &mut Criterion) {
    let adapter = seeded_adapter(512);
    let load_filter = LoadFilter::Values(Filter {
        v0: vec!["user7".to_string(), "user9".to_string()],
        ..Filter::default()
    });
    c.bench_function("filtered_load_512_rules", |b| {
        b.iter(|| {
            let mut model = MemoryModel::new();
            adapter
                .load_filtered_policy(&mut model, &load_filter)
                .unwrap();
            black_box(model.len())
        })
    });
}

criterion_group!(
    benches,
    bench_row_codec,
    bench_unfiltered_load,
    bench_filtered_load
);
criterion_main!(benches);
