//! Benchmarks for condition construction, compilation and in-memory matching.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use indexmap::IndexMap;
use quarry_query::{
    ComparisonOperator, Condition, OperatorRegistry, OrderByField, Value, compile, filter_records,
    sort_records,
};
use quarry_schema::{DialectConfig, EntityDescriptor, FieldSpec, FieldTypeCatalog, ValueType};
use std::hint::black_box;

// ============================================================================
// Helper Functions
// ============================================================================

fn person() -> EntityDescriptor {
    EntityDescriptor::builder("Person")
        .field(FieldSpec::typed("id", ValueType::Long).pk())
        .typed_field("status", ValueType::String)
        .typed_field("age", ValueType::Integer)
        .typed_field("lastName", ValueType::String)
        .build(FieldTypeCatalog::builtin())
        .unwrap()
}

fn complex_condition() -> Condition {
    Condition::and([
        Condition::eq("status", "ACTIVE"),
        Condition::or([
            Condition::like("lastName", "Sm%"),
            Condition::in_list("age", [18, 21, 65]),
        ]),
        Condition::not(Condition::between("age", 30, 40)),
        Condition::ne("lastName", Value::Null),
    ])
}

fn records(count: usize) -> Vec<IndexMap<String, Value>> {
    (0..count)
        .map(|i| {
            let mut r = IndexMap::new();
            r.insert("id".to_string(), Value::from(i as i64));
            r.insert(
                "status".to_string(),
                Value::from(if i % 3 == 0 { "ACTIVE" } else { "DISABLED" }),
            );
            r.insert("age".to_string(), Value::from((i % 90) as i64));
            r.insert(
                "lastName".to_string(),
                if i % 7 == 0 { Value::Null } else { Value::from(format!("Smith{}", i)) },
            );
            r
        })
        .collect()
}

// ============================================================================
// Construction Benchmarks
// ============================================================================

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("condition_construction");

    group.bench_function("create_equals", |b| {
        b.iter(|| black_box(Condition::eq("status", "ACTIVE")))
    });

    group.bench_function("create_complex", |b| b.iter(|| black_box(complex_condition())));

    group.bench_function("freeze", |b| {
        let condition = complex_condition();
        b.iter(|| black_box(condition.freeze()))
    });

    group.bench_function("operator_lookup", |b| {
        let registry = OperatorRegistry::global();
        b.iter(|| black_box(registry.lookup_comparison(black_box("greaterThanEqualTo"))))
    });

    group.bench_function("compare_named", |b| {
        b.iter(|| black_box(Condition::compare_named("age", "gte", 18)))
    });

    group.finish();
}

// ============================================================================
// Compilation Benchmarks
// ============================================================================

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("condition_compile");
    let entity = person();
    let dialect = DialectConfig::sqlite();

    group.bench_function("compile_equals", |b| {
        let condition = Condition::eq("status", "ACTIVE");
        b.iter(|| black_box(compile(&condition, &entity, &dialect)))
    });

    group.bench_function("compile_complex", |b| {
        let condition = complex_condition();
        b.iter(|| black_box(compile(&condition, &entity, &dialect)))
    });

    for size in [10, 100, 1000] {
        let condition = Condition::in_list("age", 0..size as i64);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("compile_in_list", size), &condition, |b, condition| {
            b.iter(|| black_box(compile(condition, &entity, &dialect)))
        });
    }

    group.finish();
}

// ============================================================================
// Matching Benchmarks
// ============================================================================

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("condition_matching");
    let condition = complex_condition();

    for size in [100, 1000, 10000] {
        let rows = records(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("filter_records", size), &rows, |b, rows| {
            b.iter(|| black_box(filter_records(rows, &condition)))
        });
    }

    group.bench_function("like_cached", |b| {
        let rows = records(1000);
        let condition = Condition::compare("lastName", ComparisonOperator::Like, "%th1%");
        b.iter(|| black_box(filter_records(&rows, &condition)))
    });

    group.finish();
}

// ============================================================================
// Sorting Benchmarks
// ============================================================================

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_records");
    let order = [OrderByField::desc("age"), OrderByField::asc("lastName").ignore_case()];

    for size in [100, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || records(size),
                |mut rows| {
                    sort_records(&mut rows, &order);
                    black_box(rows)
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_construction, bench_compile, bench_matching, bench_sort);
criterion_main!(benches);
