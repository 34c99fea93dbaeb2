//! Benchmarks for SQLite operations.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use indexmap::IndexMap;
use quarry_query::{Condition, OrderByField, Value};
use quarry_schema::{EntityDescriptor, FieldSpec, FieldTypeCatalog, ValueType};
use quarry_sqlite::{DatabasePath, JournalMode, SqliteConfig, SqliteEngine};
use std::hint::black_box;

fn users() -> EntityDescriptor {
    EntityDescriptor::builder("User")
        .field(FieldSpec::typed("id", ValueType::Long).pk())
        .typed_field("name", ValueType::String)
        .typed_field("email", ValueType::String)
        .typed_field("age", ValueType::Long)
        .typed_field("active", ValueType::Boolean)
        .build(FieldTypeCatalog::builtin())
        .unwrap()
}

fn user(i: usize) -> IndexMap<String, Value> {
    let mut r = IndexMap::new();
    r.insert("id".to_string(), Value::from(i as i64));
    r.insert("name".to_string(), Value::from(format!("User {}", i)));
    r.insert("email".to_string(), Value::from(format!("user{}@example.com", i)));
    r.insert(
        "age".to_string(),
        if i % 10 == 0 { Value::Null } else { Value::from((20 + i % 50) as i64) },
    );
    r.insert("active".to_string(), Value::from(i % 2 == 0));
    r
}

/// Create a test database with sample data using a temp file.
fn setup_test_db(count: usize) -> (SqliteEngine, EntityDescriptor, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = SqliteConfig::memory()
        .path(DatabasePath::File(temp_dir.path().join("bench.db")))
        .journal_mode(JournalMode::Delete);
    let engine = SqliteEngine::open(config).unwrap();
    let entity = users();
    engine.create_table(&entity).unwrap();
    let rows: Vec<_> = (0..count).map(user).collect();
    engine.insert_all(&entity, &rows).unwrap();
    (engine, entity, temp_dir)
}

fn bench_insert(c: &mut Criterion) {
    let (engine, entity, _dir) = setup_test_db(0);
    let mut next = 0usize;

    c.bench_function("insert_single", |b| {
        b.iter(|| {
            next += 1;
            engine.insert(&entity, &user(next)).unwrap()
        })
    });
}

fn bench_query(c: &mut Criterion) {
    let (engine, entity, _dir) = setup_test_db(1000);
    let mut group = c.benchmark_group("query");

    let all = Condition::and([]);
    group.bench_function("find_all", |b| {
        b.iter(|| engine.find(&entity, black_box(&all), &[]).unwrap())
    });

    let filtered = Condition::and([
        Condition::eq("active", true),
        Condition::or([Condition::lt("age", 30), Condition::eq("age", Value::Null)]),
    ]);
    group.bench_function("find_with_condition", |b| {
        b.iter(|| engine.find(&entity, black_box(&filtered), &[]).unwrap())
    });

    let order = [OrderByField::desc("age"), OrderByField::asc("id")];
    group.bench_function("find_ordered", |b| {
        b.iter(|| engine.find(&entity, black_box(&filtered), &order).unwrap())
    });

    let by_id = Condition::eq("id", 500i64);
    group.bench_function("find_first", |b| {
        b.iter(|| engine.find_first(&entity, black_box(&by_id), &[]).unwrap())
    });

    group.finish();
}

fn bench_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("count");

    for user_count in [100usize, 1000, 10000].iter() {
        let (engine, entity, _dir) = setup_test_db(*user_count);
        let condition = Condition::not_in("age", [21i64, 22, 23]);

        group.throughput(Throughput::Elements(*user_count as u64));
        group.bench_with_input(BenchmarkId::new("count_not_in", user_count), user_count, |b, _| {
            b.iter(|| engine.count(&entity, black_box(&condition)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_query, bench_count);
criterion_main!(benches);
