//! Benchmark comparing index-backed predicate evaluation vs full scans.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tabula_core::{sorted_rows, ColumnType, Expression, Sort, Table, TupleSet};

const DATASET_SIZES: &[i32] = &[1_000, 10_000, 100_000];

fn create_table(size: i32, indexed: bool) -> Table {
    let mut table = Table::new();
    table.add_column("age", ColumnType::Int).expect("column");
    table.add_column("name", ColumnType::String).expect("column");
    for i in 0..size {
        let row = table.add_row();
        // Spread values so a range predicate selects about 1%.
        table.set(row, "age", (i * 7919) % size).expect("age");
        table.set(row, "name", format!("user{i}")).expect("name");
    }
    if indexed {
        table.create_index("age").expect("index");
    }
    table
}

fn range_predicate(size: i32) -> Expression {
    let low = size / 2;
    Expression::and(vec![
        Expression::column("age").ge(low),
        Expression::column("age").lt(low + size / 100),
    ])
}

fn bench_range_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_filter");

    for &size in DATASET_SIZES {
        let predicate = range_predicate(size);

        let scanned = create_table(size, false);
        group.bench_with_input(BenchmarkId::new("scan", size), &scanned, |b, table| {
            b.iter(|| black_box(table.select(Some(&predicate)).count()));
        });

        let indexed = create_table(size, true);
        group.bench_with_input(BenchmarkId::new("indexed", size), &indexed, |b, table| {
            b.iter(|| black_box(table.select(Some(&predicate)).count()));
        });
    }

    group.finish();
}

fn bench_equality_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("equality_filter");

    for &size in DATASET_SIZES {
        let predicate = Expression::column("age").eq(size / 3);

        let scanned = create_table(size, false);
        group.bench_with_input(BenchmarkId::new("scan", size), &scanned, |b, table| {
            b.iter(|| black_box(table.select(Some(&predicate)).next()));
        });

        let indexed = create_table(size, true);
        group.bench_with_input(BenchmarkId::new("indexed", size), &indexed, |b, table| {
            b.iter(|| black_box(table.select(Some(&predicate)).next()));
        });
    }

    group.finish();
}

fn bench_sorted_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_rows");
    group.sample_size(20);

    for &size in &DATASET_SIZES[..2] {
        let table = create_table(size, false);
        let sort = Sort::parse("age DESC, name").expect("sort");
        group.bench_with_input(BenchmarkId::new("two_keys", size), &table, |b, table| {
            b.iter(|| {
                let rows = sorted_rows(table, table.rows(), &sort).expect("sorted");
                black_box(rows.len());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_range_filter,
    bench_equality_filter,
    bench_sorted_rows
);
criterion_main!(benches);
