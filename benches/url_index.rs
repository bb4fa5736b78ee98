//! 标识分配性能基准测试

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use shortener::storage::UrlIndex;
use std::hint::black_box;

fn urls(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("https://example.com/path/{}/resource", i))
        .collect()
}

/// 新 URL 分配 + 已存在 URL 查重
fn bench_assign(c: &mut Criterion) {
    let mut group = c.benchmark_group("url_index/assign");

    for size in [1_000usize, 10_000] {
        let input = urls(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("fresh", size), &input, |b, input| {
            b.iter(|| {
                let mut index = UrlIndex::new();
                for url in input {
                    black_box(index.assign(url));
                }
            });
        });

        let mut warm = UrlIndex::new();
        for url in &input {
            warm.assign(url);
        }
        group.bench_with_input(BenchmarkId::new("existing", size), &input, |b, input| {
            b.iter(|| {
                for url in input {
                    black_box(warm.plan(url));
                }
            });
        });
    }

    group.finish();
}

/// 批量规划（含批内重复）
fn bench_plan_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("url_index/plan_batch");

    let mut index = UrlIndex::new();
    for url in urls(5_000) {
        index.assign(&url);
    }

    let mut batch = urls(10_000);
    batch.extend(urls(1_000));
    group.throughput(Throughput::Elements(batch.len() as u64));

    group.bench_function("mixed_11k", |b| {
        b.iter(|| black_box(index.plan_batch(batch.iter().map(String::as_str))));
    });

    group.finish();
}

criterion_group!(benches, bench_assign, bench_plan_batch);
criterion_main!(benches);
