use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Instant;
use vigia_cache::{CacheConfig, CacheLayer, PutOptions, TieredCache};

fn bench_cache(c: &mut Criterion) {
    let now = Instant::now();
    let mut cache = TieredCache::<String>::new(CacheConfig::default());
    for i in 0..1_000 {
        let layer = if i % 3 == 0 { CacheLayer::L3 } else { CacheLayer::L2 };
        cache.put(
            format!("key_{i}"),
            "payload".repeat(8),
            PutOptions::new().in_layer(layer),
            now,
        );
    }

    let mut group = c.benchmark_group("Tiered Cache");

    group.bench_function("get (hit, mixed layers)", |b| {
        let mut i = 0u32;
        b.iter(|| {
            i = (i + 7) % 1_000;
            black_box(cache.get(&format!("key_{i}"), now));
        });
    });

    group.bench_function("put (L1 at capacity)", |b| {
        let mut full = TieredCache::<String>::new(CacheConfig::default());
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            black_box(full.put(format!("k{i}"), "v".to_string(), PutOptions::new(), now));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cache);
criterion_main!(benches);
