use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use cabinets_core::{Cabinet, Listener, StoreHandle, StoreSetup};
use serde_json::json;

fn counter(cabinet: &Cabinet, name: &str) -> StoreHandle {
    cabinet
        .setup_store(
            StoreSetup::new(name, json!({"count": 0, "label": "bench"})).operation(
                "inc",
                |state, payload, _ctx| {
                    let by = payload.and_then(|p| p.as_i64()).unwrap_or(1);
                    let mut state = state.clone();
                    state["count"] = json!(state["count"].as_i64().unwrap_or_default() + by);
                    Ok(state)
                },
            ),
        )
        .unwrap()
}

fn fire_benchmark(c: &mut Criterion) {
    let cabinet = Cabinet::new();
    let store = counter(&cabinet, "counter");
    let inc = store.action("inc").unwrap().clone();

    c.bench_function("fire", |b| {
        b.iter(|| {
            black_box(store.fire(&inc.with_payload(black_box(1))).unwrap());
        });
    });
}

fn fire_with_subscribers_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("fire_with_subscribers");

    for count in [1, 10, 100] {
        let cabinet = Cabinet::new();
        let store = counter(&cabinet, "counter");
        for i in 0..count {
            let listener = Listener::new(|state| {
                black_box(state);
            });
            // Half of the listeners watch a path that never changes.
            if i % 2 == 0 {
                store.subscribe_with_deps(&listener, ["count"]);
            } else {
                store.subscribe_with_deps(&listener, ["label"]);
            }
        }
        let inc = store.action("inc").unwrap().clone();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                black_box(store.fire(&inc.action()).unwrap());
            });
        });
    }

    group.finish();
}

fn combine_benchmark(c: &mut Criterion) {
    c.bench_function("combine_stores", |b| {
        b.iter(|| {
            let cabinet = Cabinet::new();
            let stores: Vec<StoreHandle> = (0..8)
                .map(|i| counter(&cabinet, &format!("store{i}")))
                .collect();
            let refs: Vec<&StoreHandle> = stores.iter().collect();
            black_box(cabinet.combine_stores(Some("all"), &refs).unwrap());
        });
    });
}

criterion_group!(
    benches,
    fire_benchmark,
    fire_with_subscribers_benchmark,
    combine_benchmark,
);
criterion_main!(benches);
