// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_selection::store::MemoryStore;
use understory_selection::synchronizer::{SyncConfig, Synchronizer};

fn member_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("m{i}")).collect()
}

fn populated(groups: usize, members: &[String]) -> Synchronizer {
    let mut sync = Synchronizer::new(MemoryStore::new(), SyncConfig::default());
    for g in 0..groups {
        let name = format!("g{g}");
        for id in members {
            sync.register(&name, id, id);
        }
    }
    sync
}

fn bench_register(c: &mut Criterion) {
    let mut group = c.benchmark_group("register");
    for &n in &[8usize, 64, 512] {
        let ids = member_ids(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("fresh_group_n{n}"), |b| {
            b.iter_batched(
                || Synchronizer::new(MemoryStore::new(), SyncConfig::default()),
                |mut sync| {
                    for id in &ids {
                        black_box(sync.register("lang", id, id));
                    }
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("reregister_n{n}"), |b| {
            let mut sync = populated(1, &ids);
            b.iter(|| {
                for id in &ids {
                    black_box(sync.register("g0", id, id));
                }
            })
        });
    }
    group.finish();
}

fn bench_select_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_fanout");
    let ids = member_ids(4);
    for &subscribers in &[1usize, 16, 256] {
        let mut sync = populated(16, &ids);
        let hits = Rc::new(Cell::new(0_u64));
        for s in 0..subscribers {
            let h = hits.clone();
            // Spread subscribers over groups; only g0 is published to.
            let slot = s % 16;
            let topic = if s % 2 == 0 { "g0".to_string() } else { format!("g{slot}") };
            sync.subscribe(&topic, move |_| h.set(h.get() + 1));
        }
        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_function(format!("subscribers_{subscribers}"), |b| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % ids.len();
                black_box(sync.select("g0", &ids[i]).ok());
            })
        });
        black_box(hits.get());
    }
    group.finish();
}

criterion_group!(benches, bench_register, bench_select_fanout);
criterion_main!(benches);
