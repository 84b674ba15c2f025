//! Location store backends under a status-command workload.

use std::collections::{BTreeMap, BTreeSet};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use multiworld::store::{build_store, GenerationData, Placement, StoreBackend};
use multiworld::{CheckTable, ItemFlags, ItemId, LocationId, SlotId, TeamId};

const SLOTS: u32 = 50;
const LOCATIONS_PER_SLOT: i64 = 400;

fn world() -> GenerationData {
    (1..=SLOTS)
        .map(|slot| {
            let locations = (0..LOCATIONS_PER_SLOT)
                .map(|n| {
                    let location = LocationId(i64::from(slot) * 10_000 + n);
                    let receiver = SlotId((slot + n as u32) % SLOTS + 1);
                    let flags = ItemFlags((n % 5) as u8 & 0b111);
                    (location, Placement::new(ItemId(n % 97), receiver, flags))
                })
                .collect::<BTreeMap<_, _>>();
            (SlotId(slot), locations)
        })
        .collect()
}

fn checks(fraction: i64) -> CheckTable {
    let mut table = CheckTable::new();
    for slot in 1..=SLOTS {
        for n in (0..LOCATIONS_PER_SLOT).filter(|n| n % fraction == 0) {
            table.record(TeamId(0), SlotId(slot), LocationId(i64::from(slot) * 10_000 + n));
        }
    }
    table
}

fn bench_queries(c: &mut Criterion) {
    let data = world();
    let sparse = checks(50);
    let dense = checks(2);
    let targets: BTreeSet<SlotId> = (1..=10).map(SlotId).collect();

    let mut group = c.benchmark_group("location_store");
    for backend in [StoreBackend::Reference, StoreBackend::Indexed] {
        let store = build_store(backend, data.clone()).unwrap();

        group.bench_with_input(BenchmarkId::new("get_missing_sparse", backend), &store, |b, store| {
            b.iter(|| store.get_missing(&sparse, TeamId(0), black_box(SlotId(17))))
        });

        group.bench_with_input(BenchmarkId::new("get_remaining_dense", backend), &store, |b, store| {
            b.iter(|| store.get_remaining(&dense, TeamId(0), black_box(SlotId(17))))
        });

        group.bench_with_input(BenchmarkId::new("find_item", backend), &store, |b, store| {
            b.iter(|| store.find_item(&targets, black_box(ItemId(42))).count())
        });

        group.bench_with_input(BenchmarkId::new("locations_for_player", backend), &store, |b, store| {
            b.iter(|| store.locations_for_player(black_box(SlotId(3))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_queries);
criterion_main!(benches);
