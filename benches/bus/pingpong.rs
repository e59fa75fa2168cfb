//! # Pingpong — Park/Wake Cost
//!
//! **Scenario**: capacity 1 forces producer and consumer to alternate, so
//! every message pays a full park, wake and re-poll round trip. This is the
//! wait-list hot path, the opposite extreme of `throughput`.

use std::hint::black_box;

use criterion::Criterion;
use filovia::bus::Bus;
use futures::executor::block_on;

const TOTAL_MESSAGES: u32 = 1_000;

pub fn bench(c: &mut Criterion) {
    c.bench_function("pingpong_capacity_one", |b| {
        let bus = Bus::new();
        let id = bus.open(1);
        b.iter(|| {
            block_on(async {
                futures::join!(
                    async {
                        for v in 0..TOTAL_MESSAGES {
                            bus.send(id, v).await.unwrap();
                        }
                    },
                    async {
                        for _ in 0..TOTAL_MESSAGES {
                            black_box(bus.recv(id).await.unwrap());
                        }
                    },
                );
            });
        });
    });
}
