//! # Throughput — Event Pump
//!
//! **Scenario**: a producer pumps events through a well-sized channel and
//! the consumer keeps up, so neither side ever parks. This is the pure
//! buffer cost: no wait-list traffic, no executor involved.

use std::hint::black_box;

use criterion::Criterion;
use filovia::bus::Bus;

const BUFFER_SIZE: usize = 1024;

pub fn bench(c: &mut Criterion) {
    c.bench_function("throughput_try_path", |b| {
        let bus = Bus::new();
        let id = bus.open(BUFFER_SIZE);
        b.iter(|| {
            for v in 0..BUFFER_SIZE as u32 {
                bus.try_send(id, v).unwrap();
            }
            for _ in 0..BUFFER_SIZE {
                black_box(bus.try_recv(id).unwrap());
            }
        });
    });

    c.bench_function("throughput_broadcast_4ch", |b| {
        let bus = Bus::new();
        let ids: Vec<_> = (0..4).map(|_| bus.open(BUFFER_SIZE)).collect();
        b.iter(|| {
            for v in 0..(BUFFER_SIZE / 4) as u32 {
                bus.try_broadcast(v).unwrap();
            }
            for &id in &ids {
                while let Ok(v) = bus.try_recv(id) {
                    black_box(v);
                }
            }
        });
    });
}
