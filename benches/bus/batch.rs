//! # Batch — Bulk Transfer
//!
//! **Scenario**: the same volume of messages moved one at a time versus in
//! slices. Batched calls pay the boundary check and the waiter wakeup once
//! per slice instead of once per message.

use std::hint::black_box;

use criterion::Criterion;
use filovia::bus::Bus;

const BUFFER_SIZE: usize = 1024;
const SLICE: usize = 64;

pub fn bench(c: &mut Criterion) {
    c.bench_function("batch_one_at_a_time", |b| {
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

    c.bench_function("batch_sliced", |b| {
        let bus = Bus::new();
        let id = bus.open(BUFFER_SIZE);
        let data = [7u32; SLICE];
        let mut out = [0u32; SLICE];
        b.iter(|| {
            for _ in 0..(BUFFER_SIZE / SLICE) {
                bus.try_send_many(id, &data).unwrap();
            }
            for _ in 0..(BUFFER_SIZE / SLICE) {
                black_box(bus.try_recv_many(id, &mut out).unwrap());
            }
        });
    });
}
