//! # Churn — Channel Table Reuse
//!
//! **Scenario**: short-lived channels opened and closed in waves. Exercises
//! the lowest-vacant-slot scan that keeps ids dense.

use criterion::Criterion;
use filovia::bus::Bus;

const WAVE: usize = 64;

pub fn bench(c: &mut Criterion) {
    c.bench_function("churn_open_close", |b| {
        let bus = Bus::new();
        b.iter(|| {
            let ids: Vec<_> = (0..WAVE).map(|_| bus.open(4)).collect();
            // close the odd half first so the table is fragmented mid-wave
            for id in ids.iter().skip(1).step_by(2) {
                bus.close(*id).unwrap();
            }
            for id in ids.iter().step_by(2) {
                bus.close(*id).unwrap();
            }
        });
    });
}
