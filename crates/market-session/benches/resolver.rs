use std::hint::black_box;

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use market_session::{closed_default_sessions, most_recent_open, Timeframe};

fn bench_most_recent_open(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2019, 12, 31, 23, 59, 0).unwrap();
    let mut group = c.benchmark_group("most_recent_open");
    for notation in ["1", "7", "4H", "1D", "3D", "W", "5M"] {
        let tf = Timeframe::parse(notation).unwrap();
        group.bench_function(notation, |b| {
            b.iter(|| most_recent_open(black_box(tf), black_box(now)))
        });
    }
    group.finish();
}

fn bench_closed_default_sessions(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2019, 7, 1, 0, 0, 0).unwrap();
    c.bench_function("closed_default_sessions", |b| {
        b.iter(|| closed_default_sessions(black_box(now)))
    });
}

criterion_group!(benches, bench_most_recent_open, bench_closed_default_sessions);
criterion_main!(benches);
