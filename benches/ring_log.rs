//! Criterion benchmarks for the dashboard feed hot paths.
//!
//! Every info/warning/error call on the detector ends in a `RingLog::append`, and
//! every push of the `log_rows` section renders a newest-first snapshot. Both run on
//! the single scheduler thread, so they bound how quickly the push loop can turn
//! around after a burst of log rows.
//!
//! Run with: cargo bench --bench ring_log

use chrono::Local;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use detector_live::notify::{BroadcastEvent, ClientLog, LogRow, RingLog, Severity};

fn row(i: usize) -> LogRow {
    LogRow {
        timestamp: Local::now(),
        severity: if i % 10 == 0 {
            Severity::Warning
        } else {
            Severity::Info
        },
        text: format!("Sound file saved: bat_{:06}.wav", i),
    }
}

/// Append into a full log, so every append also evicts.
fn ring_log_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_log_append");

    for capacity in [80, 1000] {
        let mut log = RingLog::new(capacity);
        for i in 0..capacity {
            log.append(row(i));
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("append_evicting", capacity),
            &capacity,
            |b, _| {
                let mut i = 0;
                b.iter(|| {
                    i += 1;
                    black_box(log.append(row(i)));
                });
            },
        );
    }

    group.finish();
}

/// Newest-first copies, structured and rendered.
fn ring_log_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_log_snapshot");

    for fill in [0, 10, 80] {
        let mut log = RingLog::new(80);
        for i in 0..fill {
            log.append(row(i));
        }

        group.bench_with_input(BenchmarkId::new("snapshot", fill), &fill, |b, _| {
            b.iter(|| black_box(log.snapshot()));
        });
        group.bench_with_input(BenchmarkId::new("rendered", fill), &fill, |b, _| {
            b.iter(|| black_box(log.rendered()));
        });
    }

    group.finish();
}

/// Full producer path: logger call, channel handoff, pump apply and broadcast.
fn client_log_round_trip(c: &mut Criterion) {
    let (log, logger, mut pump) = ClientLog::channel(80);

    c.bench_function("client_log_info_and_drain", |b| {
        b.iter(|| {
            logger.info("Recording started.");
            black_box(pump.drain());
        });
    });

    black_box(log.rows());
}

/// Broadcast with one registered round, the common case in the push loop.
fn broadcast_event_swap(c: &mut Criterion) {
    let event = BroadcastEvent::new();

    c.bench_function("broadcast_event_swap", |b| {
        b.iter(|| {
            let handle = event.wait_handle();
            event.broadcast();
            black_box(handle.is_fired());
        });
    });
}

criterion_group!(
    benches,
    ring_log_append,
    ring_log_snapshot,
    client_log_round_trip,
    broadcast_event_swap
);
criterion_main!(benches);
