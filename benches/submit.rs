//! Benchmarks for the producer side of `AsyncWriter`.

use std::{io, time::Duration};

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use crossbeam_channel::bounded;
use logstash_async::{AsyncWriter, RecordBuffer, RetryPolicy, WriterConfig};

const RECORD: &[u8] = b"{\"level\":\"INFO\",\"message\":\"benchmark record\"}\n";

fn bench_buffer_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_buffer_push");
    for capacity in [64usize, 1024] {
        group.bench_with_input(
            BenchmarkId::new("overflowing", capacity),
            &capacity,
            |b, &capacity| {
                let buffer = RecordBuffer::new(capacity);
                b.iter(|| black_box(buffer.push(RECORD.to_vec())));
            },
        );
    }
    group.finish();
}

fn bench_submit_with_discarding_sink(c: &mut Criterion) {
    let config = WriterConfig::default()
        .with_buffer_size(1024)
        .with_retry(RetryPolicy::new(Duration::from_millis(10), 0));
    let (writer, cancel) = AsyncWriter::with_dialer(config, || -> io::Result<io::Sink> {
        Ok(io::sink())
    })
    .expect("build writer");
    c.bench_function("submit_draining", |b| {
        b.iter(|| black_box(writer.submit(RECORD)));
    });
    cancel.cancel();
    cancel.wait_stopped(Duration::from_secs(5));
}

fn bench_submit_with_stalled_loop(c: &mut Criterion) {
    let (gate_tx, gate_rx) = bounded::<()>(0);
    let config = WriterConfig::default()
        .with_buffer_size(1024)
        .with_retry(RetryPolicy::new(Duration::from_millis(10), 0));
    let (writer, cancel) = AsyncWriter::with_dialer(config, move || -> io::Result<io::Sink> {
        let _ = gate_rx.recv();
        Ok(io::sink())
    })
    .expect("build writer");
    c.bench_function("submit_stalled", |b| {
        b.iter(|| black_box(writer.submit(RECORD)));
    });
    cancel.cancel();
    drop(gate_tx);
    cancel.wait_stopped(Duration::from_secs(5));
}

criterion_group!(
    benches,
    bench_buffer_push,
    bench_submit_with_discarding_sink,
    bench_submit_with_stalled_loop
);
criterion_main!(benches);
