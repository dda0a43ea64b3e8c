//! Warnings the writer emits through the `log` facade.

use std::{io, time::Duration};

use crossbeam_channel::bounded;
use logstash_async::{AsyncWriter, RetryPolicy, WriterConfig};
use logtest::Logger;
use serial_test::serial;

#[test]
#[serial]
fn eviction_and_dial_failures_are_reported() {
    let mut logger = Logger::start();

    let (gate_tx, gate_rx) = bounded::<()>(0);
    let config = WriterConfig::default()
        .with_buffer_size(1)
        .with_retry(RetryPolicy::new(Duration::from_millis(1), 0));
    let (writer, cancel) = AsyncWriter::with_dialer(config, move || -> io::Result<Vec<u8>> {
        let _ = gate_rx.recv();
        Err(io::Error::new(io::ErrorKind::ConnectionRefused, "offline"))
    })
    .expect("build writer");

    for i in 0..5 {
        writer.submit(format!("record-{i}\n"));
    }
    drop(gate_tx);
    drop(writer);
    assert!(cancel.wait_stopped(Duration::from_secs(5)));

    let mut messages = Vec::new();
    while let Some(record) = logger.pop() {
        if record.level() == log::Level::Warn {
            messages.push(record.args().to_owned());
        }
    }
    assert!(
        messages.iter().any(|m| m.contains("evicted because the buffer was full")),
        "missing eviction warning in {messages:?}"
    );
    assert!(
        messages
            .iter()
            .any(|m| m.contains("could not connect to the log collector after 1 attempts")),
        "missing dial failure in {messages:?}"
    );
    assert!(
        messages.iter().any(|m| m.contains("no connection to the collector")),
        "missing drop summary in {messages:?}"
    );
}
