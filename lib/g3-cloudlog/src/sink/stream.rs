/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::cell::{Cell, RefCell};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use kanal::{ReceiveErrorTimeout, Receiver, SendErrorTimeout, Sender};

use super::{ErrorReporter, LogSink};
use crate::{AsyncSinkConfig, FlushError, LogEntry, SinkStats, SubmitError};

thread_local! {
    static TL_BUF: RefCell<Vec<u8>> = RefCell::new(Vec::with_capacity(1024));
    static IN_IO_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Where the structured json lines are written to.
///
/// The log agent of the hosting platform picks them up from there.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StreamTarget {
    #[default]
    Stdout,
    Stderr,
    File(PathBuf),
}

impl StreamTarget {
    fn open(&self) -> io::Result<Box<dyn Write + Send>> {
        match self {
            StreamTarget::Stdout => Ok(Box::new(io::stdout())),
            StreamTarget::Stderr => Ok(Box::new(io::stderr())),
            StreamTarget::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Ok(Box::new(file))
            }
        }
    }
}

enum StreamMessage {
    Entry(Vec<u8>),
    Flush(Sender<io::Result<()>>),
}

/// Sink writing one json object per line, from a dedicated io thread.
pub struct JsonStreamSink {
    sender: Sender<StreamMessage>,
    stats: Arc<SinkStats>,
    flush_timeout: Duration,
}

impl JsonStreamSink {
    pub fn start(async_conf: &AsyncSinkConfig, target: &StreamTarget) -> anyhow::Result<Self> {
        let writer = target
            .open()
            .map_err(|e| anyhow!("failed to open {target:?}: {e}"))?;
        Self::start_with_writer(async_conf, writer)
    }

    fn start_with_writer(
        async_conf: &AsyncSinkConfig,
        writer: Box<dyn Write + Send>,
    ) -> anyhow::Result<Self> {
        let (sender, receiver) = kanal::bounded::<StreamMessage>(async_conf.channel_capacity);

        let stats = Arc::new(SinkStats::default());

        let io_thread = AsyncIoThread {
            name: async_conf.thread_name.clone(),
            receiver,
            writer: BufWriter::new(writer),
            stats: Arc::clone(&stats),
            write_error: None,
            reporter: ErrorReporter::new("cloud log io thread"),
        };

        let _detached_thread = std::thread::Builder::new()
            .name(async_conf.thread_name.clone())
            .spawn(move || io_thread.run_to_end())
            .map_err(|e| anyhow!("failed to spawn io thread: {e}"))?;

        Ok(JsonStreamSink {
            sender,
            stats,
            flush_timeout: async_conf.flush_timeout,
        })
    }

    pub fn get_stats(&self) -> Arc<SinkStats> {
        Arc::clone(&self.stats)
    }
}

impl LogSink for JsonStreamSink {
    fn submit(&self, entry: LogEntry) -> Result<(), SubmitError> {
        // diagnostics of an io thread must not wake up an io thread again
        if IN_IO_THREAD.get() {
            self.stats.add_io_thread_dropped();
            return Ok(());
        }
        self.stats.add_submitted();

        let data = TL_BUF.with_borrow_mut(|buf| {
            buf.clear();
            entry.to_json_line(buf).map(|_| buf.clone())
        });
        let data = match data {
            Ok(data) => data,
            Err(e) => {
                self.stats.add_format_failed();
                return Err(SubmitError::FormatFailed(e));
            }
        };

        match self.sender.try_send(StreamMessage::Entry(data)) {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.stats.add_channel_overflow();
                Err(SubmitError::ChannelOverflow)
            }
            Err(_) => {
                self.stats.add_channel_closed();
                Err(SubmitError::ChannelClosed)
            }
        }
    }

    fn flush(&self) -> Result<(), FlushError> {
        let deadline = Instant::now() + self.flush_timeout;
        let (ack_sender, ack_receiver) = kanal::bounded::<io::Result<()>>(1);
        match self
            .sender
            .send_timeout(StreamMessage::Flush(ack_sender), self.flush_timeout)
        {
            Ok(_) => {}
            Err(SendErrorTimeout::Timeout) => return Err(FlushError::Timeout(self.flush_timeout)),
            Err(_) => return Err(FlushError::Closed),
        }
        let left = deadline.saturating_duration_since(Instant::now());
        match ack_receiver.recv_timeout(left) {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(FlushError::IoFailed(e)),
            Err(ReceiveErrorTimeout::Timeout) => Err(FlushError::Timeout(self.flush_timeout)),
            Err(_) => Err(FlushError::Closed),
        }
    }
}

struct AsyncIoThread {
    name: String,
    receiver: Receiver<StreamMessage>,
    writer: BufWriter<Box<dyn Write + Send>>,
    stats: Arc<SinkStats>,
    /// first write error since the last flush request
    write_error: Option<io::Error>,
    reporter: ErrorReporter,
}

impl AsyncIoThread {
    fn run_to_end(mut self) {
        IN_IO_THREAD.set(true);

        while let Ok(msg) = self.receiver.recv() {
            self.handle(msg);

            while let Ok(Some(msg)) = self.receiver.try_recv() {
                self.handle(msg);
            }

            match self.writer.flush() {
                Ok(_) => self.reporter.check::<io::Error>(&self.name, Ok(())),
                Err(e) => {
                    self.stats.add_io_failed();
                    self.reporter.check(&self.name, Err(e));
                }
            }
        }
    }

    fn handle(&mut self, msg: StreamMessage) {
        match msg {
            StreamMessage::Entry(data) => match self.writer.write_all(&data) {
                Ok(_) => self.stats.add_written(data.len()),
                Err(e) => {
                    self.stats.add_io_failed();
                    if self.write_error.is_none() {
                        self.write_error = Some(e);
                    }
                }
            },
            StreamMessage::Flush(ack) => {
                let r = self.writer.flush();
                let r = match self.write_error.take() {
                    Some(e) => Err(e),
                    None => r,
                };
                if r.is_ok() {
                    self.stats.add_flushed();
                }
                let _ = ack.send(r);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Logger, Severity};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    /// Fails every write but flushes fine.
    struct LossyWriter;

    impl Write for LossyWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("device full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Blocks the first write until the gate is dropped.
    struct GateWriter {
        gate: Receiver<()>,
        opened: bool,
    }

    impl Write for GateWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.opened {
                let _ = self.gate.recv();
                self.opened = true;
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    const FEEDBACK_THREAD: &str = "test-feedback";

    /// Process logger forwarding the records of one io thread to a cloud logger.
    struct IoThreadLog(Logger);

    impl log::Log for IoThreadLog {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if std::thread::current().name() == Some(FEEDBACK_THREAD) {
                self.0.emit(record.args().to_string(), Severity::Warning);
            }
        }

        fn flush(&self) {}
    }

    #[test]
    fn write_and_flush() {
        let buf = SharedBuf::default();
        let sink = JsonStreamSink::start_with_writer(
            &AsyncSinkConfig::with_name("test-stream"),
            Box::new(buf.clone()),
        )
        .unwrap();

        sink.submit(LogEntry::new(Severity::Info, "first")).unwrap();
        sink.submit(LogEntry::new(Severity::Error, "second"))
            .unwrap();
        sink.flush().unwrap();

        let data = buf.0.lock().unwrap().clone();
        let lines: Vec<serde_json::Value> = data
            .split(|b| *b == b'\n')
            .filter(|l| !l.is_empty())
            .map(|l| serde_json::from_slice(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["message"], "first");
        assert_eq!(lines[1]["severity"], "ERROR");

        let snapshot = sink.get_stats().snapshot();
        assert_eq!(snapshot.submitted, 2);
        assert_eq!(snapshot.written, 2);
        assert_eq!(snapshot.written_bytes, data.len() as u64);
        assert_eq!(snapshot.flushed, 1);
    }

    #[test]
    fn flush_error_reported() {
        let sink = JsonStreamSink::start_with_writer(
            &AsyncSinkConfig::with_name("test-broken"),
            Box::new(BrokenWriter),
        )
        .unwrap();
        sink.submit(LogEntry::new(Severity::Info, "lost")).unwrap();
        assert!(matches!(sink.flush(), Err(FlushError::IoFailed(_))));
    }

    #[test]
    fn file_target() {
        let path = std::env::temp_dir().join(format!(
            "g3-cloudlog-test-{}.log",
            crate::trace::new_trace_id()
        ));
        let sink = JsonStreamSink::start(
            &AsyncSinkConfig::with_name("test-file"),
            &StreamTarget::File(path.clone()),
        )
        .unwrap();
        sink.submit(LogEntry::new(Severity::Notice, "to file"))
            .unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(content.contains("\"message\":\"to file\""));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn lost_write_reported_on_flush() {
        let sink = JsonStreamSink::start_with_writer(
            &AsyncSinkConfig::with_name("test-lossy"),
            Box::new(LossyWriter),
        )
        .unwrap();
        // larger than the BufWriter capacity, so it goes to the writer directly
        sink.submit(LogEntry::new(Severity::Info, "x".repeat(16 * 1024)))
            .unwrap();
        assert!(matches!(sink.flush(), Err(FlushError::IoFailed(_))));
        assert!(sink.flush().is_ok());

        let snapshot = sink.get_stats().snapshot();
        assert_eq!(snapshot.written, 0);
        assert_eq!(snapshot.io_failed, 1);
        assert_eq!(snapshot.flushed, 1);
    }

    #[test]
    fn flush_timeout_with_stalled_writer() {
        let (release, gate) = kanal::bounded::<()>(1);
        let mut conf = AsyncSinkConfig::with_name("test-stalled");
        conf.channel_capacity = 1;
        conf.flush_timeout = Duration::from_millis(100);
        let sink = JsonStreamSink::start_with_writer(
            &conf,
            Box::new(GateWriter {
                gate,
                opened: false,
            }),
        )
        .unwrap();

        for i in 0..4 {
            let _ = sink.submit(LogEntry::new(Severity::Info, format!("entry {i}")));
        }

        let begin = Instant::now();
        assert!(matches!(sink.flush(), Err(FlushError::Timeout(_))));
        assert!(begin.elapsed() < Duration::from_secs(1));
        drop(release);
    }

    #[test]
    fn io_thread_warnings_not_fed_back() {
        let sink = Arc::new(
            JsonStreamSink::start_with_writer(
                &AsyncSinkConfig::with_name(FEEDBACK_THREAD),
                Box::new(BrokenWriter),
            )
            .unwrap(),
        );
        let stats = sink.get_stats();

        let process_logger = Logger::new(sink.clone(), "process".to_string());
        log::set_logger(Box::leak(Box::new(IoThreadLog(process_logger)))).unwrap();
        log::set_max_level(log::LevelFilter::Trace);

        let caller = Logger::new(sink.clone(), "app".to_string());
        caller.info("one entry");

        std::thread::sleep(Duration::from_millis(300));
        let first = stats.snapshot();
        std::thread::sleep(Duration::from_millis(300));
        let second = stats.snapshot();

        assert_eq!(first.submitted, 1);
        assert!(first.io_thread_dropped >= 1);
        assert_eq!(first, second);
    }
}
