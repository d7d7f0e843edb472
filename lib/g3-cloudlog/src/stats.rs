/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default, Debug, Eq, PartialEq)]
pub struct SinkSnapshot {
    pub submitted: u64,
    pub written: u64,
    pub written_bytes: u64,
    pub flushed: u64,
    pub format_failed: u64,
    pub channel_closed: u64,
    pub channel_overflow: u64,
    pub io_failed: u64,
    pub io_thread_dropped: u64,
}

/// Counters shared by a sink and its io thread.
#[derive(Default)]
pub struct SinkStats {
    submitted: AtomicU64,
    written: AtomicU64,
    written_bytes: AtomicU64,
    flushed: AtomicU64,
    format_failed: AtomicU64,
    channel_closed: AtomicU64,
    channel_overflow: AtomicU64,
    io_failed: AtomicU64,
    io_thread_dropped: AtomicU64,
}

impl SinkStats {
    pub fn snapshot(&self) -> SinkSnapshot {
        SinkSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            written_bytes: self.written_bytes.load(Ordering::Relaxed),
            flushed: self.flushed.load(Ordering::Relaxed),
            format_failed: self.format_failed.load(Ordering::Relaxed),
            channel_closed: self.channel_closed.load(Ordering::Relaxed),
            channel_overflow: self.channel_overflow.load(Ordering::Relaxed),
            io_failed: self.io_failed.load(Ordering::Relaxed),
            io_thread_dropped: self.io_thread_dropped.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_written(&self, size: usize) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.written_bytes.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub(crate) fn add_flushed(&self) {
        self.flushed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_format_failed(&self) {
        self.format_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_channel_closed(&self) {
        self.channel_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_channel_overflow(&self) {
        self.channel_overflow.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_io_failed(&self) {
        self.io_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_io_thread_dropped(&self) {
        self.io_thread_dropped.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot() {
        let stats = SinkStats::default();
        stats.add_submitted();
        stats.add_submitted();
        stats.add_written(128);
        stats.add_flushed();
        stats.add_channel_overflow();
        stats.add_io_failed();
        stats.add_io_thread_dropped();
        assert_eq!(
            stats.snapshot(),
            SinkSnapshot {
                submitted: 2,
                written: 1,
                written_bytes: 128,
                flushed: 1,
                format_failed: 0,
                channel_closed: 0,
                channel_overflow: 1,
                io_failed: 1,
                io_thread_dropped: 1,
            }
        );
    }
}
