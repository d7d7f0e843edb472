/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::{Arguments, Write};
use std::panic::{RefUnwindSafe, UnwindSafe};

use slog::{Drain, KV, Never, OwnedKVList, Record, Serializer};

use crate::{Logger, Severity};

struct PayloadKv<'a>(&'a mut String);

impl Serializer for PayloadKv<'_> {
    fn emit_none(&mut self, _key: slog::Key) -> slog::Result {
        Ok(())
    }

    fn emit_arguments(&mut self, key: slog::Key, value: &Arguments) -> slog::Result {
        let _ = write!(self.0, " {key}={value}");
        Ok(())
    }
}

impl UnwindSafe for Logger {}
impl RefUnwindSafe for Logger {}

/// Use a [`Logger`] as the backend of a process `slog::Logger`.
///
/// Key value pairs are appended to the message as ` key=value`.
impl Drain for Logger {
    type Ok = ();
    type Err = Never;

    fn log(&self, record: &Record, logger_values: &OwnedKVList) -> Result<(), Never> {
        let mut payload = record.msg().to_string();
        let mut kv_formatter = PayloadKv(&mut payload);
        let _ = record.kv().serialize(record, &mut kv_formatter);
        let _ = logger_values.serialize(record, &mut kv_formatter);

        self.emit(payload, Severity::from(record.level()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BufLogSink;
    use slog::{slog_debug, slog_error, slog_info, slog_o};
    use std::sync::Arc;

    #[test]
    fn slog_records() {
        let sink = Arc::new(BufLogSink::default());
        let drain = Logger::new(sink.clone(), "process".to_string());
        let root = slog::Logger::root(drain, slog_o!("pid" => 42));

        slog_info!(root, "started"; "port" => 8080);
        slog_error!(root, "lost {} peers", 3);
        slog_debug!(root, "tick");

        let entries = sink.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].severity(), Severity::Info);
        assert_eq!(entries[0].payload(), "started port=8080 pid=42");
        assert_eq!(entries[1].severity(), Severity::Error);
        assert_eq!(entries[1].payload(), "lost 3 peers pid=42");
        assert_eq!(entries[2].severity(), Severity::Debug);
        assert_eq!(entries[2].log_name(), "process");
    }
}
