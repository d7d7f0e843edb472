/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

#[macro_use]
mod macros;

mod severity;
pub use severity::Severity;

mod entry;
pub use entry::{DEFAULT_RESOURCE_TYPE, HttpRequestInfo, LogEntry, MonitoredResource};

mod request;
pub use request::RequestContext;

pub mod host;
pub mod trace;

mod error;
pub use error::{FlushError, SubmitError};

mod stats;
pub use stats::{SinkSnapshot, SinkStats};

mod sink;
pub use sink::{ArcLogSink, DiscardSink, JsonStreamSink, LogSink, StreamTarget};

mod logger;
pub use logger::Logger;

mod scoped;
pub use scoped::ScopedLogger;

mod drain;

mod config;
pub use config::{AsyncSinkConfig, CloudLogConfig, SinkTarget};

mod client;
pub use client::CloudLogClient;
