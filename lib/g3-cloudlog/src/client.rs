/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::anyhow;
use http::HeaderName;
use log::debug;

use crate::sink::ArcLogSink;
use crate::{
    CloudLogConfig, DiscardSink, FlushError, JsonStreamSink, Logger, MonitoredResource,
    RequestContext, ScopedLogger, SinkStats, SinkTarget,
};

fn check_project_id(config: &CloudLogConfig) -> anyhow::Result<()> {
    if config.project_id.is_empty() {
        Err(anyhow!("project id should not be empty"))
    } else {
        Ok(())
    }
}

/// Shared handle to the log backend of one project.
pub struct CloudLogClient {
    project_id: String,
    sink: ArcLogSink,
    stats: Option<Arc<SinkStats>>,
    resource: Arc<MonitoredResource>,
    labels: Arc<BTreeMap<String, String>>,
    trace_headers: Vec<HeaderName>,
    local_echo: bool,
}

impl CloudLogClient {
    pub fn configure(config: &CloudLogConfig) -> anyhow::Result<Self> {
        check_project_id(config)?;
        let (sink, stats): (ArcLogSink, _) = match &config.target {
            SinkTarget::Discard => (Arc::new(DiscardSink), None),
            SinkTarget::Stream(target) => {
                let sink = JsonStreamSink::start(&config.async_conf, target)?;
                let stats = sink.get_stats();
                (Arc::new(sink), Some(stats))
            }
        };
        let mut client = CloudLogClient::with_sink(config, sink)?;
        client.stats = stats;
        debug!(
            "cloud log client for project {} started with target {:?}",
            client.project_id, config.target
        );
        Ok(client)
    }

    pub fn with_sink(config: &CloudLogConfig, sink: ArcLogSink) -> anyhow::Result<Self> {
        check_project_id(config)?;
        Ok(CloudLogClient {
            project_id: config.project_id.clone(),
            sink,
            stats: None,
            resource: Arc::new(MonitoredResource::new(&config.resource_type)),
            labels: Arc::new(config.labels.clone()),
            trace_headers: config.trace_headers.clone(),
            local_echo: config.local_echo,
        })
    }

    #[inline]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Full resource name of the log `name` in this project.
    pub fn log_name(&self, name: &str) -> String {
        format!("projects/{}/logs/{name}", self.project_id)
    }

    pub fn logger(&self, name: &str) -> Logger {
        Logger::new(self.sink.clone(), self.log_name(name))
            .with_labels(self.labels.clone())
            .with_resource(self.resource.clone())
    }

    /// Create the logger of one request.
    ///
    /// Child entries go to `<name>-entry` and the summary to `<name>-request`,
    /// both with the hostname label added to the common ones.
    pub fn scoped_logger(&self, request: RequestContext, name: &str) -> ScopedLogger {
        let mut labels = (*self.labels).clone();
        crate::host::with_hostname(&mut labels);
        let labels = Arc::new(labels);

        let entry_logger = Logger::new(self.sink.clone(), self.log_name(&format!("{name}-entry")))
            .with_labels(labels.clone())
            .with_resource(self.resource.clone());
        let parent_logger =
            Logger::new(self.sink.clone(), self.log_name(&format!("{name}-request")))
                .with_labels(labels)
                .with_resource(self.resource.clone());

        let mut logger = ScopedLogger::new(entry_logger, parent_logger, request, &self.trace_headers);
        logger.enable_local(self.local_echo);
        logger
    }

    /// Stats of the stream sink, not available for other targets.
    pub fn stats(&self) -> Option<Arc<SinkStats>> {
        self.stats.clone()
    }

    pub fn flush(&self) -> Result<(), FlushError> {
        self.sink.flush()
    }
}
