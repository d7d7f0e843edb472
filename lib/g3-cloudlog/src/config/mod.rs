/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::time::Duration;

use http::HeaderName;

use crate::StreamTarget;
use crate::entry::DEFAULT_RESOURCE_TYPE;

#[cfg(feature = "yaml")]
mod yaml;

const DEFAULT_CHANNEL_SIZE: usize = 4096;
const DEFAULT_THREAD_NAME: &str = "log-cloud";
const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct AsyncSinkConfig {
    pub channel_capacity: usize,
    pub thread_name: String,
    pub flush_timeout: Duration,
}

impl AsyncSinkConfig {
    pub fn with_name(thread_name: &str) -> Self {
        AsyncSinkConfig {
            channel_capacity: DEFAULT_CHANNEL_SIZE,
            thread_name: thread_name.to_string(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

impl Default for AsyncSinkConfig {
    fn default() -> Self {
        AsyncSinkConfig::with_name(DEFAULT_THREAD_NAME)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkTarget {
    Discard,
    Stream(StreamTarget),
}

impl Default for SinkTarget {
    fn default() -> Self {
        SinkTarget::Stream(StreamTarget::Stdout)
    }
}

#[derive(Clone, Debug)]
pub struct CloudLogConfig {
    pub(crate) project_id: String,
    pub(crate) resource_type: String,
    pub(crate) labels: BTreeMap<String, String>,
    pub(crate) trace_headers: Vec<HeaderName>,
    pub(crate) local_echo: bool,
    pub(crate) target: SinkTarget,
    pub(crate) async_conf: AsyncSinkConfig,
}

impl CloudLogConfig {
    pub fn new(project_id: &str) -> Self {
        CloudLogConfig {
            project_id: project_id.to_string(),
            resource_type: DEFAULT_RESOURCE_TYPE.to_string(),
            labels: BTreeMap::new(),
            trace_headers: crate::trace::default_trace_headers(),
            local_echo: false,
            target: SinkTarget::default(),
            async_conf: AsyncSinkConfig::default(),
        }
    }

    #[inline]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn set_project_id(&mut self, project_id: String) {
        self.project_id = project_id;
    }

    pub fn set_resource_type(&mut self, resource_type: String) {
        self.resource_type = resource_type;
    }

    pub fn add_label(&mut self, key: String, value: String) {
        self.labels.insert(key, value);
    }

    pub fn set_trace_headers(&mut self, headers: Vec<HeaderName>) {
        self.trace_headers = headers;
    }

    pub fn set_local_echo(&mut self, enable: bool) {
        self.local_echo = enable;
    }

    pub fn set_target(&mut self, target: SinkTarget) {
        self.target = target;
    }

    pub fn set_async_conf(&mut self, async_conf: AsyncSinkConfig) {
        self.async_conf = async_conf;
    }
}
