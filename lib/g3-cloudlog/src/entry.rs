/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::Severity;

pub const DEFAULT_RESOURCE_TYPE: &str = "gce_instance";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl MonitoredResource {
    pub fn new(kind: &str) -> Self {
        MonitoredResource {
            kind: kind.to_string(),
            labels: BTreeMap::new(),
        }
    }
}

impl Default for MonitoredResource {
    fn default() -> Self {
        MonitoredResource::new(DEFAULT_RESOURCE_TYPE)
    }
}

/// The http block attached to request scoped entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequestInfo {
    #[serde(rename = "requestMethod")]
    pub method: String,
    #[serde(rename = "requestUrl")]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_latency"
    )]
    pub latency: Option<Duration>,
}

fn serialize_latency<S>(latency: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match latency {
        Some(d) => {
            serializer.collect_str(&format_args!("{}.{:09}s", d.as_secs(), d.subsec_nanos()))
        }
        None => serializer.serialize_none(),
    }
}

fn serialize_timestamp<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// A single structured log entry.
///
/// Entries are built once and then moved into a [`LogSink`](crate::LogSink),
/// so there is no way to change them after submission.
#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: DateTime<Utc>,
    severity: Severity,
    #[serde(rename = "message", skip_serializing_if = "String::is_empty")]
    payload: String,
    #[serde(
        rename = "logging.googleapis.com/logName",
        skip_serializing_if = "String::is_empty"
    )]
    log_name: String,
    #[serde(
        rename = "logging.googleapis.com/trace",
        skip_serializing_if = "Option::is_none"
    )]
    trace: Option<String>,
    #[serde(
        rename = "logging.googleapis.com/labels",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    labels: BTreeMap<String, String>,
    #[serde(
        rename = "logging.googleapis.com/resource",
        skip_serializing_if = "Option::is_none"
    )]
    resource: Option<MonitoredResource>,
    #[serde(rename = "httpRequest", skip_serializing_if = "Option::is_none")]
    http_request: Option<HttpRequestInfo>,
}

impl LogEntry {
    pub fn new<T: Into<String>>(severity: Severity, payload: T) -> Self {
        LogEntry {
            timestamp: Utc::now(),
            severity,
            payload: payload.into(),
            log_name: String::new(),
            trace: None,
            labels: BTreeMap::new(),
            resource: None,
            http_request: None,
        }
    }

    pub fn with_log_name(mut self, log_name: String) -> Self {
        self.log_name = log_name;
        self
    }

    pub fn with_trace(mut self, trace: String) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn with_labels(mut self, labels: &BTreeMap<String, String>) -> Self {
        self.labels
            .extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn with_resource(mut self, resource: Option<&MonitoredResource>) -> Self {
        self.resource = resource.cloned();
        self
    }

    pub fn with_http_request(mut self, http_request: HttpRequestInfo) -> Self {
        self.http_request = Some(http_request);
        self
    }

    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[inline]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    #[inline]
    pub fn log_name(&self) -> &str {
        &self.log_name
    }

    #[inline]
    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    #[inline]
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    #[inline]
    pub fn resource(&self) -> Option<&MonitoredResource> {
        self.resource.as_ref()
    }

    #[inline]
    pub fn http_request(&self) -> Option<&HttpRequestInfo> {
        self.http_request.as_ref()
    }

    pub fn to_json_line(&self, buf: &mut Vec<u8>) -> serde_json::Result<()> {
        serde_json::to_writer(&mut *buf, self)?;
        buf.push(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn to_value(entry: &LogEntry) -> Value {
        let mut buf = Vec::new();
        entry.to_json_line(&mut buf).unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn plain_entry() {
        let entry = LogEntry::new(Severity::Warning, "disk almost full");
        let v = to_value(&entry);
        assert_eq!(v["severity"], "WARNING");
        assert_eq!(v["message"], "disk almost full");
        assert!(v["timestamp"].as_str().unwrap().ends_with('Z'));
        assert!(v.get("logging.googleapis.com/trace").is_none());
        assert!(v.get("logging.googleapis.com/labels").is_none());
        assert!(v.get("httpRequest").is_none());
    }

    #[test]
    fn summary_entry() {
        let mut labels = BTreeMap::new();
        labels.insert("hostname".to_string(), "node-1".to_string());
        let http = HttpRequestInfo {
            method: "GET".to_string(),
            url: "/index.html".to_string(),
            status: Some(200),
            latency: Some(Duration::from_millis(1500)),
            ..Default::default()
        };
        let entry = LogEntry::new(Severity::Error, String::new())
            .with_log_name("projects/p/logs/api-request".to_string())
            .with_trace("abc123".to_string())
            .with_labels(&labels)
            .with_resource(Some(&MonitoredResource::default()))
            .with_http_request(http);

        let v = to_value(&entry);
        assert!(v.get("message").is_none());
        assert_eq!(v["logging.googleapis.com/logName"], "projects/p/logs/api-request");
        assert_eq!(v["logging.googleapis.com/trace"], "abc123");
        assert_eq!(v["logging.googleapis.com/labels"]["hostname"], "node-1");
        assert_eq!(v["logging.googleapis.com/resource"]["type"], "gce_instance");
        assert_eq!(v["httpRequest"]["requestMethod"], "GET");
        assert_eq!(v["httpRequest"]["requestUrl"], "/index.html");
        assert_eq!(v["httpRequest"]["status"], 200);
        assert_eq!(v["httpRequest"]["latency"], "1.500000000s");
        assert!(v["httpRequest"].get("userAgent").is_none());
    }
}
