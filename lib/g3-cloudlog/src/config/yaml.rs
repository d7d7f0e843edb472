/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use http::HeaderName;
use yaml_rust::{Yaml, yaml};

use super::{AsyncSinkConfig, CloudLogConfig, SinkTarget};
use crate::StreamTarget;

fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

fn foreach_kv<F>(map: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in map.iter() {
        let Yaml::String(key) = k else {
            return Err(anyhow!("key in map should be string"));
        };
        f(key, v).context(format!("failed to parse value of key {key}"))?;
    }
    Ok(())
}

fn as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) => Ok(s.to_string()),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(s) => Ok(s.to_string()),
        _ => Err(anyhow!(
            "yaml value type for string should be 'string' / 'integer' / 'real'"
        )),
    }
}

fn as_bool(v: &Yaml) -> anyhow::Result<bool> {
    match v {
        Yaml::Boolean(b) => Ok(*b),
        Yaml::Integer(i) => Ok(*i != 0),
        Yaml::String(s) => match s.to_lowercase().as_str() {
            "on" | "true" | "yes" | "1" => Ok(true),
            "off" | "false" | "no" | "0" => Ok(false),
            _ => Err(anyhow!("invalid yaml string value for 'bool': {s}")),
        },
        _ => Err(anyhow!(
            "yaml value type for 'bool' should be 'boolean' / 'string' / 'integer'"
        )),
    }
}

fn as_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::Integer(i) => Ok(usize::try_from(*i)?),
        Yaml::String(s) => Ok(usize::from_str(s)?),
        _ => Err(anyhow!(
            "yaml value type for 'usize' should be 'string' or 'integer'"
        )),
    }
}

fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(s) => match humanize_rs::duration::parse(s) {
            Ok(d) => Ok(d),
            Err(humanize_rs::ParseError::MissingUnit) => {
                let secs = u64::from_str(s).map_err(|_| anyhow!("invalid duration string"))?;
                Ok(Duration::from_secs(secs))
            }
            Err(e) => Err(anyhow!("invalid humanize duration string: {e}")),
        },
        Yaml::Integer(i) => {
            let secs = u64::try_from(*i).map_err(|_| anyhow!("negative duration"))?;
            Ok(Duration::from_secs(secs))
        }
        _ => Err(anyhow!(
            "yaml value type for duration should be 'string' or 'integer'"
        )),
    }
}

fn as_header_name(v: &Yaml) -> anyhow::Result<HeaderName> {
    let s = as_string(v)?;
    HeaderName::from_str(&s).map_err(|e| anyhow!("invalid header name {s}: {e}"))
}

fn as_stream_file(v: &Yaml) -> anyhow::Result<StreamTarget> {
    let path = PathBuf::from(as_string(v)?);
    if path.is_absolute() {
        Ok(StreamTarget::File(path))
    } else {
        Err(anyhow!("path {} should be absolute", path.display()))
    }
}

impl SinkTarget {
    fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        match v {
            Yaml::String(s) => match normalize_key(s).as_str() {
                "discard" => Ok(SinkTarget::Discard),
                "stdout" => Ok(SinkTarget::Stream(StreamTarget::Stdout)),
                "stderr" => Ok(SinkTarget::Stream(StreamTarget::Stderr)),
                _ => Err(anyhow!("invalid sink target {s}")),
            },
            Yaml::Hash(map) => {
                let mut target = None;
                foreach_kv(map, |k, v| match normalize_key(k).as_str() {
                    "file" | "path" => {
                        target = Some(SinkTarget::Stream(as_stream_file(v)?));
                        Ok(())
                    }
                    _ => Err(anyhow!("invalid key {k}")),
                })?;
                target.ok_or_else(|| anyhow!("no file path has been set"))
            }
            _ => Err(anyhow!(
                "yaml value type for 'sink target' should be 'string' or 'map'"
            )),
        }
    }
}

impl CloudLogConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!(
                "yaml value type for 'cloud log config' should be 'map'"
            ));
        };

        let mut config = CloudLogConfig::new("");
        let mut async_conf = AsyncSinkConfig::default();
        foreach_kv(map, |k, v| match normalize_key(k).as_str() {
            "project_id" | "project" => {
                config.project_id = as_string(v)?;
                Ok(())
            }
            "resource_type" | "resource" => {
                config.resource_type = as_string(v)?;
                Ok(())
            }
            "labels" | "common_labels" => {
                let Yaml::Hash(labels) = v else {
                    return Err(anyhow!("yaml value type for key {k} should be 'map'"));
                };
                foreach_kv(labels, |lk, lv| {
                    config.labels.insert(lk.to_string(), as_string(lv)?);
                    Ok(())
                })
            }
            "trace_headers" | "trace_header" => {
                config.trace_headers = match v {
                    Yaml::Array(seq) => seq
                        .iter()
                        .enumerate()
                        .map(|(i, v)| {
                            as_header_name(v).context(format!("invalid header name #{i}"))
                        })
                        .collect::<anyhow::Result<Vec<_>>>()?,
                    _ => vec![as_header_name(v)?],
                };
                Ok(())
            }
            "local_echo" | "local" => {
                config.local_echo = as_bool(v)?;
                Ok(())
            }
            "target" => {
                config.target = SinkTarget::parse_yaml(v)?;
                Ok(())
            }
            "async_channel_size" | "channel_size" => {
                async_conf.channel_capacity = as_usize(v)?;
                Ok(())
            }
            "thread_name" => {
                async_conf.thread_name = as_string(v)?;
                Ok(())
            }
            "flush_timeout" => {
                async_conf.flush_timeout = as_duration(v)?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        })?;
        config.async_conf = async_conf;

        if config.project_id.is_empty() {
            return Err(anyhow!("no project id has been set"));
        }
        Ok(config)
    }
}
