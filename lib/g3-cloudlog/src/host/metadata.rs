/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use anyhow::{Context, anyhow};

const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";
const METADATA_DEFAULT_HOST: &str = "169.254.169.254";
const METADATA_FLAVOR_HEADER: &str = "metadata-flavor";
const METADATA_FLAVOR_VALUE: &str = "Google";
const INSTANCE_NAME_PATH: &str = "/computeMetadata/v1/instance/name";
const MAX_RESPONSE_SIZE: u64 = 16 * 1024;

/// Lookup of the instance name from the hosting platform.
pub trait InstanceMetadata {
    fn on_cloud(&self) -> bool;

    fn instance_name(&self) -> anyhow::Result<String>;
}

pub struct GceMetadata {
    host: String,
    host_from_env: bool,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Default for GceMetadata {
    fn default() -> Self {
        match std::env::var(METADATA_HOST_ENV) {
            Ok(host) if !host.is_empty() => GceMetadata::with_host(host, true),
            _ => GceMetadata::with_host(METADATA_DEFAULT_HOST.to_string(), false),
        }
    }
}

impl GceMetadata {
    fn with_host(host: String, host_from_env: bool) -> Self {
        GceMetadata {
            host,
            host_from_env,
            connect_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_secs(2),
        }
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    fn server_addr(&self) -> anyhow::Result<SocketAddr> {
        let host = if self.host.contains(':') {
            self.host.clone()
        } else {
            format!("{}:80", self.host)
        };
        host.to_socket_addrs()
            .map_err(|e| anyhow!("failed to resolve {host}: {e}"))?
            .next()
            .ok_or_else(|| anyhow!("no address found for {host}"))
    }

    fn get(&self, path: &str) -> anyhow::Result<MetadataResponse> {
        let addr = self.server_addr()?;
        let mut stream = TcpStream::connect_timeout(&addr, self.connect_timeout)
            .map_err(|e| anyhow!("failed to connect to metadata server {addr}: {e}"))?;
        stream
            .set_read_timeout(Some(self.read_timeout))
            .context("failed to set read timeout")?;
        stream
            .set_write_timeout(Some(self.read_timeout))
            .context("failed to set write timeout")?;

        let req = format!(
            "GET {path} HTTP/1.0\r\nHost: {}\r\n{METADATA_FLAVOR_HEADER}: {METADATA_FLAVOR_VALUE}\r\n\r\n",
            self.host
        );
        stream
            .write_all(req.as_bytes())
            .context("failed to send metadata request")?;

        let mut buf = Vec::with_capacity(1024);
        stream
            .take(MAX_RESPONSE_SIZE)
            .read_to_end(&mut buf)
            .context("failed to read metadata response")?;
        MetadataResponse::parse(&buf)
    }
}

impl InstanceMetadata for GceMetadata {
    fn on_cloud(&self) -> bool {
        if self.host_from_env {
            return true;
        }
        match self.get("/") {
            Ok(rsp) => rsp.google_flavor,
            Err(_) => false,
        }
    }

    fn instance_name(&self) -> anyhow::Result<String> {
        let rsp = self.get(INSTANCE_NAME_PATH)?;
        if rsp.status != 200 {
            return Err(anyhow!("metadata server returned status {}", rsp.status));
        }
        let name = rsp.body.trim();
        if name.is_empty() {
            Err(anyhow!("empty instance name"))
        } else {
            Ok(name.to_string())
        }
    }
}

#[derive(Debug)]
struct MetadataResponse {
    status: u16,
    google_flavor: bool,
    body: String,
}

impl MetadataResponse {
    fn parse(buf: &[u8]) -> anyhow::Result<Self> {
        let hdr_end = memchr::memmem::find(buf, b"\r\n\r\n")
            .ok_or_else(|| anyhow!("incomplete metadata response header"))?;
        let header = std::str::from_utf8(&buf[..hdr_end])
            .map_err(|e| anyhow!("invalid metadata response header: {e}"))?;

        let mut lines = header.split("\r\n");
        let status_line = lines.next().unwrap_or_default();
        let mut parts = status_line.splitn(3, ' ');
        match parts.next() {
            Some(version) if version.starts_with("HTTP/1.") => {}
            _ => return Err(anyhow!("invalid status line: {status_line}")),
        }
        let status = parts
            .next()
            .and_then(|s| s.parse::<u16>().ok())
            .ok_or_else(|| anyhow!("invalid status code in {status_line}"))?;

        let google_flavor = lines.any(|line| {
            line.split_once(':').is_some_and(|(name, value)| {
                name.trim().eq_ignore_ascii_case(METADATA_FLAVOR_HEADER)
                    && value.trim() == METADATA_FLAVOR_VALUE
            })
        });

        let body = String::from_utf8_lossy(&buf[hdr_end + 4..]).to_string();
        Ok(MetadataResponse {
            status,
            google_flavor,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn parse_ok() {
        let rsp = MetadataResponse::parse(
            b"HTTP/1.0 200 OK\r\nMetadata-Flavor: Google\r\nContent-Type: application/text\r\n\r\ninstance-1\n",
        )
        .unwrap();
        assert_eq!(rsp.status, 200);
        assert!(rsp.google_flavor);
        assert_eq!(rsp.body, "instance-1\n");
    }

    #[test]
    fn parse_not_google() {
        let rsp = MetadataResponse::parse(b"HTTP/1.1 404 Not Found\r\nServer: nginx\r\n\r\n").unwrap();
        assert_eq!(rsp.status, 404);
        assert!(!rsp.google_flavor);
        assert!(rsp.body.is_empty());
    }

    #[test]
    fn parse_err() {
        assert!(MetadataResponse::parse(b"HTTP/1.1 200 OK\r\n").is_err());
        assert!(MetadataResponse::parse(b"SSH-2.0-OpenSSH\r\n\r\n").is_err());
        assert!(MetadataResponse::parse(b"HTTP/1.1 abc\r\n\r\n").is_err());
    }

    #[test]
    fn instance_name_from_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut req = Vec::new();
            let mut buf = [0u8; 1024];
            while memchr::memmem::find(&req, b"\r\n\r\n").is_none() {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                req.extend_from_slice(&buf[..n]);
            }
            let req = String::from_utf8(req).unwrap();
            stream
                .write_all(b"HTTP/1.0 200 OK\r\nMetadata-Flavor: Google\r\n\r\ninstance-7")
                .unwrap();
            req
        });

        let metadata = GceMetadata::with_host(addr.to_string(), true);
        assert!(metadata.on_cloud());
        assert_eq!(metadata.instance_name().unwrap(), "instance-7");

        let req = server.join().unwrap();
        assert!(req.starts_with("GET /computeMetadata/v1/instance/name HTTP/1.0\r\n"));
        assert!(req.contains("metadata-flavor: Google\r\n"));
    }

    #[test]
    fn unreachable_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut metadata = GceMetadata::with_host(addr.to_string(), false);
        metadata.set_connect_timeout(Duration::from_millis(100));
        assert!(!metadata.on_cloud());
        assert!(metadata.instance_name().is_err());
    }
}
