/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::SocketAddr;

use http::header::{HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT};
use http::request::Parts;
use http::{Method, Request, Uri};

use crate::HttpRequestInfo;

/// The inbound request a [`ScopedLogger`](crate::ScopedLogger) is bound to.
#[derive(Clone, Debug)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    peer_addr: Option<SocketAddr>,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri) -> Self {
        RequestContext {
            method,
            uri,
            headers: HeaderMap::new(),
            peer_addr: None,
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        RequestContext {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            peer_addr: None,
        }
    }

    pub fn from_request<B>(req: &Request<B>) -> Self {
        RequestContext {
            method: req.method().clone(),
            uri: req.uri().clone(),
            headers: req.headers().clone(),
            peer_addr: None,
        }
    }

    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Value of the first `name` header, if it is valid visible ASCII.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn http_info(&self) -> HttpRequestInfo {
        HttpRequestInfo {
            method: self.method.as_str().to_string(),
            url: MaskedUri(&self.uri).to_string(),
            user_agent: self.header(&USER_AGENT).map(str::to_string),
            referer: self.header(&REFERER).map(str::to_string),
            remote_ip: self.peer_addr.map(|addr| addr.ip().to_string()),
            status: None,
            latency: None,
        }
    }
}

/// Uri display with the userinfo password replaced.
struct MaskedUri<'a>(&'a Uri);

impl fmt::Display for MaskedUri<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = self.0.scheme() {
            write!(f, "{scheme}://")?;
        }

        if let Some(authority) = self.0.authority() {
            let s = authority.as_str();
            match memchr::memrchr(b'@', s.as_bytes()) {
                Some(at_pos) => match memchr::memchr(b':', &s.as_bytes()[0..at_pos]) {
                    Some(p) => write!(f, "{}xyz{}", &s[0..=p], &s[at_pos..])?,
                    None => f.write_str(s)?,
                },
                None => f.write_str(s)?,
            }
        }

        f.write_str(self.0.path())?;
        if let Some(query) = self.0.query() {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}
