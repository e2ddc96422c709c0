//! Per-request matching rules for the test protocol handler.
//!
//! A [`RequestMatcher`] narrows which requests the handler claims once
//! interception is enabled. The default matcher has no conditions and claims
//! everything. All configured conditions must hold for a request to match.

use crate::protocol::InterceptedRequest;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Path condition, written as `{ exact: "/a" }`, `{ prefix: "/api" }` or
/// `{ regex: "^/v\\d+/" }` in fixture files.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum PathMatcher {
    Exact { exact: String },
    Prefix { prefix: String },
    Regex { regex: String },
}

/// Matching rule configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestMatcher {
    /// HTTP method, compared case-insensitively
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Host name; `*.example.com` matches any subdomain of `example.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathMatcher>,
}

impl RequestMatcher {
    /// Matcher that claims every request.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn path_exact(mut self, path: impl Into<String>) -> Self {
        self.path = Some(PathMatcher::Exact { exact: path.into() });
        self
    }

    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path = Some(PathMatcher::Prefix {
            prefix: prefix.into(),
        });
        self
    }

    pub fn path_regex(mut self, regex: impl Into<String>) -> Self {
        self.path = Some(PathMatcher::Regex {
            regex: regex.into(),
        });
        self
    }

    pub fn is_any(&self) -> bool {
        self.method.is_none() && self.host.is_none() && self.path.is_none()
    }
}

#[derive(Debug, Clone)]
enum CompiledPath {
    Exact(String),
    Prefix(String),
    Regex(Arc<Regex>),
}

/// Compiled matcher for runtime evaluation.
#[derive(Debug, Clone, Default)]
pub struct CompiledRequestMatcher {
    method: Option<String>,
    host: Option<String>,
    path: Option<CompiledPath>,
}

impl CompiledRequestMatcher {
    /// Compile a [`RequestMatcher`]. Fails only on an invalid path regex.
    pub fn compile(matcher: &RequestMatcher) -> Result<Self, regex::Error> {
        let path = match &matcher.path {
            None => None,
            Some(PathMatcher::Exact { exact }) => Some(CompiledPath::Exact(exact.clone())),
            Some(PathMatcher::Prefix { prefix }) => Some(CompiledPath::Prefix(prefix.clone())),
            Some(PathMatcher::Regex { regex }) => {
                Some(CompiledPath::Regex(Arc::new(Regex::new(regex)?)))
            }
        };

        Ok(Self {
            method: matcher.method.clone(),
            host: matcher.host.as_ref().map(|h| h.to_ascii_lowercase()),
            path,
        })
    }

    pub fn matches(&self, request: &InterceptedRequest) -> bool {
        if let Some(method) = &self.method {
            if !request.method.as_str().eq_ignore_ascii_case(method) {
                return false;
            }
        }

        if let Some(pattern) = &self.host {
            match request.host() {
                Some(host) if host_matches(pattern, &host.to_ascii_lowercase()) => {}
                _ => return false,
            }
        }

        match &self.path {
            None => true,
            Some(CompiledPath::Exact(exact)) => request.uri.path() == exact,
            Some(CompiledPath::Prefix(prefix)) => request.uri.path().starts_with(prefix.as_str()),
            Some(CompiledPath::Regex(regex)) => regex.is_match(request.uri.path()),
        }
    }
}

fn host_matches(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(suffix) => host
            .strip_suffix(suffix)
            .is_some_and(|rest| rest.ends_with('.')),
        None => pattern == host,
    }
}
