//! Endpoint configuration and its normalized form.
//!
//! # Design
//! `Config` is what callers write: every field but `path` may be omitted, and
//! it can be built from a bare path or deserialized from a config file.
//! `Config::resolve` fills the defaults once and produces a `StrictConfig`,
//! which is what the client and server roles read for the lifetime of an
//! `Endpoint`. Nothing mutates a `StrictConfig` after construction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EndpointError;

/// Status code every endpoint expects when `expect` is omitted.
pub const DEFAULT_EXPECT: u16 = 200;

/// HTTP verb an endpoint is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Patch => http::Method::PATCH,
            Method::Delete => http::Method::DELETE,
            Method::Head => http::Method::HEAD,
            Method::Options => http::Method::OPTIONS,
        }
    }
}

impl PartialEq<http::Method> for Method {
    fn eq(&self, other: &http::Method) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Acceptable response status: a single code or a set of codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expect {
    One(u16),
    Many(Vec<u16>),
}

impl From<u16> for Expect {
    fn from(status: u16) -> Self {
        Expect::One(status)
    }
}

impl From<Vec<u16>> for Expect {
    fn from(statuses: Vec<u16>) -> Self {
        Expect::Many(statuses)
    }
}

impl<const N: usize> From<[u16; N]> for Expect {
    fn from(statuses: [u16; N]) -> Self {
        Expect::Many(statuses.to_vec())
    }
}

impl Expect {
    fn into_codes(self) -> Vec<u16> {
        let mut codes = match self {
            Expect::One(status) => vec![status],
            Expect::Many(statuses) => statuses,
        };
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}

/// User-facing endpoint configuration. Only `path` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<Expect>,
}

impl Config {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn expect(mut self, expect: impl Into<Expect>) -> Self {
        self.expect = Some(expect.into());
        self
    }

    /// Fill in defaults and validate. Fails when `path` is missing, empty,
    /// not rooted at `/`, or when `expect` names no status at all.
    pub fn resolve(self) -> Result<StrictConfig, EndpointError> {
        let path = match self.path {
            Some(path) if !path.is_empty() => path,
            _ => return Err(EndpointError::Config("path is required".to_string())),
        };
        if !path.starts_with('/') {
            return Err(EndpointError::Config(format!(
                "path must start with '/': {path:?}"
            )));
        }

        let expect = self
            .expect
            .map(Expect::into_codes)
            .unwrap_or_else(|| vec![DEFAULT_EXPECT]);
        if expect.is_empty() {
            return Err(EndpointError::Config(format!(
                "expect must name at least one status for {path}"
            )));
        }
        if let Some(bad) = expect.iter().find(|status| !(100..=599).contains(*status)) {
            return Err(EndpointError::Config(format!(
                "expect holds {bad}, which is not an HTTP status, for {path}"
            )));
        }

        Ok(StrictConfig {
            method: self.method.unwrap_or_default(),
            base: self.base.unwrap_or_default(),
            path,
            expect,
        })
    }
}

impl From<&str> for Config {
    fn from(path: &str) -> Self {
        Config::new(path)
    }
}

impl From<String> for Config {
    fn from(path: String) -> Self {
        Config::new(path)
    }
}

/// Fully resolved configuration. Every field has a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrictConfig {
    method: Method,
    base: String,
    path: String,
    expect: Vec<u16>,
}

impl StrictConfig {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Expected statuses, sorted and deduplicated.
    pub fn expect(&self) -> &[u16] {
        &self.expect
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base, self.path)
    }

    pub fn accepts(&self, status: u16) -> bool {
        self.expect.contains(&status)
    }
}

impl fmt::Display for StrictConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.method, self.base, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_fields_take_defaults() {
        let strict = Config::new("/foo").resolve().unwrap();
        assert_eq!(strict.method(), Method::Post);
        assert_eq!(strict.base(), "");
        assert_eq!(strict.path(), "/foo");
        assert_eq!(strict.expect(), &[200]);
    }

    #[test]
    fn bare_path_converts_into_config() {
        let strict = Config::from("/bar").resolve().unwrap();
        assert_eq!(strict.path(), "/bar");
        assert_eq!(strict.url(), "/bar");
    }

    #[test]
    fn single_expect_becomes_a_set() {
        let strict = Config::new("/echo").expect(201u16).resolve().unwrap();
        assert_eq!(strict.expect(), &[201]);
        assert!(strict.accepts(201));
        assert!(!strict.accepts(200));
    }

    #[test]
    fn expect_list_is_deduplicated() {
        let strict = Config::new("/x").expect([204u16, 200, 204]).resolve().unwrap();
        assert_eq!(strict.expect(), &[200, 204]);
    }

    #[test]
    fn missing_path_fails_fast() {
        let err = Config::default().resolve().unwrap_err();
        assert!(matches!(err, EndpointError::Config(_)));

        let err = Config::new("").resolve().unwrap_err();
        assert!(matches!(err, EndpointError::Config(_)));
    }

    #[test]
    fn unrooted_path_is_rejected() {
        let err = Config::new("foo").resolve().unwrap_err();
        assert!(matches!(err, EndpointError::Config(_)));
    }

    #[test]
    fn empty_expect_list_is_rejected() {
        let err = Config::new("/x").expect(Vec::<u16>::new()).resolve().unwrap_err();
        assert!(matches!(err, EndpointError::Config(_)));
    }

    #[test]
    fn out_of_range_expect_is_rejected() {
        for status in [0u16, 99, 600, 1000] {
            let err = Config::new("/x").expect(status).resolve().unwrap_err();
            assert!(matches!(err, EndpointError::Config(_)), "{status}");
        }
        let err = Config::new("/x").expect([200u16, 1000]).resolve().unwrap_err();
        assert!(err.to_string().contains("1000"));

        let strict = Config::new("/x").expect([100u16, 599]).resolve().unwrap();
        assert_eq!(strict.expect(), &[100, 599]);
    }

    #[test]
    fn url_joins_base_and_path() {
        let strict = Config::new("/items")
            .base("http://localhost:3000")
            .method(Method::Get)
            .resolve()
            .unwrap();
        assert_eq!(strict.url(), "http://localhost:3000/items");
        assert_eq!(strict.to_string(), "GET http://localhost:3000/items");
    }

    #[test]
    fn config_deserializes_from_json() {
        let config: Config =
            serde_json::from_str(r#"{"method":"PUT","path":"/items","expect":[200,201]}"#).unwrap();
        let strict = config.resolve().unwrap();
        assert_eq!(strict.method(), Method::Put);
        assert_eq!(strict.expect(), &[200, 201]);

        let config: Config = serde_json::from_str(r#"{"path":"/one","expect":204}"#).unwrap();
        assert_eq!(config.expect, Some(Expect::One(204)));
    }

    #[test]
    fn unknown_config_fields_are_rejected() {
        let result: Result<Config, _> = serde_json::from_str(r#"{"path":"/a","verb":"GET"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn method_compares_with_http_method() {
        assert!(Method::Post == http::Method::POST);
        assert!(Method::Get != http::Method::POST);
        assert_eq!(http::Method::from(Method::Patch), http::Method::PATCH);
    }
}
