//! Wire-agnostic request/response pair exchanged with a `Sender`.
//!
//! # Design
//! These types describe one HTTP round-trip as plain data. The client role
//! builds a `SenderRequest`, hands it to whichever `Sender` the endpoint was
//! constructed with, and interprets the `SenderResponse` it gets back. Tests
//! substitute a scripted sender and never touch the network.

use std::collections::BTreeMap;

use crate::config::Method;

/// Header name/value pairs. A later insert with the same name replaces the
/// earlier one.
pub type Headers = BTreeMap<String, String>;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// A request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderRequest {
    pub method: Method,
    pub url: String,
    pub body: String,
    pub headers: Headers,
}

/// A response described as plain data. Any status is a valid response here;
/// interpreting it is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderResponse {
    pub body: String,
    pub status: u16,
}

impl SenderResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            status,
        }
    }
}

/// Merge header fragments left-to-right over the JSON content-type default.
///
/// Names compare ASCII case-insensitively, and the spelling of the last
/// fragment to set a header is the one kept.
pub fn merge_headers<'a, I>(fragments: I) -> Headers
where
    I: IntoIterator<Item = &'a Headers>,
{
    let mut merged = Headers::new();
    merged.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
    for fragment in fragments {
        for (name, value) in fragment {
            merged.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            merged.insert(name.clone(), value.clone());
        }
    }
    merged
}
