//! Endpoint definitions shared by the server and its clients.
//!
//! Each function returns the `Config` for one endpoint. The server mounts it
//! with an empty base; a client adds the server's address with `.base(..)`.

use serde::{Deserialize, Serialize};
use typed_endpoint::{Config, Method};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumRequest {
    pub values: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumResponse {
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivideRequest {
    pub dividend: i64,
    pub divisor: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivideResponse {
    pub quotient: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub name: String,
}

/// Body the server's error handler renders for any failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Any JSON value in, the same value out.
pub fn echo() -> Config {
    Config::new("/echo")
}

pub fn sum() -> Config {
    Config::new("/sum")
}

/// Fails in the handler when the divisor is zero.
pub fn divide() -> Config {
    Config::new("/divide").method(Method::Put)
}

/// The server answers 200 but clients of this contract expect 201.
pub fn created() -> Config {
    Config::new("/created").expect(201u16)
}
