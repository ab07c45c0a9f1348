//! Typed JSON-over-HTTP endpoints shared by client and server.
//!
//! # Overview
//! An `Endpoint<Req, Res>` is built from one `Config` (method, base, path,
//! expected statuses). The same value produces a `Caller` that sends `Req`
//! and decodes `Res`, and a `RouteHandler` layer that decodes `Req`, runs a
//! user handler and answers with `Res`.
//!
//! # Design
//! - The transport is an injected `Sender`, never a global. `ReqwestSender`
//!   is the default; tests use `sender_fn` with scripted responses.
//! - `RouteHandler` is a tower layer. Requests it does not claim fall through
//!   to the next service, so endpoints stack over a single fallback.
//! - Server-side failures are never answered directly: they are forwarded as
//!   a 500 carrying a `ForwardedError` for an outer error handler.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod handler;
pub mod http;
pub mod sender;

pub use client::Caller;
pub use config::{Config, Expect, Method, StrictConfig};
pub use endpoint::Endpoint;
pub use error::EndpointError;
pub use handler::{Exchange, ForwardedError, HeadersSent, RouteHandler, RouteService};
pub use crate::http::{merge_headers, Headers, SenderRequest, SenderResponse};
pub use sender::{sender_fn, ReqwestSender, Sender};
