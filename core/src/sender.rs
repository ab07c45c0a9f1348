//! The transport seam: something that turns a `SenderRequest` into a
//! `SenderResponse`.
//!
//! Each `Endpoint` is constructed with its own `Arc<dyn Sender>`. Production
//! code uses `ReqwestSender`; tests pass a scripted sender built with
//! `sender_fn`.

use std::future::Future;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::http::{SenderRequest, SenderResponse};

#[async_trait]
pub trait Sender: Send + Sync {
    /// Perform the round-trip. Only transport failures are errors; any HTTP
    /// status comes back as a `SenderResponse`.
    async fn send(&self, request: SenderRequest) -> anyhow::Result<SenderResponse>;
}

/// Default sender backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestSender {
    client: reqwest::Client,
}

impl ReqwestSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Sender for ReqwestSender {
    async fn send(&self, request: SenderRequest) -> anyhow::Result<SenderResponse> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        let response = self
            .client
            .request(request.method.into(), request.url.as_str())
            .headers(headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(SenderResponse { body, status })
    }
}

/// Sender built from an async closure.
pub struct FnSender<F>(F);

/// Wrap an async closure as a `Sender`.
pub fn sender_fn<F, Fut>(f: F) -> FnSender<F>
where
    F: Fn(SenderRequest) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<SenderResponse>> + Send,
{
    FnSender(f)
}

#[async_trait]
impl<F, Fut> Sender for FnSender<F>
where
    F: Fn(SenderRequest) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<SenderResponse>> + Send,
{
    async fn send(&self, request: SenderRequest) -> anyhow::Result<SenderResponse> {
        (self.0)(request).await
    }
}
