//! One typed contract shared by both sides of a JSON-over-HTTP call.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::Caller;
use crate::config::{Config, StrictConfig};
use crate::error::EndpointError;
use crate::handler::{Exchange, RouteHandler};
use crate::http::Headers;
use crate::sender::{ReqwestSender, Sender};

/// An endpoint taking `Req` and answering `Res`.
///
/// The configuration is resolved once at construction and never changes. The
/// client role (`caller`, `call`) and the server role (`handler`) both read
/// the same `StrictConfig`, so the two sides cannot drift apart.
pub struct Endpoint<Req, Res> {
    config: Arc<StrictConfig>,
    sender: Arc<dyn Sender>,
    _payload: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res> Clone for Endpoint<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            sender: self.sender.clone(),
            _payload: PhantomData,
        }
    }
}

impl<Req, Res> std::fmt::Debug for Endpoint<Req, Res> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<Req, Res> Endpoint<Req, Res>
where
    Req: Serialize + DeserializeOwned + Send + 'static,
    Res: Serialize + DeserializeOwned + Send + 'static,
{
    /// Build an endpoint that sends over the network with `ReqwestSender`.
    pub fn new(config: impl Into<Config>) -> Result<Self, EndpointError> {
        Self::with_sender(config, Arc::new(ReqwestSender::default()))
    }

    /// Build an endpoint whose client role goes through `sender`.
    pub fn with_sender(
        config: impl Into<Config>,
        sender: Arc<dyn Sender>,
    ) -> Result<Self, EndpointError> {
        let config = config.into().resolve()?;
        Ok(Self {
            config: Arc::new(config),
            sender,
            _payload: PhantomData,
        })
    }

    pub fn config(&self) -> &StrictConfig {
        &self.config
    }

    pub fn caller(&self) -> Caller<Req, Res> {
        Caller::new(self.config.clone(), self.sender.clone())
    }

    pub async fn call(&self, data: &Req) -> Result<Res, EndpointError> {
        self.caller().call(data).await
    }

    pub async fn call_with_headers(
        &self,
        data: &Req,
        fragments: &[Headers],
    ) -> Result<Res, EndpointError> {
        self.caller().call_with_headers(data, fragments).await
    }

    /// Route layer answering this endpoint with an async handler.
    pub fn handler<H, Fut, E>(&self, handler: H) -> RouteHandler<Req, Res>
    where
        H: Fn(Req, Exchange) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
        E: Into<anyhow::Error>,
    {
        RouteHandler::new(self.config.clone(), handler)
    }

    /// Route layer answering this endpoint with a synchronous handler.
    pub fn handler_sync<H, E>(&self, handler: H) -> RouteHandler<Req, Res>
    where
        H: Fn(Req, Exchange) -> Result<Res, E> + Send + Sync + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        RouteHandler::new_sync(self.config.clone(), handler)
    }
}
