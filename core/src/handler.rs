//! Server role of an endpoint: a tower layer that claims one route.
//!
//! # Design
//! `RouteHandler` wraps the next service of a dispatch chain. A request whose
//! method or path differs from the endpoint's is passed to that next service
//! untouched, so any number of endpoints can be stacked over one fallback.
//! A claimed request goes through: pre-condition check, body ingestion, JSON
//! decoding, the user handler, post-condition check, JSON encoding, send.
//!
//! The endpoint owns sending. Any failure along the way is forwarded instead:
//! the response is a bare 500 carrying a `ForwardedError` extension, which an
//! outer error-handling layer may inspect and rewrite. The error text itself
//! never reaches the client from here.
//!
//! `HeadersSent` is for middleware placed ahead of the endpoints that can
//! commit a response and still pass the request on, such as an audit or
//! short-circuit cache layer. It marks the request so the endpoint refuses it.

use std::convert::Infallible;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::request::Parts;
use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower::{Layer, Service};

use crate::config::StrictConfig;
use crate::error::EndpointError;
use crate::http::APPLICATION_JSON;

/// Largest request body a `RouteHandler` reads unless told otherwise (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Request extension set by an earlier link of the chain that has already
/// committed a response. An endpoint seeing it refuses to handle the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadersSent;

/// Response extension carrying the error an endpoint forwarded instead of
/// answering.
#[derive(Debug, Clone)]
pub struct ForwardedError(pub Arc<EndpointError>);

/// Direct access to the framework request and response for a user handler.
///
/// Headers inserted here are copied onto the endpoint's response, except
/// `Content-Type`, which is always `application/json`. Calling `send` takes
/// response ownership away from the endpoint; the endpoint then forwards a
/// protocol violation instead of answering twice.
#[derive(Clone)]
pub struct Exchange {
    request: Arc<Parts>,
    response: Arc<Mutex<ResponseState>>,
}

#[derive(Default)]
struct ResponseState {
    headers: HeaderMap,
    sent: Option<Response>,
}

impl Exchange {
    fn new(request: Parts) -> Self {
        Self {
            request: Arc::new(request),
            response: Arc::new(Mutex::new(ResponseState::default())),
        }
    }

    /// Method, URI, headers and extensions of the incoming request.
    pub fn request(&self) -> &Parts {
        &self.request
    }

    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.response.lock().headers.insert(name, value);
    }

    pub fn send(&self, response: impl IntoResponse) {
        self.response.lock().sent = Some(response.into_response());
    }

    pub fn headers_sent(&self) -> bool {
        self.response.lock().sent.is_some()
    }

    fn take_headers(&self) -> HeaderMap {
        std::mem::take(&mut self.response.lock().headers)
    }
}

type BoxHandler<Req, Res> =
    Arc<dyn Fn(Req, Exchange) -> BoxFuture<'static, anyhow::Result<Res>> + Send + Sync>;

/// Layer that serves one endpoint and defers everything else to the next
/// service in the chain.
pub struct RouteHandler<Req, Res> {
    config: Arc<StrictConfig>,
    handler: BoxHandler<Req, Res>,
    body_limit: usize,
    _payload: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res> Clone for RouteHandler<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            handler: self.handler.clone(),
            body_limit: self.body_limit,
            _payload: PhantomData,
        }
    }
}

impl<Req, Res> RouteHandler<Req, Res>
where
    Req: DeserializeOwned + Send + 'static,
    Res: Serialize + Send + 'static,
{
    pub(crate) fn new<H, Fut, E>(config: Arc<StrictConfig>, handler: H) -> Self
    where
        H: Fn(Req, Exchange) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
        E: Into<anyhow::Error>,
    {
        let handler: BoxHandler<Req, Res> = Arc::new(
            move |payload: Req, exchange: Exchange| -> BoxFuture<'static, anyhow::Result<Res>> {
                let pending = handler(payload, exchange);
                Box::pin(async move {
                    let result: anyhow::Result<Res> = pending.await.map_err(Into::into);
                    result
                })
            },
        );
        Self {
            config,
            handler,
            body_limit: DEFAULT_BODY_LIMIT,
            _payload: PhantomData,
        }
    }

    pub(crate) fn new_sync<H, E>(config: Arc<StrictConfig>, handler: H) -> Self
    where
        H: Fn(Req, Exchange) -> Result<Res, E> + Send + Sync + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        Self::new(config, move |payload, exchange| {
            std::future::ready(handler(payload, exchange))
        })
    }

    /// Cap the number of body bytes read before the request is rejected.
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn config(&self) -> &StrictConfig {
        &self.config
    }

    fn claims(&self, request: &Request) -> bool {
        self.config.method() == *request.method() && request.uri().path() == self.config.path()
    }

    async fn serve(self, request: Request) -> Response {
        match self.respond(request).await {
            Ok(response) => response,
            Err(err) => forward(err),
        }
    }

    async fn respond(&self, request: Request) -> Result<Response, EndpointError> {
        if request.extensions().get::<HeadersSent>().is_some() {
            return Err(self.violation("response was sent before the endpoint ran"));
        }

        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|source| EndpointError::Body {
                endpoint: self.config.clone(),
                source,
            })?;
        let payload: Req =
            serde_json::from_slice(&bytes).map_err(|source| EndpointError::Deserialization {
                endpoint: self.config.clone(),
                source,
            })?;
        tracing::debug!(endpoint = %self.config, "request claimed");

        let exchange = Exchange::new(parts);
        let result = (self.handler)(payload, exchange.clone())
            .await
            .map_err(|source| EndpointError::Handler {
                endpoint: self.config.clone(),
                source,
            })?;
        if exchange.headers_sent() {
            return Err(self.violation("handler sent its own response"));
        }

        let body = serde_json::to_string(&result).map_err(|source| EndpointError::Serialization {
            endpoint: self.config.clone(),
            source,
        })?;

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = StatusCode::OK;
        response.headers_mut().extend(exchange.take_headers());
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        Ok(response)
    }

    fn violation(&self, reason: &'static str) -> EndpointError {
        EndpointError::ProtocolViolation {
            endpoint: self.config.clone(),
            reason,
        }
    }
}

impl<S, Req, Res> Layer<S> for RouteHandler<Req, Res> {
    type Service = RouteService<S, Req, Res>;

    fn layer(&self, inner: S) -> Self::Service {
        RouteService {
            inner,
            route: self.clone(),
        }
    }
}

/// Service produced by `RouteHandler`; `inner` is the next link in the chain.
pub struct RouteService<S, Req, Res> {
    inner: S,
    route: RouteHandler<Req, Res>,
}

impl<S: Clone, Req, Res> Clone for RouteService<S, Req, Res> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            route: self.route.clone(),
        }
    }
}

impl<S, Req, Res> Service<Request> for RouteService<S, Req, Res>
where
    S: Service<Request, Response = Response, Error = Infallible>,
    S::Future: Send + 'static,
    Req: DeserializeOwned + Send + 'static,
    Res: Serialize + Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        if !self.route.claims(&request) {
            return Box::pin(self.inner.call(request));
        }
        let route = self.route.clone();
        Box::pin(async move { Ok(route.serve(request).await) })
    }
}

/// Turn an error into the framework's generic failure response.
fn forward(err: EndpointError) -> Response {
    tracing::warn!(error = %err, "forwarding endpoint error");
    let err = Arc::new(err);
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    let reason = status.canonical_reason().unwrap_or("Internal Server Error");
    let mut response = (status, reason).into_response();
    response.extensions_mut().insert(ForwardedError(err));
    response
}

impl IntoResponse for EndpointError {
    fn into_response(self) -> Response {
        forward(self)
    }
}
