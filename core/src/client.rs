//! Client role of an endpoint.
//!
//! # Design
//! `Caller` splits a call into `build_request` (payload to `SenderRequest`)
//! and `parse_response` (`SenderResponse` to payload), with `call` running the
//! sender in between. Both halves are pure, so they can be exercised without
//! any transport at all.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::StrictConfig;
use crate::error::{excerpt, EndpointError};
use crate::http::{merge_headers, Headers, SenderRequest, SenderResponse};
use crate::sender::Sender;

/// Invokes a remote endpoint and decodes its reply as `Res`.
pub struct Caller<Req, Res> {
    config: Arc<StrictConfig>,
    sender: Arc<dyn Sender>,
    _payload: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res> Clone for Caller<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            sender: self.sender.clone(),
            _payload: PhantomData,
        }
    }
}

impl<Req, Res> Caller<Req, Res>
where
    Req: Serialize,
    Res: DeserializeOwned,
{
    pub(crate) fn new(config: Arc<StrictConfig>, sender: Arc<dyn Sender>) -> Self {
        Self {
            config,
            sender,
            _payload: PhantomData,
        }
    }

    pub fn config(&self) -> &StrictConfig {
        &self.config
    }

    /// Call the endpoint with only the default JSON content-type header.
    pub async fn call(&self, data: &Req) -> Result<Res, EndpointError> {
        self.call_with_headers(data, &[]).await
    }

    /// Call the endpoint, merging `fragments` over the default headers.
    pub async fn call_with_headers(
        &self,
        data: &Req,
        fragments: &[Headers],
    ) -> Result<Res, EndpointError> {
        let request = self.build_request(data, fragments)?;
        tracing::debug!(endpoint = %self.config, "sending request");

        let response = self.sender.send(request).await.map_err(|source| {
            tracing::warn!(endpoint = %self.config, error = %source, "transport failed");
            EndpointError::Transport {
                endpoint: self.config.clone(),
                source,
            }
        })?;

        tracing::debug!(endpoint = %self.config, status = response.status, "received response");
        self.parse_response(response)
    }

    pub fn build_request(
        &self,
        data: &Req,
        fragments: &[Headers],
    ) -> Result<SenderRequest, EndpointError> {
        let body = serde_json::to_string(data).map_err(|source| EndpointError::Serialization {
            endpoint: self.config.clone(),
            source,
        })?;
        Ok(SenderRequest {
            method: self.config.method(),
            url: self.config.url(),
            body,
            headers: merge_headers(fragments),
        })
    }

    /// Check the status against the expected set, then decode the body.
    /// The body is never decoded when the status is unexpected.
    pub fn parse_response(&self, response: SenderResponse) -> Result<Res, EndpointError> {
        check_status(&self.config, &response)?;
        serde_json::from_str(&response.body).map_err(|source| EndpointError::Deserialization {
            endpoint: self.config.clone(),
            source,
        })
    }
}

fn check_status(config: &Arc<StrictConfig>, response: &SenderResponse) -> Result<(), EndpointError> {
    if config.accepts(response.status) {
        return Ok(());
    }
    tracing::warn!(endpoint = %config, status = response.status, "unexpected status");
    Err(EndpointError::UnexpectedStatus {
        endpoint: config.clone(),
        status: response.status,
        body: excerpt(&response.body),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;

    use super::*;
    use crate::config::{Config, Method};
    use crate::http::{APPLICATION_JSON, CONTENT_TYPE};
    use crate::sender::sender_fn;

    #[derive(Debug, Serialize)]
    struct Greeting {
        name: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        v: i64,
    }

    fn caller_with<Req, Res>(config: Config, status: u16, body: &'static str) -> Caller<Req, Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let sender = sender_fn(move |_request: SenderRequest| async move {
            Ok(SenderResponse::new(status, body))
        });
        Caller::new(Arc::new(config.resolve().unwrap()), Arc::new(sender))
    }

    #[test]
    fn build_request_produces_json_post() {
        let caller: Caller<Greeting, Reply> =
            caller_with(Config::new("/greet").base("http://localhost:3000"), 200, "");
        let request = caller
            .build_request(&Greeting { name: "ada".to_string() }, &[])
            .unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "http://localhost:3000/greet");
        assert_eq!(request.body, r#"{"name":"ada"}"#);
        assert_eq!(request.headers[CONTENT_TYPE], APPLICATION_JSON);
    }

    #[test]
    fn build_request_rejects_unserializable_payload() {
        let caller: Caller<HashMap<(u8, u8), u8>, Reply> = caller_with(Config::new("/map"), 200, "");
        let mut data = HashMap::new();
        data.insert((1, 2), 3);
        let err = caller.build_request(&data, &[]).unwrap_err();
        assert!(matches!(err, EndpointError::Serialization { .. }));
    }

    #[test]
    fn parse_response_skips_decoding_on_unexpected_status() {
        let caller: Caller<Greeting, Reply> = caller_with(Config::new("/echo"), 200, "");
        let err = caller
            .parse_response(SenderResponse::new(500, "{\"v\":1}"))
            .unwrap_err();
        assert!(matches!(err, EndpointError::UnexpectedStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn call_resolves_with_parsed_body() {
        let caller: Caller<serde_json::Value, Reply> =
            caller_with(Config::new("/echo"), 200, r#"{"v":42}"#);
        let reply = caller.call(&serde_json::json!({})).await.unwrap();
        assert_eq!(reply, Reply { v: 42 });
    }

    #[tokio::test]
    async fn call_rejects_status_outside_expect() {
        let caller: Caller<serde_json::Value, Reply> =
            caller_with(Config::new("/echo").expect(201u16), 200, "ok");
        let err = caller.call(&serde_json::json!({})).await.unwrap_err();
        match err {
            EndpointError::UnexpectedStatus { status, body, .. } => {
                assert_eq!(status, 200);
                assert_eq!(body, "ok");
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn call_rejects_invalid_json_body() {
        let caller: Caller<serde_json::Value, Reply> =
            caller_with(Config::new("/echo"), 200, "not json");
        let err = caller.call(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, EndpointError::Deserialization { .. }));
    }

    #[tokio::test]
    async fn call_surfaces_sender_failure_as_transport_error() {
        let sender = sender_fn(|_request: SenderRequest| async move {
            Err::<SenderResponse, _>(anyhow::anyhow!("connection refused"))
        });
        let caller: Caller<serde_json::Value, Reply> = Caller::new(
            Arc::new(Config::new("/down").resolve().unwrap()),
            Arc::new(sender),
        );
        let err = caller.call(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, EndpointError::Transport { .. }));
        assert!(err.to_string().contains("POST /down"));
    }

    #[tokio::test]
    async fn call_with_headers_passes_merged_headers_to_sender() {
        let sender = sender_fn(|request: SenderRequest| async move {
            let echoed = serde_json::to_string(&request.headers)?;
            Ok::<_, anyhow::Error>(SenderResponse::new(200, echoed))
        });
        let caller: Caller<serde_json::Value, Headers> = Caller::new(
            Arc::new(Config::new("/headers").resolve().unwrap()),
            Arc::new(sender),
        );
        let auth: Headers = [("X-Request-Id".to_string(), "1".to_string())].into();
        let retry: Headers = [("X-Request-Id".to_string(), "2".to_string())].into();
        let seen = caller
            .call_with_headers(&serde_json::json!(null), &[auth, retry])
            .await
            .unwrap();
        assert_eq!(seen["X-Request-Id"], "2");
        assert_eq!(seen[CONTENT_TYPE], APPLICATION_JSON);
    }
}
