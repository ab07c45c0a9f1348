pub mod contracts;

use std::convert::Infallible;

use axum::extract::Request;
use axum::http::{HeaderName, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use typed_endpoint::{Endpoint, EndpointError, ForwardedError};

use contracts::{
    Created, CreateRequest, DivideRequest, DivideResponse, ErrorBody, SumRequest, SumResponse,
};

const REQUEST_ID: &str = "x-request-id";

#[derive(Debug, thiserror::Error)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
}

/// Every contract endpoint stacked over a 404 fallback, behind the error
/// handler.
pub fn app() -> Result<Router, EndpointError> {
    let echo: Endpoint<Value, Value> = Endpoint::new(contracts::echo())?;
    let sum: Endpoint<SumRequest, SumResponse> = Endpoint::new(contracts::sum())?;
    let divide: Endpoint<DivideRequest, DivideResponse> = Endpoint::new(contracts::divide())?;
    let created: Endpoint<CreateRequest, Created> = Endpoint::new(contracts::created())?;

    Ok(Router::new()
        .fallback(not_found)
        .layer(echo.handler_sync(|value, exchange| {
            if let Some(id) = exchange.request().headers.get(REQUEST_ID).cloned() {
                exchange.insert_header(HeaderName::from_static(REQUEST_ID), id);
            }
            Ok::<_, Infallible>(value)
        }))
        .layer(sum.handler(|input: SumRequest, _exchange| async move {
            input
                .values
                .iter()
                .try_fold(0i64, |acc, v| acc.checked_add(*v))
                .map(|total| SumResponse { total })
                .ok_or(MathError::Overflow)
        }))
        .layer(divide.handler(|input: DivideRequest, _exchange| async move {
            if input.divisor == 0 {
                return Err(MathError::DivisionByZero);
            }
            input
                .dividend
                .checked_div(input.divisor)
                .map(|quotient| DivideResponse { quotient })
                .ok_or(MathError::Overflow)
        }))
        .layer(created.handler_sync(|input: CreateRequest, _exchange| {
            Ok::<_, Infallible>(Created { name: input.name })
        }))
        .layer(middleware::from_fn(handle_errors))
        .layer(TraceLayer::new_for_http()))
}

pub async fn run(listener: TcpListener) -> anyhow::Result<()> {
    axum::serve(listener, app()?).await?;
    Ok(())
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "no endpoint claimed this request".to_string(),
        }),
    )
}

/// Central error handler: renders errors forwarded by any endpoint.
async fn handle_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let Some(ForwardedError(err)) = response.extensions().get::<ForwardedError>().cloned() else {
        return response;
    };

    let status = match *err {
        EndpointError::Deserialization { .. } | EndpointError::Body { .. } => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::error!(error = %err, status = status.as_u16(), "request failed");
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}
