//! Request handlers.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use animcalc_core::{CalculationRequest, Error, Operator, RequestId};
use animcalc_telemetry::Timer;

use crate::assets;
use crate::server::AppState;

// === Error Response ===

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
}

impl ErrorResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

fn error_response(err: &Error) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}

/// Body that could not be read at all, e.g. over the size limit.
fn rejection_response(rejection: &BytesRejection) -> Response {
    (
        rejection.status(),
        Json(ErrorResponse::new(rejection.body_text())),
    )
        .into_response()
}

/// Turns a handler panic into the same 500 body as any other internal fault.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let description = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %description, "Handler panicked");
    error_response(&Error::internal(description))
}

// === Page ===

pub(crate) async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

pub(crate) async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        assets::SCRIPT_JS,
    )
}

// === Health Endpoints ===

/// Liveness probe body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `true` while the process serves requests.
    pub ok: bool,
}

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Body of `GET /api/status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Always `"running"`.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
    /// RFC 3339 start time.
    pub started_at: String,
    /// Successful calculations served.
    pub calculations: u64,
    /// Failed calculations served.
    pub errors: u64,
    /// Successful calculations per operator symbol.
    pub by_operator: BTreeMap<String, u64>,
}

pub(crate) async fn server_status(State(state): State<Arc<AppState>>) -> Json<ServerStatus> {
    Json(ServerStatus {
        status: "running".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        started_at: state.started_at.to_rfc3339(),
        calculations: state.metrics.calculations(),
        errors: state.metrics.errors(),
        by_operator: Operator::ALL
            .iter()
            .map(|op| (op.symbol().to_string(), state.metrics.by_operator(*op)))
            .collect(),
    })
}

// === Calculation ===

/// `POST /calculate`.
///
/// The body is read as raw bytes so that a missing or malformed payload is
/// reported through the calculation error taxonomy rather than by an
/// extractor rejection. A body that cannot be buffered keeps the
/// rejection's status but still gets the `{"error": ..}` shape.
///
/// Decoding and evaluation are the two steps `animcalc_core::calculate`
/// composes; they run separately here so the operator is known for the
/// per-operator counters.
pub(crate) async fn calculate(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = RequestId::new();

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            state.metrics.record_error();
            tracing::debug!(request_id = %request_id, error = %rejection.body_text(), "Request body rejected");
            return rejection_response(&rejection);
        },
    };

    let timer = Timer::start("calculate");

    let outcome = CalculationRequest::from_json(&body)
        .and_then(|request| request.evaluate().map(|result| (request.operator, result)));

    let latency_ms = timer.stop();

    match outcome {
        Ok((operator, result)) => {
            state.metrics.record_success(operator);
            tracing::debug!(
                request_id = %request_id,
                operator = %operator,
                result = result.result,
                latency_ms,
                "Calculation finished"
            );
            Json(result).into_response()
        },
        Err(e) => {
            state.metrics.record_error();
            if e.is_client_error() {
                tracing::debug!(request_id = %request_id, kind = e.kind(), error = %e, "Calculation rejected");
            } else {
                tracing::warn!(request_id = %request_id, kind = e.kind(), error = %e, "Calculation failed");
            }
            error_response(&e)
        },
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_response(&Error::InvalidRequest).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(&Error::DivisionByZero).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(&Error::internal("x")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    async fn error_text(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        body.error
    }

    #[tokio::test]
    async fn test_handle_panic_messages() {
        let cases: [(Box<dyn Any + Send>, &str); 3] = [
            (Box::new("static message"), "Internal error: static message"),
            (Box::new(String::from("owned message")), "Internal error: owned message"),
            (Box::new(42_u8), "Internal error: unknown panic"),
        ];

        for (panic, expected) in cases {
            let resp = handle_panic(panic);
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(error_text(resp).await, expected);
        }
    }

    async fn explode() -> &'static str {
        panic!("operand table corrupted")
    }

    #[tokio::test]
    async fn test_panicking_route_is_caught() {
        let app = Router::new()
            .route("/explode", get(explode))
            .layer(CatchPanicLayer::custom(handle_panic));

        let resp = app
            .oneshot(Request::get("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            error_text(resp).await,
            "Internal error: operand table corrupted"
        );
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_value(ErrorResponse::new("No data provided")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "No data provided"}));
    }
}
