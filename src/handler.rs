use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    extract::Request,
    http::{
        HeaderName, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tower::{Layer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::api::DiscoveryResponse;
use crate::error::ApiError;
use crate::kv::KeyValueStore;
use crate::pins::{self, PinStore};

pub const ALLOWED_METHODS: &str = "GET,HEAD,POST,OPTIONS,PUT,DELETE";
pub const ALLOWED_HEADERS: &str = "Content-Type,Authorization";

pub struct AppState<K> {
    pub pins: Arc<PinStore<K>>,
}

impl<K> Clone for AppState<K> {
    fn clone(&self) -> Self {
        AppState {
            pins: self.pins.clone(),
        }
    }
}

/// The routed app behind trailing-slash normalization.
pub type PinService = NormalizePath<Router>;

/// Full service: pin routes, discovery fallback, timeout, panic guard and
/// CORS on every response. `/user/octocat/pinned/` routes like
/// `/user/octocat/pinned`.
pub fn router<K: KeyValueStore>(pins: PinStore<K>, request_timeout: Duration) -> PinService {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]);

    let app = Router::new()
        .merge(pins::routes::<K>())
        .fallback(discovery)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .timeout(request_timeout),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(cors)
        .layer(middleware::from_fn(preflight))
        .with_state(AppState {
            pins: Arc::new(pins),
        });

    NormalizePathLayer::trim_trailing_slash().layer(app)
}

fn cors_headers() -> [(HeaderName, &'static str); 3] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
        (ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS),
    ]
}

/// OPTIONS on any path is answered here with 204 and no body.
pub async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return (StatusCode::NO_CONTENT, cors_headers()).into_response();
    }
    next.run(request).await
}

pub async fn discovery() -> Json<DiscoveryResponse> {
    info!("got discovery request");
    Json(DiscoveryResponse::new())
}

async fn handle_timeout(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("request timed out");
        ApiError::Timeout
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        ApiError::internal("Internal server error")
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = message, "handler panicked");
    ApiError::internal("Internal server error").into_response()
}
