use crate::{
    auth::require_auth,
    models::AppState,
    routes::{health, preferences, recipes},
};

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};

use tower::ServiceBuilder;
use tower_http::{
    classify::ServerErrorsFailureClass,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{Span, info_span};

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[must_use]
pub fn build_app(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            let method = req.method().to_string();
            let uri = req.uri().to_string();
            let rid = req
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");

            info_span!("http", method=%method, uri=%uri, request_id=%rid)
        })
        .on_request(|_req: &Request<Body>, _span: &Span| {
            tracing::debug!("request started");
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &Span| {
            tracing::info!(status=%res.status(), latency_ms=%latency.as_millis(), "response completed");
        })
        .on_failure(|class: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
            tracing::error!(%class, latency_ms=%latency.as_millis(), "request failed");
        });

    // Request-ID middleware wraps the trace layer so every span carries
    // the generated x-request-id.
    let request_id_layer = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id());

    let protected = Router::new()
        .route("/recipes/generate", post(recipes::generate))
        .route("/recipes/modify", post(recipes::modify))
        .route("/recipes/history", get(recipes::history))
        .route("/recipes/save", post(recipes::save))
        .route("/recipes/save/{recipe_id}", delete(recipes::unsave))
        .route("/recipes/saved", get(recipes::saved))
        .route(
            "/preferences",
            get(preferences::get).put(preferences::put),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/recipes/test", get(recipes::test_generation))
        .merge(protected)
        .with_state(state)
        .layer(trace)
        .layer(request_id_layer)
        .layer(cors_layer())
}
