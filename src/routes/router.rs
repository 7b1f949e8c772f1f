use crate::config::RateLimitConfig;
use crate::middleware_impls::IpKeyExtractor;
use axum::middleware;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};

use super::health;
use super::url_handlers;
use super::AppState;

/// Create application router
pub fn create_router(
    state: Arc<AppState>,
    allowed_origins: Vec<String>,
    rate_limit_config: RateLimitConfig,
) -> axum::Router {
    use crate::middleware_impls::{request_context_middleware, request_id_middleware};

    // Strict rate limiting for creation. Periods are clamped to 1ms so a
    // configured rate above one request per millisecond cannot produce the
    // zero period the governor builder rejects.
    let governor_layer_strict = GovernorLayer::new(
        tower_governor::governor::GovernorConfigBuilder::default()
            .per_millisecond((60000 / rate_limit_config.requests_per_minute).max(1))
            .burst_size(rate_limit_config.burst_size)
            .key_extractor(IpKeyExtractor)
            .finish()
            .expect("Failed to build strict governor config"),
    );

    // More lenient limits for redirects and statistics
    let governor_layer_lenient = GovernorLayer::new(
        tower_governor::governor::GovernorConfigBuilder::default()
            .per_millisecond((60000 / (rate_limit_config.requests_per_minute * 2)).max(1))
            .burst_size(rate_limit_config.burst_size * 2)
            .key_extractor(IpKeyExtractor)
            .finish()
            .expect("Failed to build lenient governor config"),
    );

    // Configure CORS with specific origins
    let cors = if allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|s| s.parse::<http::HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let creation_routes = axum::Router::new()
        .route("/shorturls", post(url_handlers::create_url))
        .layer(governor_layer_strict);

    // The static /shorturls and /health segments win over /{code}; those
    // names are also in the reserved-shortcode set so no mapping can ever
    // claim them
    let public_routes = axum::Router::new()
        .route("/{code}", get(url_handlers::resolve_url))
        .route("/shorturls/{code}/stats", get(url_handlers::get_url_stats))
        .layer(governor_layer_lenient);

    let health_routes = axum::Router::new().route("/health", get(health::health_check));

    creation_routes
        .merge(public_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(request_context_middleware))
        .with_state(state)
}
