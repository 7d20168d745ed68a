use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, request_span, require_admin};
use crate::routes::{admin_codes, admin_registrations, health, registrations, scanner};
use crate::services::{EmailService, TicketService};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub email: EmailService,
    pub ticket: TicketService,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
        email: EmailService::new(config.email.clone()),
        ticket: TicketService::new(config.ticket.clone()),
    };

    // Build CORS layer based on configuration
    let cors = if config.server.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .server
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/v1/register", post(registrations::register))
        .route("/api/v1/verify/:code", get(registrations::verify_code))
        .route("/api/v1/health", get(health::health_check))
        .route("/api/v1/health/ready", get(health::readiness_check))
        .route("/metrics", get(metrics_handler));

    // Admin routes (require the admin passcode)
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/access-codes",
            post(admin_codes::create_codes).get(admin_codes::list_codes),
        )
        .route(
            "/api/v1/admin/access-codes/stats",
            get(admin_codes::code_stats),
        )
        .route(
            "/api/v1/admin/access-codes/:code/release",
            post(admin_codes::release_code),
        )
        .route("/api/v1/admin/cleanup", delete(admin_codes::cleanup_expired))
        .route(
            "/api/v1/admin/registrations",
            get(admin_registrations::list_registrations),
        )
        .route(
            "/api/v1/admin/registrations/:id",
            get(admin_registrations::get_registration),
        )
        .route(
            "/api/v1/admin/registrations/:id/status",
            patch(admin_registrations::update_status),
        )
        .route(
            "/api/v1/admin/registrations/:id/resend",
            post(admin_registrations::resend_confirmation),
        )
        .route(
            "/api/v1/admin/participant-ids",
            get(admin_registrations::pool_status),
        )
        // Admin auth runs before any handler in this group
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Scanner routes share the admin passcode
    let scanner_routes = Router::new()
        .route("/api/v1/scanner/checkin", post(scanner::check_in))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(scanner_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_span)) // Request ID and logging
        .layer(cors)
        .with_state(state)
}
