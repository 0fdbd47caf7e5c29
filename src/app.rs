use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::manager::HealthCheck;
use crate::database::{DatabaseManager, PgAttendanceRepository, PgUserRepository};
use crate::geofence::GeofencePolicy;
use crate::handlers;
use crate::middleware::logging::log_request_body;
use crate::middleware::recovery::{envelope_timeout, handle_panic};
use crate::middleware::{jwt_auth_middleware, require_tenant_middleware};
use crate::services::{AccountService, AttendanceService};

/// Shared, immutable request-handling state built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub health: Arc<dyn HealthCheck>,
    pub accounts: AccountService,
    pub attendance: AttendanceService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseManager) -> Self {
        let tokens = TokenService::from_config(&config.security);
        let users = Arc::new(PgUserRepository::new(db.pool().clone()));
        let attendances = Arc::new(PgAttendanceRepository::new(db.pool().clone()));
        let policy = GeofencePolicy::from_config(&config.attendance);

        Self {
            accounts: AccountService::new(users.clone(), tokens.clone()),
            attendance: AttendanceService::new(attendances, users, policy),
            config: Arc::new(config),
            tokens,
            health: Arc::new(db),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let server = state.config.server.clone();
    let body_limit = server.max_body_bytes;

    Router::new()
        .nest("/api/v1", api_routes())
        .fallback(handlers::not_found)
        // Global middleware, innermost first
        .layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware))
        .layer(middleware::from_fn(move |request: Request, next: Next| {
            log_request_body(request, next, body_limit)
        }))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(middleware::map_response(envelope_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/register", post(public::auth::register_post))
        .route("/auth/login", post(public::auth::login_post))
        .merge(tenant_routes())
}

fn tenant_routes() -> Router<AppState> {
    use handlers::protected::{attendance, auth};

    Router::new()
        .route("/auth/me", get(auth::me_get))
        .route("/attendance", get(attendance::attendance_get))
        .route("/attendance/check-location", post(attendance::check_location_post))
        .route("/attendance/clock-in", post(attendance::clock_in_post))
        .route("/attendance/clock-out", post(attendance::clock_out_post))
        .route_layer(middleware::from_fn(require_tenant_middleware))
}
