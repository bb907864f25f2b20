//! HTTP API server for the storefront backend.
//!
//! Serves the catalog, order, payment, auth and admin endpoints under `/api`,
//! uploaded images under `/media`, with structured logging (tracing) and
//! Prometheus metrics. A trailing slash on any path is ignored.

pub mod config;
pub mod error;
pub mod extract;
pub mod media;
pub mod routes;
pub mod state;
pub mod views;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::{Config, ConfigError, LogFormat};
pub use state::{AppState, create_gateway};

/// The application service: the router behind trailing-slash normalization.
pub type App = NormalizePath<Router>;

/// Creates the Axum application with all routes and shared state.
///
/// `/products/` and `/products` reach the same handler. Serve it through
/// `axum::ServiceExt::into_make_service` so paths are trimmed before routing.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> App {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);
    let media_files = ServeDir::new(state.media.root());

    let router = Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api", api_routes::<S>())
        .with_state(state)
        .nest_service(media::MEDIA_URL, media_files)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

fn api_routes<S: Store + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    use routes::{admin, auth, orders, payments, products};

    let catalog = Router::new()
        .route(
            "/products",
            get(products::list::<S>).post(products::create::<S>),
        )
        .route(
            "/products/{id}",
            get(products::get::<S>)
                .put(products::replace::<S>)
                .patch(products::update::<S>)
                .delete(products::delete::<S>),
        )
        .layer(DefaultBodyLimit::max(media::MAX_UPLOAD_BYTES));

    Router::new()
        .merge(catalog)
        .route("/auth/register", post(auth::register::<S>))
        .route("/auth/login", post(auth::login::<S>))
        .route("/auth/token/refresh", post(auth::refresh::<S>))
        .route("/orders", get(orders::list::<S>).post(orders::create::<S>))
        .route(
            "/orders/{id}",
            get(orders::get::<S>).delete(orders::delete::<S>),
        )
        .route("/payment/create-order", post(payments::create_order::<S>))
        .route("/payment/verify", post(payments::verify::<S>))
        .route("/admin/stats", get(admin::stats::<S>))
        .route("/admin/product-analytics", get(admin::product_analytics::<S>))
        .route("/admin/users", get(admin::list_users::<S>))
        .route(
            "/admin/users/{id}",
            get(admin::get_user::<S>)
                .put(admin::replace_user::<S>)
                .patch(admin::update_user::<S>)
                .delete(admin::delete_user::<S>),
        )
        .route("/admin/orders", get(admin::list_orders::<S>))
        .route(
            "/admin/orders/{id}/status",
            patch(orders::update_status::<S>),
        )
        .route("/admin/config/{model}", get(admin::config))
}
