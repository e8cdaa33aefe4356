//! Route configuration.

use crate::error::error_page_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route(
            "/",
            get(handlers::new_page_form).post(handlers::create_page),
        )
        .route("/{slug}", get(handlers::show_page))
        .route(
            "/{slug}/edit",
            get(handlers::edit_page_form).post(handlers::save_page),
        )
        .nest_service("/static", ServeDir::new(&state.config.server.static_dir));

    // When enabled, restrict this endpoint to the Prometheus scraper at the
    // network level. See crate::metrics.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error_page_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
