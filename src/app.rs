use crate::handlers;
use crate::state::AppState;
use crate::uploads::UPLOADS_ROUTE;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route(
            "/",
            get(handlers::index).fallback(handlers::method_fallback),
        )
        .route(
            "/api/forms",
            get(handlers::list_forms)
                .post(handlers::create_form)
                .fallback(handlers::method_fallback),
        )
        .route(
            "/api/forms/:id",
            get(handlers::get_form)
                .put(handlers::update_form)
                .delete(handlers::delete_form)
                .fallback(handlers::method_fallback),
        )
        .route(
            "/api/responses",
            post(handlers::submit_response).fallback(handlers::method_fallback),
        )
        .route(
            "/api/responses/:form_id",
            get(handlers::list_responses).fallback(handlers::method_fallback),
        )
        .route(
            "/api/stats/:form_id",
            get(handlers::get_stats).fallback(handlers::method_fallback),
        )
        .route(
            "/api/upload",
            post(handlers::upload)
                .fallback(handlers::method_fallback)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .fallback(handlers::not_found);

    if let Some(dir) = &state.upload_dir {
        router = router.nest_service(UPLOADS_ROUTE, ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
