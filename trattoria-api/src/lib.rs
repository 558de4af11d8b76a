use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod session;

use handlers::{
    ApiDoc, AppState, auth_router, course_router, menu_router, reservation_router, table_router,
};

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(auth_router())
        .merge(menu_router())
        .merge(course_router())
        .merge(table_router())
        .merge(reservation_router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
