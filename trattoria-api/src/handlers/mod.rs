pub mod auth;
pub mod course;
pub mod menu;
pub mod reservation;
pub mod table;

pub use auth::router as auth_router;
pub use course::router as course_router;
pub use menu::router as menu_router;
pub use reservation::router as reservation_router;
pub use table::router as table_router;

use std::sync::Arc;

use diesel::PgConnection;
use trattoria_service::{ServiceResult, establish_connection, token::TokenIssuer};
use utoipa::OpenApi;

use crate::error::ApiError;

/// Opens one connection per call and runs the work on the blocking pool.
#[derive(Clone)]
pub struct Database {
    database_url: Arc<str>,
}

impl Database {
    pub fn new(database_url: &str) -> Self {
        Self {
            database_url: Arc::from(database_url),
        }
    }

    pub async fn run<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut PgConnection) -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let database_url = self.database_url.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&database_url)
                .map_err(|e| ApiError::InternalError(format!("Database connection error: {e}")))?;
            work(&mut conn).map_err(ApiError::from)
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("Blocking task failed: {e}")))?
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenIssuer>,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn session_max_age(&self) -> i64 {
        self.tokens.expires_in().num_seconds()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::create_user,
        auth::login,
        auth::admin_login,
        auth::logout,
        auth::admin_check,
        menu::list_menu_types,
        menu::list_menus,
        menu::get_menu,
        menu::create_menu,
        menu::update_menu,
        menu::delete_menu,
        menu::get_catalog,
        course::list_courses,
        course::get_course,
        course::create_course,
        course::update_course,
        course::delete_course,
        table::list_tables,
        reservation::create_reservation,
        reservation::list_my_reservations,
        reservation::delete_my_reservation,
        reservation::list_reservations,
        reservation::delete_reservation,
        reservation::update_reservation_status,
    ),
    components(
        schemas(
            crate::models::CredentialsRequest,
            crate::models::UserResponse,
            crate::models::LoginResponse,
            crate::models::AdminCheckResponse,
            crate::models::MenuTypeResponse,
            crate::models::ListMenuTypesResponse,
            crate::models::MenuRequest,
            crate::models::MenuItemResponse,
            crate::models::ListMenusResponse,
            crate::models::CourseRequest,
            crate::models::CourseResponse,
            crate::models::ListCoursesResponse,
            crate::models::CatalogCategory,
            crate::models::CatalogResponse,
            crate::models::TableResponse,
            crate::models::ListTablesResponse,
            crate::models::LineItemType,
            crate::models::CartEntryRequest,
            crate::models::CreateReservationRequest,
            crate::models::CreateReservationResponse,
            crate::models::LineItemResponse,
            crate::models::ReservationResponse,
            crate::models::ListReservationsResponse,
            crate::models::UpdateReservationStatusRequest,
            crate::models::ApiErrorResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Sign-up, sign-in and session endpoints"),
        (name = "menus", description = "Menu item and category endpoints"),
        (name = "courses", description = "Course endpoints"),
        (name = "tables", description = "Dining table endpoints"),
        (name = "reservations", description = "Reservation endpoints")
    ),
    info(
        title = "Trattoria API",
        description = "Menu, course and reservation API for the restaurant",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::*;
            components.add_security_scheme(
                "customer",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    crate::session::AUTH_COOKIE,
                ))),
            );
            components.add_security_scheme(
                "admin",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    crate::session::ADMIN_COOKIE,
                ))),
            );
        }
    }
}
