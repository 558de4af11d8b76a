use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;
use trattoria_service::{course, menu, menu::MenuForm};
use utoipa::IntoParams;

use crate::error::ApiError;
use crate::models::*;
use crate::session::AdminSession;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/menu-types", get(list_menu_types))
        .route("/menus", get(list_menus).post(create_menu))
        .route(
            "/menus/{id}",
            get(get_menu).put(update_menu).delete(delete_menu),
        )
        .route("/catalog", get(get_catalog))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MenuQuery {
    /// Only list items of this category
    pub type_id: Option<i32>,
}

fn menu_form(payload: MenuRequest) -> Result<MenuForm, ApiError> {
    Ok(MenuForm {
        price: parse_price(&payload.price)?,
        name: payload.name,
        orderable: payload.orderable,
        menu_type: payload.menu_type,
        detail: payload.detail,
        image_url: payload.image_url,
    })
}

#[utoipa::path(
    get,
    path = "/menu-types",
    responses(
        (status = 200, description = "Menu categories", body = ListMenuTypesResponse),
    ),
    tag = "menus"
)]
#[instrument(skip(state))]
pub async fn list_menu_types(
    State(state): State<AppState>,
) -> Result<Json<ListMenuTypesResponse>, ApiError> {
    let menu_types = state.db.run(menu::list_menu_types).await?;

    Ok(Json(ListMenuTypesResponse {
        menu_types: menu_types.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/menus",
    params(MenuQuery),
    responses(
        (status = 200, description = "Menu items with their category", body = ListMenusResponse),
    ),
    tag = "menus"
)]
#[instrument(skip(state))]
pub async fn list_menus(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<ListMenusResponse>, ApiError> {
    let menus = state
        .db
        .run(move |conn| match query.type_id {
            Some(type_id) => menu::list_menus_by_type(conn, type_id),
            None => menu::list_menus(conn),
        })
        .await?;

    Ok(Json(ListMenusResponse {
        menus: menus.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/menus/{id}",
    responses(
        (status = 200, description = "Menu item details", body = MenuItemResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Menu item ID")
    ),
    tag = "menus"
)]
#[instrument(skip(state))]
pub async fn get_menu(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let detail = state.db.run(move |conn| menu::get_menu(conn, id)).await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    post,
    path = "/menus",
    request_body = MenuRequest,
    responses(
        (status = 201, description = "Menu item created", body = MenuItemResponse),
        (status = 400, description = "Invalid menu item", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(
        ("admin" = []),
    ),
    tag = "menus"
)]
#[instrument(skip(state, _admin))]
pub async fn create_menu(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(payload): Json<MenuRequest>,
) -> Result<(StatusCode, Json<MenuItemResponse>), ApiError> {
    let form = menu_form(payload)?;
    form.validate()?;

    let detail = state.db.run(move |conn| menu::create_menu(conn, form)).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

#[utoipa::path(
    put,
    path = "/menus/{id}",
    request_body = MenuRequest,
    responses(
        (status = 200, description = "Menu item updated", body = MenuItemResponse),
        (status = 400, description = "Invalid menu item", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Menu item ID")
    ),
    security(
        ("admin" = []),
    ),
    tag = "menus"
)]
#[instrument(skip(state, _admin))]
pub async fn update_menu(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<i32>,
    Json(payload): Json<MenuRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let form = menu_form(payload)?;
    form.validate()?;

    let detail = state
        .db
        .run(move |conn| menu::update_menu(conn, id, form))
        .await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    delete,
    path = "/menus/{id}",
    responses(
        (status = 204, description = "Menu item deleted"),
        (status = 400, description = "Menu item is still referenced", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Menu item ID")
    ),
    security(
        ("admin" = []),
    ),
    tag = "menus"
)]
#[instrument(skip(state, _admin))]
pub async fn delete_menu(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.db.run(move |conn| menu::delete_menu(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/catalog",
    responses(
        (status = 200, description = "Orderable menu items by category, plus orderable courses", body = CatalogResponse),
    ),
    tag = "menus"
)]
#[instrument(skip(state))]
pub async fn get_catalog(State(state): State<AppState>) -> Result<Json<CatalogResponse>, ApiError> {
    let (categories, courses) = state
        .db
        .run(|conn| Ok((menu::menu_catalog(conn)?, course::list_courses(conn, true)?)))
        .await?;

    Ok(Json(CatalogResponse {
        categories: categories.into_iter().map(Into::into).collect(),
        courses: courses.into_iter().map(Into::into).collect(),
    }))
}
