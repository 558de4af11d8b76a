use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use tracing::instrument;
use trattoria_service::{course, course::CourseForm};

use crate::error::ApiError;
use crate::models::*;
use crate::session::AdminSession;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
}

fn course_form(payload: CourseRequest) -> Result<CourseForm, ApiError> {
    let form = CourseForm {
        price: parse_price(&payload.price)?,
        name: payload.name,
        orderable: payload.orderable,
        detail: payload.detail,
        menu_item_ids: payload.menu_item_ids,
    };
    form.validate()?;
    Ok(form)
}

#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "All courses with their menu items", body = ListCoursesResponse),
    ),
    tag = "courses"
)]
#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<ListCoursesResponse>, ApiError> {
    let courses = state
        .db
        .run(|conn| course::list_courses(conn, false))
        .await?;

    Ok(Json(ListCoursesResponse {
        courses: courses.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/courses/{id}",
    responses(
        (status = 200, description = "Course with its menu items", body = CourseResponse),
        (status = 404, description = "Course not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    tag = "courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CourseResponse>, ApiError> {
    let detail = state
        .db
        .run(move |conn| course::get_course_detail(conn, id))
        .await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    post,
    path = "/courses",
    request_body = CourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Invalid course", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(
        ("admin" = []),
    ),
    tag = "courses"
)]
#[instrument(skip(state, _admin))]
pub async fn create_course(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(payload): Json<CourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    let form = course_form(payload)?;
    let detail = state
        .db
        .run(move |conn| course::create_course(conn, form))
        .await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

#[utoipa::path(
    put,
    path = "/courses/{id}",
    request_body = CourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Invalid course", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Course not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    security(
        ("admin" = []),
    ),
    tag = "courses"
)]
#[instrument(skip(state, _admin))]
pub async fn update_course(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<i32>,
    Json(payload): Json<CourseRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    let form = course_form(payload)?;
    let detail = state
        .db
        .run(move |conn| course::update_course(conn, id, form))
        .await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    delete,
    path = "/courses/{id}",
    responses(
        (status = 204, description = "Course deleted"),
        (status = 400, description = "Course is still referenced", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Course not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    security(
        ("admin" = []),
    ),
    tag = "courses"
)]
#[instrument(skip(state, _admin))]
pub async fn delete_course(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state
        .db
        .run(move |conn| course::delete_course(conn, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
