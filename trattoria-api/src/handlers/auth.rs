use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Json},
    routing::{get, post},
};
use tracing::{info, instrument};
use trattoria_service::{
    account,
    token::{Principal, Role},
};

use crate::error::ApiError;
use crate::models::*;
use crate::session::{
    ADMIN_COOKIE, admin_login_cookies, cookie_value, customer_login_cookies, logout_cookies,
};

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/login", post(login))
        .route("/admin/login", post(admin_login))
        .route("/logout", post(logout))
        .route("/admin/check", get(admin_check))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Missing field or name already taken", body = ApiErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .db
        .run(move |conn| account::register_user(conn, &payload.name, &payload.password))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            name: user.name,
            created_at: user.created_at.to_rfc3339(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in; session cookies set", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ApiErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .run(move |conn| account::authenticate_user(conn, &payload.name, &payload.password))
        .await?;

    let token = state.tokens.issue(&Principal {
        id: user.id,
        role: Role::Customer,
    })?;
    let max_age = state.session_max_age();
    info!(user_id = %user.id, "user signed in");

    Ok((
        AppendHeaders(
            customer_login_cookies(&token, max_age, state.secure_cookies).map(|c| (SET_COOKIE, c)),
        ),
        Json(LoginResponse {
            id: user.id,
            name: user.name,
            expires_in: max_age,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in; admin cookie set", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ApiErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = state
        .db
        .run(move |conn| account::authenticate_admin(conn, &payload.name, &payload.password))
        .await?;

    let token = state.tokens.issue(&Principal {
        id: admin.id,
        role: Role::Admin,
    })?;
    let max_age = state.session_max_age();
    info!(admin_id = %admin.id, "admin signed in");

    Ok((
        AppendHeaders(
            admin_login_cookies(&token, max_age, state.secure_cookies).map(|c| (SET_COOKIE, c)),
        ),
        Json(LoginResponse {
            id: admin.id,
            name: admin.name,
            expires_in: max_age,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "All session cookies cleared"),
    ),
    tag = "auth"
)]
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        AppendHeaders(logout_cookies(state.secure_cookies).map(|c| (SET_COOKIE, c))),
    )
}

#[utoipa::path(
    get,
    path = "/admin/check",
    responses(
        (status = 200, description = "Admin session is valid", body = AdminCheckResponse),
        (status = 401, description = "No valid admin session", body = AdminCheckResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(state, headers))]
pub async fn admin_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<AdminCheckResponse>) {
    let authenticated = cookie_value(&headers, ADMIN_COOKIE)
        .is_some_and(|token| state.tokens.verify(token, Role::Admin).is_ok());
    let status = if authenticated {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    (status, Json(AdminCheckResponse { authenticated }))
}
