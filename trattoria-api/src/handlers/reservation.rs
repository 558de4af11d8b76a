use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
};
use tracing::instrument;
use trattoria_service::{
    models::ReservationStatus,
    reservation::{self, ReservationRequest},
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::*;
use crate::session::{AdminSession, CustomerSession};

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reservations", post(create_reservation))
        .route("/reservations/mine", get(list_my_reservations))
        .route("/reservations/{id}", delete(delete_my_reservation))
        .route("/admin/reservations", get(list_reservations))
        .route("/admin/reservations/{id}", delete(delete_reservation))
        .route(
            "/admin/reservations/{id}/status",
            put(update_reservation_status),
        )
}

#[utoipa::path(
    post,
    path = "/reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = CreateReservationResponse),
        (status = 400, description = "Mixed cart, bad quantity, unknown table or party too large", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(
        ("customer" = []),
    ),
    tag = "reservations"
)]
#[instrument(skip(state, session), fields(user_id = %session.0.id))]
pub async fn create_reservation(
    State(state): State<AppState>,
    session: CustomerSession,
    Json(payload): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<CreateReservationResponse>), ApiError> {
    let request = ReservationRequest {
        user_id: session.0.id,
        reserved_at: payload.reserved_at,
        party_size: payload.party_size,
        table_id: payload.table_id,
        items: payload.items.into_iter().map(Into::into).collect(),
    };
    // Cart shape, party size and date are checked before a connection is opened.
    reservation::validate_request(&request)?;

    let created = state
        .db
        .run(move |conn| reservation::create_reservation(conn, request))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateReservationResponse {
            id: created.id,
            status: created.status.to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/reservations/mine",
    responses(
        (status = 200, description = "Reservations of the signed-in user", body = ListReservationsResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(
        ("customer" = []),
    ),
    tag = "reservations"
)]
#[instrument(skip(state, session), fields(user_id = %session.0.id))]
pub async fn list_my_reservations(
    State(state): State<AppState>,
    session: CustomerSession,
) -> Result<Json<ListReservationsResponse>, ApiError> {
    let user_id = session.0.id;
    let reservations = state
        .db
        .run(move |conn| reservation::list_user_reservations(conn, user_id))
        .await?;

    Ok(Json(ListReservationsResponse {
        reservations: reservations.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    delete,
    path = "/reservations/{id}",
    responses(
        (status = 204, description = "Reservation cancelled and removed"),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "No such reservation for this user", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Reservation ID")
    ),
    security(
        ("customer" = []),
    ),
    tag = "reservations"
)]
#[instrument(skip(state, session), fields(user_id = %session.0.id))]
pub async fn delete_my_reservation(
    State(state): State<AppState>,
    session: CustomerSession,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let owner = session.0.id;
    state
        .db
        .run(move |conn| reservation::delete_reservation(conn, id, Some(owner)))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/admin/reservations",
    responses(
        (status = 200, description = "Every reservation with guest, table and line items", body = ListReservationsResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(
        ("admin" = []),
    ),
    tag = "reservations"
)]
#[instrument(skip(state, _admin))]
pub async fn list_reservations(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<ListReservationsResponse>, ApiError> {
    let reservations = state.db.run(reservation::list_reservations).await?;

    Ok(Json(ListReservationsResponse {
        reservations: reservations.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    delete,
    path = "/admin/reservations/{id}",
    responses(
        (status = 204, description = "Reservation removed"),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Reservation not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Reservation ID")
    ),
    security(
        ("admin" = []),
    ),
    tag = "reservations"
)]
#[instrument(skip(state, _admin))]
pub async fn delete_reservation(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .db
        .run(move |conn| reservation::delete_reservation(conn, id, None))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/admin/reservations/{id}/status",
    request_body = UpdateReservationStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = CreateReservationResponse),
        (status = 400, description = "Unknown status", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Reservation not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Reservation ID")
    ),
    security(
        ("admin" = []),
    ),
    tag = "reservations"
)]
#[instrument(skip(state, _admin))]
pub async fn update_reservation_status(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReservationStatusRequest>,
) -> Result<Json<CreateReservationResponse>, ApiError> {
    let status = payload
        .status
        .parse::<ReservationStatus>()
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let updated = state
        .db
        .run(move |conn| reservation::update_reservation_status(conn, id, status))
        .await?;

    Ok(Json(CreateReservationResponse {
        id: updated.id,
        status: updated.status.to_string(),
    }))
}
