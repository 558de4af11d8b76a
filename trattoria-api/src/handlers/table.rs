use axum::{Router, extract::State, response::Json, routing::get};
use tracing::instrument;
use trattoria_service::reservation;

use crate::error::ApiError;
use crate::models::*;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/tables", get(list_tables))
}

#[utoipa::path(
    get,
    path = "/tables",
    responses(
        (status = 200, description = "Tables that can be reserved", body = ListTablesResponse),
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn list_tables(State(state): State<AppState>) -> Result<Json<ListTablesResponse>, ApiError> {
    let tables = state.db.run(reservation::list_tables).await?;

    Ok(Json(ListTablesResponse {
        tables: tables.into_iter().map(Into::into).collect(),
    }))
}
