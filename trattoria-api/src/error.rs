use axum::{http::StatusCode, response::Json};
use serde_json::json;
use trattoria_service::{ServiceError, token::TokenError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Invalid name or password")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Session expired")]
    SessionExpired,
    #[error("{0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::BadRequest(msg),
            ServiceError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ServiceError::InvalidCredentials => ApiError::InvalidCredentials,
            ServiceError::PasswordHash | ServiceError::Internal(_) => {
                ApiError::InternalError(format!("{err:?}"))
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::SessionExpired,
            TokenError::Invalid | TokenError::WrongRole => ApiError::InvalidToken,
            TokenError::Issue => ApiError::InternalError(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationFailed
            | ApiError::InvalidCredentials
            | ApiError::InvalidToken
            | ApiError::SessionExpired => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::InternalError(detail) => {
                tracing::error!(%detail, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;
    use diesel::result::Error as DieselError;

    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::validation("Select a category"), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("Course"), StatusCode::NOT_FOUND),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                ServiceError::Internal(DieselError::NotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn token_errors_are_unauthorized() {
        for err in [TokenError::Expired, TokenError::Invalid, TokenError::WrongRole] {
            assert_eq!(ApiError::from(err).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn not_found_keeps_entity_name() {
        let err = ApiError::from(ServiceError::NotFound("Reservation"));
        assert_eq!(err.to_string(), "Reservation not found");
    }

    #[test]
    fn internal_detail_is_hidden() {
        let response = ApiError::InternalError("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
