use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Invalid name or password")]
    InvalidCredentials,
    #[error("Failed to hash password")]
    PasswordHash,
    #[error("Unexpected internal error")]
    Internal(#[from] DieselError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServiceError::Internal(_) | ServiceError::PasswordHash)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Maps a foreign key violation on delete to a validation failure, leaving
/// any other database error untouched.
pub(crate) fn still_referenced(err: DieselError, what: &str) -> ServiceError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            ServiceError::Validation(format!("{what} is still referenced and cannot be deleted"))
        }
        err => ServiceError::Internal(err),
    }
}

pub(crate) fn unique_name(err: DieselError, message: &str) -> ServiceError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ServiceError::Validation(message.to_string())
        }
        err => ServiceError::Internal(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_entity() {
        assert_eq!(
            ServiceError::NotFound("Reservation").to_string(),
            "Reservation not found"
        );
    }

    #[test]
    fn internal_errors_are_not_client_errors() {
        assert!(!ServiceError::Internal(DieselError::NotFound).is_client_error());
        assert!(ServiceError::validation("bad").is_client_error());
        assert!(ServiceError::InvalidCredentials.is_client_error());
    }

    #[test]
    fn non_constraint_errors_stay_internal() {
        let err = still_referenced(DieselError::RollbackTransaction, "Menu item");
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
