//! Diesel and r2d2 error mapping.

use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::port::BackendError;

fn is_busy(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("database is locked") || message.contains("busy")
}

pub(super) fn from_diesel(error: &DieselError) -> BackendError {
    match error {
        DieselError::DatabaseError(kind, info) => {
            let message = info.message().to_string();
            match kind {
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation => BackendError::Constraint(message),
                DatabaseErrorKind::ClosedConnection => BackendError::ConnectionLost(message),
                _ if is_busy(&message) => BackendError::Busy(message),
                _ => BackendError::Other(message),
            }
        }
        DieselError::QueryBuilderError(e)
        | DieselError::DeserializationError(e)
        | DieselError::SerializationError(e) => BackendError::InvalidInput(e.to_string()),
        other => {
            let message = other.to_string();
            if is_busy(&message) {
                BackendError::Busy(message)
            } else {
                BackendError::Other(message)
            }
        }
    }
}

/// Checkout failures are always a timeout waiting for a free connection.
pub(super) fn from_pool(error: &diesel::r2d2::PoolError) -> BackendError {
    BackendError::PoolExhausted(error.to_string())
}

pub(super) fn from_join(error: &tokio::task::JoinError) -> BackendError {
    BackendError::Other(format!("database worker failed: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_other() {
        assert!(matches!(
            from_diesel(&DieselError::NotFound),
            BackendError::Other(_)
        ));
    }

    #[test]
    fn busy_messages_are_detected() {
        assert!(is_busy("database is locked"));
        assert!(is_busy("SQLITE_BUSY"));
        assert!(!is_busy("no such table: entries"));
    }
}
