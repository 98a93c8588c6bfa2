//! Retry classification port.
//!
//! Which errors are transient depends on the backend and driver, so the
//! manager asks a classifier instead of hardcoding a list.

use super::database::BackendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Retryable,
    NonRetryable,
}

pub trait RetryClassifier: Send + Sync {
    fn classify(&self, error: &BackendError) -> ErrorClass;
}

impl<F> RetryClassifier for F
where
    F: Fn(&BackendError) -> ErrorClass + Send + Sync,
{
    fn classify(&self, error: &BackendError) -> ErrorClass {
        self(error)
    }
}

/// Treats dropped connections, lock contention and pool exhaustion as
/// transient; everything else as permanent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryClassifier;

impl RetryClassifier for DefaultRetryClassifier {
    fn classify(&self, error: &BackendError) -> ErrorClass {
        match error {
            BackendError::ConnectionLost(_)
            | BackendError::Busy(_)
            | BackendError::PoolExhausted(_) => ErrorClass::Retryable,
            BackendError::Constraint(_)
            | BackendError::InvalidInput(_)
            | BackendError::DeadlineExceeded
            | BackendError::Other(_) => ErrorClass::NonRetryable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_classifier_retries_transient_errors() {
        let c = DefaultRetryClassifier;
        assert_eq!(
            c.classify(&BackendError::Busy("database is locked".into())),
            ErrorClass::Retryable
        );
        assert_eq!(
            c.classify(&BackendError::ConnectionLost("reset".into())),
            ErrorClass::Retryable
        );
        assert_eq!(
            c.classify(&BackendError::PoolExhausted("timeout".into())),
            ErrorClass::Retryable
        );
    }

    #[test]
    fn default_classifier_rejects_permanent_errors() {
        let c = DefaultRetryClassifier;
        assert_eq!(
            c.classify(&BackendError::Constraint("UNIQUE".into())),
            ErrorClass::NonRetryable
        );
        assert_eq!(
            c.classify(&BackendError::InvalidInput("bad".into())),
            ErrorClass::NonRetryable
        );
    }

    #[test]
    fn closures_are_classifiers() {
        let always = |_: &BackendError| ErrorClass::Retryable;
        assert_eq!(
            always.classify(&BackendError::Other("x".into())),
            ErrorClass::Retryable
        );
    }
}
