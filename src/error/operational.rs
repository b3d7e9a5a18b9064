//! Operational error context propagation with `anyhow`.
//!
//! Extension traits for attaching context to fallible calls and a single
//! place that decides how recoverable failures are logged and shown.

use std::{error::Error as StdError, fmt::Display};

use {
    anyhow::{Context, Error, Result as AnyhowResult},
    tracing::{error, warn},
};

/// Extension trait for enhanced error context.
pub trait ResultExt<T, E> {
    /// Adds context to an error with a static string.
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;

    /// Adds context to an error with a formatted string.
    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;

    /// Logs the error as a warning and converts the result into an `Option`.
    ///
    /// Used where a failure degrades to a default instead of propagating.
    fn or_warn(self, context: &str) -> Option<T>
    where
        E: Display;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(context)
    }

    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(format.to_string())
    }

    fn or_warn(self, context: &str) -> Option<T>
    where
        E: Display,
    {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(context = context, error = %e, "Recovered from error");
                None
            }
        }
    }
}

/// Centralized error reporting and logging.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Reports a recoverable failure; the session continues in a degraded state.
    pub fn degraded(error: &Error, context: &str) {
        warn!(context = context, error = format!("{error:#}"), "Degraded");
    }

    /// Reports an error-level failure.
    pub fn error(error: &Error, context: &str) {
        error!(context = context, error = format!("{error:#}"), "Error");
    }

    /// Converts an error to a short message suitable for a user notice.
    ///
    /// Only the outermost context is shown; the full chain goes to the log.
    pub fn to_user_message(error: &Error) -> String {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    };

    use anyhow::anyhow;

    use crate::error::operational::{ErrorReporter, ResultExt};

    #[derive(Debug)]
    struct TestError;

    impl Display for TestError {
        fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
            write!(f, "Test error")
        }
    }

    impl Error for TestError {}

    #[test]
    fn test_result_ext_with_context() {
        let result: Result<i32, TestError> = Err(TestError);
        let error = result.add_context("Loading catalog").unwrap_err();
        assert!(error.to_string().contains("Loading catalog"));
        assert_eq!(error.root_cause().to_string(), "Test error");
    }

    #[test]
    fn test_result_ext_with_contextf() {
        let result: Result<i32, TestError> = Err(TestError);
        let error = result.add_contextf(format!("Reading {}", "/music")).unwrap_err();
        assert!(error.to_string().contains("Reading /music"));
    }

    #[test]
    fn test_or_warn_degrades_to_none() {
        let failed: Result<i32, TestError> = Err(TestError);
        assert_eq!(failed.or_warn("test"), None);

        let ok: Result<i32, TestError> = Ok(3);
        assert_eq!(ok.or_warn("test"), Some(3));
    }

    #[test]
    fn test_error_reporter_user_message() {
        let error = anyhow!("Catalog unavailable").context("No songs found");
        assert_eq!(ErrorReporter::to_user_message(&error), "No songs found");
    }
}
