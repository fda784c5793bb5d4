use std::error::Error as StdError;

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InvalidDuration>;

type Source = Box<dyn StdError + Send + Sync + 'static>;

/// The only error a duration operation can fail with.
///
/// Carries a human readable reason, an optional numeric code and an optional underlying cause.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct InvalidDuration {
    reason: String,
    code: Option<i32>,
    #[source]
    source: Option<Source>,
}

impl InvalidDuration {
    pub fn because<R: Into<String>>(reason: R) -> Self {
        InvalidDuration {
            reason: reason.into(),
            code: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn caused_by<E>(mut self, source: E) -> Self
    where
        E: Into<Source>,
    {
        self.source = Some(source.into());
        self
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Numeric code, `0` when none was attached.
    pub fn code(&self) -> i32 {
        self.code.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_the_reason() {
        let error = InvalidDuration::because("A duration cannot be smaller than zero");
        assert_eq!(error.to_string(), "A duration cannot be smaller than zero");
        assert_eq!(error.reason(), "A duration cannot be smaller than zero");
        assert_eq!(error.code(), 0);
        assert!(error.source().is_none());
    }

    #[test]
    fn keeps_code_and_cause() {
        let cause = "x".parse::<u32>().unwrap_err();
        let error = InvalidDuration::because("'x' is not a valid duration")
            .with_code(42)
            .caused_by(cause);
        assert_eq!(error.code(), 42);
        let source = error.source().expect("chained cause");
        assert_eq!(source.to_string(), "invalid digit found in string");
    }
}
