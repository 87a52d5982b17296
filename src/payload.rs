use std::any::Any;
use std::fmt;

use crate::error::ExtractError;

/// A container for a value of any concrete `Send` type.
///
/// Workers produce a `Payload` from each unit of work so that results of
/// different types can flow through a single channel type. The submitter
/// recovers the concrete value with [`Payload::extract`], which fails with
/// a recoverable error when the requested type is not the stored one.
///
/// `Payload` is move-only: the held value may be unique or expensive, so no
/// cloning is offered and extraction consumes the container.
pub struct Payload {
    value: Option<Box<dyn Any + Send>>,
}

impl Payload {
    /// Wraps `value`, erasing its type.
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            value: Some(Box::new(value)),
        }
    }

    /// A payload holding nothing. Returned by invalid handles and by work
    /// items that were dropped unexecuted.
    pub fn empty() -> Self {
        Self { value: None }
    }

    /// Whether this payload holds a value.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Releases the stored value as `T`, consuming the payload.
    ///
    /// No conversions are attempted: `T` must be exactly the type the
    /// payload was constructed with.
    pub fn extract<T: Send + 'static>(self) -> Result<T, ExtractError> {
        match self.value {
            None => Err(ExtractError::Empty),
            Some(boxed) => boxed.downcast::<T>().map(|value| *value).map_err(|_| {
                ExtractError::TypeMismatch {
                    requested: std::any::type_name::<T>(),
                }
            }),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload")
            .field(if self.value.is_some() {
                &"<value>"
            } else {
                &"<empty>"
            })
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Report {
        name: String,
        lines: usize,
    }

    #[test]
    fn round_trip_preserves_value() {
        let payload = Payload::new(Report {
            name: "summary".to_string(),
            lines: 42,
        });
        assert!(!payload.is_empty());

        let report = payload.extract::<Report>().unwrap();
        assert_eq!(
            report,
            Report {
                name: "summary".to_string(),
                lines: 42,
            }
        );
    }

    #[test]
    fn extract_with_wrong_type_fails() {
        let payload = Payload::new(7u64);
        let err = payload.extract::<String>().unwrap_err();
        assert!(matches!(err, ExtractError::TypeMismatch { .. }));
    }

    #[test]
    fn empty_payload_reports_empty() {
        let payload = Payload::empty();
        assert!(payload.is_empty());
        assert_eq!(payload.extract::<u64>(), Err(ExtractError::Empty));
    }

    #[test]
    fn mismatch_names_requested_type() {
        let err = Payload::new(1i32).extract::<u8>().unwrap_err();
        match err {
            ExtractError::TypeMismatch { requested } => assert_eq!(requested, "u8"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
