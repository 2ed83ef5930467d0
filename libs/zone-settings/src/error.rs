use std::fmt;

use thiserror::Error;

/// Boxed error used at collaborator boundaries (transport, authenticator).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Pipeline step at which an operation failed.
///
/// Every caller-visible failure carries exactly one stage. Stages are never
/// rewritten after the fact: a decode failure stays a decode failure even if
/// a later step would have failed too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Stage {
    /// Required caller input is missing or not acceptable.
    Validation,
    /// The path template itself could not be resolved.
    UrlResolution,
    /// The outgoing value does not fit its declared shape.
    Encode,
    /// The transport collaborator reported a failure.
    Transport,
    /// The response did not match the expected envelope or result shape.
    Decode,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::UrlResolution => "url_resolution",
            Stage::Encode => "encode",
            Stage::Transport => "transport",
            Stage::Decode => "decode",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified operation failure.
///
/// Created once at the point of failure and never mutated. The component
/// error that caused it is available through [`std::error::Error::source`]
/// and can be downcast to the concrete type (`CodecError`, `PathError`, ...).
#[derive(Debug, Error)]
#[error("{operation} failed at {stage} stage: {cause}")]
pub struct OperationError {
    stage: Stage,
    operation: String,
    #[source]
    cause: BoxError,
}

impl OperationError {
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Operation name, e.g. `get_minify` or `update_dnssec`.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    #[must_use]
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    /// Attempts to view the cause as a concrete component error.
    #[must_use]
    pub fn cause_as<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.cause.downcast_ref::<E>()
    }

    /// Consumes the error and returns the boxed cause.
    #[must_use]
    pub fn into_cause(self) -> BoxError {
        self.cause
    }
}

/// Tags a failure with the stage and operation it belongs to.
///
/// Pure and total: no logging, no retry decisions. All failure paths of the
/// settings client go through this function before reaching the caller.
#[must_use]
pub fn classify(stage: Stage, operation: &str, cause: impl Into<BoxError>) -> OperationError {
    OperationError {
        stage,
        operation: operation.to_owned(),
        cause: cause.into(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::error::Error;

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection refused")
        }
    }

    impl Error for Refused {}

    #[test]
    fn classify_keeps_stage_and_operation() {
        let err = classify(Stage::Transport, "get_minify", Refused);
        assert_eq!(err.stage(), Stage::Transport);
        assert_eq!(err.operation(), "get_minify");
        assert_eq!(
            err.to_string(),
            "get_minify failed at transport stage: connection refused"
        );
    }

    #[test]
    fn classify_accepts_plain_strings() {
        let err = classify(Stage::Validation, "update_waf", "missing scope");
        assert_eq!(err.cause().to_string(), "missing scope");
    }

    #[test]
    fn cause_is_reachable_through_source() {
        let err = classify(Stage::Transport, "get_ipv6", Refused);
        let source = err.source().unwrap();
        assert!(source.downcast_ref::<Refused>().is_some());
        assert!(err.cause_as::<Refused>().is_some());
    }

    #[test]
    fn stage_names_are_stable() {
        let names: Vec<_> = [
            Stage::Validation,
            Stage::UrlResolution,
            Stage::Encode,
            Stage::Transport,
            Stage::Decode,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(
            names.join(" "),
            "validation url_resolution encode transport decode"
        );
    }
}
