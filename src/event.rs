//! Failure reporting side channel.
//!
//! Codecs funnel every deserialization failure through an optional
//! registered callback before raising it to the caller, so an operational
//! layer can log or emit telemetry without altering control flow. The
//! reporter is never a retry or recovery mechanism, and soft end-of-stream
//! is not a failure.

use crate::error::Error;

/// A deserialization failure, carrying the partially-accumulated frame for
/// diagnostics.
#[derive(Debug)]
pub struct FailureEvent<'a> {
    /// The error about to be raised to the caller.
    pub cause: &'a Error,
    /// The frame bytes accumulated before the failure (possibly empty).
    pub buffer: &'a [u8],
    /// Offset at which the failure was detected; `None` when it occurred
    /// before any payload byte was read (e.g. during header decode).
    pub offset: Option<usize>,
}

/// Callback sink invoked once per deserialization failure.
pub type ErrorReporter = Box<dyn Fn(FailureEvent<'_>) + Send>;

pub(crate) fn report(
    reporter: &Option<ErrorReporter>,
    cause: &Error,
    buffer: &[u8],
    offset: Option<usize>,
) {
    if let Some(reporter) = reporter {
        reporter(FailureEvent {
            cause,
            buffer,
            offset,
        });
    }
}
