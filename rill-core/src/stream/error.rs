//! Error types for the stream core.
//!
//! Three failure categories exist, and they travel different paths:
//!
//! - A **stream error** ([`StreamError`]) is an expected terminal event,
//!   delivered through the observer's error capability.
//! - A **teardown failure** ([`TeardownError`], aggregated into
//!   [`UnsubscribeError`]) happens while a subscription releases its
//!   resources. It is collected, never short-circuited.
//! - An **unhandled error** ([`UnhandledError`]) is a terminal stream error
//!   that reached a consumer with no error capability. It is returned from
//!   the delivery path so the caller decides, instead of being dropped.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Error payload carried on a stream's error channel.
///
/// The payload is optional: a producer may signal failure without supplying
/// an underlying error. Cloning is cheap; the inner error is shared.
#[derive(Debug, Clone)]
pub struct StreamError {
    inner: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl StreamError {
    /// Wrap an underlying error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            inner: Some(Arc::new(error)),
        }
    }

    /// Failure described by a bare message, with no underlying error type.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    /// Failure without any supplied payload.
    pub fn unspecified() -> Self {
        Self { inner: None }
    }

    /// True when no payload was supplied.
    pub fn is_unspecified(&self) -> bool {
        self.inner.is_none()
    }

    /// Payload identity: do two errors carry the same underlying payload?
    ///
    /// Two unspecified errors count as the same. This is the stream-level
    /// notion of "the same error" used when a transformation forwards an
    /// error unchanged.
    pub fn same(&self, other: &StreamError) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(error) => write!(f, "{error}"),
            None => f.write_str("stream error (no payload)"),
        }
    }
}

/// Message-only payload backing [`StreamError::msg`].
#[derive(Debug, Error)]
#[error("{0}")]
struct MessageError(String);

/// A single teardown action failed while a subscription was closing.
#[derive(Debug, Clone, Error)]
#[error("teardown failed: {message}")]
pub struct TeardownError {
    message: String,
}

impl TeardownError {
    /// Teardown failure with the given description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Aggregate failure from one unsubscribe pass.
///
/// Every owned teardown runs before this is reported; a failing action
/// never prevents its siblings from running.
#[derive(Debug, Error)]
#[error("{} teardown action(s) failed while unsubscribing", .failures.len())]
pub struct UnsubscribeError {
    failures: Vec<TeardownError>,
}

impl UnsubscribeError {
    pub(crate) fn new(failures: Vec<TeardownError>) -> Self {
        Self { failures }
    }

    /// The individual teardown failures, in the order they occurred.
    pub fn failures(&self) -> &[TeardownError] {
        &self.failures
    }

    /// Consume the aggregate, yielding the individual failures.
    pub fn into_failures(self) -> Vec<TeardownError> {
        self.failures
    }
}

/// A terminal stream error reached a consumer with no error capability.
#[derive(Debug, Clone, Error)]
#[error("unhandled stream error: {0}")]
pub struct UnhandledError(StreamError);

impl UnhandledError {
    /// Wrap the stream error that went unhandled.
    pub fn new(error: StreamError) -> Self {
        Self(error)
    }

    /// The stream error that went unhandled.
    pub fn stream_error(&self) -> &StreamError {
        &self.0
    }

    /// Consume the wrapper, yielding the stream error.
    pub fn into_stream_error(self) -> StreamError {
        self.0
    }
}
