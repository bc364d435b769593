//! Value-suppressing pass-through.
//!
//! The simplest complete operator, and the worked example of the protocol:
//! `next` is received and discarded, `error` and `complete` forward to the
//! destination unchanged and immediately. Filtering and mapping operators
//! differ from this one only in which channels they intercept and how.

use crate::stream::{Observable, Observer, StreamError, Subscriber, UnhandledError};

use super::Operator;

/// Operator that discards every value while passing termination through.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreElements;

struct IgnoreElementsObserver<T> {
    destination: Subscriber<T>,
}

impl<T> Observer<T> for IgnoreElementsObserver<T> {
    fn next(&mut self, _value: T) {
        // Received and discarded; only termination passes through.
    }

    fn error(&mut self, error: StreamError) -> Result<(), UnhandledError> {
        self.destination.error(error)
    }

    fn complete(&mut self) {
        self.destination.complete();
    }
}

impl<T: 'static> Operator<T, T> for IgnoreElements {
    fn apply(&self, destination: Subscriber<T>) -> Subscriber<T> {
        let subscription = destination.subscription().clone();
        Subscriber::with_subscription(IgnoreElementsObserver { destination }, subscription)
    }
}

impl<T: 'static> Observable<T> {
    /// Suppress every value, preserving error and completion timing.
    pub fn ignore_elements(&self) -> Observable<T> {
        self.lift(IgnoreElements)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
