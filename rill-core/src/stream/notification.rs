//! Notification Implementation
//!
//! A Notification is an immutable encoding of a single stream event. Every
//! delivery a subscriber can receive (a next value, a terminal error, or
//! completion) has a notification form, which makes events first-class
//! values that can be stored, replayed through [`Notification::to_observable`],
//! or routed to an observer after the fact.
//!
//! # Identity
//!
//! Rust values have no object identity, so the sharing contract is tracked
//! with instance IDs:
//!
//! - `next(v)` takes a fresh ID on every call, even for equal values.
//! - The valueless next ([`Notification::empty_next`]) and completion
//!   ([`Notification::complete`]) always carry their shared sentinel ID.
//! - Error notifications are never shared, even when the payload is
//!   unspecified; every call produces a distinct instance.
//!
//! [`Notification::same_instance`] is the observable form of this policy.

use std::sync::atomic::{AtomicU64, Ordering};

use super::error::{StreamError, UnhandledError};
use super::observable::Observable;
use super::observer::Observer;
use super::subscription::Teardown;

/// Sentinel instance ID shared by every valueless next notification.
const SHARED_NEXT_ID: u64 = 0;

/// Sentinel instance ID shared by every completion notification.
const SHARED_COMPLETE_ID: u64 = 1;

/// Counter for fresh notification instance IDs.
static NOTIFICATION_ID_COUNTER: AtomicU64 = AtomicU64::new(2);

/// Generate a new unique notification instance ID.
fn next_notification_id() -> u64 {
    NOTIFICATION_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// The kind of stream event a [`Notification`] encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A value emission.
    Next,
    /// A terminal error.
    Error,
    /// Terminal completion.
    Complete,
}

#[derive(Debug, Clone)]
enum Payload<T> {
    Next(T),
    Error(StreamError),
    Complete,
}

/// An immutable encoding of one stream event.
///
/// The variant is fixed at construction and never changes.
#[derive(Debug, Clone)]
pub struct Notification<T> {
    payload: Payload<T>,
    id: u64,
}

impl<T> Notification<T> {
    /// A next notification carrying `value`. Always a fresh instance.
    pub fn next(value: T) -> Self {
        Self {
            payload: Payload::Next(value),
            id: next_notification_id(),
        }
    }

    /// An error notification. Always a fresh instance, even when the
    /// payload is [`StreamError::unspecified`].
    pub fn error(error: StreamError) -> Self {
        Self {
            payload: Payload::Error(error),
            id: next_notification_id(),
        }
    }

    /// The completion notification. Always the shared instance.
    pub fn complete() -> Self {
        Self {
            payload: Payload::Complete,
            id: SHARED_COMPLETE_ID,
        }
    }

    /// The kind of event this notification encodes.
    pub fn kind(&self) -> NotificationKind {
        match self.payload {
            Payload::Next(_) => NotificationKind::Next,
            Payload::Error(_) => NotificationKind::Error,
            Payload::Complete => NotificationKind::Complete,
        }
    }

    /// True for next notifications.
    pub fn is_next(&self) -> bool {
        matches!(self.payload, Payload::Next(_))
    }

    /// True for error notifications.
    pub fn is_error(&self) -> bool {
        matches!(self.payload, Payload::Error(_))
    }

    /// True for completion notifications.
    pub fn is_complete(&self) -> bool {
        matches!(self.payload, Payload::Complete)
    }

    /// True for every next notification, valueless included.
    pub fn has_value(&self) -> bool {
        self.is_next()
    }

    /// The carried value, for next notifications.
    pub fn value(&self) -> Option<&T> {
        match &self.payload {
            Payload::Next(value) => Some(value),
            _ => None,
        }
    }

    /// The carried error payload, for error notifications.
    pub fn exception(&self) -> Option<&StreamError> {
        match &self.payload {
            Payload::Error(error) => Some(error),
            _ => None,
        }
    }

    /// This notification's instance ID.
    pub fn instance_id(&self) -> u64 {
        self.id
    }

    /// Instance identity: shared notifications compare equal across calls,
    /// freshly allocated ones never do.
    pub fn same_instance(&self, other: &Notification<T>) -> bool {
        self.id == other.id
    }

    /// Route this notification to exactly one of three channels, matching
    /// its kind. The channel runs synchronously, exactly once per call.
    pub fn dispatch<N, E, C>(&self, on_next: N, on_error: E, on_complete: C)
    where
        N: FnOnce(&T),
        E: FnOnce(&StreamError),
        C: FnOnce(),
    {
        match &self.payload {
            Payload::Next(value) => on_next(value),
            Payload::Error(error) => on_error(error),
            Payload::Complete => on_complete(),
        }
    }
}

impl Notification<()> {
    /// The valueless next notification. Always the shared instance.
    ///
    /// The absent value is `()`: a typed stream has no valueless next at
    /// any other element type.
    pub fn empty_next() -> Self {
        Self {
            payload: Payload::Next(()),
            id: SHARED_NEXT_ID,
        }
    }
}

impl<T: Clone> Notification<T> {
    /// Route this notification to the matching capability of an
    /// observer-shaped target. A [`Subscriber`](super::Subscriber) is
    /// itself an observer, so live endpoints are accepted too.
    pub fn observe(&self, observer: &mut dyn Observer<T>) -> Result<(), UnhandledError> {
        match &self.payload {
            Payload::Next(value) => {
                observer.next(value.clone());
                Ok(())
            }
            Payload::Error(error) => observer.error(error.clone()),
            Payload::Complete => {
                observer.complete();
                Ok(())
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Notification<T> {
    /// An observable that replays exactly this notification as a terminal
    /// sequence: a next value followed by completion, an immediate error,
    /// or an immediate completion. No scheduling delay is introduced.
    pub fn to_observable(&self) -> Observable<T> {
        let notification = self.clone();
        Observable::new(move |subscriber| {
            match &notification.payload {
                Payload::Next(value) => {
                    subscriber.next(value.clone());
                    subscriber.complete();
                }
                Payload::Error(error) => return Err(error.clone()),
                Payload::Complete => subscriber.complete(),
            }
            Ok(Teardown::none())
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
