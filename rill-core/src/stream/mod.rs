//! Stream Primitives
//!
//! This module implements the building blocks every stream transformation
//! is made of: notifications, subscriptions, subscribers, observers, and
//! observables.
//!
//! # Concepts
//!
//! ## Notifications
//!
//! A [`Notification`] is an immutable value encoding a single stream event:
//! a next value, a terminal error, or completion. Notifications make event
//! delivery a first-class value that can be stored, replayed, and compared.
//!
//! ## Subscriptions
//!
//! A [`Subscription`] is a cancellation handle. It owns teardown actions and
//! child subscriptions, and releases every owned resource exactly once when
//! it closes, no matter how many times or from where `unsubscribe` is
//! called.
//!
//! ## Subscribers
//!
//! A [`Subscriber`] pairs an observer with a subscription and enforces the
//! delivery contract: events arrive in producer call order, nothing is
//! delivered after the first terminal event, and terminal events release
//! the subscription automatically.
//!
//! ## Observables
//!
//! An [`Observable`] is a lazy description of a producible sequence.
//! Constructing one has no side effects; each subscription runs the
//! producer independently.
//!
//! # Implementation Notes
//!
//! Termination (`Active` -> `Terminated`) and cancellation
//! (`Open` -> `Closed`) are two orthogonal, absorbing state axes. Both are
//! tracked with atomic flags so that a producer tearing down its own
//! subscription from inside a delivery callback observes a consistent
//! state.

mod error;
mod notification;
mod observable;
mod observer;
mod subscriber;
mod subscription;

pub use error::{StreamError, TeardownError, UnhandledError, UnsubscribeError};
pub use notification::{Notification, NotificationKind};
pub use observable::Observable;
pub use observer::{CallbackObserver, Observer};
pub use subscriber::Subscriber;
pub use subscription::{Subscription, Teardown};
