//! Subscriber Implementation
//!
//! A Subscriber is the live, consumer-side endpoint of one stream
//! execution. It pairs an observer with a [`Subscription`] and enforces
//! the delivery contract:
//!
//! 1. Events reach the observer in producer call order.
//!
//! 2. Termination is exactly-once: after the first `error` or `complete`,
//!    every further delivery is silently discarded.
//!
//! 3. Terminal events release the subscription automatically, after the
//!    observer has been notified.
//!
//! # State Machine
//!
//! `Active -> Active` on next, `Active -> Terminated` on error or complete,
//! and `Terminated` is absorbing. Cancellation (`Open -> Closed`) is an
//! orthogonal axis owned by the subscription; a subscriber that is closed
//! but not yet terminated also stops delivering.
//!
//! # Thread Safety
//!
//! The stopped flag is atomic and the observer sits behind a mutex, so a
//! producer and a cancelling consumer may race without double-delivering a
//! terminal event. Panics from observer callbacks are not caught here;
//! they propagate to whoever drove the delivery.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, trace};

use super::error::{StreamError, UnhandledError};
use super::observer::{CallbackObserver, Observer};
use super::subscription::Subscription;

/// Live consumer-side endpoint: an observer plus its subscription.
///
/// Cloning shares state; every handle refers to the same endpoint. One
/// subscriber belongs to exactly one subscription and is never reused
/// across subscriptions.
pub struct Subscriber<T> {
    /// The wrapped observer. The mutex serializes delivery.
    observer: Arc<Mutex<Box<dyn Observer<T>>>>,

    /// Monotonic termination flag: true after the first error or complete.
    stopped: Arc<AtomicBool>,

    /// The subscription this subscriber's resources hang off.
    subscription: Subscription,
}

impl<T> Subscriber<T> {
    /// Subscriber from an observer, with a fresh subscription.
    pub fn new(observer: impl Observer<T> + 'static) -> Self {
        Self::with_subscription(observer, Subscription::new())
    }

    /// Subscriber from a bare next callback. The missing error channel
    /// makes terminal errors surface as [`UnhandledError`].
    pub fn from_next(on_next: impl FnMut(T) + Send + 'static) -> Self
    where
        T: 'static,
    {
        Self::new(CallbackObserver::new().on_next(on_next))
    }

    /// Subscriber sharing an existing subscription.
    ///
    /// Operators wrap their destination this way: the wrapping subscriber
    /// and the destination close together, whichever side unsubscribes.
    pub fn with_subscription(observer: impl Observer<T> + 'static, subscription: Subscription) -> Self {
        Self {
            observer: Arc::new(Mutex::new(Box::new(observer))),
            stopped: Arc::new(AtomicBool::new(false)),
            subscription,
        }
    }

    /// Wrap a destination subscriber directly: all three channels forward
    /// unchanged and the subscription is shared.
    pub fn wrap(destination: &Subscriber<T>) -> Self
    where
        T: 'static,
    {
        Self::with_subscription(destination.clone(), destination.subscription().clone())
    }

    /// True after the first terminal event has been delivered.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// The subscription this subscriber hangs off.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Deliver a value.
    ///
    /// Discarded without reaching the observer when this subscriber has
    /// terminated or its subscription closed. Does not itself terminate.
    pub fn next(&self, value: T) {
        if self.is_stopped() || self.subscription.is_closed() {
            trace!(
                subscription = self.subscription.id(),
                "discarding next after termination or close"
            );
            return;
        }
        self.observer.lock().next(value);
    }

    /// Deliver the terminal error, then release the subscription.
    ///
    /// No-op once terminated. Returns `Err` when the observer had no error
    /// capability, so an unhandled stream error is never silently dropped.
    pub fn error(&self, error: StreamError) -> Result<(), UnhandledError> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let outcome = if self.subscription.is_closed() {
            trace!(
                subscription = self.subscription.id(),
                "discarding error after close"
            );
            Ok(())
        } else {
            self.observer.lock().error(error)
        };

        self.finish();
        outcome
    }

    /// Deliver completion, then release the subscription.
    ///
    /// No-op once terminated.
    pub fn complete(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        if self.subscription.is_closed() {
            trace!(
                subscription = self.subscription.id(),
                "discarding complete after close"
            );
        } else {
            self.observer.lock().complete();
        }

        self.finish();
    }

    /// Auto-teardown after a terminal event. The consumer already got its
    /// terminal notification, so failures here surface in the log.
    fn finish(&self) {
        if let Err(failure) = self.subscription.unsubscribe() {
            error!(
                subscription = self.subscription.id(),
                %failure,
                "teardown failed after terminal event"
            );
        }
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            observer: Arc::clone(&self.observer),
            stopped: Arc::clone(&self.stopped),
            subscription: self.subscription.clone(),
        }
    }
}

/// A subscriber is itself an observer, which lets operators treat their
/// destination uniformly and lets notifications be observed by live
/// endpoints.
impl<T> Observer<T> for Subscriber<T> {
    fn next(&mut self, value: T) {
        Subscriber::next(self, value);
    }

    fn error(&mut self, error: StreamError) -> Result<(), UnhandledError> {
        Subscriber::error(self, error)
    }

    fn complete(&mut self) {
        Subscriber::complete(self);
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("stopped", &self.is_stopped())
            .field("subscription", &self.subscription)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::subscription::Teardown;
    use std::sync::atomic::AtomicI32;

    struct Counters {
        next: AtomicI32,
        errors: AtomicI32,
        completes: AtomicI32,
    }

    impl Counters {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                next: AtomicI32::new(0),
                errors: AtomicI32::new(0),
                completes: AtomicI32::new(0),
            })
        }
    }

    fn counting_subscriber(counters: &Arc<Counters>) -> Subscriber<i32> {
        let on_next = counters.clone();
        let on_error = counters.clone();
        let on_complete = counters.clone();
        Subscriber::new(
            CallbackObserver::new()
                .on_next(move |_: i32| {
                    on_next.next.fetch_add(1, Ordering::SeqCst);
                })
                .on_error(move |_| {
                    on_error.errors.fetch_add(1, Ordering::SeqCst);
                })
                .on_complete(move || {
                    on_complete.completes.fetch_add(1, Ordering::SeqCst);
                }),
        )
    }

    #[test]
    fn delivers_in_call_order_until_complete() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let subscriber = Subscriber::from_next(move |n: i32| {
            seen_clone.lock().push(n);
        });

        subscriber.next(1);
        subscriber.next(2);
        subscriber.next(3);
        subscriber.complete();
        subscriber.next(4);

        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn nothing_is_delivered_after_complete() {
        let counters = Counters::new();
        let subscriber = counting_subscriber(&counters);

        subscriber.complete();
        subscriber.next(1);
        let _ = subscriber.error(StreamError::msg("late"));
        subscriber.complete();

        assert_eq!(counters.next.load(Ordering::SeqCst), 0);
        assert_eq!(counters.errors.load(Ordering::SeqCst), 0);
        assert_eq!(counters.completes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nothing_is_delivered_after_error() {
        let counters = Counters::new();
        let subscriber = counting_subscriber(&counters);

        subscriber.next(1);
        subscriber.error(StreamError::msg("boom")).unwrap();
        subscriber.next(2);
        subscriber.complete();
        let _ = subscriber.error(StreamError::msg("again"));

        assert_eq!(counters.next.load(Ordering::SeqCst), 1);
        assert_eq!(counters.errors.load(Ordering::SeqCst), 1);
        assert_eq!(counters.completes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn terminal_events_release_the_subscription() {
        let released = Arc::new(AtomicBool::new(false));
        let released_clone = released.clone();

        let counters = Counters::new();
        let subscriber = counting_subscriber(&counters);
        subscriber.subscription().add(Teardown::action(move || {
            released_clone.store(true, Ordering::SeqCst);
        }));

        assert!(!subscriber.subscription().is_closed());
        subscriber.complete();

        assert!(subscriber.subscription().is_closed());
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn delivery_stops_once_the_subscription_closes() {
        let counters = Counters::new();
        let subscriber = counting_subscriber(&counters);

        subscriber.next(1);
        subscriber.subscription().unsubscribe().unwrap();
        subscriber.next(2);
        subscriber.complete();

        assert_eq!(counters.next.load(Ordering::SeqCst), 1);
        assert_eq!(counters.completes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_error_capability_surfaces_unhandled() {
        let subscriber = Subscriber::from_next(|_: i32| {});

        let unhandled = subscriber.error(StreamError::msg("boom")).unwrap_err();
        assert_eq!(unhandled.stream_error().to_string(), "boom");

        // Delivery still terminated and released the subscription
        assert!(subscriber.is_stopped());
        assert!(subscriber.subscription().is_closed());
    }

    #[test]
    fn consumer_may_unsubscribe_from_inside_next() {
        let counters = Counters::new();
        let subscription = Subscription::new();

        let on_next_counters = counters.clone();
        let handle = subscription.clone();
        let observer = CallbackObserver::new().on_next(move |_: i32| {
            on_next_counters.next.fetch_add(1, Ordering::SeqCst);
            handle.unsubscribe().unwrap();
        });

        let subscriber = Subscriber::with_subscription(observer, subscription);

        subscriber.next(1);
        subscriber.next(2);
        subscriber.next(3);

        // Only the delivery that triggered the cancellation got through
        assert_eq!(counters.next.load(Ordering::SeqCst), 1);
        assert!(subscriber.subscription().is_closed());
        assert!(!subscriber.is_stopped());
    }

    #[test]
    fn wrap_shares_subscription_and_forwards() {
        let counters = Counters::new();
        let destination = counting_subscriber(&counters);
        let wrapped = Subscriber::wrap(&destination);

        assert!(wrapped.subscription().ptr_eq(destination.subscription()));

        wrapped.next(1);
        wrapped.complete();

        assert_eq!(counters.next.load(Ordering::SeqCst), 1);
        assert_eq!(counters.completes.load(Ordering::SeqCst), 1);
        assert!(destination.subscription().is_closed());
    }
}
