//! Observable Implementation
//!
//! An Observable is a lazy, re-executable description of a producible
//! event sequence. Constructing one has no side effects; the stored
//! producer runs once per subscription, each execution fully independent
//! of the others.
//!
//! # How Subscribing Works
//!
//! 1. The consumer's observer (or bare callback) is wrapped in a fresh
//!    [`Subscriber`].
//!
//! 2. The producer runs with that subscriber and returns a [`Teardown`]
//!    for whatever resource it acquired, which is attached to the
//!    subscriber's subscription.
//!
//! 3. The subscription is returned to the consumer as the cancellation
//!    handle.
//!
//! A producer that fails before returning its teardown is routed through
//! the subscriber's error path, which also closes the partial
//! subscription.
//!
//! # Scheduling
//!
//! The core never assumes a time source. A producer may emit synchronously
//! on the subscribing call stack, or capture any deferral capability the
//! caller supplies and emit from there; the delivery contract is identical
//! either way.

use std::sync::Arc;

use tracing::error;

use super::error::StreamError;
use super::observer::{CallbackObserver, Observer};
use super::subscriber::Subscriber;
use super::subscription::{Subscription, Teardown};

type ProducerFn<T> = dyn Fn(Subscriber<T>) -> Result<Teardown, StreamError> + Send + Sync;

/// Lazy, re-executable description of a producible event sequence.
///
/// Cloning is cheap and shares the producer; each subscription still gets
/// its own independent execution.
pub struct Observable<T> {
    producer: Arc<ProducerFn<T>>,
}

impl<T: 'static> Observable<T> {
    /// Observable from a producer function.
    ///
    /// The producer is not run here; subscribing is the only trigger.
    pub fn new(
        producer: impl Fn(Subscriber<T>) -> Result<Teardown, StreamError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            producer: Arc::new(producer),
        }
    }

    /// Subscribe with an observer, returning the cancellation handle.
    pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> Subscription {
        self.subscribe_subscriber(&Subscriber::new(observer))
    }

    /// Subscribe with a bare next callback.
    pub fn subscribe_next(&self, on_next: impl FnMut(T) + Send + 'static) -> Subscription {
        self.subscribe(CallbackObserver::new().on_next(on_next))
    }

    /// Subscribe with an existing subscriber.
    ///
    /// This is the core entry every other subscribe form funnels into, and
    /// the one operators use: the producer's teardown lands on the
    /// subscriber's own subscription, so no resource outlives it.
    pub fn subscribe_subscriber(&self, subscriber: &Subscriber<T>) -> Subscription {
        let subscription = subscriber.subscription().clone();

        match (self.producer)(subscriber.clone()) {
            Ok(teardown) => subscription.add(teardown),
            Err(failure) => {
                // Synchronous producer failure: route through the error
                // path, which also closes the partial subscription.
                if let Err(unhandled) = subscriber.error(failure) {
                    error!(
                        subscription = subscription.id(),
                        %unhandled,
                        "producer failed with no consumer error capability"
                    );
                }
            }
        }

        subscription
    }

    /// Derive a new observable by applying an operator.
    ///
    /// On subscription the operator wraps the destination subscriber, and
    /// the source is subscribed with the wrapped subscriber. The wrapped
    /// subscriber shares the destination's subscription, so the derived
    /// observable introduces no independent resource: cancelling it is
    /// exactly cancelling the source.
    pub fn lift<Out, Op>(&self, operator: Op) -> Observable<Out>
    where
        Out: 'static,
        Op: crate::operator::Operator<T, Out> + 'static,
    {
        let source = self.clone();
        Observable::new(move |destination: Subscriber<Out>| {
            let wrapped = operator.apply(destination);
            source.subscribe_subscriber(&wrapped);
            Ok(Teardown::none())
        })
    }

    /// Completes immediately without emitting.
    pub fn empty() -> Self {
        Observable::new(|subscriber| {
            subscriber.complete();
            Ok(Teardown::none())
        })
    }

    /// Never emits and never terminates; the subscription stays open until
    /// the consumer cancels it.
    pub fn never() -> Self {
        Observable::new(|_subscriber| Ok(Teardown::none()))
    }

    /// Errors immediately with `error`.
    pub fn throw(error: StreamError) -> Self {
        Observable::new(move |_subscriber| Err(error.clone()))
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// Emits `value` once, then completes.
    pub fn of(value: T) -> Self {
        Observable::new(move |subscriber| {
            subscriber.next(value.clone());
            subscriber.complete();
            Ok(Teardown::none())
        })
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

    #[test]
    fn construction_has_no_side_effects() {
        let runs = Arc::new(AtomicI32::new(0));
        let runs_clone = runs.clone();

        let observable = Observable::new(move |subscriber: Subscriber<i32>| {
            runs_clone.fetch_add(1, Ordering::SeqCst);
            subscriber.complete();
            Ok(Teardown::none())
        });

        assert_eq!(runs.load(Ordering::SeqCst), 0);

        observable.subscribe_next(|_| {});
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn each_subscription_is_an_independent_execution() {
        let runs = Arc::new(AtomicI32::new(0));
        let runs_clone = runs.clone();

        let observable = Observable::new(move |subscriber: Subscriber<i32>| {
            runs_clone.fetch_add(1, Ordering::SeqCst);
            subscriber.next(1);
            subscriber.complete();
            Ok(Teardown::none())
        });

        let first_seen = Arc::new(AtomicI32::new(0));
        let first_clone = first_seen.clone();
        observable.subscribe_next(move |n| {
            first_clone.fetch_add(n, Ordering::SeqCst);
        });

        let second_seen = Arc::new(AtomicI32::new(0));
        let second_clone = second_seen.clone();
        observable.subscribe_next(move |n| {
            second_clone.fetch_add(n, Ordering::SeqCst);
        });

        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(first_seen.load(Ordering::SeqCst), 1);
        assert_eq!(second_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn producer_teardown_runs_on_unsubscribe() {
        let released = Arc::new(AtomicBool::new(false));
        let released_clone = released.clone();

        let observable = Observable::new(move |_subscriber: Subscriber<i32>| {
            let released = released_clone.clone();
            Ok(Teardown::action(move || {
                released.store(true, Ordering::SeqCst);
            }))
        });

        let subscription = observable.subscribe_next(|_| {});
        assert!(!released.load(Ordering::SeqCst));

        subscription.unsubscribe().unwrap();
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn producer_failure_routes_to_error_path() {
        let errors = Arc::new(AtomicI32::new(0));
        let errors_clone = errors.clone();

        let observable = Observable::new(|_subscriber: Subscriber<i32>| {
            Err(StreamError::msg("could not start"))
        });

        let subscription = observable.subscribe(
            CallbackObserver::new()
                .on_next(|_: i32| panic!("should not be called"))
                .on_error(move |failure| {
                    assert_eq!(failure.to_string(), "could not start");
                    errors_clone.fetch_add(1, Ordering::SeqCst);
                }),
        );

        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert!(subscription.is_closed());
    }

    #[test]
    fn empty_completes_immediately() {
        let completes = Arc::new(AtomicI32::new(0));
        let completes_clone = completes.clone();

        let subscription = Observable::<i32>::empty().subscribe(
            CallbackObserver::new()
                .on_next(|_: i32| panic!("should not be called"))
                .on_complete(move || {
                    completes_clone.fetch_add(1, Ordering::SeqCst);
                }),
        );

        assert_eq!(completes.load(Ordering::SeqCst), 1);
        assert!(subscription.is_closed());
    }

    #[test]
    fn never_stays_open() {
        let subscription = Observable::<i32>::never().subscribe_next(|_| panic!("should not be called"));

        assert!(!subscription.is_closed());
        subscription.unsubscribe().unwrap();
        assert!(subscription.is_closed());
    }

    #[test]
    fn throw_errors_immediately() {
        let failure = StreamError::msg("bad source");
        let errors = Arc::new(AtomicI32::new(0));
        let errors_clone = errors.clone();

        let expected = failure.clone();
        let subscription = Observable::<i32>::throw(failure).subscribe(
            CallbackObserver::new().on_error(move |seen| {
                assert!(seen.same(&expected));
                errors_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert!(subscription.is_closed());
    }

    #[test]
    fn of_emits_once_then_completes() {
        let seen = Arc::new(AtomicI32::new(0));
        let seen_clone = seen.clone();
        let completes = Arc::new(AtomicI32::new(0));
        let completes_clone = completes.clone();

        Observable::of(41).subscribe(
            CallbackObserver::new()
                .on_next(move |n: i32| {
                    seen_clone.store(n, Ordering::SeqCst);
                })
                .on_complete(move || {
                    completes_clone.fetch_add(1, Ordering::SeqCst);
                }),
        );

        assert_eq!(seen.load(Ordering::SeqCst), 41);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_teardown_is_released_when_producer_terminated_synchronously() {
        let released = Arc::new(AtomicBool::new(false));
        let released_clone = released.clone();

        // The producer completes before returning its teardown; the
        // teardown must still be released, immediately.
        let observable = Observable::new(move |subscriber: Subscriber<i32>| {
            subscriber.complete();
            let released = released_clone.clone();
            Ok(Teardown::action(move || {
                released.store(true, Ordering::SeqCst);
            }))
        });

        let subscription = observable.subscribe_next(|_| {});

        assert!(subscription.is_closed());
        assert!(released.load(Ordering::SeqCst));
    }
}
