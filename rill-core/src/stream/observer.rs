//! Observer types for the stream core.
//!
//! An observer is the consumer-side surface of a stream: up to three
//! capabilities, one per event kind. Two forms exist, resolved once at the
//! construction boundary rather than inspected at delivery time: any type
//! implementing [`Observer`], or a set of callbacks packed into a
//! [`CallbackObserver`] with any subset of the channels supplied.

use super::error::{StreamError, UnhandledError};

/// Consumer surface of a stream: the three event capabilities.
///
/// Implementations are driven by a [`Subscriber`](super::Subscriber), which
/// guarantees call ordering and stops delivering after the first terminal
/// event; observers themselves do not need to defend against late calls.
pub trait Observer<T>: Send {
    /// Receive a value.
    fn next(&mut self, value: T);

    /// Receive the terminal error.
    ///
    /// Returns `Err` when this observer has no way to handle the error, so
    /// the failure surfaces to whoever drove the delivery instead of being
    /// dropped.
    fn error(&mut self, error: StreamError) -> Result<(), UnhandledError>;

    /// Receive terminal completion.
    fn complete(&mut self);
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnMut(StreamError) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;

/// Callable-triple form of [`Observer`].
///
/// Any subset of the three channels may be supplied. Missing `next` and
/// `complete` channels are no-ops; a missing `error` channel makes terminal
/// errors surface as [`UnhandledError`] from the delivery path.
///
/// # Example
///
/// ```rust
/// use rill_core::stream::CallbackObserver;
///
/// let observer = CallbackObserver::new()
///     .on_next(|n: i32| println!("saw {n}"))
///     .on_complete(|| println!("done"));
/// # let _ = observer;
/// ```
pub struct CallbackObserver<T> {
    on_next: Option<NextFn<T>>,
    on_error: Option<ErrorFn>,
    on_complete: Option<CompleteFn>,
}

impl<T> CallbackObserver<T> {
    /// An observer with no channels supplied.
    pub fn new() -> Self {
        Self {
            on_next: None,
            on_error: None,
            on_complete: None,
        }
    }

    /// Supply the next channel.
    pub fn on_next(mut self, f: impl FnMut(T) + Send + 'static) -> Self {
        self.on_next = Some(Box::new(f));
        self
    }

    /// Supply the error channel.
    pub fn on_error(mut self, f: impl FnMut(StreamError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Supply the complete channel.
    pub fn on_complete(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl<T> Default for CallbackObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Observer<T> for CallbackObserver<T> {
    fn next(&mut self, value: T) {
        if let Some(f) = self.on_next.as_mut() {
            f(value);
        }
    }

    fn error(&mut self, error: StreamError) -> Result<(), UnhandledError> {
        match self.on_error.as_mut() {
            Some(f) => {
                f(error);
                Ok(())
            }
            None => Err(UnhandledError::new(error)),
        }
    }

    fn complete(&mut self) {
        if let Some(f) = self.on_complete.as_mut() {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[test]
    fn supplied_channels_are_invoked() {
        let sum = Arc::new(AtomicI32::new(0));
        let sum_clone = sum.clone();
        let completes = Arc::new(AtomicI32::new(0));
        let completes_clone = completes.clone();

        let mut observer = CallbackObserver::new()
            .on_next(move |n: i32| {
                sum_clone.fetch_add(n, Ordering::SeqCst);
            })
            .on_complete(move || {
                completes_clone.fetch_add(1, Ordering::SeqCst);
            });

        observer.next(1);
        observer.next(2);
        observer.complete();

        assert_eq!(sum.load(Ordering::SeqCst), 3);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_next_and_complete_are_no_ops() {
        let mut observer = CallbackObserver::<i32>::new();

        observer.next(1);
        observer.complete();
    }

    #[test]
    fn missing_error_channel_surfaces_unhandled() {
        let mut observer = CallbackObserver::<i32>::new();

        let outcome = observer.error(StreamError::msg("nobody home"));

        let unhandled = outcome.unwrap_err();
        assert_eq!(unhandled.stream_error().to_string(), "nobody home");
    }

    #[test]
    fn supplied_error_channel_handles() {
        let errors = Arc::new(AtomicI32::new(0));
        let errors_clone = errors.clone();

        let mut observer =
            CallbackObserver::<i32>::new().on_error(move |_| {
                errors_clone.fetch_add(1, Ordering::SeqCst);
            });

        assert!(observer.error(StreamError::unspecified()).is_ok());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }
}
