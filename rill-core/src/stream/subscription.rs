//! Subscription Implementation
//!
//! A Subscription is a cancellable unit of work. It owns an ordered list of
//! resources, either teardown actions or child subscriptions, and releases
//! all of them exactly once when it closes.
//!
//! # State Machine
//!
//! A subscription is `Open` until the first `unsubscribe` call flips it to
//! `Closed`. `Closed` is absorbing: later calls are no-ops and resources
//! added afterwards are released immediately instead of stored.
//!
//! # Re-entrancy
//!
//! Teardowns run outside the internal lock. A teardown may therefore call
//! `add` or `unsubscribe` on the very subscription that is closing (the
//! pattern a producer uses to cancel itself from inside its own delivery
//! callback) without deadlocking or running anything twice.
//!
//! # Failure Semantics
//!
//! A teardown action that fails never prevents its siblings from running.
//! Failures are collected across the whole pass and reported once, as an
//! aggregate, after every owned resource has been released.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{error, trace};

use super::error::{TeardownError, UnsubscribeError};

/// Counter for generating unique subscription IDs.
static SUBSCRIPTION_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique subscription ID.
fn next_subscription_id() -> u64 {
    SUBSCRIPTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A resource owned by a [`Subscription`], released exactly once on close.
pub enum Teardown {
    /// Nothing to release.
    None,
    /// An action to run on close.
    Action(Box<dyn FnOnce() -> Result<(), TeardownError> + Send>),
    /// A child subscription to close.
    Subscription(Subscription),
}

impl Teardown {
    /// The empty teardown.
    pub fn none() -> Self {
        Self::None
    }

    /// Teardown from an infallible action.
    pub fn action(f: impl FnOnce() + Send + 'static) -> Self {
        Self::Action(Box::new(move || {
            f();
            Ok(())
        }))
    }

    /// Teardown from an action that can report failure.
    pub fn fallible(f: impl FnOnce() -> Result<(), TeardownError> + Send + 'static) -> Self {
        Self::Action(Box::new(f))
    }

    /// Release the resource, pushing any failures onto `failures`.
    fn close(self, failures: &mut Vec<TeardownError>) {
        match self {
            Teardown::None => {}
            Teardown::Action(action) => {
                if let Err(failure) = action() {
                    failures.push(failure);
                }
            }
            Teardown::Subscription(child) => {
                if let Err(aggregate) = child.unsubscribe() {
                    failures.extend(aggregate.into_failures());
                }
            }
        }
    }
}

impl From<Subscription> for Teardown {
    fn from(subscription: Subscription) -> Self {
        Self::Subscription(subscription)
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Teardown::None => f.write_str("Teardown::None"),
            Teardown::Action(_) => f.write_str("Teardown::Action"),
            Teardown::Subscription(child) => {
                f.debug_tuple("Teardown::Subscription").field(child).finish()
            }
        }
    }
}

struct SubscriptionInner {
    /// Unique identifier for this subscription.
    id: u64,

    /// Monotonic close flag: false until the first unsubscribe, true after.
    closed: AtomicBool,

    /// Resources released when this subscription closes. Most subscriptions
    /// own one or two.
    resources: Mutex<SmallVec<[Teardown; 2]>>,
}

/// Composable, idempotent cancellation handle.
///
/// Cloning shares state: every handle refers to the same subscription, and
/// closing any of them closes all of them.
///
/// # Example
///
/// ```rust
/// use rill_core::stream::{Subscription, Teardown};
///
/// let subscription = Subscription::new();
/// subscription.add(Teardown::action(|| println!("released")));
///
/// subscription.unsubscribe().unwrap();
/// assert!(subscription.is_closed());
///
/// // Idempotent: nothing runs a second time
/// subscription.unsubscribe().unwrap();
/// ```
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

impl Subscription {
    /// Create a new open subscription owning no resources.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                id: next_subscription_id(),
                closed: AtomicBool::new(false),
                resources: Mutex::new(SmallVec::new()),
            }),
        }
    }

    /// Get the subscription's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// True once this subscription has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Handle identity: do two handles share the same subscription state?
    pub fn ptr_eq(&self, other: &Subscription) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The number of resources currently owned.
    pub fn resource_count(&self) -> usize {
        self.inner.resources.lock().len()
    }

    /// Register a resource to release when this subscription closes.
    ///
    /// If the subscription is already closed, the resource is released
    /// immediately instead of stored; a failure on that path is logged,
    /// never dropped.
    pub fn add(&self, teardown: impl Into<Teardown>) {
        let teardown = teardown.into();
        if matches!(teardown, Teardown::None) {
            return;
        }

        {
            let mut resources = self.inner.resources.lock();
            if !self.is_closed() {
                resources.push(teardown);
                return;
            }
        }

        // Already closed: release immediately.
        let mut failures = Vec::new();
        teardown.close(&mut failures);
        for failure in &failures {
            error!(
                subscription = self.inner.id,
                %failure,
                "teardown failed while closing a resource added after unsubscribe"
            );
        }
    }

    /// Detach a previously added child without closing it.
    pub fn remove(&self, child: &Subscription) {
        let mut resources = self.inner.resources.lock();
        resources.retain(|resource| {
            !matches!(resource, Teardown::Subscription(owned) if owned.ptr_eq(child))
        });
    }

    /// Close this subscription and release every owned resource.
    ///
    /// Idempotent: only the first call closes; later calls return `Ok` and
    /// have no further effect. A failing teardown never prevents its
    /// siblings from running; all failures from one pass are returned as a
    /// single aggregate.
    pub fn unsubscribe(&self) -> Result<(), UnsubscribeError> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        trace!(subscription = self.inner.id, "closing subscription");

        // Drain under the lock, release outside it: a teardown may call
        // add/unsubscribe on this same subscription.
        let drained: SmallVec<[Teardown; 2]> = {
            let mut resources = self.inner.resources.lock();
            std::mem::take(&mut *resources)
        };

        let mut failures = Vec::new();
        for teardown in drained {
            teardown.close(&mut failures);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(UnsubscribeError::new(failures))
        }
    }
}

impl Clone for Subscription {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("closed", &self.is_closed())
            .field("resources", &self.resource_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
