//! Operator Protocol
//!
//! An operator is a transformation from one observable to another. It never
//! touches the source or the consumer directly: at subscribe time it wraps
//! the downstream subscriber in a new one that intercepts some of the three
//! channels, and the source is subscribed with the wrapper. Upstream and
//! downstream need no awareness of each other beyond the subscriber
//! contract.
//!
//! # Design Decisions
//!
//! 1. Operators are small structs holding a reference to their destination
//!    plus whatever per-operator state they need, composed per subscription.
//!    There is no shared operator base type; ownership and lifetime are
//!    explicit per instance.
//!
//! 2. The wrapping subscriber shares the destination's subscription
//!    (`Subscriber::with_subscription`), so a derived observable introduces
//!    no independent resource: cancelling it is exactly cancelling the
//!    source, and a terminal event on either side releases both.
//!
//! 3. Operators may change what flows through the channels, never the
//!    contract: ordering is preserved and termination stays exactly-once.

mod ignore_elements;

pub use ignore_elements::IgnoreElements;

use crate::stream::Subscriber;

/// A transformation applied through [`Observable::lift`].
///
/// Given the downstream destination, build the subscriber the source will
/// be subscribed with.
///
/// [`Observable::lift`]: crate::stream::Observable::lift
pub trait Operator<In, Out>: Send + Sync {
    /// Wrap `destination`, intercepting whichever channels this operator
    /// transforms and delegating the rest.
    fn apply(&self, destination: Subscriber<Out>) -> Subscriber<In>;
}
