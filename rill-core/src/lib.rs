//! Rill Core
//!
//! This crate provides the core runtime for the Rill reactive stream
//! library. It implements:
//!
//! - The notification model: a uniform encoding of the three stream events
//!   (value, error, completion)
//! - Composable, idempotent cancellation (subscriptions and teardowns)
//! - The subscriber contract: ordering and exactly-once termination
//! - Lazy observables and the generic operator-application protocol
//!
//! The core imposes no threading or scheduling model. Producers may emit
//! synchronously on the subscribing call stack or defer emissions through
//! any scheduling capability the caller supplies.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `stream`: the primitives (notifications, subscriptions, subscribers,
//!   observers, and observables)
//! - `operator`: the protocol for wrapping a downstream subscriber to build
//!   derived observables, with the value-suppressing operator as the worked
//!   example
//!
//! # Example
//!
//! ```rust
//! use rill_core::stream::{Observable, Teardown};
//!
//! // A source that emits three values, then completes
//! let numbers = Observable::new(|subscriber| {
//!     for n in 0..3 {
//!         subscriber.next(n);
//!     }
//!     subscriber.complete();
//!     Ok(Teardown::none())
//! });
//!
//! // Nothing runs until a consumer subscribes
//! let subscription = numbers.subscribe_next(|n| println!("saw {n}"));
//!
//! // Cancellation is explicit and idempotent
//! subscription.unsubscribe().unwrap();
//! ```

pub mod operator;
pub mod stream;
