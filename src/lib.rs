//! A write-once promise whose producer runs eagerly on its own thread.
//!
//! [`Promise::new`] spawns the producer immediately and hands back an observer
//! handle. The producer receives a [`Resolver`] and a [`Rejecter`]; the first
//! one to be called settles the promise and every later call is ignored.
//! Observers block on [`Promise::wait`] (or `.await` the promise) and all of
//! them see the same outcome.
//!
//! # Examples
//!
//! ```
//! use promise_cell::Promise;
//! use std::{thread, time::Duration};
//!
//! let promise: Promise<i32> = Promise::new(|resolve, _reject| {
//!     thread::sleep(Duration::from_millis(10));
//!     resolve.resolve(42);
//! });
//! assert_eq!(promise.wait(), Ok(42));
//! assert_eq!(promise.wait(), Ok(42));
//! ```
//!
//! A panic inside the producer becomes a failure instead of tearing down the
//! process:
//!
//! ```
//! use promise_cell::{Error, Promise};
//!
//! let promise: Promise<i32> = Promise::new(|_, _| panic!("boom"));
//! assert_eq!(promise.wait(), Err(Error::Unhandled("boom".into())));
//! ```
mod builder;
mod fault;
mod promise;
mod settle;

pub use builder::Builder;
pub use promise::Promise;
pub use settle::{Rejecter, Resolver};

/// Failures the promise itself can produce.
///
/// Errors passed to [`Rejecter::reject`] are never wrapped; these variants only
/// appear when the cell has to invent a failure on the producer's behalf.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The producer panicked with a payload that was not an error value.
    #[error("unhandled error: {0}")]
    Unhandled(String),
    /// Every resolver and rejecter was dropped without settling.
    #[error("producer dropped without settling the promise")]
    ProducerDropped,
    /// The producer thread could not be started.
    #[error("failed to spawn producer thread: {0}")]
    Spawn(String),
}
