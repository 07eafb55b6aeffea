//! Turns a panic inside the producer into an ordinary failure.
//!
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace};
use crate::{settle::Cell, Error};

/// Runs `producer`, rejecting `cell` with the adapted payload if it panics.
///
/// Does nothing extra when the producer returns normally; settling is up to
/// the resolver and rejecter it was given.
pub(crate) fn catch<T, E, F>(cell: &Cell<T, E>, producer: F)
where
    E: From<Error> + 'static,
    F: FnOnce(),
{
    // The cell is the only state observed after unwinding and it is never
    // left half-written.
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(producer)) {
        if !cell.settle(Err(adapt(payload))) {
            trace!("producer panicked after the promise settled");
        }
    }
}

/// Payloads that are already errors pass through untouched, anything else is
/// rendered into [`Error::Unhandled`].
pub(crate) fn adapt<E>(payload: Box<dyn Any + Send>) -> E
where
    E: From<Error> + 'static,
{
    let payload = match payload.downcast::<E>() {
        Ok(err) => {
            debug!(kind = "error", "producer panicked");
            return *err;
        }
        Err(payload) => payload,
    };
    let payload = match payload.downcast::<Error>() {
        Ok(err) => {
            debug!(kind = "crate_error", "producer panicked");
            return E::from(*err);
        }
        Err(payload) => payload,
    };
    let message = describe(&*payload);
    debug!(kind = "message", %message, "producer panicked");
    E::from(Error::Unhandled(message))
}

fn describe(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}

#[cfg(test)]
mod tests {
use std::panic;
use super::{adapt, catch};
use crate::{settle::Cell, Error};

#[derive(Debug, Clone, PartialEq)]
enum AppError {
    Disk(u32),
    Promise(Error),
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::Promise(err)
    }
}

#[test]
fn test_adapt_str_payload() {
    let err: Error = adapt(Box::new("test panic"));
    assert_eq!(err, Error::Unhandled("test panic".into()));
    assert_eq!(err.to_string(), "unhandled error: test panic");
}

#[test]
fn test_adapt_string_payload() {
    let err: Error = adapt(Box::new(format!("code {}", 3)));
    assert_eq!(err, Error::Unhandled("code 3".into()));
}

#[test]
fn test_adapt_opaque_payload() {
    let err: Error = adapt(Box::new(17u8));
    assert_eq!(err, Error::Unhandled("Box<dyn Any>".into()));
}

#[test]
fn test_adapt_own_error_is_verbatim() {
    let err: AppError = adapt(Box::new(AppError::Disk(4)));
    assert_eq!(err, AppError::Disk(4));
}

#[test]
fn test_adapt_crate_error_is_converted() {
    let err: AppError = adapt(Box::new(Error::Spawn("nope".into())));
    assert_eq!(err, AppError::Promise(Error::Spawn("nope".into())));
}

#[test]
fn test_catch_rejects_pending_cell() {
    let cell = Cell::<i32, Error>::new();
    catch(&cell, || panic::panic_any(Error::ProducerDropped));
    assert_eq!(*cell.wait(), Err(Error::ProducerDropped));
}

#[test]
fn test_catch_after_settlement_is_ignored() {
    let cell = Cell::<i32, Error>::new();
    catch(&cell, || {
        cell.settle(Ok(1));
        panic!("late");
    });
    assert_eq!(*cell.wait(), Ok(1));
}

#[test]
fn test_catch_without_panic_leaves_cell_pending() {
    let cell = Cell::<i32, Error>::new();
    catch(&cell, || {});
    assert!(!cell.is_settled());
}
}
