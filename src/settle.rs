use std::fmt::{self, Debug};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::Waker;
use tracing::{debug, trace};
use crate::Error;

/// The shared write-once slot behind a promise and its settlement handles.
pub(crate) struct Cell<T, E> {
    state: Mutex<State<T, E>>,
    settled: Condvar,
}

struct State<T, E> {
    value: Option<Arc<Result<T, E>>>,
    // Wakers of futures dropped before settlement stay here until settle
    // drains the list.
    wakers: Vec<Waker>,
}

impl<T, E> Cell<T, E> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                value: None,
                wakers: vec![],
            }),
            settled: Condvar::new(),
        }
    }

    // The lock is never held while user code runs, so a poisoned state is
    // still consistent.
    fn lock(&self) -> MutexGuard<'_, State<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.lock().value.is_some()
    }

    /// Stores `outcome` if nothing has been stored yet and wakes every waiter.
    ///
    /// Returns `false` and discards `outcome` when the cell was already
    /// settled.
    pub(crate) fn settle(&self, outcome: Result<T, E>) -> bool {
        let wakers = {
            let mut state = self.lock();
            if state.value.is_some() {
                trace!(fulfilled = outcome.is_ok(), "ignoring redundant settlement");
                return false;
            }
            trace!(fulfilled = outcome.is_ok(), "settling promise");
            state.value = Some(Arc::new(outcome));
            std::mem::take(&mut state.wakers)
        };
        self.settled.notify_all();
        for waker in wakers {
            waker.wake()
        }
        true
    }

    /// Blocks until the cell is settled and returns the shared outcome.
    pub(crate) fn wait(&self) -> Arc<Result<T, E>> {
        let mut state = self.lock();
        loop {
            if let Some(ref value) = state.value {
                return value.clone();
            }
            state = self
                .settled
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Returns the outcome if settled, otherwise registers `waker` to be woken
    /// on settlement.
    pub(crate) fn poll_settled(&self, waker: &Waker) -> Option<Arc<Result<T, E>>> {
        let mut state = self.lock();
        match state.value {
            Some(ref value) => Some(value.clone()),
            None => {
                if !state.wakers.iter().any(|w| w.will_wake(waker)) {
                    state.wakers.push(waker.clone());
                }
                None
            }
        }
    }
}

/// Shared by every resolver and rejecter of one promise. Dropping the last
/// one while the cell is still pending fails the promise with
/// [`Error::ProducerDropped`].
pub(crate) struct Settle<T, E: From<Error>> {
    cell: Arc<Cell<T, E>>,
}

impl<T, E: From<Error>> Settle<T, E> {
    pub(crate) fn new(cell: Arc<Cell<T, E>>) -> Self {
        Self { cell }
    }

    pub(crate) fn cell(&self) -> &Cell<T, E> {
        &self.cell
    }
}

impl<T, E: From<Error>> Drop for Settle<T, E> {
    fn drop(&mut self) {
        if !self.cell.is_settled() && self.cell.settle(Err(E::from(Error::ProducerDropped))) {
            debug!("producer dropped every settlement handle, failing promise");
        }
    }
}

/// Fulfills the promise it was handed out for.
///
/// Only the first call to [`Resolver::resolve`] or [`Rejecter::reject`] on a
/// promise has any effect.
pub struct Resolver<T, E: From<Error> = Error> {
    settle: Arc<Settle<T, E>>,
}

impl<T, E: From<Error>> Resolver<T, E> {
    pub(crate) fn new(settle: Arc<Settle<T, E>>) -> Self {
        Self { settle }
    }

    ///promise.resolve
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_cell::Promise;
    /// let promise: Promise<&str> = Promise::new(|resolve, _| {
    ///     resolve.resolve("🍓");
    ///     resolve.resolve("🍋");
    /// });
    /// assert_eq!(promise.wait(), Ok("🍓"));
    /// ```
    pub fn resolve(&self, value: T) {
        self.settle.cell().settle(Ok(value));
    }
}

impl<T, E: From<Error>> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self { settle: self.settle.clone() }
    }
}

impl<T, E: From<Error>> Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("settled", &self.settle.cell().is_settled())
            .finish()
    }
}

/// Fails the promise it was handed out for.
pub struct Rejecter<T, E: From<Error> = Error> {
    settle: Arc<Settle<T, E>>,
}

impl<T, E: From<Error>> Rejecter<T, E> {
    pub(crate) fn new(settle: Arc<Settle<T, E>>) -> Self {
        Self { settle }
    }

    ///promise.reject
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_cell::{Error, Promise};
    /// let promise: Promise<()> = Promise::new(|_, reject| {
    ///     reject.reject(Error::Unhandled("💥".into()));
    /// });
    /// assert!(promise.wait().is_err());
    /// ```
    pub fn reject(&self, err: E) {
        self.settle.cell().settle(Err(err));
    }
}

impl<T, E: From<Error>> Clone for Rejecter<T, E> {
    fn clone(&self) -> Self {
        Self { settle: self.settle.clone() }
    }
}

impl<T, E: From<Error>> Debug for Rejecter<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejecter")
            .field("settled", &self.settle.cell().is_settled())
            .finish()
    }
}
