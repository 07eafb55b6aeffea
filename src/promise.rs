use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use crate::settle::Cell;
use crate::{Builder, Error, Rejecter, Resolver};

/// Observer handle of a promise. Clones share the same outcome.
///
/// Waiting is possible from any number of threads, any number of times, both
/// by blocking with [`Promise::wait`] and by `.await`ing a clone.
///
/// # Examples
///
/// ```
/// use promise_cell::Promise;
/// use futures::executor::block_on;
/// use std::thread;
///
/// let promise: Promise<String> = Promise::new(|resolve, _| resolve.resolve("Hi".into()));
/// let promise2 = promise.clone();
/// let task1 = thread::spawn(move || block_on(async {
///     println!("Received on task 1 {:?}", promise2.await);
/// }));
/// println!("Received on main {:?}", promise.wait());
/// task1.join().expect("The task1 thread has panicked.");
/// ```
pub struct Promise<T, E = Error> {
    cell: Arc<Cell<T, E>>,
}

impl<T, E> Promise<T, E>
where
    T: Send + Sync + 'static,
    E: From<Error> + Send + Sync + 'static,
{
    /// Spawns `producer` on its own thread and returns without waiting for it.
    ///
    /// The producer settles the promise through the [`Resolver`] or
    /// [`Rejecter`] it is handed. If it panics before doing so the panic
    /// becomes the failure: a payload of type `E` (see
    /// [`std::panic::panic_any`]) is used as is, any other payload is
    /// described by [`Error::Unhandled`].
    ///
    /// Panics can only be intercepted when the crate is built with
    /// `panic = "unwind"`. The process-wide panic hook still runs first, so
    /// the default hook prints the panic message to stderr; the hook is left
    /// to the embedding application.
    pub fn new<F>(producer: F) -> Self
    where
        F: FnOnce(Resolver<T, E>, Rejecter<T, E>) + Send + 'static,
    {
        Builder::new().spawn(producer)
    }
}

impl<T, E> Promise<T, E> {
    pub(crate) fn from_cell(cell: Arc<Cell<T, E>>) -> Self {
        Self { cell }
    }

    /// Blocks until the promise settles and returns a clone of the outcome.
    pub fn wait(&self) -> Result<T, E>
    where
        T: Clone,
        E: Clone,
    {
        (*self.wait_shared()).clone()
    }

    /// Blocks until the promise settles and returns the shared outcome
    /// without cloning it.
    pub fn wait_shared(&self) -> Arc<Result<T, E>> {
        self.cell.wait()
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self { cell: self.cell.clone() }
    }
}

impl<T, E> Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("settled", &self.cell.is_settled())
            .finish()
    }
}

impl<T, E> Future for Promise<T, E> {
    type Output = Arc<Result<T, E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.cell.poll_settled(cx.waker()) {
            Some(value) => Poll::Ready(value),
            None => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
use futures::executor::block_on;
use std::thread;
use std::time::{Duration, Instant};
use super::Promise;
use crate::Error;

#[test]
fn test_promise_resolve() {
    let promise: Promise<String> = Promise::new(|resolve, _| {
        resolve.resolve(String::from("🍓"));
    });
    assert_eq!(promise.wait(), Ok(String::from("🍓")));
}

#[test]
fn test_promise_reject() {
    let promise: Promise<String> = Promise::new(|_, reject| {
        reject.reject(Error::Unhandled("reject!!".into()));
    });
    assert_eq!(promise.wait(), Err(Error::Unhandled("reject!!".into())));
}

#[test]
fn test_two_promises_await() {
    let promise: Promise<String> = Promise::new(|resolve, _| {
        thread::sleep(Duration::from_millis(50));
        resolve.resolve(String::from("🍓"));
    });
    let op_a = promise.clone();
    let op_b = promise.clone();
    let task1 = thread::spawn(move || block_on(async { op_a.await }));
    let task2 = thread::spawn(move || block_on(async { op_b.await }));
    let a = task1.join().expect("The task1 thread has panicked");
    let b = task2.join().expect("The task2 thread has panicked");
    assert_eq!(*a, Ok(String::from("🍓")));
    assert_eq!(a, b);
}

#[test]
fn test_await_after_settled() {
    let promise: Promise<i32> = Promise::new(|resolve, _| resolve.resolve(3));
    assert_eq!(promise.wait(), Ok(3));
    assert_eq!(*block_on(promise.clone()), Ok(3));
    assert_eq!(*block_on(promise), Ok(3));
}

#[test]
fn test_wait_shared_returns_same_allocation() {
    let promise: Promise<Vec<u8>> = Promise::new(|resolve, _| resolve.resolve(vec![1, 2, 3]));
    let first = promise.wait_shared();
    let second = promise.wait_shared();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn test_new_does_not_block() {
    let started = Instant::now();
    let promise: Promise<i32> = Promise::new(|resolve, _| {
        thread::sleep(Duration::from_millis(300));
        resolve.resolve(1);
    });
    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(promise.wait(), Ok(1));
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[test]
fn test_debug_reports_settlement() {
    let promise: Promise<i32> = Promise::new(|resolve, _| resolve.resolve(1));
    promise.wait().unwrap();
    assert_eq!(format!("{:?}", promise), "Promise { settled: true }");
}
}
