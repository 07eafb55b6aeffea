use std::sync::Arc;
use std::thread;
use tracing::debug;
use crate::settle::{Cell, Settle};
use crate::{fault, Error, Promise, Rejecter, Resolver};

const DEFAULT_THREAD_NAME: &str = "promise-producer";

/// Configures the thread a producer runs on, in the manner of
/// [`std::thread::Builder`].
///
/// # Examples
///
/// ```
/// use promise_cell::{Builder, Promise};
/// use std::thread;
///
/// let promise: Promise<String> = Builder::new()
///     .name("loader")
///     .stack_size(256 * 1024)
///     .spawn(|resolve, _| {
///         resolve.resolve(thread::current().name().unwrap_or_default().to_owned());
///     });
/// assert_eq!(promise.wait(), Ok("loader".to_owned()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the producer thread. Defaults to `promise-producer`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the producer thread's stack size in bytes.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Starts `producer` on a new thread and returns its promise right away.
    ///
    /// A thread that cannot be spawned fails the promise with
    /// [`Error::Spawn`]; this call itself never fails.
    pub fn spawn<T, E, F>(self, producer: F) -> Promise<T, E>
    where
        T: Send + Sync + 'static,
        E: From<Error> + Send + Sync + 'static,
        F: FnOnce(Resolver<T, E>, Rejecter<T, E>) + Send + 'static,
    {
        let cell = Arc::new(Cell::new());
        let settle = Arc::new(Settle::new(cell.clone()));
        let resolver = Resolver::new(settle.clone());
        let rejecter = Rejecter::new(settle.clone());
        // Held across the producer so its handles unwinding with a panic
        // cannot settle the promise as dropped before the panic is adapted.
        let guard = settle.clone();

        let mut thread = thread::Builder::new()
            .name(self.name.unwrap_or_else(|| DEFAULT_THREAD_NAME.to_owned()));
        if let Some(size) = self.stack_size {
            thread = thread.stack_size(size);
        }
        let spawned = thread.spawn(move || {
            fault::catch(guard.cell(), move || producer(resolver, rejecter));
        });
        if let Err(err) = spawned {
            debug!(error = %err, "failed to spawn producer thread");
            cell.settle(Err(E::from(Error::Spawn(err.to_string()))));
        }
        drop(settle);
        Promise::from_cell(cell)
    }
}
