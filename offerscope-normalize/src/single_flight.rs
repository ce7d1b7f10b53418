//! Coalesce concurrent calls that share a key into one execution.
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

type Call<T> = Shared<BoxFuture<'static, T>>;

struct Entry<T: Clone> {
    call: Call<T>,
    waiters: usize,
}

pub struct SingleFlight<T: Clone> {
    calls: Mutex<HashMap<String, Entry<T>>>,
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

/// Unregisters one waiter. The entry goes away once the call finished or its
/// last waiter was dropped, so a later caller never joins an abandoned call.
struct Waiter<'a, T: Clone> {
    calls: &'a Mutex<HashMap<String, Entry<T>>>,
    key: String,
    call: Call<T>,
    finished: bool,
}

impl<T: Clone> Drop for Waiter<'_, T> {
    fn drop(&mut self) {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = calls.get_mut(&self.key) else {
            return;
        };
        if !entry.call.ptr_eq(&self.call) {
            return;
        }
        entry.waiters = entry.waiters.saturating_sub(1);
        if self.finished || entry.waiters == 0 {
            if !self.finished {
                tracing::debug!(key = %self.key, "single_flight.abandoned");
            }
            calls.remove(&self.key);
        }
    }
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `make()` unless a call with the same key is already in flight, in
    /// which case wait for that call and return a clone of its output.
    ///
    /// ```
    /// use futures::FutureExt;
    /// use offerscope_normalize::single_flight::SingleFlight;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let flights = SingleFlight::<u32>::new();
    /// let runs = Arc::new(AtomicUsize::new(0));
    /// let make = || {
    ///     let runs = runs.clone();
    ///     async move {
    ///         runs.fetch_add(1, Ordering::SeqCst);
    ///         tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    ///         7
    ///     }
    ///     .boxed()
    /// };
    /// let (a, b) = tokio::join!(flights.run("k".into(), make), flights.run("k".into(), make));
    /// assert_eq!((a, b), (7, 7));
    /// assert_eq!(runs.load(Ordering::SeqCst), 1);
    /// # });
    /// ```
    pub async fn run<F>(&self, key: String, make: F) -> T
    where
        F: FnOnce() -> BoxFuture<'static, T>,
    {
        let call = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            match calls.get_mut(&key) {
                Some(entry) => {
                    tracing::debug!(%key, "single_flight.joined");
                    entry.waiters += 1;
                    entry.call.clone()
                }
                None => {
                    let call = make().shared();
                    calls.insert(
                        key.clone(),
                        Entry {
                            call: call.clone(),
                            waiters: 1,
                        },
                    );
                    call
                }
            }
        };

        let mut waiter = Waiter {
            calls: &self.calls,
            key,
            call: call.clone(),
            finished: false,
        };
        let output = call.await;
        waiter.finished = true;
        output
    }

    pub fn in_flight(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
