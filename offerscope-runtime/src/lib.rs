//! Tokio runtime wrapper with one process-wide cancellation tree.
//!
//! The binary builds an [`OfferscopeRuntime`] and hands the pipeline a child
//! of the root token through [`OfferscopeRuntime::run`]. Ctrl-C or shutdown
//! cancels the root, which reaches every child.
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct OfferscopeRuntime {
    runtime: Runtime,
    root: CancellationToken,
}

/// Cloneable access to the runtime and its root token.
#[derive(Clone)]
pub struct OfferscopeHandle {
    inner: Handle,
    root: CancellationToken,
}

impl OfferscopeRuntime {
    /// Build a multi-thread Tokio runtime.
    ///
    /// ```
    /// use offerscope_runtime::OfferscopeRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = OfferscopeRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);
        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }
        Ok(Self {
            runtime: builder.build()?,
            root: CancellationToken::new(),
        })
    }

    pub fn handle(&self) -> OfferscopeHandle {
        OfferscopeHandle {
            inner: self.runtime.handle().clone(),
            root: self.root.clone(),
        }
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Run one top-level task to completion and shut the runtime down.
    ///
    /// The task receives a child of the root token; Ctrl-C cancels it.
    ///
    /// ```
    /// use offerscope_runtime::OfferscopeRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = OfferscopeRuntime::build("run-example", Some(1)).unwrap();
    /// let cancelled = runtime.run(Duration::from_millis(10), |cancel| async move {
    ///     cancel.is_cancelled()
    /// });
    /// assert!(!cancelled);
    /// ```
    pub fn run<F, Fut, T>(self, grace: Duration, task: F) -> T
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T>,
    {
        let handle = self.handle();
        let watcher = handle.cancel_on_ctrl_c();
        let out = self.runtime.block_on(task(handle.child_token()));
        watcher.abort();
        self.shutdown(grace);
        out
    }

    /// Cancel outstanding work and shut the runtime down gracefully.
    pub fn shutdown(self, grace: Duration) {
        self.root.cancel();
        self.runtime.shutdown_timeout(grace);
    }
}

impl OfferscopeHandle {
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(fut)
    }

    /// Token that fires with the root but can be cancelled on its own
    /// without affecting siblings.
    ///
    /// ```
    /// use offerscope_runtime::OfferscopeRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = OfferscopeRuntime::build("child-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// let first = handle.child_token();
    /// let second = handle.child_token();
    /// first.cancel();
    /// assert!(!second.is_cancelled());
    /// handle.cancel_all();
    /// assert!(second.is_cancelled());
    /// runtime.shutdown(Duration::from_millis(5));
    /// ```
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    pub fn cancel_all(&self) {
        self.root.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Cancel the root token on the first Ctrl-C.
    pub fn cancel_on_ctrl_c(&self) -> JoinHandle<()> {
        let root = self.root.clone();
        self.inner.spawn(async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if res.is_ok() {
                        tracing::warn!("runtime.ctrl_c.cancelling");
                        root.cancel();
                    }
                }
                _ = root.cancelled() => {}
            }
        })
    }
}
