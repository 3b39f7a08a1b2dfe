//! Process-wide Tokio runtime with a shared cancellation token.
//!
//! Every long-running operation in docsift takes a [`CancellationToken`];
//! the runtime owns the root token and cancels it on ctrl-c or shutdown.

use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct SiftHandle {
    inner: Handle,
    cancel: CancellationToken,
}

pub struct SiftRuntime {
    runtime: Runtime,
    cancel: CancellationToken,
}

impl SiftRuntime {
    /// Build a multi-threaded runtime. `worker_threads` of `None` uses
    /// Tokio's default of one worker per core.
    ///
    /// ```
    /// use docsift_runtime::SiftRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = SiftRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// assert_eq!(runtime.block_on(async { 2 + 2 }), 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);

        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }

        let runtime = builder
            .build()
            .with_context(|| format!("building runtime {thread_name}"))?;
        Ok(Self {
            runtime,
            cancel: CancellationToken::new(),
        })
    }

    /// A cloneable handle for spawning tasks and sharing cancellation.
    ///
    /// ```
    /// use docsift_runtime::SiftRuntime;
    ///
    /// let runtime = SiftRuntime::build("handle-example", Some(1)).unwrap();
    /// assert!(!runtime.handle().cancellation().is_cancelled());
    /// ```
    pub fn handle(&self) -> SiftHandle {
        SiftHandle {
            inner: self.runtime.handle().clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel the root token when the process receives ctrl-c.
    ///
    /// ```no_run
    /// use docsift_runtime::SiftRuntime;
    ///
    /// let runtime = SiftRuntime::build("signals", None).unwrap();
    /// runtime.cancel_on_ctrl_c();
    /// let cancel = runtime.handle().cancellation();
    /// runtime.block_on(cancel.cancelled());
    /// ```
    pub fn cancel_on_ctrl_c(&self) {
        let cancel = self.cancel.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => tracing::warn!("runtime.interrupted"),
                        Err(e) => tracing::error!(error = %e, "runtime.signal_listener_failed"),
                    }
                    cancel.cancel();
                }
            }
        });
    }

    /// Cancel outstanding work and give tasks `graceful` to wind down.
    ///
    /// ```
    /// use docsift_runtime::SiftRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = SiftRuntime::build("shutdown-example", Some(1)).unwrap();
    /// let cancel = runtime.handle().cancellation();
    /// runtime.shutdown(Duration::from_millis(5));
    /// assert!(cancel.is_cancelled());
    /// ```
    pub fn shutdown(self, graceful: Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}

impl SiftHandle {
    /// ```
    /// use docsift_runtime::SiftRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = SiftRuntime::build("spawn-doctest", Some(1)).unwrap();
    /// let task = runtime.handle().spawn(async { 21 * 2 });
    /// assert_eq!(runtime.block_on(async move { task.await.unwrap() }), 42);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(fut)
    }

    /// The root token. Cancelling it cancels every child token.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// A token cancelled with the root but cancellable on its own.
    ///
    /// ```
    /// use docsift_runtime::SiftRuntime;
    ///
    /// let runtime = SiftRuntime::build("child-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// let child = handle.child_token();
    /// child.cancel();
    /// assert!(!handle.cancellation().is_cancelled());
    /// handle.cancellation().cancel();
    /// assert!(handle.child_token().is_cancelled());
    /// ```
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
}
