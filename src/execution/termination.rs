//! Signal-driven shutdown.
//!
//! A [`Termination`] is installed once per run. Every live resource that must
//! not outlive the process registers a cleanup worker with it. On the first
//! interrupt or terminate signal the coordinator:
//!
//! 1. fires the shared shutdown token, waking every worker,
//! 2. waits until all registered workers have finished,
//! 3. exits the process with [`EXIT_TERMINATED`].
//!
//! Workers whose resource is released normally simply finish, so the barrier
//! only ever waits on resources that are still alive.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

/// Exit code of a run interrupted by a signal.
pub const EXIT_TERMINATED: i32 = 128;

/// Shutdown broadcast plus cleanup completion barrier.
#[derive(Debug, Clone, Default)]
pub struct Termination {
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl Termination {
    /// Create a coordinator with no registered worker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has started.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Number of cleanup workers still running.
    pub fn pending_cleanups(&self) -> usize {
        self.tracker.len()
    }

    /// Register a cleanup worker.
    ///
    /// `cleanup` runs once if shutdown starts before `released` is cancelled;
    /// otherwise the worker ends without running it.
    pub fn register<F>(&self, released: CancellationToken, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let shutdown = self.shutdown.clone();

        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = released.cancelled() => {}
                _ = shutdown.cancelled() => cleanup(),
            }
        });
    }

    /// Fire the shutdown token and wait for every registered worker.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Listen for termination signals in the background.
    ///
    /// The first signal triggers [`shutdown`](Self::shutdown) and then exits
    /// the process with [`EXIT_TERMINATED`]. Once a signal is received the
    /// exit happens even if the listener is stopped meanwhile.
    pub fn install(&self) -> std::io::Result<SignalListener> {
        let mut signals = Signals::new()?;
        let this = self.clone();
        let stop = CancellationToken::new();
        let stopped = stop.clone();

        let handle = tokio::spawn(async move {
            let received = tokio::select! {
                biased;
                received = signals.recv() => received,
                _ = stopped.cancelled() => return,
            };

            match received {
                Some(name) => {
                    warn!(signal = name, "terminating");
                    this.shutdown().await;
                    debug!("cleanup complete");
                    std::process::exit(EXIT_TERMINATED);
                }
                None => debug!("signal streams closed"),
            }
        });

        Ok(SignalListener { stop, handle })
    }
}

/// Background signal listener returned by [`Termination::install`].
#[derive(Debug)]
pub struct SignalListener {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl SignalListener {
    /// Stop listening.
    ///
    /// When a signal is already being handled this never returns: the
    /// process exits with [`EXIT_TERMINATED`] once cleanup completes.
    pub async fn stop(self) {
        self.stop.cancel();
        if let Err(err) = self.handle.await {
            debug!(error = %err, "signal listener ended abnormally");
        }
    }
}

#[cfg(unix)]
struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    async fn recv(&mut self) -> Option<&'static str> {
        tokio::select! {
            received = self.interrupt.recv() => received.map(|_| "SIGINT"),
            received = self.terminate.recv() => received.map(|_| "SIGTERM"),
            received = self.hangup.recv() => received.map(|_| "SIGHUP"),
            received = self.quit.recv() => received.map(|_| "SIGQUIT"),
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> Option<&'static str> {
        tokio::signal::ctrl_c().await.ok().map(|_| "ctrl-c")
    }
}
