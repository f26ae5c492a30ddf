use std::ffi::OsString;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::core::config::ClusterConfig;
use crate::core::master::{Master, MasterHandle, Role, Worker};
use crate::core::pool::Pool;
use crate::core::signals::SignalListener;
use crate::core::supervisor::Supervisor;
use crate::error::ClusterError;
use crate::events::Bus;
use crate::process::{
    ExitSender, Invocation, Launcher, ReexecArgs, TokioLauncher, app_name_from, detect_role,
    master_title, set_process_title, worker_title,
};
use crate::subscribers::{NoHooks, Subscribe, SubscriberSet, WorkerHooks};
use crate::topology;

const CONTROL_QUEUE: usize = 64;

/// Entry point: a configured, not yet initialized cluster.
pub struct Cluster {
    cfg: ClusterConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    hooks: Arc<dyn WorkerHooks>,
    launcher: Arc<dyn Launcher>,
    os_signals: bool,
}

impl Cluster {
    /// Starts building a cluster from `cfg`.
    pub fn builder(cfg: ClusterConfig) -> ClusterBuilder {
        ClusterBuilder::new(cfg)
    }

    /// Determines this process's role and, in the master, starts the pool.
    ///
    /// `args` is the full argument vector including `argv[0]`, normally
    /// `std::env::args_os()`.
    ///
    /// In a worker this returns immediately. In the master it spawns every
    /// worker (staggered), waits for the pool to settle, and returns once the
    /// supervisor loop is running.
    ///
    /// # Errors
    /// - [`ClusterError::MissingPort`] if `cfg.port` is zero;
    /// - [`ClusterError::InvalidWorkerTag`] if `args` carries a malformed tag;
    /// - [`ClusterError::SignalSetup`] if signal listeners cannot be installed;
    /// - [`ClusterError::TooManySpawnFailures`] if more than half of the initial
    ///   spawns fail.
    pub async fn init<I, S>(self, args: I) -> Result<Role, ClusterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let argv: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let mut settings = self.cfg.resolve(topology::logical_cores())?;
        let invocation = detect_role(&argv)?;
        let reexec = ReexecArgs::capture(argv);
        if settings.name.is_empty() {
            settings.name = app_name_from(reexec.program());
        }

        if let Invocation::Worker { id, port } = invocation {
            set_process_title(&worker_title(&settings.name, id));
            return Ok(Role::Worker(Worker {
                id,
                port,
                worker_count: settings.workers,
            }));
        }
        set_process_title(&master_title(&settings.name));

        let signals = if self.os_signals {
            Some(SignalListener::install().map_err(ClusterError::SignalSetup)?)
        } else {
            None
        };

        let bus = Bus::new(settings.bus_capacity);
        let stop_listener = CancellationToken::new();
        let listener = if self.subscribers.is_empty() {
            None
        } else {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            Some(set.listen(stop_listener.clone()))
        };

        let port = settings.port;
        let worker_count = settings.workers;
        let (exit_tx, exit_rx) = mpsc::unbounded_channel();
        let (ctl_tx, ctl_rx) = mpsc::channel(CONTROL_QUEUE);
        let pool = Pool::new(
            settings,
            reexec,
            self.launcher,
            self.hooks,
            bus.clone(),
            ExitSender::new(exit_tx),
        );
        let supervisor = Supervisor::new(pool, bus.clone(), ctl_rx, exit_rx, signals);

        let (ready_tx, ready_rx) = oneshot::channel();
        let join = tokio::spawn(supervisor.run(ready_tx));

        let started = match ready_rx.await {
            Ok(res) => res,
            Err(_) => {
                stop_listener.cancel();
                if let Some(listener) = listener {
                    let _ = listener.await;
                }
                return Err(match join.await {
                    Ok(Err(e)) => e,
                    Ok(Ok(())) => ClusterError::Closed,
                    Err(e) => ClusterError::Aborted {
                        reason: e.to_string(),
                    },
                });
            }
        };
        if let Err(e) = started {
            stop_listener.cancel();
            if let Some(listener) = listener {
                let _ = listener.await;
            }
            return Err(e);
        }

        Ok(Role::Master(Master {
            handle: MasterHandle::new(ctl_tx),
            join,
            bus,
            stop_listener,
            listener,
            port,
            worker_count,
        }))
    }
}

/// Builder for [`Cluster`].
pub struct ClusterBuilder {
    cfg: ClusterConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    hooks: Arc<dyn WorkerHooks>,
    launcher: Arc<dyn Launcher>,
    os_signals: bool,
}

impl ClusterBuilder {
    /// Creates a builder with no subscribers, no hooks, the tokio launcher and
    /// OS signal handling enabled.
    pub fn new(cfg: ClusterConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            hooks: Arc::new(NoHooks),
            launcher: Arc::new(TokioLauncher::new()),
            os_signals: true,
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets a dedicated worker task and a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the synchronous start/exit callbacks.
    pub fn with_hooks(mut self, hooks: Arc<dyn WorkerHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replaces the process backend.
    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Enables or disables `SIGTERM`/`SIGINT`/`SIGUSR2` handling in the master.
    ///
    /// With signals off, shutdown and restart are driven only through
    /// [`MasterHandle`].
    pub fn with_os_signals(mut self, enabled: bool) -> Self {
        self.os_signals = enabled;
        self
    }

    pub fn build(self) -> Cluster {
        Cluster {
            cfg: self.cfg,
            subscribers: self.subscribers,
            hooks: self.hooks,
            launcher: self.launcher,
            os_signals: self.os_signals,
        }
    }
}
