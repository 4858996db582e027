//! Periodic driver for reconciliation passes.
//!
//! The scheduler owns no scheduling semantics of the domain: it only
//! decides *when* to invoke the reconciliation runner, with:
//! - a configurable pass interval plus jitter to avoid thundering herd
//! - a slower cadence for the overdue/expired sweeps and statistics
//! - exponential backoff on errors
//! - a command channel for pausing and manual runs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

/// Which work a scheduled tick should perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// General reconciliation only.
    General,
    /// General reconciliation plus the overdue/expired sweeps and the
    /// statistics log.
    Full,
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Base interval between reconciliation passes.
    pub pass_interval: Duration,
    /// Maximum jitter to add to the interval (as fraction 0.0-1.0).
    pub jitter_fraction: f64,
    /// Every Nth pass runs the sweeps and statistics as well.
    pub sweep_every_n_passes: u64,
    /// Initial backoff duration on error.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// Maximum consecutive failures before giving up.
    pub max_consecutive_failures: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pass_interval: Duration::from_secs(60),
            jitter_fraction: 0.1,
            sweep_every_n_passes: 5,
            initial_backoff: Duration::from_secs(5),
            max_backoff: Duration::from_secs(300),
            backoff_multiplier: 2.0,
            max_consecutive_failures: 10,
        }
    }
}

impl SchedulerConfig {
    /// Creates a new scheduler config with the given pass interval.
    pub fn new(pass_interval: Duration) -> Self {
        Self {
            pass_interval,
            ..Default::default()
        }
    }

    /// Builder: set jitter fraction.
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Builder: set the sweep cadence.
    pub fn with_sweep_every(mut self, n: u64) -> Self {
        self.sweep_every_n_passes = n.max(1);
        self
    }

    /// Builder: set backoff parameters.
    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the next pass delay with jitter.
    pub fn next_pass_delay(&self) -> Duration {
        let base = self.pass_interval.as_secs_f64();
        let jitter_range = base * self.jitter_fraction;
        let jitter = rand_jitter(jitter_range);
        Duration::from_secs_f64((base + jitter).max(0.0))
    }

    /// Calculates backoff delay based on consecutive failures.
    pub fn backoff_delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_backoff.as_secs_f64();
        let multiplier = self
            .backoff_multiplier
            .powi(consecutive_failures as i32 - 1);
        let delay = base * multiplier;
        let max = self.max_backoff.as_secs_f64();

        Duration::from_secs_f64(delay.min(max))
    }
}

/// Simple pseudo-random jitter generator.
/// Uses the current time to generate a value in [-range, range].
fn rand_jitter(range: f64) -> f64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    let fraction = (nanos as f64) / (1_000_000_000.0);
    (fraction * 2.0 - 1.0) * range
}

/// Commands that can be sent to the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerCommand {
    /// Trigger an immediate full pass.
    RunNow,
    /// Pause the scheduler.
    Pause,
    /// Resume the scheduler.
    Resume,
    /// Stop the scheduler.
    Stop,
}

/// Scheduler state.
#[derive(Debug, Clone)]
pub struct SchedulerState {
    /// Whether the scheduler is paused.
    pub paused: bool,
    /// Number of consecutive pass failures.
    pub consecutive_failures: u32,
    /// Number of passes completed successfully.
    pub passes_run: u64,
    /// Last successful pass time.
    pub last_pass: Option<DateTime<Utc>>,
    /// Last pass attempt time.
    pub last_attempt: Option<DateTime<Utc>>,
    /// Last error message.
    pub last_error: Option<String>,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerState {
    /// Creates a new scheduler state.
    pub fn new() -> Self {
        Self {
            paused: false,
            consecutive_failures: 0,
            passes_run: 0,
            last_pass: None,
            last_attempt: None,
            last_error: None,
        }
    }

    /// Records a successful pass.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.passes_run += 1;
        self.last_pass = Some(Utc::now());
        self.last_attempt = self.last_pass;
        self.last_error = None;
    }

    /// Records a failed pass.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.consecutive_failures += 1;
        self.last_attempt = Some(Utc::now());
        self.last_error = Some(error.into());
    }
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Creates a new shared scheduler state.
pub fn new_scheduler_state() -> SharedSchedulerState {
    Arc::new(RwLock::new(SchedulerState::new()))
}

/// The scheduler manages periodic reconciliation passes.
pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: Option<mpsc::Receiver<SchedulerCommand>>,
}

impl Scheduler {
    /// Creates a new scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: new_scheduler_state(),
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs the scheduler loop with the given pass runner.
    ///
    /// The runner is called on every tick with the [`PassKind`] to
    /// perform and should return the number of status updates applied,
    /// or an error message on failure.
    pub async fn run<F, Fut>(mut self, pass_fn: F)
    where
        F: Fn(PassKind) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<usize, String>> + Send,
    {
        let mut command_rx = self.command_rx.take().expect("run called twice");

        info!(
            interval_secs = self.config.pass_interval.as_secs(),
            sweep_every = self.config.sweep_every_n_passes,
            "Reconciliation scheduler started"
        );

        // Initial pass; the first tick is always a full one so missed
        // windows are caught up immediately after startup.
        self.do_pass(&pass_fn).await;

        loop {
            let delay = self.calculate_next_delay().await;
            debug!(delay_secs = delay.as_secs(), "Scheduling next pass");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let state = self.state.read().await;
                    if state.paused {
                        debug!("Scheduler paused, skipping pass");
                        continue;
                    }
                    drop(state);

                    self.do_pass(&pass_fn).await;
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::RunNow) => {
                            debug!("Received RunNow command");
                            self.do_full_pass(&pass_fn).await;
                        }
                        Some(SchedulerCommand::Pause) => {
                            info!("Scheduler paused");
                            self.state.write().await.paused = true;
                        }
                        Some(SchedulerCommand::Resume) => {
                            info!("Scheduler resumed");
                            self.state.write().await.paused = false;
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("Scheduler stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn calculate_next_delay(&self) -> Duration {
        let state = self.state.read().await;

        if state.consecutive_failures > 0 {
            let backoff = self.config.backoff_delay(state.consecutive_failures);
            debug!(
                failures = state.consecutive_failures,
                backoff_secs = backoff.as_secs(),
                "Using backoff delay"
            );
            return backoff;
        }

        self.config.next_pass_delay()
    }

    async fn do_pass<F, Fut>(&self, pass_fn: &F)
    where
        F: Fn(PassKind) -> Fut,
        Fut: std::future::Future<Output = Result<usize, String>>,
    {
        let kind = {
            let state = self.state.read().await;
            if state.passes_run % self.config.sweep_every_n_passes == 0 {
                PassKind::Full
            } else {
                PassKind::General
            }
        };
        self.execute(pass_fn, kind).await;
    }

    async fn do_full_pass<F, Fut>(&self, pass_fn: &F)
    where
        F: Fn(PassKind) -> Fut,
        Fut: std::future::Future<Output = Result<usize, String>>,
    {
        self.execute(pass_fn, PassKind::Full).await;
    }

    async fn execute<F, Fut>(&self, pass_fn: &F, kind: PassKind)
    where
        F: Fn(PassKind) -> Fut,
        Fut: std::future::Future<Output = Result<usize, String>>,
    {
        let state = self.state.read().await;
        if state.consecutive_failures >= self.config.max_consecutive_failures {
            error!(
                failures = state.consecutive_failures,
                max = self.config.max_consecutive_failures,
                "Max consecutive failures reached, skipping pass"
            );
            return;
        }
        drop(state);

        debug!(kind = ?kind, "Starting reconciliation pass");
        match pass_fn(kind).await {
            Ok(applied) => {
                info!(kind = ?kind, applied, "Reconciliation pass completed");
                self.state.write().await.record_success();
            }
            Err(e) => {
                warn!(error = %e, "Reconciliation pass failed");
                self.state.write().await.record_failure(e);
            }
        }
    }
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Triggers an immediate full pass.
    pub async fn run_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::RunNow).await
    }

    /// Pauses the scheduler.
    pub async fn pause(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Pause).await
    }

    /// Resumes the scheduler.
    pub async fn resume(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Resume).await
    }

    /// Stops the scheduler.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    /// Returns the current scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }

    /// Returns true if the scheduler is paused.
    pub async fn is_paused(&self) -> bool {
        self.state.read().await.paused
    }
}
