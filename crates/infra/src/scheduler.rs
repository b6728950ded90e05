//! Background thread that runs the lifecycle sweep on a fixed interval.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use tradepost_core::Clock;

use crate::lifecycle::{LifecycleManager, SweepError, SweepSummary};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Thread name, also used in logs.
    pub name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            name: "lifecycle-sweep".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStats {
    pub sweeps_run: u64,
    pub sweeps_refused: u64,
    pub sweeps_failed: u64,
    pub listings_closed: u64,
    pub cards_expired: u64,
    pub notifications_sent: u64,
    pub item_failures: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub uptime_secs: u64,
}

impl SchedulerStats {
    fn record(&mut self, summary: &SweepSummary) {
        self.sweeps_run += 1;
        self.listings_closed += summary.listings_closed as u64;
        self.cards_expired += summary.cards_expired as u64;
        self.notifications_sent += summary.notifications_sent as u64;
        self.item_failures += summary.failures as u64;
    }
}

#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<SchedulerStats>>,
}

impl SchedulerHandle {
    /// Stop after the current sweep (if any) and wait for the thread.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("sweep scheduler thread panicked");
            }
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        lock(&self.stats).clone()
    }
}

pub struct SweepScheduler {
    lifecycle: Arc<LifecycleManager>,
    clock: Arc<dyn Clock>,
}

impl SweepScheduler {
    pub fn new(lifecycle: Arc<LifecycleManager>, clock: Arc<dyn Clock>) -> Self {
        Self { lifecycle, clock }
    }

    /// Start the loop on its own thread. The first sweep runs immediately.
    pub fn spawn(self, config: SchedulerConfig) -> std::io::Result<SchedulerHandle> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(SchedulerStats::default()));
        let thread_stats = stats.clone();

        let join = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || scheduler_loop(self, config, shutdown_rx, thread_stats))?;

        Ok(SchedulerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        })
    }
}

fn lock(stats: &Mutex<SchedulerStats>) -> std::sync::MutexGuard<'_, SchedulerStats> {
    stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn scheduler_loop(
    scheduler: SweepScheduler,
    config: SchedulerConfig,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<SchedulerStats>>,
) {
    info!(scheduler = %config.name, interval_secs = config.interval.as_secs(), "sweep scheduler started");
    let started = Instant::now();

    loop {
        let now = scheduler.clock.now();
        let result = scheduler.lifecycle.run_sweep(now);

        {
            let mut s = lock(&stats);
            s.uptime_secs = started.elapsed().as_secs();
            s.last_run = Some(now);
            match &result {
                Ok(summary) => s.record(summary),
                Err(SweepError::AlreadyRunning) => s.sweeps_refused += 1,
                Err(SweepError::Store(_)) => s.sweeps_failed += 1,
            }
        }

        match result {
            Ok(_) => {}
            Err(SweepError::AlreadyRunning) => {
                warn!(scheduler = %config.name, "previous sweep still running, skipped")
            }
            Err(err) => error!(scheduler = %config.name, error = %err, "sweep failed"),
        }

        match shutdown_rx.recv_timeout(config.interval) {
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    info!(scheduler = %config.name, "sweep scheduler stopped");
}
