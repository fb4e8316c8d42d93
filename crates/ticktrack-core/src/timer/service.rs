use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::backend::TaskBackend;
use crate::timer::channel::ElapsedChannels;
use crate::timer::registry::{TimerRegistry, TimerState};

/// Cadence of the two background loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// How often elapsed values are recomputed and published.  Defaults to 1 s.
    pub tick_interval: Duration,
    /// How often running timers are persisted to the backend.  Defaults to 10 s.
    pub flush_interval: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            flush_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Default)]
struct TimerTable {
    registry: TimerRegistry,
    channels: ElapsedChannels,
}

/// State shared between the service handle and its background loops.
struct Shared<B> {
    backend: Arc<B>,
    table: Mutex<TimerTable>,
}

impl<B: TaskBackend> Shared<B> {
    fn table(&self) -> MutexGuard<'_, TimerTable> {
        // Critical sections are single map operations; a poisoned table is still consistent.
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(&self) -> usize {
        let now = Instant::now();
        let mut table = self.table();
        let values = table.registry.snapshot(now);
        for (task_id, elapsed) in &values {
            table.channels.publish(task_id, *elapsed);
        }
        if !values.is_empty() {
            debug!(active = values.len(), "timers ticked");
        }
        values.len()
    }

    async fn flush(&self) -> usize {
        let values = {
            let table = self.table();
            if table.registry.is_empty() {
                return 0;
            }
            table.registry.snapshot(Instant::now())
        };

        info!(active = values.len(), "flushing running timers");
        join_all(values.iter().map(|(task_id, elapsed)| self.save(task_id, *elapsed))).await;
        values.len()
    }

    async fn save(&self, task_id: &str, elapsed: u64) {
        match self.backend.update_elapsed(task_id, elapsed).await {
            Ok(_) => debug!(task_id, elapsed, "timer saved"),
            Err(e) => warn!(task_id, elapsed, error = %e, "failed to save timer"),
        }
    }
}

/// Owns the timer registry, the per-task channels and the tick / flush loops.
///
/// Construct one per logged-in session and share it through an `Arc`.  The
/// loops stop on [`shutdown`](Self::shutdown) or when the service is dropped.
pub struct TimerService<B: TaskBackend> {
    shared: Arc<Shared<B>>,
    shutdown_tx: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    /// Final-value saves spawned by `stop`, awaited by `settle`.
    saves: Mutex<JoinSet<()>>,
}

impl<B: TaskBackend> std::fmt::Debug for TimerService<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self.shared.table().registry.len();
        write!(f, "TimerService({active} active)")
    }
}

impl<B: TaskBackend> TimerService<B> {
    /// Create the service and spawn its tick and flush loops.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(backend: Arc<B>, config: TimerConfig) -> Self {
        let service = Self::unscheduled(backend);
        let now = Instant::now();

        let tick = tokio::spawn(tick_loop(
            Arc::clone(&service.shared),
            time::interval_at(now + config.tick_interval, config.tick_interval),
            service.shutdown_tx.subscribe(),
        ));
        let flush = tokio::spawn(flush_loop(
            Arc::clone(&service.shared),
            time::interval_at(now + config.flush_interval, config.flush_interval),
            service.shutdown_tx.subscribe(),
        ));
        if let Ok(mut workers) = service.workers.lock() {
            workers.push(tick);
            workers.push(flush);
        }

        service
    }

    /// Create the service without background loops; callers drive
    /// [`tick`](Self::tick) and [`flush`](Self::flush) themselves.
    pub fn unscheduled(backend: Arc<B>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                backend,
                table: Mutex::new(TimerTable::default()),
            }),
            shutdown_tx,
            workers: Mutex::new(Vec::new()),
            saves: Mutex::new(JoinSet::new()),
        }
    }

    /// Start tracking `task_id` from `current_elapsed` seconds.
    ///
    /// A second start for a task that is already running is ignored and
    /// returns `false`; the original start instant is kept.
    pub fn start(&self, task_id: &str, current_elapsed: u64) -> bool {
        let mut table = self.shared.table();
        if !table.registry.start(task_id, current_elapsed, Instant::now()) {
            debug!(task_id, "timer already running; start ignored");
            return false;
        }
        table.channels.publish(task_id, current_elapsed);
        info!(task_id, current_elapsed, active = table.registry.len(), "timer started");
        true
    }

    /// Stop tracking `task_id` and return its final elapsed seconds, or `None`
    /// if no timer was running.
    ///
    /// The final value is published on the task's channel and persisted to
    /// the backend in the background; a failed save is only logged.  Use
    /// [`settle`](Self::settle) to wait for the save.
    pub fn stop(&self, task_id: &str) -> Option<u64> {
        self.stop_with_state(task_id).map(|(final_elapsed, _)| final_elapsed)
    }

    /// [`stop`](Self::stop), also handing back the removed state so the stop
    /// can be undone with [`restore`](Self::restore).
    pub(crate) fn stop_with_state(&self, task_id: &str) -> Option<(u64, TimerState)> {
        let (final_elapsed, state) = {
            let mut table = self.shared.table();
            let state = table.registry.take(task_id)?;
            let final_elapsed = state.elapsed_at(Instant::now());
            table.channels.publish(task_id, final_elapsed);
            (final_elapsed, state)
        };
        info!(task_id, final_elapsed, "timer stopped");
        self.persist(task_id, final_elapsed);
        Some((final_elapsed, state))
    }

    /// Stop every running timer (each one is persisted like [`stop`](Self::stop)).
    pub fn clear_all(&self) -> Vec<(String, u64)> {
        let ids = self.shared.table().registry.task_ids();
        ids.into_iter()
            .filter_map(|id| self.stop(&id).map(|elapsed| (id, elapsed)))
            .collect()
    }

    /// Stop every running timer and wait until each final value has been
    /// sent to the backend.  Used when a session ends.
    pub async fn drain(&self) -> Vec<(String, u64)> {
        let stopped: Vec<(String, u64)> = {
            let now = Instant::now();
            let mut table = self.shared.table();
            let ids = table.registry.task_ids();
            ids.into_iter()
                .filter_map(|id| {
                    let final_elapsed = table.registry.take(&id)?.elapsed_at(now);
                    table.channels.publish(&id, final_elapsed);
                    Some((id, final_elapsed))
                })
                .collect()
        };
        if !stopped.is_empty() {
            info!(stopped = stopped.len(), "draining timers");
        }
        join_all(stopped.iter().map(|(task_id, elapsed)| self.shared.save(task_id, *elapsed))).await;
        self.settle().await;
        stopped
    }

    /// Wait for every final-value save started by a stop.
    pub async fn settle(&self) {
        let mut saves = std::mem::take(&mut *self.saves());
        while let Some(joined) = saves.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "final time save did not complete");
            }
        }
    }

    pub fn is_active(&self, task_id: &str) -> bool {
        self.shared.table().registry.is_active(task_id)
    }

    pub fn active_count(&self) -> usize {
        self.shared.table().registry.len()
    }

    /// Elapsed seconds right now, if the task has a running timer.
    pub fn current_elapsed(&self, task_id: &str) -> Option<u64> {
        self.shared.table().registry.elapsed(task_id, Instant::now())
    }

    /// Subscribe to the live elapsed value of `task_id`.
    ///
    /// The receiver starts at the last known value (or `0`) and sees every
    /// subsequent tick.  Drop it when the task is no longer displayed.
    pub fn elapsed(&self, task_id: &str) -> watch::Receiver<u64> {
        self.shared.table().channels.subscribe(task_id)
    }

    /// Last value published for `task_id`, if its channel exists.
    pub fn last_known(&self, task_id: &str) -> Option<u64> {
        self.shared.table().channels.latest(task_id)
    }

    /// Recompute every running timer and publish the values.  Returns how
    /// many timers were updated.
    pub fn tick(&self) -> usize {
        self.shared.tick()
    }

    /// Persist every running timer.  No request is made when nothing is
    /// running.  Returns how many saves were attempted.
    pub async fn flush(&self) -> usize {
        self.shared.flush().await
    }

    /// Drop the timer and the task's channel without persisting anything.
    /// Subscribers see their channel close.
    pub(crate) fn discard(&self, task_id: &str) {
        let mut table = self.shared.table();
        table.registry.take(task_id);
        table.channels.remove(task_id);
    }

    /// Remove the timer without persisting anything.
    pub(crate) fn take(&self, task_id: &str) -> Option<TimerState> {
        self.shared.table().registry.take(task_id)
    }

    /// Put back a timer removed by [`take`](Self::take) or a stop.
    pub(crate) fn restore(&self, state: TimerState) -> bool {
        let now = Instant::now();
        let mut table = self.shared.table();
        let task_id = state.task_id.clone();
        let elapsed = state.elapsed_at(now);
        if !table.registry.restore(state) {
            return false;
        }
        table.channels.publish(&task_id, elapsed);
        true
    }

    /// Cancel the tick and flush loops and wait for them to finish.
    ///
    /// Running timers stay registered; call [`clear_all`](Self::clear_all)
    /// first to persist and release them.
    pub async fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        let workers: Vec<_> = match self.workers.lock() {
            Ok(mut w) => w.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "timer loop ended abnormally");
            }
        }
        self.settle().await;
        info!("timer loops stopped");
    }

    fn persist(&self, task_id: &str, elapsed: u64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(task_id, elapsed, "no runtime available; final time not saved");
            return;
        };
        let backend = Arc::clone(&self.shared.backend);
        let task_id = task_id.to_owned();
        let mut saves = self.saves();
        while saves.try_join_next().is_some() {}
        saves.spawn_on(
            async move {
                match backend.update_elapsed(&task_id, elapsed).await {
                    Ok(_) => debug!(task_id = %task_id, elapsed, "final time saved"),
                    Err(e) => {
                        warn!(task_id = %task_id, elapsed, error = %e, "failed to save final time")
                    }
                }
            },
            &handle,
        );
    }

    fn saves(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.saves.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<B: TaskBackend> Drop for TimerService<B> {
    fn drop(&mut self) {
        let workers = match self.workers.get_mut() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        for worker in workers.drain(..) {
            worker.abort();
        }
    }
}

async fn tick_loop<B: TaskBackend>(
    shared: Arc<Shared<B>>,
    mut ticker: Interval,
    mut shutdown: watch::Receiver<bool>,
) {
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                shared.tick();
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

async fn flush_loop<B: TaskBackend>(
    shared: Arc<Shared<B>>,
    mut ticker: Interval,
    mut shutdown: watch::Receiver<bool>,
) {
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                shared.flush().await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
