//! The locally held task list shared by the task, dashboard and timer views.
//!
//! Toggling is optimistic: the local flag flips and the timer starts or
//! stops before the backend answers.  When the answer arrives the server's
//! elapsed time is accepted but its running flag is not; the local flag at
//! response time wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use ticktrack_api::{ApiError, Task};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::TaskBackend;
use crate::error::TrackError;
use crate::filter::TaskFilter;
use crate::stats::{self, DashboardStats};
use crate::timer::{TimerService, TimerState};

/// What to do with the optimistic local state when a toggle request fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToggleFailurePolicy {
    /// Restore the flag, elapsed time and timer to their pre-toggle values,
    /// unless the task was toggled again in the meantime.
    #[default]
    Rollback,
    /// Keep the flipped state and only report the error.
    KeepOptimistic,
}

/// A toggle applied locally whose backend call has not completed yet.
#[derive(Debug)]
pub struct ToggleTicket {
    task_id: String,
    running: bool,
    generation: u64,
    previous_running: bool,
    previous_elapsed: u64,
    paused_timer: Option<TimerState>,
}

impl ToggleTicket {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// The running flag the toggle switched to.
    pub fn running(&self) -> bool {
        self.running
    }
}

#[derive(Debug, Default)]
struct BoardState {
    tasks: Vec<Task>,
    generations: HashMap<String, u64>,
}

impl BoardState {
    fn find_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}

pub struct TaskBoard<B: TaskBackend> {
    backend: Arc<B>,
    timers: Arc<TimerService<B>>,
    policy: ToggleFailurePolicy,
    state: Mutex<BoardState>,
}

impl<B: TaskBackend> std::fmt::Debug for TaskBoard<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskBoard")
            .field("tasks", &self.state().tasks.len())
            .field("policy", &self.policy)
            .field("timers", &self.timers)
            .finish()
    }
}

impl<B: TaskBackend> TaskBoard<B> {
    pub fn new(backend: Arc<B>, timers: Arc<TimerService<B>>) -> Self {
        Self {
            backend,
            timers,
            policy: ToggleFailurePolicy::default(),
            state: Mutex::new(BoardState::default()),
        }
    }

    pub fn with_policy(mut self, policy: ToggleFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn timers(&self) -> &Arc<TimerService<B>> {
        &self.timers
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch the user's tasks and replace the board with them.
    pub async fn load(&self, user_id: &str) -> Result<Vec<Task>, TrackError> {
        let baseline = self.state().generations.clone();
        let tasks = self.backend.tasks_for_user(user_id).await?;
        debug!(user_id, count = tasks.len(), "tasks loaded");
        self.replace_tasks(tasks, &baseline);
        Ok(self.tasks())
    }

    /// Replace the board.  Tasks the backend reports as running get a timer
    /// seeded with their stored elapsed time; tasks with a live local timer
    /// stay running whatever the backend says.
    pub fn set_tasks(&self, tasks: Vec<Task>) {
        let baseline = self.state().generations.clone();
        self.replace_tasks(tasks, &baseline);
    }

    /// Tasks toggled after `baseline` was taken keep their local flag and
    /// elapsed time; the fetched copy predates the toggle.
    fn replace_tasks(&self, mut tasks: Vec<Task>, baseline: &HashMap<String, u64>) {
        let mut state = self.state();
        for task in &mut tasks {
            if state.generations.get(&task.id) != baseline.get(&task.id) {
                if let Some(local) = state.tasks.iter().find(|t| t.id == task.id) {
                    task.is_running = local.is_running;
                    task.elapsed_time = local.elapsed_time;
                }
                debug!(task_id = %task.id, "toggled during reload; local state kept");
                continue;
            }
            if task.is_running {
                self.timers.start(&task.id, task.elapsed_time);
            } else if self.timers.is_active(&task.id) {
                task.is_running = true;
            }
        }
        state.tasks = tasks;
    }

    /// Insert a task or replace the one with the same id.
    pub fn upsert(&self, task: Task) {
        let mut state = self.state();
        match state.find_mut(&task.id) {
            Some(existing) => *existing = task,
            None => state.tasks.push(task),
        }
    }

    pub fn get(&self, task_id: &str) -> Option<Task> {
        let task = self.state().tasks.iter().find(|t| t.id == task_id).cloned()?;
        Some(self.with_live_elapsed(task))
    }

    /// All tasks in backend order, running ones carrying their live elapsed time.
    pub fn tasks(&self) -> Vec<Task> {
        let tasks = self.state().tasks.clone();
        tasks.into_iter().map(|t| self.with_live_elapsed(t)).collect()
    }

    fn with_live_elapsed(&self, mut task: Task) -> Task {
        if let Some(elapsed) = self.timers.current_elapsed(&task.id) {
            task.elapsed_time = elapsed;
        }
        task
    }

    /// Apply a toggle locally and return the ticket to settle it with.
    ///
    /// Switching to running starts a timer seeded with the stored elapsed
    /// time; switching to paused stops the timer and adopts its final value.
    pub fn begin_toggle(&self, task_id: &str) -> Result<ToggleTicket, TrackError> {
        let mut guard = self.state();
        let state = &mut *guard;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| TrackError::UnknownTask(task_id.to_owned()))?;
        let generation = {
            let counter = state.generations.entry(task_id.to_owned()).or_insert(0);
            *counter += 1;
            *counter
        };

        let previous_running = task.is_running;
        let previous_elapsed = task.elapsed_time;
        let running = !previous_running;
        task.is_running = running;

        let mut paused_timer = None;
        if running {
            self.timers.start(task_id, task.elapsed_time);
        } else if let Some((final_elapsed, timer)) = self.timers.stop_with_state(task_id) {
            task.elapsed_time = final_elapsed;
            paused_timer = Some(timer);
        }
        debug!(task_id, running, generation, "toggle applied locally");

        Ok(ToggleTicket {
            task_id: task_id.to_owned(),
            running,
            generation,
            previous_running,
            previous_elapsed,
            paused_timer,
        })
    }

    /// Settle a toggle with the backend's answer.
    pub fn finish_toggle(
        &self,
        ticket: ToggleTicket,
        response: Result<Task, ApiError>,
    ) -> Result<Task, TrackError> {
        match response {
            Ok(server) => Ok(self.reconcile(server)),
            Err(e) => {
                warn!(task_id = %ticket.task_id, error = %e, "toggle failed");
                if self.policy == ToggleFailurePolicy::Rollback {
                    self.roll_back(ticket);
                }
                Err(e.into())
            }
        }
    }

    /// Toggle `task_id` locally, ask the backend to do the same and reconcile.
    ///
    /// A pause waits for the final elapsed value to be saved before the
    /// toggle request goes out, so the answer already carries it.
    pub async fn toggle(&self, task_id: &str) -> Result<Task, TrackError> {
        let ticket = self.begin_toggle(task_id)?;
        if !ticket.running {
            self.timers.settle().await;
        }
        let response = self.backend.toggle_running(task_id).await;
        self.finish_toggle(ticket, response)
    }

    fn reconcile(&self, server: Task) -> Task {
        let merged = {
            let mut state = self.state();
            match state.find_mut(&server.id) {
                Some(local) => {
                    let completed = server.completed.or(local.completed);
                    *local = Task {
                        is_running: local.is_running,
                        completed,
                        ..server
                    };
                    local.clone()
                }
                None => server,
            }
        };
        self.with_live_elapsed(merged)
    }

    fn roll_back(&self, ticket: ToggleTicket) {
        let mut state = self.state();
        if state.generations.get(&ticket.task_id) != Some(&ticket.generation) {
            debug!(task_id = %ticket.task_id, "task toggled again since; rollback skipped");
            return;
        }
        let Some(task) = state.find_mut(&ticket.task_id) else {
            return;
        };

        task.is_running = ticket.previous_running;
        task.elapsed_time = ticket.previous_elapsed;
        if ticket.running {
            self.timers.take(&ticket.task_id);
        } else if let Some(timer) = ticket.paused_timer {
            self.timers.restore(timer);
        }
        info!(task_id = %ticket.task_id, running = ticket.previous_running, "toggle rolled back");
    }

    /// Set the completion flag on the local copy.
    pub fn set_completed(&self, task_id: &str, completed: bool) -> Result<Task, TrackError> {
        let task = {
            let mut state = self.state();
            let task = state
                .find_mut(task_id)
                .ok_or_else(|| TrackError::UnknownTask(task_id.to_owned()))?;
            task.completed = Some(completed);
            task.clone()
        };
        Ok(self.with_live_elapsed(task))
    }

    pub fn toggle_completed(&self, task_id: &str) -> Result<Task, TrackError> {
        let completed = self
            .state()
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(Task::is_completed)
            .ok_or_else(|| TrackError::UnknownTask(task_id.to_owned()))?;
        self.set_completed(task_id, !completed)
    }

    /// Delete the task on the backend, then drop it and its timer locally
    /// without saving the timer.
    pub async fn remove(&self, task_id: &str) -> Result<(), TrackError> {
        self.backend.delete_task(task_id).await?;
        let mut state = self.state();
        state.tasks.retain(|t| t.id != task_id);
        state.generations.remove(task_id);
        self.timers.discard(task_id);
        info!(task_id, "task removed");
        Ok(())
    }

    pub fn filtered(&self, filter: &TaskFilter) -> Vec<Task> {
        filter.apply(&self.tasks())
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_tasks(&self.tasks())
    }

    pub fn recent(&self, limit: usize) -> Vec<Task> {
        stats::recent(&self.tasks(), limit)
    }

    /// Live elapsed seconds of `task_id`.
    pub fn watch(&self, task_id: &str) -> watch::Receiver<u64> {
        self.timers.elapsed(task_id)
    }

    /// Stop and save every timer, wait for saves still in flight, then cancel
    /// the timer loops.
    pub async fn close(&self) {
        self.timers.drain().await;
        self.timers.shutdown().await;
    }
}
