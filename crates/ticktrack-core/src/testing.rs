//! In-memory backend double shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ticktrack_api::{ApiError, Resource, Task, User};
use tokio::sync::Notify;

use crate::backend::{TaskBackend, UserLookup};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    UpdateElapsed(String, u64),
    Toggle(String),
    List(String),
    Delete(String),
}

pub(crate) fn task(id: &str, elapsed: u64, running: bool) -> Task {
    Task {
        id: id.to_owned(),
        user_id: "u1".to_owned(),
        name: format!("task {id}"),
        description: String::new(),
        elapsed_time: elapsed,
        is_running: running,
        completed: None,
    }
}

/// Records every call and keeps a server-side copy of the tasks.
#[derive(Default)]
pub(crate) struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    notify: Notify,
    failing: AtomicBool,
    tasks: Mutex<HashMap<String, Task>>,
    users: Mutex<Vec<User>>,
}

impl RecordingBackend {
    pub(crate) fn with_tasks(tasks: Vec<Task>) -> Self {
        let backend = Self::default();
        backend
            .tasks
            .lock()
            .unwrap()
            .extend(tasks.into_iter().map(|t| (t.id.clone(), t)));
        backend
    }

    pub(crate) fn with_users(users: Vec<User>) -> Self {
        let backend = Self::default();
        *backend.users.lock().unwrap() = users;
        backend
    }

    /// Make every subsequent request fail with a 500.
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn elapsed_updates(&self) -> Vec<(String, u64)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::UpdateElapsed(id, v) => Some((id, v)),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `n` calls were recorded.
    pub(crate) async fn wait_for_calls(&self, n: usize) -> Vec<Call> {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                let calls = self.calls();
                if calls.len() >= n {
                    return calls;
                }
                notified.await;
            }
        };
        tokio::time::timeout(Duration::from_secs(30), wait)
            .await
            .expect("backend calls did not arrive")
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        self.notify.notify_waiters();
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::from_status(Resource::Task, 500, ""));
        }
        Ok(())
    }
}

impl TaskBackend for RecordingBackend {
    async fn update_elapsed(&self, task_id: &str, elapsed: u64) -> Result<Task, ApiError> {
        self.record(Call::UpdateElapsed(task_id.to_owned(), elapsed))?;
        let mut tasks = self.tasks.lock().unwrap();
        let entry = tasks
            .entry(task_id.to_owned())
            .or_insert_with(|| task(task_id, 0, false));
        entry.elapsed_time = elapsed;
        Ok(entry.clone())
    }

    async fn toggle_running(&self, task_id: &str) -> Result<Task, ApiError> {
        self.record(Call::Toggle(task_id.to_owned()))?;
        let mut tasks = self.tasks.lock().unwrap();
        let entry = tasks
            .get_mut(task_id)
            .ok_or_else(|| ApiError::from_status(Resource::Task, 404, ""))?;
        entry.is_running = !entry.is_running;
        Ok(entry.clone())
    }

    async fn tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, ApiError> {
        self.record(Call::List(user_id.to_owned()))?;
        let tasks = self.tasks.lock().unwrap();
        let mut owned: Vec<Task> = tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(owned)
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), ApiError> {
        self.record(Call::Delete(task_id.to_owned()))?;
        self.tasks.lock().unwrap().remove(task_id);
        Ok(())
    }
}

impl UserLookup for RecordingBackend {
    async fn user_by_email(&self, email: &str) -> Result<User, ApiError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| ApiError::from_status(Resource::User, 404, ""))
    }

    async fn user_by_id(&self, id: &str) -> Result<User, ApiError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| ApiError::from_status(Resource::User, 404, ""))
    }
}
