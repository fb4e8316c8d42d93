//! Seams between the tracking layer and the REST backend.
//!
//! [`ApiClient`] implements both traits; tests substitute in-memory doubles.

use std::future::Future;

use ticktrack_api::{ApiClient, ApiError, Task, User};

/// The task operations the timer mechanism and the task board depend on.
pub trait TaskBackend: Send + Sync + 'static {
    /// Persist a new elapsed value (`PATCH {elapsedTime}`).
    fn update_elapsed(
        &self,
        task_id: &str,
        elapsed: u64,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Ask the backend to flip the running flag (`PATCH {toggle: true}`).
    fn toggle_running(&self, task_id: &str)
    -> impl Future<Output = Result<Task, ApiError>> + Send;

    fn tasks_for_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    fn delete_task(&self, task_id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Lookups used by login.
pub trait UserLookup: Send + Sync + 'static {
    fn user_by_email(&self, email: &str) -> impl Future<Output = Result<User, ApiError>> + Send;
    fn user_by_id(&self, id: &str) -> impl Future<Output = Result<User, ApiError>> + Send;
}

impl TaskBackend for ApiClient {
    async fn update_elapsed(&self, task_id: &str, elapsed: u64) -> Result<Task, ApiError> {
        self.update_time(task_id, elapsed).await
    }

    async fn toggle_running(&self, task_id: &str) -> Result<Task, ApiError> {
        ApiClient::toggle_running(self, task_id).await
    }

    async fn tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, ApiError> {
        ApiClient::tasks_for_user(self, user_id).await
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), ApiError> {
        ApiClient::delete_task(self, task_id).await
    }
}

impl UserLookup for ApiClient {
    async fn user_by_email(&self, email: &str) -> Result<User, ApiError> {
        ApiClient::user_by_email(self, email).await
    }

    async fn user_by_id(&self, id: &str) -> Result<User, ApiError> {
        self.get_user(id).await
    }
}
