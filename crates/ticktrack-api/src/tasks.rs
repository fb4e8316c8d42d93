//! `/tasks` endpoints.

use tracing::debug;
use validator::Validate;

use crate::client::ApiClient;
use crate::error::{ApiError, Resource};
use crate::models::{Task, TaskCreate, TaskPatch, TaskUpdate};

impl ApiClient {
    /// `GET /tasks/{id}`
    pub async fn get_task(&self, id: &str) -> Result<Task, ApiError> {
        let url = self.endpoint(&["tasks", id])?;
        debug!(method = "GET", %url, "task request");
        self.execute(Resource::Task, self.http.get(url)).await
    }

    /// `GET /tasks/user/{userId}`
    pub async fn tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, ApiError> {
        let url = self.endpoint(&["tasks", "user", user_id])?;
        debug!(method = "GET", %url, "task request");
        self.execute(Resource::Task, self.http.get(url)).await
    }

    /// `POST /tasks`
    pub async fn create_task(&self, task: &TaskCreate) -> Result<Task, ApiError> {
        task.validate()?;
        let url = self.endpoint(&["tasks"])?;
        debug!(method = "POST", %url, name = %task.name, "task request");
        self.execute(Resource::Task, self.http.post(url).json(task)).await
    }

    /// `PUT /tasks/{id}`
    pub async fn update_task(&self, id: &str, task: &TaskUpdate) -> Result<Task, ApiError> {
        task.validate()?;
        let url = self.endpoint(&["tasks", id])?;
        debug!(method = "PUT", %url, "task request");
        self.execute(Resource::Task, self.http.put(url).json(task)).await
    }

    /// `PATCH /tasks/{id}` with an arbitrary partial body.
    pub async fn patch_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        let url = self.endpoint(&["tasks", id])?;
        debug!(method = "PATCH", %url, ?patch, "task request");
        self.execute(Resource::Task, self.http.patch(url).json(patch)).await
    }

    /// `PATCH /tasks/{id}` with `{ "toggle": true }`; the backend flips
    /// `isRunning` and returns the updated task.
    pub async fn toggle_running(&self, id: &str) -> Result<Task, ApiError> {
        self.patch_task(id, &TaskPatch::toggle()).await
    }

    /// `PATCH /tasks/{id}` with `{ "elapsedTime": seconds }`.
    pub async fn update_time(&self, id: &str, seconds: u64) -> Result<Task, ApiError> {
        self.patch_task(id, &TaskPatch::elapsed(seconds)).await
    }

    /// `DELETE /tasks/{id}`
    pub async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["tasks", id])?;
        debug!(method = "DELETE", %url, "task request");
        self.execute_empty(Resource::Task, self.http.delete(url)).await
    }
}
