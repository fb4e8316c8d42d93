//! Wire types for the `/tasks` and `/users` resources.
//!
//! Field names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A tracked task as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Cumulative tracked time in seconds.
    #[serde(default)]
    pub elapsed_time: u64,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed.unwrap_or(false)
    }
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreate {
    #[validate(length(min = 1, message = "an owning user is required"))]
    pub user_id: String,
    #[validate(length(min = 3, message = "name must have at least 3 characters"))]
    pub name: String,
    pub description: String,
}

/// Body of `PUT /tasks/{id}` (full replace).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[validate(length(min = 1, message = "an owning user is required"))]
    pub user_id: String,
    #[validate(length(min = 3, message = "name must have at least 3 characters"))]
    pub name: String,
    pub description: String,
    pub elapsed_time: u64,
    pub is_running: bool,
}

impl TaskUpdate {
    /// Start a full-replace body from the current server record.
    pub fn from_task(task: &Task) -> Self {
        Self {
            user_id: task.user_id.clone(),
            name: task.name.clone(),
            description: task.description.clone(),
            elapsed_time: task.elapsed_time,
            is_running: task.is_running,
        }
    }
}

/// Body of `PATCH /tasks/{id}`.  Only the fields that are `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// Ask the backend to flip `isRunning`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggle: Option<bool>,
}

impl TaskPatch {
    pub fn elapsed(seconds: u64) -> Self {
        Self {
            elapsed_time: Some(seconds),
            ..Default::default()
        }
    }

    pub fn toggle() -> Self {
        Self {
            toggle: Some(true),
            ..Default::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Body of `POST /users` (registration).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserCreate {
    #[validate(length(min = 3, message = "name must have at least 3 characters"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must have at least 6 characters"))]
    pub password: String,
}

/// Body of `PUT /users/{id}`.  The password is only sent when changed.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(length(min = 3, message = "name must have at least 3 characters"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, message = "password must have at least 6 characters"))]
    pub password: Option<String>,
}

/// Body of `PATCH /users/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_uses_camel_case_fields() {
        let task: Task = serde_json::from_value(json!({
            "id": "t1",
            "userId": "u1",
            "name": "Write report",
            "description": "",
            "elapsedTime": 42,
            "isRunning": true
        }))
        .unwrap();

        assert_eq!(task.user_id, "u1");
        assert_eq!(task.elapsed_time, 42);
        assert!(task.is_running);
        assert_eq!(task.completed, None);
        assert!(!task.is_completed());
    }

    #[test]
    fn task_tolerates_missing_optional_fields() {
        let task: Task = serde_json::from_value(json!({
            "id": "t1",
            "userId": "u1",
            "name": "Fresh"
        }))
        .unwrap();
        assert_eq!(task.elapsed_time, 0);
        assert!(!task.is_running);
        assert!(task.description.is_empty());
    }

    #[test]
    fn patch_only_serializes_set_fields() {
        assert_eq!(
            serde_json::to_value(TaskPatch::elapsed(105)).unwrap(),
            json!({ "elapsedTime": 105 })
        );
        assert_eq!(
            serde_json::to_value(TaskPatch::toggle()).unwrap(),
            json!({ "toggle": true })
        );
    }

    #[test]
    fn task_create_rules() {
        let ok = TaskCreate {
            user_id: "u1".into(),
            name: "abc".into(),
            description: String::new(),
        };
        assert!(ok.validate().is_ok());

        let short = TaskCreate { name: "ab".into(), ..ok.clone() };
        assert!(short.validate().is_err());

        let orphan = TaskCreate { user_id: String::new(), ..ok };
        assert!(orphan.validate().is_err());
    }

    #[test]
    fn user_create_rules() {
        let ok = UserCreate {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "secret1".into(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = UserCreate { email: "ana.example.com".into(), ..ok.clone() };
        let errors = bad_email.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));

        let short_password = UserCreate { password: "12345".into(), ..ok };
        let errors = short_password.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn user_update_password_is_optional() {
        let update = UserUpdate {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: None,
        };
        assert!(update.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "name": "Ana", "email": "ana@example.com" })
        );

        let weak = UserUpdate { password: Some("123".into()), ..update };
        assert!(weak.validate().is_err());
    }
}
