//! `/users` endpoints, including the e-mail lookup used for login.

use tracing::debug;
use validator::Validate;

use crate::client::ApiClient;
use crate::error::{ApiError, Resource};
use crate::models::{User, UserCreate, UserPatch, UserUpdate};

impl ApiClient {
    /// `GET /users/{id}`
    pub async fn get_user(&self, id: &str) -> Result<User, ApiError> {
        let url = self.endpoint(&["users", id])?;
        debug!(method = "GET", %url, "user request");
        self.execute(Resource::User, self.http.get(url)).await
    }

    /// `GET /users/email/{email}`
    pub async fn user_by_email(&self, email: &str) -> Result<User, ApiError> {
        let url = self.endpoint(&["users", "email", email])?;
        debug!(method = "GET", %url, "user request");
        self.execute(Resource::User, self.http.get(url)).await
    }

    /// `POST /users`
    pub async fn create_user(&self, user: &UserCreate) -> Result<User, ApiError> {
        user.validate()?;
        let url = self.endpoint(&["users"])?;
        debug!(method = "POST", %url, email = %user.email, "user request");
        self.execute(Resource::User, self.http.post(url).json(user)).await
    }

    /// `PUT /users/{id}`
    pub async fn update_user(&self, id: &str, user: &UserUpdate) -> Result<User, ApiError> {
        user.validate()?;
        let url = self.endpoint(&["users", id])?;
        debug!(method = "PUT", %url, "user request");
        self.execute(Resource::User, self.http.put(url).json(user)).await
    }

    /// `PATCH /users/{id}`
    pub async fn patch_user(&self, id: &str, patch: &UserPatch) -> Result<User, ApiError> {
        let url = self.endpoint(&["users", id])?;
        debug!(method = "PATCH", %url, "user request");
        self.execute(Resource::User, self.http.patch(url).json(patch)).await
    }

    /// `DELETE /users/{id}`
    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["users", id])?;
        debug!(method = "DELETE", %url, "user request");
        self.execute_empty(Resource::User, self.http.delete(url)).await
    }
}
