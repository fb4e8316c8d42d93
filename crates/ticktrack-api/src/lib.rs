pub mod api;
pub mod client;
pub mod error;
pub mod models;
pub mod tasks;
pub mod users;

pub use api::{Api, DEFAULT_BASE_URL};
pub use client::ApiClient;
pub use error::{ApiError, Resource};
pub use models::{Task, TaskCreate, TaskPatch, TaskUpdate, User, UserCreate, UserPatch, UserUpdate};
