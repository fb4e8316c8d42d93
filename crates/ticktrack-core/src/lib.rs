//! Task tracking on top of the ticktrack REST client: per-task timers,
//! the optimistic toggle flow, the task board and the persisted session.

pub mod backend;
pub mod board;
pub mod error;
pub mod filter;
pub mod format;
pub mod session;
pub mod stats;
pub mod timer;

#[cfg(test)]
mod testing;

pub use backend::{TaskBackend, UserLookup};
pub use board::{TaskBoard, ToggleFailurePolicy, ToggleTicket};
pub use error::TrackError;
pub use filter::{CompletionFilter, SortOrder, StatusFilter, TaskFilter};
pub use format::{format_elapsed, parse_elapsed};
pub use session::{Session, SessionStore};
pub use stats::{DashboardStats, RECENT_LIMIT};
pub use timer::{TimerConfig, TimerService};
