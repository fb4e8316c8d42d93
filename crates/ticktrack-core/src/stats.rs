use serde::Serialize;
use ticktrack_api::Task;

/// Number of tasks shown in the dashboard's "recent" list.
pub const RECENT_LIMIT: usize = 5;

/// Aggregates shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_tasks: usize,
    /// Sum of elapsed seconds over every task.
    pub total_time: u64,
    pub running: usize,
    pub completed: usize,
}

impl DashboardStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        Self {
            total_tasks: tasks.len(),
            total_time: tasks.iter().map(|t| t.elapsed_time).sum(),
            running: tasks.iter().filter(|t| t.is_running).count(),
            completed: tasks.iter().filter(|t| t.is_completed()).count(),
        }
    }
}

/// The last `limit` tasks in backend order, newest first.
pub fn recent(tasks: &[Task], limit: usize) -> Vec<Task> {
    tasks.iter().rev().take(limit).cloned().collect()
}
