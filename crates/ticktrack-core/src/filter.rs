//! Task list filtering and ordering.

use strum::{Display, EnumString};
use ticktrack_api::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CompletionFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

/// Tasks carry no timestamps; "recent" lists names in descending order and
/// "oldest" in ascending order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Recent,
    Oldest,
    /// Most tracked time first.
    Time,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub completion: CompletionFilter,
    pub user_id: Option<String>,
    pub sort: SortOrder,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Running => task.is_running,
            StatusFilter::Paused => !task.is_running,
        };
        let completion_ok = match self.completion {
            CompletionFilter::All => true,
            CompletionFilter::Completed => task.is_completed(),
            CompletionFilter::Incomplete => !task.is_completed(),
        };
        let user_ok = self
            .user_id
            .as_deref()
            .is_none_or(|uid| uid.is_empty() || task.user_id == uid);
        status_ok && completion_ok && user_ok
    }

    /// Filter then sort `tasks`.  Sorting is stable.
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        let mut out: Vec<Task> = tasks.iter().filter(|t| self.matches(t)).cloned().collect();
        match self.sort {
            SortOrder::Recent => out.sort_by(|a, b| b.name.cmp(&a.name)),
            SortOrder::Oldest => out.sort_by(|a, b| a.name.cmp(&b.name)),
            SortOrder::Time => out.sort_by(|a, b| b.elapsed_time.cmp(&a.elapsed_time)),
        }
        out
    }
}
