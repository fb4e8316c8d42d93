use std::collections::HashMap;

use tokio::time::Instant;

/// Wall-clock state of one running timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub task_id: String,
    pub started_at: Instant,
    /// Elapsed seconds already accumulated when the timer was started.
    pub elapsed_at_start: u64,
}

impl TimerState {
    /// `elapsed_at_start + floor(now - started_at)` in whole seconds.
    pub fn elapsed_at(&self, now: Instant) -> u64 {
        let secs = now.saturating_duration_since(self.started_at).as_secs();
        self.elapsed_at_start.saturating_add(secs)
    }
}

/// In-memory map from task id to its running timer.
///
/// Unbounded; an entry only goes away through [`take`](Self::take).
#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: HashMap<String, TimerState>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a timer for `task_id` seeded with `current_elapsed`.
    ///
    /// Returns `false` and leaves the existing entry untouched when the task
    /// already has a timer: the first start wins.
    pub fn start(&mut self, task_id: &str, current_elapsed: u64, now: Instant) -> bool {
        if self.timers.contains_key(task_id) {
            return false;
        }
        self.timers.insert(
            task_id.to_owned(),
            TimerState {
                task_id: task_id.to_owned(),
                started_at: now,
                elapsed_at_start: current_elapsed,
            },
        );
        true
    }

    /// Unregister and hand back the raw state so it can be restored later.
    pub fn take(&mut self, task_id: &str) -> Option<TimerState> {
        self.timers.remove(task_id)
    }

    /// Re-insert a previously taken state.  Does nothing if a newer timer has
    /// been registered for the task in the meantime.
    pub fn restore(&mut self, state: TimerState) -> bool {
        if self.timers.contains_key(&state.task_id) {
            return false;
        }
        self.timers.insert(state.task_id.clone(), state);
        true
    }

    pub fn is_active(&self, task_id: &str) -> bool {
        self.timers.contains_key(task_id)
    }

    pub fn elapsed(&self, task_id: &str, now: Instant) -> Option<u64> {
        self.timers.get(task_id).map(|state| state.elapsed_at(now))
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Current elapsed value of every registered timer.
    pub fn snapshot(&self, now: Instant) -> Vec<(String, u64)> {
        self.timers
            .values()
            .map(|state| (state.task_id.clone(), state.elapsed_at(now)))
            .collect()
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.timers.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn elapsed_floors_partial_seconds() {
        let t0 = Instant::now();
        let state = TimerState {
            task_id: "a".into(),
            started_at: t0,
            elapsed_at_start: 100,
        };
        assert_eq!(state.elapsed_at(t0), 100);
        assert_eq!(state.elapsed_at(t0 + Duration::from_millis(999)), 100);
        assert_eq!(state.elapsed_at(t0 + Duration::from_millis(1000)), 101);
        assert_eq!(state.elapsed_at(t0 + Duration::from_millis(5_500)), 105);
    }

    #[test]
    fn elapsed_never_goes_below_seed() {
        let t0 = Instant::now();
        let state = TimerState {
            task_id: "a".into(),
            started_at: t0 + Duration::from_secs(3),
            elapsed_at_start: 7,
        };
        assert_eq!(state.elapsed_at(t0), 7);
    }

    #[test]
    fn duplicate_start_keeps_first_registration() {
        let t0 = Instant::now();
        let mut reg = TimerRegistry::new();
        assert!(reg.start("a", 10, t0));
        assert!(!reg.start("a", 500, t0 + Duration::from_secs(4)));

        assert_eq!(reg.elapsed("a", t0 + Duration::from_secs(6)), Some(16));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn take_unknown_returns_none() {
        let mut reg = TimerRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.take("ghost"), None);
    }

    #[test]
    fn huge_seed_saturates_instead_of_overflowing() {
        let t0 = Instant::now();
        let state = TimerState {
            task_id: "a".into(),
            started_at: t0,
            elapsed_at_start: u64::MAX - 1,
        };
        assert_eq!(state.elapsed_at(t0 + Duration::from_secs(5)), u64::MAX);
    }

    #[test]
    fn take_and_restore_round_trip() {
        let t0 = Instant::now();
        let mut reg = TimerRegistry::new();
        reg.start("a", 3, t0);

        let state = reg.take("a").unwrap();
        assert!(!reg.is_active("a"));

        assert!(reg.restore(state.clone()));
        assert_eq!(reg.elapsed("a", t0 + Duration::from_secs(2)), Some(5));

        // A newer registration is not overwritten.
        reg.take("a");
        reg.start("a", 50, t0);
        assert!(!reg.restore(state));
        assert_eq!(reg.elapsed("a", t0), Some(50));
    }

    #[test]
    fn snapshot_covers_every_timer() {
        let t0 = Instant::now();
        let mut reg = TimerRegistry::new();
        reg.start("a", 0, t0);
        reg.start("b", 20, t0);

        let mut snap = reg.snapshot(t0 + Duration::from_secs(2));
        snap.sort();
        assert_eq!(snap, vec![("a".to_owned(), 2), ("b".to_owned(), 22)]);
    }
}
