use std::collections::HashMap;

use tokio::sync::watch;

/// Per-task elapsed-time channels with replay-latest semantics.
///
/// Each channel is a `watch` sender created lazily on first access.  Values
/// published while nobody is subscribed are kept and handed to the next
/// subscriber.  Channels are never closed by the table itself; subscribers
/// drop their receiver when they stop displaying the task.
#[derive(Debug, Default)]
pub struct ElapsedChannels {
    senders: HashMap<String, watch::Sender<u64>>,
}

impl ElapsedChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `task_id`, creating the channel at `0` if needed.
    pub fn subscribe(&mut self, task_id: &str) -> watch::Receiver<u64> {
        self.sender(task_id, 0).subscribe()
    }

    /// Create the channel at `value` unless it already exists.
    pub fn seed(&mut self, task_id: &str, value: u64) {
        self.sender(task_id, value);
    }

    /// Store `value` as the latest and wake subscribers, if any.
    pub fn publish(&mut self, task_id: &str, value: u64) {
        self.sender(task_id, value).send_replace(value);
    }

    pub fn latest(&self, task_id: &str) -> Option<u64> {
        self.senders.get(task_id).map(|tx| *tx.borrow())
    }

    pub fn subscriber_count(&self, task_id: &str) -> usize {
        self.senders
            .get(task_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Forget the channel.  Existing receivers keep their last value and see
    /// the channel as closed.
    pub fn remove(&mut self, task_id: &str) {
        self.senders.remove(task_id);
    }

    fn sender(&mut self, task_id: &str, initial: u64) -> &watch::Sender<u64> {
        self.senders
            .entry(task_id.to_owned())
            .or_insert_with(|| watch::channel(initial).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazily_created_channel_starts_at_zero() {
        let mut channels = ElapsedChannels::new();
        let rx = channels.subscribe("a");
        assert_eq!(*rx.borrow(), 0);
    }

    #[test]
    fn seed_does_not_override_existing_value() {
        let mut channels = ElapsedChannels::new();
        channels.seed("a", 40);
        channels.seed("a", 99);
        assert_eq!(channels.latest("a"), Some(40));
    }

    #[test]
    fn late_subscriber_sees_last_published_value() {
        let mut channels = ElapsedChannels::new();
        channels.publish("a", 7);
        channels.publish("a", 8);
        let rx = channels.subscribe("a");
        assert_eq!(*rx.borrow(), 8);
    }

    #[tokio::test]
    async fn subscriber_is_woken_by_publish() {
        let mut channels = ElapsedChannels::new();
        let mut rx = channels.subscribe("a");
        channels.publish("a", 3);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 3);
    }

    #[test]
    fn dropped_receivers_are_released() {
        let mut channels = ElapsedChannels::new();
        let rx1 = channels.subscribe("a");
        let rx2 = channels.subscribe("a");
        assert_eq!(channels.subscriber_count("a"), 2);
        drop(rx1);
        drop(rx2);
        assert_eq!(channels.subscriber_count("a"), 0);
        assert_eq!(channels.subscriber_count("missing"), 0);
    }
}
