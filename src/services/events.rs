//! Per-task event broadcasting.
//!
//! Each task id owns one broadcast channel. Subscribers attach with
//! unbounded lifetime; terminal events force-close the channel so streams
//! end once no further events are possible. Publishing for a single task id
//! is single-writer (that task's worker), but many task ids publish
//! concurrently, so the channel map is guarded.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

pub const EVENT_TASK_STARTED: &str = "task_started";
pub const EVENT_TASK_PROGRESS: &str = "task_progress";
pub const EVENT_TASK_COMPLETED: &str = "task_completed";
pub const EVENT_TASK_FAILED: &str = "task_failed";

/// One named event on a task's stream.
#[derive(Debug, Clone, Serialize)]
pub struct TaskEvent {
    pub event: String,
    pub task_id: String,
    pub payload: Value,
}

/// Configuration for the broadcaster.
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Per-channel buffer; slow subscribers past this lag miss events.
    pub channel_capacity: usize,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self { channel_capacity: 64 }
    }
}

/// Per-task-id publish/subscribe fan-out.
pub struct TaskEventBroadcaster {
    config: BroadcasterConfig,
    channels: Mutex<HashMap<String, broadcast::Sender<TaskEvent>>>,
}

impl TaskEventBroadcaster {
    pub fn new(config: BroadcasterConfig) -> Self {
        Self { config, channels: Mutex::new(HashMap::new()) }
    }

    /// Attach a subscriber to the task's stream, creating the channel on
    /// first use.
    pub async fn subscribe(&self, task_id: &str) -> broadcast::Receiver<TaskEvent> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(task_id.to_string())
            .or_insert_with(|| broadcast::channel(self.config.channel_capacity).0)
            .subscribe()
    }

    /// Deliver an event to every live subscriber of the task. Dead
    /// subscribers are dropped by the channel without affecting the others
    /// or the publisher. Terminal events remove the channel afterwards,
    /// closing all remaining receivers.
    pub async fn publish(&self, task_id: &str, event_name: &str, payload: Value) {
        let event = TaskEvent {
            event: event_name.to_string(),
            task_id: task_id.to_string(),
            payload,
        };

        let mut channels = self.channels.lock().await;
        if let Some(sender) = channels.get(task_id) {
            // No subscribers is fine; the event is simply dropped.
            let _ = sender.send(event);
        }

        if is_terminal_event(event_name) {
            if channels.remove(task_id).is_some() {
                debug!(task_id, event_name, "closed event channel after terminal event");
            }
        }
    }

    /// Live subscriber count for a task (test/monitoring hook).
    pub async fn subscriber_count(&self, task_id: &str) -> usize {
        let channels = self.channels.lock().await;
        channels.get(task_id).map_or(0, broadcast::Sender::receiver_count)
    }
}

fn is_terminal_event(event_name: &str) -> bool {
    event_name == EVENT_TASK_COMPLETED || event_name == EVENT_TASK_FAILED
}
