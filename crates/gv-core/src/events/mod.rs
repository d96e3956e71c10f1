//! Row mutation commands addressed to a table by identity
//!
//! Any component may publish add/delete/highlight/invalidate commands for a
//! table id. Every grid showing that table receives them through its
//! [`Subscription`]; dropping the subscription unsubscribes.

use std::sync::{Arc, Weak};

use ahash::AHashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Subscription identifier
pub type SubscriberId = Uuid;

/// Command delivered to the grids of one table
#[derive(Debug, Clone, PartialEq)]
pub enum GridCommand<R> {
    /// Upsert records by track identity
    Add(Vec<R>),
    /// Delete records by raw track value
    Delete(Vec<Value>),
    /// Flag records as updated without changing data
    Highlight(Vec<R>),
    /// Refresh visible rows if highlights are pending
    Invalidate,
}

type Subscribers<R> = AHashMap<String, Vec<(SubscriberId, UnboundedSender<GridCommand<R>>)>>;

/// Table-scoped command channel
pub struct CommandBus<R> {
    subscribers: Arc<Mutex<Subscribers<R>>>,
}

impl<R> Clone for CommandBus<R> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<R: Clone + Send + 'static> CommandBus<R> {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Start receiving commands for `table_id`
    pub fn subscribe(&self, table_id: impl Into<String>) -> Subscription<R> {
        let table_id = table_id.into();
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .entry(table_id.clone())
            .or_default()
            .push((id, sender));
        tracing::debug!("Subscribed {} to table '{}'", id, table_id);

        Subscription {
            id,
            table_id,
            receiver,
            bus: Arc::downgrade(&self.subscribers),
        }
    }

    /// Deliver `command` to every subscriber of `table_id`; returns how many received it
    pub fn publish(&self, table_id: &str, command: GridCommand<R>) -> usize {
        let mut subscribers = self.subscribers.lock();
        let Some(targets) = subscribers.get_mut(table_id) else {
            return 0;
        };
        targets.retain(|(_, sender)| !sender.is_closed());
        for (_, sender) in targets.iter() {
            let _ = sender.send(command.clone());
        }
        targets.len()
    }

    pub fn subscriber_count(&self, table_id: &str) -> usize {
        self.subscribers.lock().get(table_id).map(Vec::len).unwrap_or(0)
    }
}

impl<R: Clone + Send + 'static> Default for CommandBus<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end for one table; unsubscribes on drop
pub struct Subscription<R> {
    id: SubscriberId,
    table_id: String,
    receiver: UnboundedReceiver<GridCommand<R>>,
    bus: Weak<Mutex<Subscribers<R>>>,
}

impl<R> Subscription<R> {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Next queued command, if any
    pub fn try_next(&mut self) -> Option<GridCommand<R>> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the next command
    pub async fn next(&mut self) -> Option<GridCommand<R>> {
        self.receiver.recv().await
    }
}

impl<R> Drop for Subscription<R> {
    fn drop(&mut self) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        let mut subscribers = bus.lock();
        if let Some(targets) = subscribers.get_mut(&self.table_id) {
            targets.retain(|(id, _)| *id != self.id);
            if targets.is_empty() {
                subscribers.remove(&self.table_id);
            }
        }
    }
}
