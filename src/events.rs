use log::debug;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::blockchain::Block;

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Ledger notifications pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A block was admitted to the chain.
    NewBlock(Block),
    /// Full chain snapshot, sent once when a subscriber attaches.
    ChainUpdated(Vec<Block>),
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::NewBlock(_) => "new_block",
            LedgerEvent::ChainUpdated(_) => "chain_updated",
        }
    }

    /// JSON body of the event (the block or the chain).
    pub fn data(&self) -> serde_json::Result<String> {
        match self {
            LedgerEvent::NewBlock(block) => serde_json::to_string(block),
            LedgerEvent::ChainUpdated(chain) => serde_json::to_string(chain),
        }
    }
}

/// Fan-out channel between the ledger service and whatever transport pushes
/// events to clients. Knows nothing about HTTP.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Send to every current subscriber. Returns how many received it.
    pub fn publish(&self, event: LedgerEvent) -> usize {
        let name = event.name();
        match self.tx.send(event) {
            Ok(n) => {
                debug!("EVENTS - {name} delivered to {n} subscriber(s)");
                n
            }
            // No subscribers attached
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}
