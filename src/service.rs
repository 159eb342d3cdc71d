use std::sync::{Mutex, RwLock, RwLockReadGuard};

use log::{debug, info, warn};
use tokio::sync::broadcast;

use crate::blockchain::{Block, Blockchain, CancelToken};
use crate::config::Config;
use crate::error::{LedgerError, Result};
use crate::events::{EventBus, LedgerEvent};

/// Owns one ledger for the lifetime of the process and serializes admissions.
///
/// A running Proof-of-Work search holds `admission` plus a `chain` read lock,
/// so reads and subscriptions stay responsive while mining.
#[derive(Debug)]
pub struct LedgerService {
    chain: RwLock<Blockchain>,
    admission: Mutex<()>,
    cancel: CancelToken,
    events: EventBus,
}

impl LedgerService {
    pub fn new(config: &Config) -> Self {
        Self {
            chain: RwLock::new(
                Blockchain::new(config.difficulty).with_pow_budget(config.pow_max_attempts),
            ),
            admission: Mutex::new(()),
            cancel: CancelToken::new(),
            events: EventBus::new(config.event_buffer),
        }
    }

    /// Read access to the ledger.
    pub fn chain(&self) -> RwLockReadGuard<'_, Blockchain> {
        self.chain.read().expect("chain lock poisoned")
    }

    pub fn get_chain(&self) -> Vec<Block> {
        self.chain().chain().to_vec()
    }

    pub fn get_block(&self, index: u64) -> Option<Block> {
        self.chain().get(index).cloned()
    }

    pub fn validate(&self) -> Result<()> {
        self.chain().verify()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Build a candidate on the current tail, mine it, and append it.
    ///
    /// The whole sequence runs under the admission lock so no other candidate
    /// can be built against the same tail. Blocks the calling thread for the
    /// duration of the search.
    pub fn submit_payload(&self, payload: String) -> Result<Block> {
        let _admission = self.admission.lock().expect("admission lock poisoned");

        let (candidate, attempts) = {
            let bc = self.chain();
            let mut candidate = bc.next_candidate(payload)?;
            let index = candidate.index;
            debug!("SUBMIT - mining block #{index} at difficulty {}", bc.difficulty());

            let attempts = bc
                .proof_of_work(&mut candidate, &self.cancel)
                .inspect_err(|e| warn!("SUBMIT - block #{index} not mined: {e}"))?;
            (candidate, attempts)
        };

        let block = self.append(candidate)?;
        info!(
            "SUBMIT - sealed block #{} (hash={}, nonce={}, attempts={attempts})",
            block.index, block.hash, block.nonce
        );
        Ok(block)
    }

    /// Append a block built outside the ledger. Its index must be the next
    /// position and it must link to the tail; its hash is not re-checked.
    pub fn admit(&self, block: Block) -> Result<Block> {
        let _admission = self.admission.lock().expect("admission lock poisoned");
        let expected = self.chain().len() as u64;
        if block.index != expected {
            warn!("ADMIT - rejected block #{}: next position is #{expected}", block.index);
            return Err(LedgerError::IndexMismatch {
                expected,
                found: block.index,
            });
        }
        self.append(block)
    }

    fn append(&self, block: Block) -> Result<Block> {
        let mut bc = self.chain.write().expect("chain lock poisoned");
        let block = bc.add_block(block)?.clone();
        // Published under the write lock so `subscribe` never sees a block twice.
        self.events.publish(LedgerEvent::NewBlock(block.clone()));
        Ok(block)
    }

    /// Attach a subscriber: returns the chain snapshot and a receiver for every
    /// block admitted after that snapshot.
    pub fn subscribe(&self) -> (Vec<Block>, broadcast::Receiver<LedgerEvent>) {
        let bc = self.chain();
        let rx = self.events.subscribe();
        (bc.chain().to_vec(), rx)
    }

    /// Cancel any running search and refuse further mining.
    pub fn shutdown(&self) {
        info!("SHUTDOWN - cancelling proof-of-work");
        self.cancel.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
