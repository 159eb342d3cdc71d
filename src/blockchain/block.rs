use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH};

/// A single record in the ledger.
///
/// Fields are declared in sorted key order so the JSON sent to subscribers
/// lists them in the same order as the hash preimage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub hash: String, // Cached hash of the block
    pub index: u64,
    pub nonce: u64, // Proof-of-Work nonce
    pub payload: String,
    pub previous_hash: String,
    pub timestamp: i64, // Unix timestamp in milliseconds (UTC)
}

/// Hash preimage. Keys must stay in sorted order.
#[derive(Serialize)]
struct Preimage<'a> {
    index: u64,
    nonce: u64,
    payload: &'a str,
    previous_hash: &'a str,
    timestamp: i64,
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis() -> Self {
        Self::new(
            0,
            Utc::now().timestamp_millis(),
            GENESIS_PAYLOAD.to_string(),
            GENESIS_PREVIOUS_HASH.to_string(),
        )
    }

    /// Create a new block (not mined yet) and compute its hash right away.
    pub fn new(index: u64, timestamp: i64, payload: String, previous_hash: String) -> Self {
        let mut block = Self {
            hash: String::new(),
            index,
            nonce: 0,
            payload,
            previous_hash,
            timestamp,
        };
        block.refresh_hash();
        block
    }

    /// Compute the SHA-256 hash of this block over every field except `hash`.
    /// The preimage is the canonical JSON object with sorted keys.
    pub fn compute_hash(&self) -> String {
        let preimage = Preimage {
            index: self.index,
            nonce: self.nonce,
            payload: &self.payload,
            previous_hash: &self.previous_hash,
            timestamp: self.timestamp,
        };
        let bytes = serde_json::to_vec(&preimage).expect("serialize block preimage");
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }

    /// Store the freshly computed hash. Call after mutating any field.
    pub fn refresh_hash(&mut self) {
        self.hash = self.compute_hash();
    }

    /// Whether the cached `hash` still matches the block's content.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Whether the cached hash starts with `difficulty` hex zeros.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.hash.len() >= difficulty as usize
            && self
                .hash
                .chars()
                .take(difficulty as usize)
                .all(|c| c == '0')
    }
}
