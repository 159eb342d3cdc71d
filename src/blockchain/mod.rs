pub mod block;
pub mod model;
pub mod pow;

pub use block::Block;
pub use model::Blockchain;
pub use pow::{CancelToken, ProofOfWork};

/// Default Proof-of-Work difficulty (number of leading hex zeros).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Difficulty bounds accepted from configuration.
pub const DIFF_MIN: u32 = 1;
pub const DIFF_MAX: u32 = 8;

/// Payload of the genesis block.
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

/// Predecessor link of the genesis block. Never a valid hex digest.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
