use std::fmt;

use thiserror::Error;

/// What went wrong with a stored block during chain verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Cached `hash` no longer matches the digest of the block's fields.
    HashMismatch,
    /// `previous_hash` does not equal the predecessor's `hash`.
    BrokenLink,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::HashMismatch => write!(f, "hash mismatch"),
            ViolationKind::BrokenLink => write!(f, "broken link"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("linkage mismatch: expected previous_hash {expected}, got {found}")]
    LinkageMismatch { expected: String, found: String },

    #[error("index mismatch: expected block #{expected}, got #{found}")]
    IndexMismatch { expected: u64, found: u64 },

    #[error("integrity violation at block #{index}: {kind}")]
    IntegrityViolation { index: u64, kind: ViolationKind },

    /// Unreachable after construction; the genesis block is always present.
    #[error("chain is empty")]
    EmptyChain,

    #[error("proof-of-work cancelled after {attempts} attempts")]
    PowCancelled { attempts: u64 },

    #[error("proof-of-work gave up after {attempts} attempts")]
    PowBudgetExhausted { attempts: u64 },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
