use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use super::Block;
use crate::error::{LedgerError, Result};

/// How often (in attempts) a running search polls its cancel token.
const CANCEL_POLL_INTERVAL: u64 = 1024;

/// Cloneable stop signal shared between the owner of a search and the search itself.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Nonce search for a hash with `difficulty` leading hex zeros.
///
/// Without `max_attempts` the search only ends on success or cancellation; the
/// expected cost grows 16x per difficulty step, so high difficulties can keep a
/// worker busy indefinitely.
#[derive(Debug, Clone, Copy)]
pub struct ProofOfWork {
    difficulty: u32,
    max_attempts: Option<u64>,
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> Self {
        Self {
            difficulty,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn target_prefix(&self) -> String {
        "0".repeat(self.difficulty as usize)
    }

    /// Increment the block's nonce until its hash satisfies the difficulty.
    /// Only `nonce` and `hash` are touched. Returns the number of hashes tried.
    pub fn solve(&self, block: &mut Block, cancel: &CancelToken) -> Result<u64> {
        let target_prefix = self.target_prefix();
        let mut attempts: u64 = 0;
        loop {
            if attempts % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
                debug!("POW - block #{} cancelled after {attempts} attempts", block.index);
                return Err(LedgerError::PowCancelled { attempts });
            }
            if self.max_attempts.is_some_and(|max| attempts >= max) {
                debug!("POW - block #{} out of budget after {attempts} attempts", block.index);
                return Err(LedgerError::PowBudgetExhausted { attempts });
            }

            block.refresh_hash();
            attempts += 1;
            if block.hash.starts_with(&target_prefix) {
                return Ok(attempts);
            }

            block.nonce = match block.nonce.checked_add(1) {
                Some(n) => n,
                None => return Err(LedgerError::PowBudgetExhausted { attempts }),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelToken, ProofOfWork};
    use crate::blockchain::Block;
    use crate::error::LedgerError;

    fn candidate() -> Block {
        Block::new(1, 1_700_000_000_000, "hello".into(), "prev".into())
    }

    #[test]
    fn mining_produces_leading_zeros() {
        let mut b = candidate();
        let attempts = ProofOfWork::new(2).solve(&mut b, &CancelToken::new()).unwrap();
        assert!(attempts >= 1);
        assert!(b.hash.starts_with("00"));
        assert!(b.has_valid_hash());
        assert!(b.meets_difficulty(2));
    }

    #[test]
    fn difficulty_four_yields_four_zeros() {
        let mut b = candidate();
        ProofOfWork::new(4).solve(&mut b, &CancelToken::new()).unwrap();
        assert_eq!(&b.hash[..4], "0000");
        assert!(b.has_valid_hash());
    }

    #[test]
    fn payload_is_left_untouched() {
        let mut b = candidate();
        ProofOfWork::new(2).solve(&mut b, &CancelToken::new()).unwrap();
        assert_eq!(b.payload, "hello");
        assert_eq!(b.previous_hash, "prev");
        assert_eq!(b.index, 1);
    }

    #[test]
    fn search_is_reproducible() {
        let mut a = candidate();
        let mut b = candidate();
        let pow = ProofOfWork::new(2);
        pow.solve(&mut a, &CancelToken::new()).unwrap();
        pow.solve(&mut b, &CancelToken::new()).unwrap();
        assert_eq!(a.nonce, b.nonce);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn cancelled_token_stops_search() {
        let token = CancelToken::new();
        token.cancel();
        let mut b = candidate();
        let err = ProofOfWork::new(8).solve(&mut b, &token).unwrap_err();
        assert_eq!(err, LedgerError::PowCancelled { attempts: 0 });
    }

    #[test]
    fn budget_bounds_search() {
        let mut b = candidate();
        let err = ProofOfWork::new(64)
            .with_max_attempts(Some(10))
            .solve(&mut b, &CancelToken::new())
            .unwrap_err();
        assert_eq!(err, LedgerError::PowBudgetExhausted { attempts: 10 });
    }

    #[test]
    fn zero_difficulty_accepts_first_hash() {
        let mut b = candidate();
        let attempts = ProofOfWork::new(0).solve(&mut b, &CancelToken::new()).unwrap();
        assert_eq!(attempts, 1);
        assert_eq!(b.nonce, 0);
    }

    #[test]
    fn target_prefix_matches_difficulty() {
        assert_eq!(ProofOfWork::new(4).target_prefix(), "0000");
        assert_eq!(ProofOfWork::new(4).difficulty(), 4);
    }
}
