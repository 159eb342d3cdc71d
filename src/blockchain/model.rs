use chrono::Utc;
use log::{debug, warn};

use super::{Block, CancelToken, GENESIS_PREVIOUS_HASH, ProofOfWork};
use crate::error::{LedgerError, Result, ViolationKind};

/// Simple in-memory blockchain with Proof-of-Work.
#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    pow: ProofOfWork,
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block.
    pub fn new(difficulty: u32) -> Self {
        let mut bc = Self {
            chain: Vec::new(),
            pow: ProofOfWork::new(difficulty),
        };
        bc.create_genesis_block();
        bc
    }

    /// Cap the hash attempts of every search; `None` searches until solved.
    pub fn with_pow_budget(mut self, max_attempts: Option<u64>) -> Self {
        self.pow = self.pow.with_max_attempts(max_attempts);
        self
    }

    fn create_genesis_block(&mut self) {
        let genesis = Block::genesis();
        debug!("GENESIS - hash={}", genesis.hash);
        self.chain.push(genesis);
    }

    /// Return the last block in the chain.
    pub fn latest_block(&self) -> Result<&Block> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    /// Build an unmined candidate on top of the current tail.
    pub fn next_candidate(&self, payload: String) -> Result<Block> {
        let tail = self.latest_block()?;
        Ok(Block::new(
            self.chain.len() as u64,
            Utc::now().timestamp_millis(),
            payload,
            tail.hash.clone(),
        ))
    }

    /// Run the ledger's Proof-of-Work on `block`. See [`ProofOfWork::solve`].
    pub fn proof_of_work(&self, block: &mut Block, cancel: &CancelToken) -> Result<u64> {
        self.pow.solve(block, cancel)
    }

    /// Append `block` if it links to the current tail.
    ///
    /// Only linkage is checked here; the block's own hash and difficulty are
    /// trusted to have been produced by [`Blockchain::proof_of_work`].
    pub fn add_block(&mut self, block: Block) -> Result<&Block> {
        let tail_hash = &self.latest_block()?.hash;
        if block.previous_hash != *tail_hash {
            warn!(
                "ADD - rejected block #{}: previous_hash {} != tail {}",
                block.index, block.previous_hash, tail_hash
            );
            return Err(LedgerError::LinkageMismatch {
                expected: tail_hash.clone(),
                found: block.previous_hash,
            });
        }
        debug!("ADD - appended block #{} (hash={})", block.index, block.hash);
        self.chain.push(block);
        self.latest_block()
    }

    /// Check hash integrity and linkage of every stored block.
    /// Returns the first violation found.
    pub fn verify(&self) -> Result<()> {
        if self.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        let genesis = &self.chain[0];
        if !genesis.has_valid_hash() {
            return Err(LedgerError::IntegrityViolation {
                index: 0,
                kind: ViolationKind::HashMismatch,
            });
        }
        if genesis.previous_hash != GENESIS_PREVIOUS_HASH {
            return Err(LedgerError::IntegrityViolation {
                index: 0,
                kind: ViolationKind::BrokenLink,
            });
        }

        for (i, pair) in self.chain.windows(2).enumerate() {
            let (prev, current) = (&pair[0], &pair[1]);
            let index = i as u64 + 1;

            if !current.has_valid_hash() {
                return Err(LedgerError::IntegrityViolation {
                    index,
                    kind: ViolationKind::HashMismatch,
                });
            }
            if current.previous_hash != prev.hash {
                return Err(LedgerError::IntegrityViolation {
                    index,
                    kind: ViolationKind::BrokenLink,
                });
            }
        }

        Ok(())
    }

    /// Validate the entire chain: linkage and hashes.
    pub fn validate_chain(&self) -> bool {
        self.verify().is_ok()
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.chain.get(i))
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.pow.difficulty()
    }

    #[cfg(test)]
    pub(crate) fn chain_mut(&mut self) -> &mut Vec<Block> {
        &mut self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::Blockchain;
    use crate::blockchain::{Block, CancelToken, GENESIS_PREVIOUS_HASH};
    use crate::error::{LedgerError, ViolationKind};

    fn mine_and_add(bc: &mut Blockchain, payload: &str) -> Block {
        let mut block = bc.next_candidate(payload.to_string()).unwrap();
        bc.proof_of_work(&mut block, &CancelToken::new()).unwrap();
        bc.add_block(block).unwrap().clone()
    }

    fn chain_of(n: usize) -> Blockchain {
        let mut bc = Blockchain::new(1);
        for i in 0..n {
            mine_and_add(&mut bc, &format!("payload-{i}"));
        }
        bc
    }

    #[test]
    fn new_chain_has_genesis() {
        let bc = Blockchain::new(4);
        assert_eq!(bc.len(), 1);
        let genesis = bc.latest_block().unwrap();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert_eq!(genesis.hash, genesis.compute_hash());
        assert!(bc.validate_chain());
    }

    #[test]
    fn appended_blocks_keep_chain_valid() {
        let mut bc = Blockchain::new(1);
        for i in 0..5 {
            mine_and_add(&mut bc, &format!("p{i}"));
            assert!(bc.validate_chain());
        }
        assert_eq!(bc.len(), 6);
        for (i, b) in bc.chain().iter().enumerate() {
            assert_eq!(b.index, i as u64);
        }
    }

    #[test]
    fn candidate_links_to_tail() {
        let bc = Blockchain::new(1);
        let candidate = bc.next_candidate("x".into()).unwrap();
        assert_eq!(candidate.index, 1);
        assert_eq!(candidate.previous_hash, bc.latest_block().unwrap().hash);
        assert!(candidate.timestamp >= bc.chain()[0].timestamp);
    }

    #[test]
    fn rejects_wrong_previous_hash() {
        let mut bc = chain_of(1);
        let bogus = Block::new(2, 0, "evil".into(), "0".repeat(64));
        let err = bc.add_block(bogus).unwrap_err();
        assert!(matches!(err, LedgerError::LinkageMismatch { .. }));
        assert_eq!(bc.len(), 2);
        assert!(bc.validate_chain());
    }

    #[test]
    fn add_block_checks_linkage_only() {
        let mut bc = Blockchain::new(4);
        let mut unmined = bc.next_candidate("x".into()).unwrap();
        unmined.hash = "not-a-digest".into();
        assert!(bc.add_block(unmined).is_ok());
        assert_eq!(bc.len(), 2);
    }

    #[test]
    fn pow_budget_is_applied() {
        let bc = Blockchain::new(8).with_pow_budget(Some(5));
        let mut candidate = bc.next_candidate("x".into()).unwrap();
        let err = bc.proof_of_work(&mut candidate, &CancelToken::new()).unwrap_err();
        assert_eq!(err, LedgerError::PowBudgetExhausted { attempts: 5 });
    }

    #[test]
    fn stale_candidate_is_rejected() {
        let mut bc = Blockchain::new(1);
        let stale = bc.next_candidate("first".into()).unwrap();
        mine_and_add(&mut bc, "winner");
        assert!(bc.add_block(stale).is_err());
        assert_eq!(bc.len(), 2);
    }

    #[test]
    fn tampered_payload_detected() {
        let mut bc = chain_of(3);
        bc.chain_mut()[2].payload.push('x');
        assert_eq!(
            bc.verify(),
            Err(LedgerError::IntegrityViolation {
                index: 2,
                kind: ViolationKind::HashMismatch
            })
        );
        assert!(!bc.validate_chain());
    }

    fn flip_first_char(s: &str) -> String {
        let head = if s.starts_with('0') { 'f' } else { '0' };
        format!("{head}{}", &s[1..])
    }

    #[test]
    fn tampered_fields_detected() {
        let mutations: [fn(&mut Block); 4] = [
            |b| b.payload = format!("{}!", b.payload),
            |b| b.timestamp ^= 1,
            |b| b.index ^= 1,
            |b| b.previous_hash = flip_first_char(&b.previous_hash),
        ];
        for mutate in mutations {
            for pos in 0..4 {
                let mut bc = chain_of(3);
                mutate(&mut bc.chain_mut()[pos]);
                assert!(!bc.validate_chain(), "mutation at #{pos} not detected");
            }
        }
    }

    #[test]
    fn rehashed_tamper_breaks_link() {
        let mut bc = chain_of(3);
        let block = &mut bc.chain_mut()[1];
        block.payload = "rewritten".into();
        block.refresh_hash();
        assert_eq!(
            bc.verify(),
            Err(LedgerError::IntegrityViolation {
                index: 2,
                kind: ViolationKind::BrokenLink
            })
        );
    }

    #[test]
    fn empty_chain_fails_fast() {
        let mut bc = Blockchain::new(1);
        bc.chain_mut().clear();
        assert_eq!(bc.latest_block().unwrap_err(), LedgerError::EmptyChain);
        assert!(bc.next_candidate("x".into()).is_err());
        assert_eq!(bc.verify(), Err(LedgerError::EmptyChain));
        assert!(!bc.validate_chain());
    }

    #[test]
    fn get_by_index() {
        let bc = chain_of(2);
        assert_eq!(bc.get(1).unwrap().payload, "payload-0");
        assert!(bc.get(3).is_none());
    }

    #[test]
    fn hello_scenario_at_default_difficulty() {
        let mut bc = Blockchain::new(4);
        assert_eq!(bc.len(), 1);
        assert!(bc.validate_chain());

        let block = mine_and_add(&mut bc, "hello");
        assert_eq!(bc.len(), 2);
        assert_eq!(block.payload, "hello");
        assert_eq!(bc.chain()[1].previous_hash, bc.chain()[0].hash);
        assert!(bc.chain()[1].hash.starts_with("0000"));
        assert!(bc.validate_chain());
    }
}
