//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use pos_consensus::chain::{BlockStore, NetworkClock, SignatureVerifier, UtxoView};
use pos_consensus::types::{Block, Coin, Hash, OutPoint, Transaction};

#[derive(Debug, Default)]
pub struct MemoryUtxoView {
    pub coins: HashMap<OutPoint, Coin>,
}

impl UtxoView for MemoryUtxoView {
    fn coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        self.coins.get(outpoint).cloned()
    }
}

#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    pub blocks: HashMap<Hash, Block>,
    pub transactions: HashMap<Hash, (Transaction, Hash)>,
    pub tx_offsets: HashMap<u32, u32>,
}

impl BlockStore for MemoryBlockStore {
    fn block(&self, hash: &Hash) -> Option<Block> {
        self.blocks.get(hash).cloned()
    }

    fn transaction(&self, txid: &Hash) -> Option<(Transaction, Hash)> {
        self.transactions.get(txid).cloned()
    }

    fn tx_offset(&self, height: u32) -> Option<u32> {
        self.tx_offsets.get(&height).copied()
    }
}

/// Signature verifier with a fixed verdict.
#[derive(Debug)]
pub struct StaticSignatures(pub bool);

impl SignatureVerifier for StaticSignatures {
    fn verify_spend(
        &self,
        _coin: &Coin,
        _spender: &Transaction,
        _input: usize,
        _flags: u32,
    ) -> bool {
        self.0
    }
}

/// Clock pinned to a fixed network-adjusted time.
#[derive(Debug)]
pub struct FixedClock(pub i64);

impl NetworkClock for FixedClock {
    fn adjusted_time(&self) -> i64 {
        self.0
    }
}
