//! Block index arena and the collaborator seams consumed by the kernel.
//!
//! The ancestry of this codebase reached for process-wide state (a global
//! block index map, a global tree database, a global clock). Here every
//! entry point receives an explicit [`ChainContext`] instead; the kernel
//! itself never mutates the index and holds no locks.

use std::collections::HashMap;

use crate::params::StakeParams;
use crate::types::{Block, Coin, Hash, OutPoint, Transaction};

/// Opaque handle to an entry in a [`ChainIndex`].
///
/// Handles are only minted by the arena that owns the entry, so an id held
/// by a caller always resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Per-block metadata tracked by the chain, as read by the stake kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIndexEntry {
    pub hash: Hash,
    pub height: u32,
    pub time: i64,
    /// Kernel hash for proof-of-stake blocks, the block hash otherwise.
    pub hash_proof: Hash,
    pub stake_modifier: u64,
    /// Whether this block advanced the modifier.
    pub generated_stake_modifier: bool,
    pub stake_entropy_bit: bool,
    pub proof_of_stake: bool,
    pub prev: Option<NodeId>,
    /// Successor on the active chain; `None` at the tip and on forks.
    pub next: Option<NodeId>,
}

impl BlockIndexEntry {
    /// The entropy bit of a block is the lowest bit of its hash on the wire.
    pub fn entropy_bit(hash: &Hash) -> bool {
        hash[0] & 1 == 1
    }
}

/// Append-only arena of block index entries with lookup by block hash.
#[derive(Debug, Clone, Default)]
pub struct ChainIndex {
    entries: Vec<BlockIndexEntry>,
    by_hash: HashMap<Hash, NodeId>,
    tip: Option<NodeId>,
}

impl ChainIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` as the new active-chain tip, wiring `prev` to the
    /// current tip and the current tip's `next` back to it.
    pub fn append(&mut self, mut entry: BlockIndexEntry) -> NodeId {
        let id = NodeId(self.entries.len());
        entry.prev = self.tip;
        entry.next = None;
        if let Some(tip) = self.tip {
            self.entries[tip.0].next = Some(id);
        }
        self.by_hash.insert(entry.hash, id);
        self.entries.push(entry);
        self.tip = Some(id);
        id
    }

    pub fn tip(&self) -> Option<NodeId> {
        self.tip
    }

    pub fn entry(&self, id: NodeId) -> &BlockIndexEntry {
        &self.entries[id.0]
    }

    pub fn lookup(&self, hash: &Hash) -> Option<NodeId> {
        self.by_hash.get(hash).copied()
    }

    /// Ancestor of `id` at exactly `height`, walking `prev` links.
    pub fn ancestor(&self, id: NodeId, height: u32) -> Option<NodeId> {
        let mut cursor = id;
        loop {
            let entry = self.entry(cursor);
            if entry.height == height {
                return Some(cursor);
            }
            if entry.height < height {
                return None;
            }
            cursor = entry.prev?;
        }
    }

    /// Stamp the modifier the engine derived for a freshly connected block.
    pub fn set_stake_modifier(&mut self, id: NodeId, modifier: u64, generated: bool) {
        let entry = &mut self.entries[id.0];
        entry.stake_modifier = modifier;
        entry.generated_stake_modifier = generated;
    }

    /// Stamp the kernel proof a validated coinstake produced.
    pub fn set_hash_proof(&mut self, id: NodeId, hash_proof: Hash) {
        self.entries[id.0].hash_proof = hash_proof;
    }
}

/// Read access to unspent (and recently spent) outputs.
pub trait UtxoView {
    fn coin(&self, outpoint: &OutPoint) -> Option<Coin>;
}

/// Read access to stored blocks and the transaction index.
pub trait BlockStore {
    /// Full block by block hash.
    fn block(&self, hash: &Hash) -> Option<Block>;

    /// Transaction by id, with the hash of the block containing it. Covers
    /// the on-disk index and, on the mining side, the mempool.
    fn transaction(&self, txid: &Hash) -> Option<(Transaction, Hash)>;

    /// Byte offset of the staked transaction inside its block, as indexed
    /// per height. Only the V1 kernel hashes it.
    fn tx_offset(&self, height: u32) -> Option<u32>;
}

/// Signature check of a spending transaction input against the coin it
/// consumes.
pub trait SignatureVerifier {
    fn verify_spend(&self, coin: &Coin, spender: &Transaction, input: usize, flags: u32) -> bool;
}

/// Network-adjusted wall clock (median of peer offsets).
pub trait NetworkClock {
    fn adjusted_time(&self) -> i64;
}

/// Script verification flags for coinstake signature checks: none, the
/// output was already validated when it entered the chain.
pub const SCRIPT_VERIFY_NONE: u32 = 0;

/// Everything stake validation reads, bundled per invocation.
///
/// All members are read-only snapshots; the surrounding chain lock (owned
/// by the caller) keeps them stable for the duration of a check.
#[derive(Clone, Copy)]
pub struct ChainContext<'a> {
    pub params: &'a StakeParams,
    pub index: &'a ChainIndex,
    pub utxo: &'a dyn UtxoView,
    pub store: &'a dyn BlockStore,
    pub signatures: &'a dyn SignatureVerifier,
    pub clock: &'a dyn NetworkClock,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hash_byte: u8, height: u32, time: i64) -> BlockIndexEntry {
        let mut hash = [0u8; 32];
        hash[0] = hash_byte;
        BlockIndexEntry {
            hash,
            height,
            time,
            hash_proof: hash,
            stake_modifier: 0,
            generated_stake_modifier: false,
            stake_entropy_bit: BlockIndexEntry::entropy_bit(&hash),
            proof_of_stake: false,
            prev: None,
            next: None,
        }
    }

    #[test]
    fn test_append_links_active_chain() {
        let mut index = ChainIndex::new();
        let a = index.append(entry(1, 0, 1000));
        let b = index.append(entry(2, 1, 1064));
        let c = index.append(entry(3, 2, 1128));

        assert_eq!(index.tip(), Some(c));
        assert_eq!(index.entry(b).prev, Some(a));
        assert_eq!(index.entry(b).next, Some(c));
        assert_eq!(index.entry(a).prev, None);
        assert_eq!(index.entry(c).next, None);
    }

    #[test]
    fn test_lookup_by_hash() {
        let mut index = ChainIndex::new();
        let a = index.append(entry(7, 0, 1000));
        let mut hash = [0u8; 32];
        hash[0] = 7;
        assert_eq!(index.lookup(&hash), Some(a));
        hash[0] = 8;
        assert_eq!(index.lookup(&hash), None);
    }

    #[test]
    fn test_ancestor_walk() {
        let mut index = ChainIndex::new();
        let ids: Vec<_> = (0..5)
            .map(|i| index.append(entry(i as u8 + 1, i, 1000 + 64 * i as i64)))
            .collect();
        assert_eq!(index.ancestor(ids[4], 2), Some(ids[2]));
        assert_eq!(index.ancestor(ids[4], 4), Some(ids[4]));
        assert_eq!(index.ancestor(ids[2], 4), None);
    }

    #[test]
    fn test_entropy_bit_is_lowest_wire_bit() {
        let mut hash = [0u8; 32];
        assert!(!BlockIndexEntry::entropy_bit(&hash));
        hash[0] = 0x03;
        assert!(BlockIndexEntry::entropy_bit(&hash));
        hash[0] = 0x02;
        assert!(!BlockIndexEntry::entropy_bit(&hash));
        // only the first wire byte matters
        hash[0] = 0;
        hash[31] = 0xff;
        assert!(!BlockIndexEntry::entropy_bit(&hash));
    }

    #[test]
    fn test_modifier_stamping() {
        let mut index = ChainIndex::new();
        let a = index.append(entry(1, 0, 1000));
        index.set_stake_modifier(a, 0xdead_beef, true);
        assert_eq!(index.entry(a).stake_modifier, 0xdead_beef);
        assert!(index.entry(a).generated_stake_modifier);
    }
}
