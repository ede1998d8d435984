//! Core chain types read by the proof-of-stake kernel.

use serde::{Deserialize, Serialize};

use crate::hashing::hash256;

/// 256-bit hash in canonical wire order (little-endian integer).
pub type Hash = [u8; 32];

/// Byte string type (scripts, raw serializations).
pub type ByteString = Vec<u8>;

/// Amount in satoshi.
pub type Amount = i64;

/// Satoshis per coin.
pub const COIN: Amount = 100_000_000;

/// Reference to a transaction output: `(txid, output index)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    /// The null outpoint marks coinbase inputs.
    pub fn is_null(&self) -> bool {
        self.hash == [0u8; 32] && self.index == u32::MAX
    }
}

/// Transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
}

/// Transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Amount,
    pub script_pubkey: ByteString,
}

impl TransactionOutput {
    /// An empty output carries no value and no script; coinstakes open with one.
    pub fn is_empty(&self) -> bool {
        self.value == 0 && self.script_pubkey.is_empty()
    }
}

/// Transaction, carrying the per-transaction timestamp this chain family
/// serializes alongside the version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub time: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

impl Transaction {
    /// Coinstake shape: a real first prevout, at least two outputs, and an
    /// empty first output.
    pub fn is_coin_stake(&self) -> bool {
        !self.inputs.is_empty()
            && !self.inputs[0].prevout.is_null()
            && self.outputs.len() >= 2
            && self.outputs[0].is_empty()
    }
}

/// Block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    /// Double SHA-256 of the 80-byte wire serialization.
    pub fn hash(&self) -> Hash {
        let mut bytes = Vec::with_capacity(80);
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.prev_block_hash);
        bytes.extend_from_slice(&self.merkle_root);
        bytes.extend_from_slice(&self.time.to_le_bytes());
        bytes.extend_from_slice(&self.bits.to_le_bytes());
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        hash256(&bytes)
    }
}

/// Block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn block_time(&self) -> u32 {
        self.header.time
    }
}

/// An unspent (or recently spent) output as seen by the UTXO view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub value: Amount,
    pub script_pubkey: ByteString,
    /// Height of the block that created this output.
    pub height: u32,
    pub spent: bool,
}
