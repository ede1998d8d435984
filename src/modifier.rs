//! Stake modifier derivation.
//!
//! The stake modifier scrambles the kernel hash so that a coin owner cannot
//! precompute future proofs at the time their output confirms. It is
//! recomputed at a fixed time interval rather than every block, which keeps
//! an attacker from gaining control of additional modifier bits by mining a
//! burst of blocks. Each of the modifier's 64 bits is the entropy bit of
//! one block picked out of the recent past; the pick is driven by a hash of
//! the candidate's proof-hash with the previous modifier, so it is
//! unpredictable ahead of time but fixed once the chain exists.

use std::collections::HashSet;

use crate::chain::{ChainIndex, NodeId};
use crate::error::{Result, StakeError};
use crate::hashing::hash256;
use crate::params::{StakeParams, MODIFIER_BITS};
use crate::types::Hash;
use crate::uint256::U256;

/// Last stake modifier at or before `from`, with its generation time.
fn last_stake_modifier(index: &ChainIndex, from: NodeId) -> Result<(u64, i64)> {
    let mut entry = index.entry(from);
    while !entry.generated_stake_modifier {
        match entry.prev {
            Some(prev) => entry = index.entry(prev),
            None => break,
        }
    }
    // the genesis entry always carries the flag; anything else means the
    // index was never initialized
    if !entry.generated_stake_modifier {
        return Err(StakeError::MissingGenesisModifier);
    }
    Ok((entry.stake_modifier, entry.time))
}

/// Selection hash of one candidate: double SHA-256 of its proof-hash and
/// the previous modifier. Proof-of-stake candidates are shifted down 32
/// bits so they win ties against proof-of-work blocks; as the chain grows
/// the modifier is seeded preferentially from stake history.
fn selection_hash(hash_proof: &Hash, prev_modifier: u64, proof_of_stake: bool) -> U256 {
    let mut preimage = [0u8; 40];
    preimage[..32].copy_from_slice(hash_proof);
    preimage[32..].copy_from_slice(&prev_modifier.to_le_bytes());
    let digest = hash256(&preimage);
    let value = U256::from_le_bytes(&digest);
    if proof_of_stake {
        value.shr(32)
    } else {
        value
    }
}

/// Pick the candidate with the lowest selection hash among those not yet
/// selected, stopping once a pick exists and the remaining candidates fall
/// beyond `selection_stop`.
fn select_block_from_candidates(
    index: &ChainIndex,
    sorted_by_timestamp: &[(i64, Hash)],
    selected: &HashSet<Hash>,
    selection_stop: i64,
    prev_modifier: u64,
) -> Result<Option<NodeId>> {
    let mut best: Option<(U256, NodeId)> = None;
    for (_, hash) in sorted_by_timestamp {
        let id = index
            .lookup(hash)
            .ok_or(StakeError::CandidateNotIndexed)?;
        let entry = index.entry(id);
        if best.is_some() && entry.time > selection_stop {
            break;
        }
        if selected.contains(&entry.hash) {
            continue;
        }
        let hash_selection = selection_hash(&entry.hash_proof, prev_modifier, entry.proof_of_stake);
        match best {
            Some((best_hash, _)) if hash_selection >= best_hash => {}
            _ => best = Some((hash_selection, id)),
        }
    }
    Ok(best.map(|(_, id)| id))
}

/// Derive the stake modifier for the block whose parent is `prev`, along
/// with whether this block generates a fresh one.
///
/// A `None` parent is the genesis case: modifier zero, flagged as
/// generated. Otherwise the current modifier is reused until the parent's
/// timestamp crosses into a new modifier interval; at that point 64
/// selection rounds over the recent candidate window each contribute one
/// entropy bit to the new value.
pub fn compute_next_stake_modifier(
    index: &ChainIndex,
    params: &StakeParams,
    prev: Option<NodeId>,
) -> Result<(u64, bool)> {
    let prev = match prev {
        Some(id) => id,
        None => return Ok((0, true)), // genesis modifier is zero
    };
    let prev_entry = index.entry(prev);

    // if the current modifier is not old enough, keep it
    let (stake_modifier, modifier_time) = last_stake_modifier(index, prev)?;
    if modifier_time / params.modifier_interval() >= prev_entry.time / params.modifier_interval() {
        return Ok((stake_modifier, false));
    }

    // collect candidate blocks over the selection window, oldest first,
    // ties normalized to ascending hash order regardless of chain direction
    let selection_interval = params.selection_interval();
    let selection_start =
        prev_entry.time / params.modifier_interval() * params.modifier_interval()
            - selection_interval;
    let mut sorted_by_timestamp: Vec<(i64, Hash)> = Vec::with_capacity(
        (MODIFIER_BITS as i64 * params.modifier_interval() / params.target_spacing()) as usize,
    );
    let mut cursor = Some(prev);
    while let Some(id) = cursor {
        let entry = index.entry(id);
        if entry.time < selection_start {
            break;
        }
        sorted_by_timestamp.push((entry.time, entry.hash));
        cursor = entry.prev;
    }
    sorted_by_timestamp.reverse();
    sorted_by_timestamp.sort();

    // select one block per section and pack its entropy bit
    let mut new_modifier = 0u64;
    let mut selection_stop = selection_start;
    let mut selected: HashSet<Hash> = HashSet::new();
    let rounds = sorted_by_timestamp.len().min(MODIFIER_BITS as usize);
    for round in 0..rounds {
        selection_stop += params.selection_interval_section(round as u32);
        let id = select_block_from_candidates(
            index,
            &sorted_by_timestamp,
            &selected,
            selection_stop,
            stake_modifier,
        )?
        .ok_or(StakeError::NoCandidateSelected {
            round: round as u32,
        })?;
        let entry = index.entry(id);
        new_modifier |= (entry.stake_entropy_bit as u64) << round;
        selected.insert(entry.hash);
    }

    Ok((new_modifier, true))
}
