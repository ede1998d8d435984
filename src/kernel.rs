//! Stake kernel hash checks, protocol V1 and V2.
//!
//! A coinstake's first input must satisfy
//! `Hash(modifier ‖ … ‖ time_tx) <= target * weight`: the chance of
//! minting is proportional to the stake backing the kernel. The preimage
//! deliberately avoids block and transaction hashes, which can be ground
//! out in vast quantities; every field is either fixed history or a
//! timestamp the protocol constrains.
//!
//! V1 weights the target by coin-days and hashes the staked transaction's
//! byte offset in its block, with the modifier looked up about one
//! selection interval after the staked block. V2 weights by raw value and
//! hashes the prevout id, taking the modifier straight from the parent of
//! the block under validation, so nothing in the check depends on chain
//! state past the parent.

use log::debug;

use crate::chain::{ChainContext, NodeId};
use crate::error::{Result, StakeError};
use crate::hashing::hash256;
use crate::types::{Block, Hash, OutPoint, Transaction, COIN};
use crate::uint256::{expand_compact, U256};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Outcome of a successful kernel check, stamped on the block index by the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeProof {
    pub hash_proof: Hash,
    /// Weighted target the proof was measured against, as a 256-bit
    /// little-endian value.
    pub target: Hash,
}

/// Kernel hash weight, in seconds, of a coin-age interval.
///
/// Weight starts from zero at the minimum age and is capped at the maximum
/// age, so active coins participate while very old coins cannot dominate
/// the hash when difficulty is low.
pub fn get_weight(
    params: &crate::params::StakeParams,
    interval_beginning: i64,
    interval_end: i64,
) -> i64 {
    (interval_end - interval_beginning - params.stake_min_age()).min(params.stake_max_age())
}

/// The modifier hashed into a V1 kernel is the one generated about one
/// selection interval after the block holding the staked output, so it was
/// unknowable when that output confirmed.
///
/// Returns the modifier with the height and time where it was generated.
/// Reaching the best block first is the normal case for a node that is
/// still syncing: that yields the soft "not yet available" error unless
/// `print_proof` demands resolution or the staked block is old enough that
/// the walk should have completed.
pub fn kernel_stake_modifier(
    ctx: &ChainContext<'_>,
    block_from_hash: &Hash,
    print_proof: bool,
) -> Result<(u64, u32, i64)> {
    let from = ctx
        .index
        .lookup(block_from_hash)
        .ok_or(StakeError::BlockNotIndexed)?;
    let from_entry = ctx.index.entry(from);
    let mut modifier_height = from_entry.height;
    let mut modifier_time = from_entry.time;
    let selection_interval = ctx.params.selection_interval();

    let mut cursor = from;
    while modifier_time < from_entry.time + selection_interval {
        let next = match ctx.index.entry(cursor).next {
            Some(next) => next,
            None => {
                // reached best block; may happen if the node is behind
                if print_proof
                    || from_entry.time + ctx.params.stake_min_age() - selection_interval
                        > ctx.clock.adjusted_time()
                {
                    return Err(StakeError::ModifierBeyondTip {
                        height: ctx.index.entry(cursor).height,
                    });
                }
                return Err(StakeError::ModifierNotAvailable);
            }
        };
        cursor = next;
        let entry = ctx.index.entry(cursor);
        if entry.generated_stake_modifier {
            modifier_height = entry.height;
            modifier_time = entry.time;
        }
    }
    Ok((
        ctx.index.entry(cursor).stake_modifier,
        modifier_height,
        modifier_time,
    ))
}

fn staked_value(tx_prev: &Transaction, prevout: &OutPoint) -> Result<i64> {
    tx_prev
        .outputs
        .get(prevout.index as usize)
        .map(|output| output.value)
        .ok_or(StakeError::PrevoutMissing)
}

fn check_stake_kernel_hash_v1(
    ctx: &ChainContext<'_>,
    nbits: u32,
    block_from: &Block,
    tx_prev_offset: u32,
    tx_prev: &Transaction,
    prevout: &OutPoint,
    time_tx: u32,
    print_proof: bool,
) -> Result<StakeProof> {
    if time_tx < tx_prev.time {
        debug!("kernel v1: transaction timestamp violation");
        return Err(StakeError::TimeViolation);
    }
    let time_block_from = block_from.block_time();
    if time_block_from as i64 + ctx.params.stake_min_age() > time_tx as i64 {
        debug!("kernel v1: staked output below minimum age");
        return Err(StakeError::MinAgeViolation);
    }

    let target_per_coin_day = expand_compact(nbits)?;
    let value_in = staked_value(tx_prev, prevout)?;

    // coin-day weight: the value-seconds product first, both truncating
    // divisions after
    let weight = get_weight(ctx.params, tx_prev.time as i64, time_tx as i64).max(0);
    let coin_day_weight =
        ((value_in as u128) * (weight as u128) / COIN as u128 / SECONDS_PER_DAY as u128) as u64;
    let target = target_per_coin_day.saturating_mul_u64(coin_day_weight);

    let (modifier, modifier_height, modifier_time) =
        kernel_stake_modifier(ctx, &block_from.hash(), print_proof)?;

    let mut preimage = Vec::with_capacity(28);
    preimage.extend_from_slice(&modifier.to_le_bytes());
    preimage.extend_from_slice(&time_block_from.to_le_bytes());
    preimage.extend_from_slice(&tx_prev_offset.to_le_bytes());
    preimage.extend_from_slice(&tx_prev.time.to_le_bytes());
    preimage.extend_from_slice(&prevout.index.to_le_bytes());
    preimage.extend_from_slice(&time_tx.to_le_bytes());
    let hash_proof = hash256(&preimage);

    if print_proof {
        debug!(
            "kernel v1: modifier {:#018x} generated at height {} time {}",
            modifier, modifier_height, modifier_time
        );
    }

    if U256::from_le_bytes(&hash_proof) > target {
        return Err(StakeError::ProofAboveTarget);
    }

    Ok(StakeProof {
        hash_proof,
        target: target.to_le_bytes(),
    })
}

fn check_stake_kernel_hash_v2(
    ctx: &ChainContext<'_>,
    prev: NodeId,
    nbits: u32,
    time_block_from: u32,
    tx_prev: &Transaction,
    prevout: &OutPoint,
    time_tx: u32,
    print_proof: bool,
) -> Result<StakeProof> {
    if time_tx < tx_prev.time {
        debug!(
            "kernel v2: transaction timestamp violation {} < {}",
            time_tx, tx_prev.time
        );
        return Err(StakeError::TimeViolation);
    }
    if time_block_from as i64 + ctx.params.stake_min_age() > time_tx as i64 {
        debug!("kernel v2: staked output below minimum age");
        return Err(StakeError::MinAgeViolation);
    }

    // weighted target: raw stake value, no coin-day aging
    let target_base = expand_compact(nbits)?;
    let value_in = staked_value(tx_prev, prevout)?;
    let target = target_base.saturating_mul_u64(value_in as u64);

    let modifier = ctx.index.entry(prev).stake_modifier;

    let mut preimage = Vec::with_capacity(56);
    preimage.extend_from_slice(&modifier.to_le_bytes());
    preimage.extend_from_slice(&time_block_from.to_le_bytes());
    preimage.extend_from_slice(&tx_prev.time.to_le_bytes());
    preimage.extend_from_slice(&prevout.hash);
    preimage.extend_from_slice(&prevout.index.to_le_bytes());
    preimage.extend_from_slice(&time_tx.to_le_bytes());
    let hash_proof = hash256(&preimage);

    if U256::from_le_bytes(&hash_proof) > target {
        debug!("kernel v2: proof-of-stake hash above weighted target");
        return Err(StakeError::ProofAboveTarget);
    }
    if print_proof {
        debug!("kernel v2: pass, modifier {:#018x}", modifier);
    }

    Ok(StakeProof {
        hash_proof,
        target: target.to_le_bytes(),
    })
}

/// Kernel check with protocol version dispatch.
///
/// Blocks strictly above the V2 activation height use the V2 kernel; the
/// block at the activation height itself still runs V1.
#[allow(clippy::too_many_arguments)]
pub fn check_stake_kernel_hash(
    ctx: &ChainContext<'_>,
    prev: NodeId,
    nbits: u32,
    block_from: &Block,
    tx_prev_offset: u32,
    tx_prev: &Transaction,
    prevout: &OutPoint,
    time_tx: u32,
    print_proof: bool,
) -> Result<StakeProof> {
    if ctx.index.entry(prev).height + 1 > ctx.params.protocol_v2_height() {
        check_stake_kernel_hash_v2(
            ctx,
            prev,
            nbits,
            block_from.block_time(),
            tx_prev,
            prevout,
            time_tx,
            print_proof,
        )
    } else {
        check_stake_kernel_hash_v1(
            ctx,
            nbits,
            block_from,
            tx_prev_offset,
            tx_prev,
            prevout,
            time_tx,
            print_proof,
        )
    }
}
