//! Coinstake validation entry points.
//!
//! `check_proof_of_stake` is the block-connection path: it resolves the
//! staked output through the collaborating views, verifies the spend
//! signature and runs the kernel check. `check_kernel` is its mining-side
//! twin, probing whether an output would stake at a given time without a
//! signed transaction in hand.

use log::debug;

use crate::chain::{ChainContext, NodeId, SCRIPT_VERIFY_NONE};
use crate::error::{Result, StakeError};
use crate::kernel::{check_stake_kernel_hash, StakeProof};
use crate::params::StakeParams;
use crate::types::{OutPoint, Transaction};

/// Validate the kernel and signature of a coinstake being connected on top
/// of `prev`.
///
/// The returned proof is stamped on the new block's index entry by the
/// caller. Errors carry the DoS severity: a kernel miss or an unresolved
/// prevout is expected while syncing and scores low, everything else is a
/// protocol violation.
pub fn check_proof_of_stake(
    ctx: &ChainContext<'_>,
    prev: NodeId,
    tx: &Transaction,
    nbits: u32,
    print_proof: bool,
) -> Result<StakeProof> {
    if !tx.is_coin_stake() {
        return Err(StakeError::NotCoinStake);
    }

    // the kernel is input 0
    let txin = &tx.inputs[0];
    let coin_prev = match ctx.utxo.coin(&txin.prevout) {
        Some(coin) => coin,
        None => {
            debug!("check_proof_of_stake: stake prevout does not exist");
            return Err(StakeError::PrevoutMissing);
        }
    };

    let block_from_id = ctx
        .index
        .ancestor(prev, coin_prev.height)
        .ok_or(StakeError::AncestorNotFound {
            height: coin_prev.height,
        })?;
    let block_from = ctx
        .store
        .block(&ctx.index.entry(block_from_id).hash)
        .ok_or(StakeError::BlockNotFound)?;

    let (tx_prev, _block_hash) = ctx
        .store
        .transaction(&txin.prevout.hash)
        .ok_or(StakeError::PrevoutNotInChain)?;

    let prev_entry = ctx.index.entry(prev);
    let tx_prev_offset = if prev_entry.height + 1 > ctx.params.protocol_v2_height() {
        0
    } else {
        // absent index entries fall back to offset zero
        ctx.store.tx_offset(prev_entry.height).unwrap_or(0)
    };

    if !ctx
        .signatures
        .verify_spend(&coin_prev, tx, 0, SCRIPT_VERIFY_NONE)
    {
        debug!("check_proof_of_stake: signature check failed on coinstake");
        return Err(StakeError::SignatureFailed);
    }

    check_stake_kernel_hash(
        ctx,
        prev,
        nbits,
        &block_from,
        tx_prev_offset,
        &tx_prev,
        &txin.prevout,
        tx.time,
        print_proof,
    )
    .map_err(|err| {
        debug!("check_proof_of_stake: kernel check failed: {err}");
        err
    })
}

/// Mining-side probe: would `prevout` staked at `time_tx` satisfy the
/// kernel on top of `prev`?
///
/// Skips the signature check (there is no signed coinstake yet) and adds
/// the guards block connection gets for free: the staked output must be
/// mature and unspent.
pub fn check_kernel(
    ctx: &ChainContext<'_>,
    prev: NodeId,
    nbits: u32,
    prevout: &OutPoint,
    time_tx: u32,
) -> bool {
    let coin_prev = match ctx.utxo.coin(prevout) {
        Some(coin) => coin,
        None => return false,
    };

    let new_height = ctx.index.entry(prev).height + 1;
    if new_height.saturating_sub(coin_prev.height) < ctx.params.coinbase_maturity() {
        return false;
    }

    let block_from_id = match ctx.index.ancestor(prev, coin_prev.height) {
        Some(id) => id,
        None => return false,
    };

    if coin_prev.spent {
        return false;
    }

    let block_from = match ctx.store.block(&ctx.index.entry(block_from_id).hash) {
        Some(block) => block,
        None => return false,
    };

    let prev_height = ctx.index.entry(prev).height;
    let tx_prev_offset = if prev_height + 1 > ctx.params.protocol_v2_height() {
        0
    } else {
        ctx.store.tx_offset(prev_height).unwrap_or(0)
    };

    let (tx_prev, _block_hash) = match ctx.store.transaction(&prevout.hash) {
        Some(found) => found,
        None => return false,
    };

    check_stake_kernel_hash(
        ctx,
        prev,
        nbits,
        &block_from,
        tx_prev_offset,
        &tx_prev,
        prevout,
        time_tx,
        false,
    )
    .is_ok()
}

/// Whether a coinstake timestamp is acceptable for a block at `height`.
///
/// Above the V2 activation height the block and transaction timestamps
/// must be equal and land on the mask's grid (16-second steps with the
/// default mask); below it, equality alone suffices.
pub fn check_coinstake_timestamp(
    params: &StakeParams,
    height: u32,
    time_block: i64,
    time_tx: i64,
) -> bool {
    if height > params.protocol_v2_height() {
        time_block == time_tx && (time_tx & params.stake_timestamp_mask() as i64) == 0
    } else {
        time_block == time_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_params(v2_height: u32) -> StakeParams {
        StakeParams::new(3600, 90 * 24 * 60 * 60, 600, 64, v2_height, 0x0f, 100)
    }

    #[test]
    fn test_timestamp_on_grid_passes_above_v2() {
        let params = mask_params(1000);
        assert!(check_coinstake_timestamp(&params, 1001, 16, 16));
        assert!(check_coinstake_timestamp(&params, 1001, 4096, 4096));
    }

    #[test]
    fn test_timestamp_off_grid_fails_above_v2() {
        let params = mask_params(1000);
        assert!(!check_coinstake_timestamp(&params, 1001, 17, 17));
        assert!(!check_coinstake_timestamp(&params, 1001, 15, 15));
    }

    #[test]
    fn test_timestamp_mismatch_fails_everywhere() {
        let params = mask_params(1000);
        assert!(!check_coinstake_timestamp(&params, 1001, 16, 32));
        assert!(!check_coinstake_timestamp(&params, 999, 16, 32));
    }

    #[test]
    fn test_mask_not_enforced_at_or_below_v2_height() {
        let params = mask_params(1000);
        assert!(check_coinstake_timestamp(&params, 999, 17, 17));
        // the activation height itself still runs the old rule
        assert!(check_coinstake_timestamp(&params, 1000, 17, 17));
    }
}
