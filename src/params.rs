//! Consensus parameters for the stake kernel.
//!
//! All values are fixed at startup; the derived selection interval is
//! computed once in the constructor so every node works from the same
//! number.

/// Ratio between the modifier interval and the length of the first
/// selection section.
pub const MODIFIER_INTERVAL_RATIO: i64 = 3;

/// Number of selection rounds, one entropy bit each.
pub const MODIFIER_BITS: u32 = 64;

/// Minimum age of a staked output: 8 hours.
pub const DEFAULT_STAKE_MIN_AGE: i64 = 8 * 60 * 60;

/// Maximum age counted toward coin-day weight: 90 days.
pub const DEFAULT_STAKE_MAX_AGE: i64 = 90 * 24 * 60 * 60;

/// Stake modifier recomputation interval: 10 minutes.
pub const DEFAULT_MODIFIER_INTERVAL: i64 = 10 * 60;

/// Target spacing between blocks.
pub const DEFAULT_TARGET_SPACING: i64 = 64;

/// Height of the last protocol-V1 block.
pub const DEFAULT_PROTOCOL_V2_HEIGHT: u32 = 38_424;

/// Coinstake timestamps above the V2 height land on a 16-second grid.
pub const DEFAULT_STAKE_TIMESTAMP_MASK: u32 = 0x0000000f;

/// Blocks before a generated output may be staked.
pub const DEFAULT_COINBASE_MATURITY: u32 = 500;

/// Immutable consensus parameters.
///
/// Constructed once at startup and passed by reference into every kernel
/// entry point; the kernel holds no process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeParams {
    stake_min_age: i64,
    stake_max_age: i64,
    modifier_interval: i64,
    target_spacing: i64,
    protocol_v2_height: u32,
    stake_timestamp_mask: u32,
    coinbase_maturity: u32,
    selection_interval: i64,
}

impl StakeParams {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stake_min_age: i64,
        stake_max_age: i64,
        modifier_interval: i64,
        target_spacing: i64,
        protocol_v2_height: u32,
        stake_timestamp_mask: u32,
        coinbase_maturity: u32,
    ) -> Self {
        let mut params = Self {
            stake_min_age,
            stake_max_age,
            modifier_interval,
            target_spacing,
            protocol_v2_height,
            stake_timestamp_mask,
            coinbase_maturity,
            selection_interval: 0,
        };
        params.selection_interval = (0..MODIFIER_BITS)
            .map(|section| params.selection_interval_section(section))
            .sum();
        params
    }

    pub fn stake_min_age(&self) -> i64 {
        self.stake_min_age
    }

    pub fn stake_max_age(&self) -> i64 {
        self.stake_max_age
    }

    pub fn modifier_interval(&self) -> i64 {
        self.modifier_interval
    }

    pub fn target_spacing(&self) -> i64 {
        self.target_spacing
    }

    pub fn protocol_v2_height(&self) -> u32 {
        self.protocol_v2_height
    }

    pub fn stake_timestamp_mask(&self) -> u32 {
        self.stake_timestamp_mask
    }

    pub fn coinbase_maturity(&self) -> u32 {
        self.coinbase_maturity
    }

    /// Length in seconds of one selection section.
    ///
    /// Sections shorten toward the far end of the lookback window:
    /// `modifier_interval * 63 / (63 + (63 - n) * (ratio - 1))`, truncating
    /// integer division. Section 63 spans the full modifier interval.
    pub fn selection_interval_section(&self, section: u32) -> i64 {
        debug_assert!(section < MODIFIER_BITS);
        self.modifier_interval * 63
            / (63 + (63 - section as i64) * (MODIFIER_INTERVAL_RATIO - 1))
    }

    /// Total lookback window used when generating a new stake modifier:
    /// the sum of all 64 sections.
    pub fn selection_interval(&self) -> i64 {
        self.selection_interval
    }
}

impl Default for StakeParams {
    fn default() -> Self {
        Self::new(
            DEFAULT_STAKE_MIN_AGE,
            DEFAULT_STAKE_MAX_AGE,
            DEFAULT_MODIFIER_INTERVAL,
            DEFAULT_TARGET_SPACING,
            DEFAULT_PROTOCOL_V2_HEIGHT,
            DEFAULT_STAKE_TIMESTAMP_MASK,
            DEFAULT_COINBASE_MATURITY,
        )
    }
}
