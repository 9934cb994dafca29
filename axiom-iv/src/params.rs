use std::{fs::File, path::Path};

use anyhow::{ensure, Context};
use ethers_core::types::{Address, H256};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::{
    slot::PackedField,
    stream::Capacities,
    types::MAX_FIELDS_PER_RECEIPT,
    utils::log2_ceil,
};

/// Position of the `slot0` record in the storage stream.
pub const TICK_STORAGE_IDX: usize = 0;
/// Position of the `liquidity` record in the storage stream.
pub const LIQUIDITY_STORAGE_IDX: usize = 1;
/// Block numbers are range checked to this many bits.
pub const BLOCK_NUMBER_BITS: usize = 64;
/// Largest declared output width. Outputs are exposed as a single field element.
pub const MAX_OUTPUT_BITS: usize = 248;
/// Widest signed swap amount supported. Amounts are read from the low 128-bit limb.
pub const MAX_AMOUNT_BITS: usize = 128;

lazy_static! {
    /// `keccak256("Swap(address,address,int256,int256,uint160,uint128,int24)")`
    pub static ref UNISWAP_V3_SWAP_EVENT_ID: H256 =
        "0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67".parse().unwrap();
    /// Mainnet USDC/WETH 5 bps pool.
    pub static ref USDC_WETH_500_POOL: Address =
        "0x88e6A0c2dDD26FEEb64F039a2c41296FcB3f5640".parse().unwrap();
}

/// Everything the IV circuit is specialized to. Changing the target pool changes these constants;
/// none of them are derived from witness data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IvCircuitParams {
    pub capacities: Capacities,
    /// The pool every receipt field and storage slot must come from.
    pub pool_address: Address,
    /// `topics[0]` of the swap event.
    pub swap_event_id: H256,
    /// Which of a receipt's fields holds the swap amount.
    pub volume_field: usize,
    /// Index of the swap amount within the log data section (`amount1` is 1).
    pub amount_field_index: u32,
    /// Swap amounts are `int{amount_bits}` sign extended to 256 bits.
    pub amount_bits: usize,
    pub tick_slot: H256,
    pub tick_field: PackedField,
    pub liquidity_slot: H256,
    pub liquidity_field: PackedField,
    /// Width in ticks of the band `[tick, tick + tick_band]` whose liquidity is valued.
    pub tick_band: u64,
    /// Pool fee in hundredths of a basis point, e.g. 500 for 5 bps.
    pub fee_tier: u64,
    /// Integer approximation of `sqrt(365)`.
    pub sqrt_365: u64,
    pub output_bits: usize,
}

impl Default for IvCircuitParams {
    fn default() -> Self {
        Self {
            capacities: Capacities::new(32, 32, 0),
            pool_address: *USDC_WETH_500_POOL,
            swap_event_id: *UNISWAP_V3_SWAP_EVENT_ID,
            volume_field: 0,
            amount_field_index: 1,
            amount_bits: 88,
            tick_slot: H256::from_low_u64_be(0),
            tick_field: PackedField::new(160, 24, true),
            liquidity_slot: H256::from_low_u64_be(4),
            liquidity_field: PackedField::new(0, 128, false),
            tick_band: 1,
            fee_tier: 500,
            sqrt_365: 19,
            output_bits: MAX_OUTPUT_BITS,
        }
    }
}

impl IvCircuitParams {
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open params file {}", path.display()))?;
        serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse params file {}", path.display()))
    }

    /// Bits of the total volume: a sum of `max_receipts` magnitudes of `int{amount_bits}` values.
    pub fn volume_bits(&self) -> usize {
        self.amount_bits + log2_ceil(self.capacities.max_receipts)
    }

    /// Bits of a tick shifted to be non-negative, with room for `tick + tick_band`.
    pub fn tick_bits(&self) -> usize {
        self.tick_field.bit_width + 1
    }

    pub fn tvl_bits(&self) -> usize {
        self.liquidity_field.bit_width + self.tick_bits()
    }

    /// Multiplier applied to the integer square root: `2 * fee_tier * sqrt_365`, or `None` if it
    /// overflows a `u64`.
    pub fn metric_scale(&self) -> Option<u64> {
        self.fee_tier.checked_mul(2)?.checked_mul(self.sqrt_365)
    }

    pub fn metric_bits(&self) -> Option<usize> {
        let scale_bits = (u64::BITS - self.metric_scale()?.leading_zeros()) as usize;
        Some((self.volume_bits() + 1) / 2 + scale_bits)
    }

    /// Setup-time checks. `field_capacity` is the number of bits every field element can hold.
    pub fn validate(&self, field_capacity: usize) -> anyhow::Result<()> {
        self.capacities.validate()?;
        ensure!(
            self.capacities.max_storage > LIQUIDITY_STORAGE_IDX,
            "InvalidCapacity: storage must hold the slot0 and liquidity records"
        );
        ensure!(
            self.volume_field < MAX_FIELDS_PER_RECEIPT,
            "volume_field {} out of range, receipts carry {MAX_FIELDS_PER_RECEIPT} fields",
            self.volume_field
        );
        ensure!(
            (2..=MAX_AMOUNT_BITS).contains(&self.amount_bits),
            "amount_bits must be in [2, {MAX_AMOUNT_BITS}], got {}",
            self.amount_bits
        );
        self.tick_field.validate()?;
        self.liquidity_field.validate()?;
        ensure!(self.tick_field.signed, "tick field must be signed");
        ensure!(!self.liquidity_field.signed, "liquidity field must be unsigned");
        ensure!(
            self.tick_band as u128 <= 1u128 << (self.tick_field.bit_width - 1),
            "tick_band {} does not fit in the tick width",
            self.tick_band
        );
        // `volume = q * tvl + r` must not wrap around the modulus
        ensure!(
            self.volume_bits() + self.tvl_bits() <= field_capacity,
            "volume ({} bits) / tvl ({} bits) division overflows the field ({field_capacity} bits)",
            self.volume_bits(),
            self.tvl_bits()
        );
        ensure!(
            self.output_bits <= MAX_OUTPUT_BITS && self.output_bits <= field_capacity,
            "output_bits {} exceeds {MAX_OUTPUT_BITS}",
            self.output_bits
        );
        let metric_bits = self.metric_bits().with_context(|| {
            format!("2 * fee_tier {} * sqrt_365 {} overflows u64", self.fee_tier, self.sqrt_365)
        })?;
        ensure!(
            metric_bits <= self.output_bits,
            "metric ({metric_bits} bits) does not fit in {} output bits",
            self.output_bits
        );
        Ok(())
    }
}
