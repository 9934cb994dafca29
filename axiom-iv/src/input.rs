//! Preparation of circuit inputs from indexed chain data. Nothing here is constrained: the circuit
//! re-checks everything it relies on.
use std::{cmp::Reverse, str::FromStr};

use anyhow::{anyhow, bail, ensure};
use ethers_core::types::{Address, Chain, H256, I256};
use serde::{Deserialize, Serialize};

use crate::{
    params::IvCircuitParams,
    types::{DataInput, LogField, ReceiptRecord, StorageRecord, MAX_FIELDS_PER_RECEIPT},
    utils::i256_to_h256,
};

/// A decoded `Swap` log of the target pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapLog {
    pub block_number: u64,
    pub tx_hash: H256,
    pub log_position: u32,
    pub contract: Address,
    pub amount1: I256,
}

/// The `n` swaps with the largest `|amount1|`, largest first. Swaps of equal size keep their original
/// order.
///
/// Receipt capacity is fixed at setup, so a day of swaps has to be cut down to the ones that dominate
/// volume.
pub fn select_largest_swaps(swaps: &[SwapLog], n: usize) -> Vec<SwapLog> {
    let mut sorted = swaps.to_vec();
    // stable
    sorted.sort_by_key(|swap| Reverse(swap.amount1.unsigned_abs()));
    sorted.truncate(n);
    sorted
}

/// Builds a padded [DataInput] for the IV circuit from the largest swaps and the `slot0` and
/// `liquidity` words of the pool read at `storage_block`.
pub fn build_data_input(
    params: &IvCircuitParams,
    swaps: &[SwapLog],
    storage_block: u64,
    slot0: H256,
    liquidity: H256,
) -> anyhow::Result<DataInput> {
    let receipts = select_largest_swaps(swaps, params.capacities.max_receipts)
        .into_iter()
        .map(|swap| {
            let mut fields = vec![LogField::default(); MAX_FIELDS_PER_RECEIPT];
            fields[params.volume_field] = LogField {
                contract: swap.contract,
                event_id: params.swap_event_id,
                is_topic: false,
                field_index: params.amount_field_index,
                log_position: swap.log_position,
                value: i256_to_h256(swap.amount1),
            };
            ReceiptRecord { block_number: swap.block_number, tx_hash: swap.tx_hash, fields }
        })
        .collect();
    let storage_slots = [(params.tick_slot, slot0), (params.liquidity_slot, liquidity)]
        .map(|(slot, value)| StorageRecord {
            block_number: storage_block,
            address: params.pool_address,
            slot,
            value,
        })
        .to_vec();
    let input = DataInput { receipts, storage_slots, transactions: vec![] };
    input.into_padded(&params.capacities)
}

/// Sampling period of [approximate_blocks_for_timestamp].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interval {
    Day,
    Hour,
    SixHours,
    TwelveHours,
}

impl Interval {
    pub fn secs(&self) -> u64 {
        match self {
            Interval::Day => 86400,
            Interval::Hour => 3600,
            Interval::SixHours => 21600,
            Interval::TwelveHours => 43200,
        }
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Interval::Day),
            "1h" => Ok(Interval::Hour),
            "6h" => Ok(Interval::SixHours),
            "12h" => Ok(Interval::TwelveHours),
            _ => Err(anyhow!("Unknown interval {s}, expected one of 1d, 1h, 6h, 12h")),
        }
    }
}

/// Seconds per block on chains with a fixed block time.
pub fn block_time_secs(chain: Chain) -> Option<u64> {
    match chain {
        Chain::Mainnet | Chain::Sepolia => Some(12),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockStamp {
    pub number: u64,
    pub timestamp: u64,
}

/// Estimates the block at `initial_timestamp` from `latest` and the chain's block time, then steps
/// back `number_of_periods - 1` intervals from it. Returned oldest first.
pub fn approximate_blocks_for_timestamp(
    initial_timestamp: u64,
    latest: BlockStamp,
    interval: Interval,
    number_of_periods: usize,
    chain: Chain,
) -> anyhow::Result<Vec<BlockStamp>> {
    ensure!(number_of_periods >= 1, "number_of_periods must be >= 1");
    let Some(block_time) = block_time_secs(chain) else {
        bail!("Unrecognized chain: {chain}");
    };
    ensure!(
        initial_timestamp <= latest.timestamp,
        "timestamp {initial_timestamp} is after the latest block timestamp {}",
        latest.timestamp
    );
    let blocks_back = (latest.timestamp - initial_timestamp) / block_time;
    let initial = BlockStamp {
        number: latest.number.checked_sub(blocks_back).ok_or_else(|| {
            anyhow!("timestamp {initial_timestamp} is before the chain's first block")
        })?,
        timestamp: initial_timestamp,
    };

    let mut blocks = (0..number_of_periods as u64)
        .map(|i| {
            let secs_back = i * interval.secs();
            let number = initial
                .number
                .checked_sub(secs_back / block_time)
                .ok_or_else(|| anyhow!("period {i} starts before the chain's first block"))?;
            let timestamp = initial
                .timestamp
                .checked_sub(secs_back)
                .ok_or_else(|| anyhow!("period {i} starts before the unix epoch"))?;
            Ok(BlockStamp { number, timestamp })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    blocks.reverse();
    log::debug!("approximate blocks: {blocks:?}");
    Ok(blocks)
}
