use anyhow::{ensure, Context};
use ethers_core::types::{I256, U256};

use crate::{
    liquidity::tick_range_liquidity,
    params::{IvCircuitParams, LIQUIDITY_STORAGE_IDX, TICK_STORAGE_IDX},
    slot::decode_packed_field,
    types::{DataInput, StorageRecord},
    utils::h256_to_u256,
    volatility::volatility,
    volume::total_swap_volume,
};

/// Intermediate and final values of one IV evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IvValues {
    pub total_volume: U256,
    pub tick: I256,
    pub liquidity: U256,
    pub tick_tvl: U256,
    pub metric: U256,
}

/// The `slot0` and `liquidity` reads must be of the pool's declared slots, at the same block.
pub fn check_pool_storage(
    params: &IvCircuitParams,
    tick_record: &StorageRecord,
    liquidity_record: &StorageRecord,
) -> anyhow::Result<()> {
    for (name, record, slot) in [
        ("tick", tick_record, params.tick_slot),
        ("liquidity", liquidity_record, params.liquidity_slot),
    ] {
        ensure!(record.slot == slot, "{name} read from slot {:?}, expected {slot:?}", record.slot);
        ensure!(
            record.address == params.pool_address,
            "{name} read from {:?}, expected pool {:?}",
            record.address,
            params.pool_address
        );
    }
    ensure!(
        tick_record.block_number == liquidity_record.block_number,
        "tick read at block {} but liquidity at block {}",
        tick_record.block_number,
        liquidity_record.block_number
    );
    Ok(())
}

/// Evaluates the IV circuit off-circuit. Errors exactly when some circuit constraint would fail.
///
/// Assumes `params` has been validated.
pub fn evaluate(params: &IvCircuitParams, input: &DataInput) -> anyhow::Result<IvValues> {
    input.check_capacities(&params.capacities)?;
    let storage = input.storage_slots();
    let tick_record = storage.get(TICK_STORAGE_IDX);
    let liquidity_record = storage.get(LIQUIDITY_STORAGE_IDX);
    check_pool_storage(params, tick_record, liquidity_record)?;

    let tick = decode_packed_field(h256_to_u256(tick_record.value), params.tick_field);
    let liquidity =
        decode_packed_field(h256_to_u256(liquidity_record.value), params.liquidity_field)
            .into_raw();
    let total_volume = total_swap_volume(params, input.receipts(), tick_record.block_number)?;
    let band_end = tick + I256::from_raw(U256::from(params.tick_band));
    let tick_tvl = tick_range_liquidity(tick, band_end, liquidity);
    let metric_scale = params.metric_scale().context("fee tier scale overflows u64")?;
    let metric = volatility(total_volume, tick_tvl, metric_scale);
    log::debug!(
        "volume: {total_volume}, tick: {tick}, liquidity: {liquidity}, tvl: {tick_tvl}, iv: {metric}"
    );
    Ok(IvValues { total_volume, tick, liquidity, tick_tvl, metric })
}
