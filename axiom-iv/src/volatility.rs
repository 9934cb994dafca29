//! `iv = 2 * feeTier * sqrt(dailyVolume / tickTvl) * sqrt(365)` in integer arithmetic.
//!
//! The division truncates and the square root is a floor, so the metric moves in steps of
//! `2 * feeTier * sqrt365`. When `tickTvl = 0` the ratio is defined as 0 and so is the metric.
use axiom_eth::{
    halo2_base::{
        gates::{GateInstructions, RangeInstructions},
        AssignedValue, Context,
        QuantumCell::Constant,
    },
    Field,
};
use ethers_core::types::U256;

use crate::{
    chip::IvChip,
    params::IvCircuitParams,
    utils::{fe_to_u256, u256_to_fe},
};

/// Largest `s` with `s * s <= value`, by binary search over a fixed 128 rounds.
pub fn integer_sqrt(value: U256) -> U256 {
    // lo^2 <= value < hi^2
    let (mut lo, mut hi) = (U256::zero(), U256::one() << 128);
    for _ in 0..128 {
        let mid = (lo + hi) >> 1;
        if mid * mid <= value {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// `volume / tvl`, or 0 when `tvl = 0`.
pub fn volume_tvl_ratio(volume: U256, tvl: U256) -> U256 {
    volume.checked_div(tvl).unwrap_or_default()
}

/// `isqrt(volume / tvl) * metric_scale`, see [IvCircuitParams::metric_scale].
pub fn volatility(volume: U256, tvl: U256, metric_scale: u64) -> U256 {
    let sqrt_ratio = integer_sqrt(volume_tvl_ratio(volume, tvl));
    sqrt_ratio * U256::from(metric_scale)
}

impl<'r, F: Field> IvChip<'r, F> {
    /// Floor square root of `value`. Assumes `value < 2^num_bits`.
    ///
    /// The root is a witness constrained by `s^2 <= value <= s^2 + 2s`.
    pub fn integer_sqrt(
        &self,
        ctx: &mut Context<F>,
        value: AssignedValue<F>,
        num_bits: usize,
    ) -> AssignedValue<F> {
        let gate = self.gate();
        let range = self.range();
        let root_bits = (num_bits + 1) / 2;
        let root = ctx.load_witness(u256_to_fe(integer_sqrt(fe_to_u256(value.value()))));
        range.range_check(ctx, root, root_bits);
        let square = gate.mul(ctx, root, root);
        let below = gate.sub(ctx, value, square);
        range.range_check(ctx, below, num_bits);
        let ceiling = gate.mul_add(ctx, root, Constant(F::from(2)), square);
        let above = gate.sub(ctx, ceiling, value);
        range.range_check(ctx, above, root_bits + 1);
        root
    }

    /// `volume / tvl` truncated, with `tvl = 0` mapped to a ratio of 0.
    ///
    /// The divisor is swapped for 1 when `tvl = 0` so the division always has a witness.
    pub fn volume_tvl_ratio(
        &self,
        ctx: &mut Context<F>,
        volume: AssignedValue<F>,
        tvl: AssignedValue<F>,
        volume_bits: usize,
        tvl_bits: usize,
    ) -> AssignedValue<F> {
        let gate = self.gate();
        let tvl_is_zero = gate.is_zero(ctx, tvl);
        let divisor = gate.select(ctx, Constant(F::ONE), tvl, tvl_is_zero);
        let (quotient, _) = self.range().div_mod_var(ctx, volume, divisor, volume_bits, tvl_bits);
        gate.sub_mul(ctx, quotient, quotient, tvl_is_zero)
    }

    pub fn volatility(
        &self,
        ctx: &mut Context<F>,
        params: &IvCircuitParams,
        metric_scale: u64,
        volume: AssignedValue<F>,
        tvl: AssignedValue<F>,
    ) -> AssignedValue<F> {
        let volume_bits = params.volume_bits();
        let ratio = self.volume_tvl_ratio(ctx, volume, tvl, volume_bits, params.tvl_bits());
        let sqrt_ratio = self.integer_sqrt(ctx, ratio, volume_bits);
        self.gate().mul(ctx, sqrt_ratio, Constant(F::from(metric_scale)))
    }
}
