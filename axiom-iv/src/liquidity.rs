//! Token1 value of liquidity over a tick band.
//!
//! The exact amount is `L * (sqrt(p_b) - sqrt(p_a))` with `p = 1.0001^tick`. Raising to a witness
//! power is not available in circuit, so the band is valued linearly in ticks instead:
//! `amount1 ~ L * |tick_b - tick_a|`.
use axiom_eth::{
    halo2_base::{
        gates::{GateInstructions, RangeInstructions},
        AssignedValue, Context,
        QuantumCell::Constant,
    },
    Field,
};
use ethers_core::types::{I256, U256};

use crate::chip::IvChip;

pub fn tick_range_liquidity(tick_a: I256, tick_b: I256, liquidity: U256) -> U256 {
    liquidity * (tick_b - tick_a).unsigned_abs()
}

impl<'r, F: Field> IvChip<'r, F> {
    /// `liquidity * |tick_b - tick_a|`, symmetric in the two ticks.
    ///
    /// Ticks are signed field elements in `[-2^(tick_bits - 1), 2^(tick_bits - 1))`. The bounds are
    /// ordered with a comparison bit and two selects.
    pub fn tick_range_liquidity(
        &self,
        ctx: &mut Context<F>,
        tick_a: AssignedValue<F>,
        tick_b: AssignedValue<F>,
        liquidity: AssignedValue<F>,
        tick_bits: usize,
    ) -> AssignedValue<F> {
        let gate = self.gate();
        let offset = Constant(gate.pow_of_two()[tick_bits - 1]);
        let [a, b] = [tick_a, tick_b].map(|tick| gate.add(ctx, tick, offset));
        let a_lt_b = self.range().is_less_than(ctx, a, b, tick_bits);
        let lower = gate.select(ctx, a, b, a_lt_b);
        let upper = gate.select(ctx, b, a, a_lt_b);
        let width = gate.sub(ctx, upper, lower);
        gate.mul(ctx, liquidity, width)
    }
}
