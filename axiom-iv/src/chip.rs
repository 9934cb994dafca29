use axiom_eth::{
    halo2_base::{
        gates::{GateChip, GateInstructions, RangeChip, RangeInstructions},
        AssignedValue, Context,
        QuantumCell::Constant,
    },
    utils::hilo::HiLo,
    Field,
};

/// Gadgets for the IV circuit. Each component adds its methods in its own module.
#[derive(Clone, Copy, Debug)]
pub struct IvChip<'r, F: Field> {
    range: &'r RangeChip<F>,
}

impl<'r, F: Field> IvChip<'r, F> {
    pub fn new(range: &'r RangeChip<F>) -> Self {
        Self { range }
    }

    pub fn range(&self) -> &RangeChip<F> {
        self.range
    }

    pub fn gate(&self) -> &GateChip<F> {
        self.range.gate()
    }

    /// Little endian bits of a `bytes32` word: `lo` bits first, then `hi` bits.
    ///
    /// Also constrains both limbs to be `< 2^128`.
    pub fn word_to_bits(
        &self,
        ctx: &mut Context<F>,
        word: HiLo<AssignedValue<F>>,
    ) -> Vec<AssignedValue<F>> {
        let mut bits = self.gate().num_to_bits(ctx, word.lo(), 128);
        bits.extend(self.gate().num_to_bits(ctx, word.hi(), 128));
        bits
    }

    /// Recomposes little endian `bits`. Assumes every entry is a bit.
    pub fn bits_to_num(&self, ctx: &mut Context<F>, bits: &[AssignedValue<F>]) -> AssignedValue<F> {
        let gate = self.gate();
        let pows = gate.pow_of_two()[..bits.len()].iter().map(|pow| Constant(*pow));
        gate.inner_product(ctx, bits.iter().copied(), pows)
    }

    /// Constrains `a == b` whenever `cond` is 1. Assumes `cond` is a bit.
    pub fn constrain_equal_if(
        &self,
        ctx: &mut Context<F>,
        a: AssignedValue<F>,
        b: F,
        cond: AssignedValue<F>,
    ) {
        let gate = self.gate();
        let diff = gate.sub(ctx, a, Constant(b));
        let gated = gate.mul(ctx, diff, cond);
        gate.assert_is_const(ctx, &gated, &F::ZERO);
    }
}
