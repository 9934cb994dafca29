use anyhow::ensure;
use axiom_eth::{
    halo2_base::{gates::GateInstructions, AssignedValue, Context, QuantumCell::Constant},
    utils::hilo::HiLo,
    Field,
};
use ethers_core::types::{I256, U256};
use serde::{Deserialize, Serialize};

use crate::chip::IvChip;

/// Widest packed field supported; wider values would not leave room for arithmetic in the field.
pub const MAX_PACKED_FIELD_BITS: usize = 128;

/// Location of a variable packed into a storage slot, e.g. `int24 tick` at bits `[160, 184)` of
/// `slot0`. Tied to the storage layout of a specific contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedField {
    pub bit_offset: usize,
    pub bit_width: usize,
    pub signed: bool,
}

impl PackedField {
    pub const fn new(bit_offset: usize, bit_width: usize, signed: bool) -> Self {
        Self { bit_offset, bit_width, signed }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (1..=MAX_PACKED_FIELD_BITS).contains(&self.bit_width),
            "packed field width {} must be in [1, {MAX_PACKED_FIELD_BITS}]",
            self.bit_width
        );
        ensure!(
            self.bit_offset + self.bit_width <= 256,
            "packed field [{}, {}) exceeds 256 bits",
            self.bit_offset,
            self.bit_offset + self.bit_width
        );
        Ok(())
    }

    fn mask(&self) -> U256 {
        (U256::one() << self.bit_width) - 1
    }

    /// Smallest and largest representable values.
    pub fn bounds(&self) -> (I256, I256) {
        let top = I256::from_raw(U256::one() << self.bit_width);
        if self.signed {
            let half = I256::from_raw(U256::one() << (self.bit_width - 1));
            (-half, half - I256::one())
        } else {
            (I256::zero(), top - I256::one())
        }
    }
}

/// Extracts bits `[offset, offset + width)` of `word`, sign extending when `field.signed`.
pub fn decode_packed_field(word: U256, field: PackedField) -> I256 {
    let raw = (word >> field.bit_offset) & field.mask();
    let value = I256::from_raw(raw);
    if field.signed && raw.bit(field.bit_width - 1) {
        value - I256::from_raw(U256::one() << field.bit_width)
    } else {
        value
    }
}

/// Writes `value` into bits `[offset, offset + width)` of `word`, leaving other bits untouched.
pub fn pack_packed_field(word: U256, field: PackedField, value: I256) -> anyhow::Result<U256> {
    let (min, max) = field.bounds();
    ensure!(min <= value && value <= max, "{value} does not fit in {field:?}");
    let raw = value.into_raw() & field.mask();
    let cleared = word & !(field.mask() << field.bit_offset);
    Ok(cleared | (raw << field.bit_offset))
}

impl<'r, F: Field> IvChip<'r, F> {
    /// Reads `field` out of the little endian bits of a word (see [IvChip::word_to_bits]).
    ///
    /// Signed fields are returned in field encoding: a negative value `v` is `p + v`.
    pub fn decode_packed_bits(
        &self,
        ctx: &mut Context<F>,
        bits: &[AssignedValue<F>],
        field: PackedField,
    ) -> AssignedValue<F> {
        let slice = &bits[field.bit_offset..field.bit_offset + field.bit_width];
        let unsigned = self.bits_to_num(ctx, slice);
        if !field.signed {
            return unsigned;
        }
        let gate = self.gate();
        let sign = slice[field.bit_width - 1];
        gate.sub_mul(ctx, unsigned, sign, Constant(gate.pow_of_two()[field.bit_width]))
    }

    pub fn decode_packed_field(
        &self,
        ctx: &mut Context<F>,
        word: HiLo<AssignedValue<F>>,
        field: PackedField,
    ) -> AssignedValue<F> {
        let bits = self.word_to_bits(ctx, word);
        self.decode_packed_bits(ctx, &bits, field)
    }
}
