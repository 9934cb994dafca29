//! Circuit outputs. Each output is an unsigned integer of a declared bit width. Consumers decode an
//! output as the first `ceil(width / 8)` bytes of its slot in the output data, big endian.
use anyhow::ensure;
use axiom_eth::{
    halo2_base::{
        gates::{RangeChip, RangeInstructions},
        AssignedValue, Context,
    },
    Field,
};
use ethers_core::types::U256;
use itertools::Itertools;

use crate::{params::MAX_OUTPUT_BITS, utils::fe_to_u256};

pub fn output_byte_len(bits: usize) -> usize {
    (bits + 7) / 8
}

/// `value` as `ceil(bits / 8)` big endian bytes.
pub fn encode_uint(value: U256, bits: usize) -> anyhow::Result<Vec<u8>> {
    ensure!((1..=256).contains(&bits), "output width {bits} must be in [1, 256]");
    ensure!(value.bits() <= bits, "{value} does not fit in uint{bits}");
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    Ok(word[32 - output_byte_len(bits)..].to_vec())
}

/// Reads the first `ceil(bits / 8)` bytes of `bytes` as a big endian integer.
pub fn decode_uint(bytes: &[u8], bits: usize) -> anyhow::Result<U256> {
    ensure!((1..=256).contains(&bits), "output width {bits} must be in [1, 256]");
    let len = output_byte_len(bits);
    ensure!(bytes.len() >= len, "need {len} bytes to decode uint{bits}, got {}", bytes.len());
    Ok(U256::from_big_endian(&bytes[..len]))
}

/// Outputs declared by an [AppCircuit](crate::circuit::AppCircuit), in declaration order.
/// Each output becomes one public instance.
#[derive(Clone, Debug, Default)]
pub struct OutputBuffer<F: Field> {
    values: Vec<AssignedValue<F>>,
    widths: Vec<usize>,
}

impl<F: Field> OutputBuffer<F> {
    /// Range checks `value` to `bits` and appends it. Panics if `bits > MAX_OUTPUT_BITS`; widths are
    /// circuit constants.
    pub fn output_uint(
        &mut self,
        ctx: &mut Context<F>,
        range: &RangeChip<F>,
        value: AssignedValue<F>,
        bits: usize,
    ) {
        assert!(bits > 0 && bits <= MAX_OUTPUT_BITS, "output width {bits} not supported");
        range.range_check(ctx, value, bits);
        self.values.push(value);
        self.widths.push(bits);
    }

    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    pub fn into_values(self) -> Vec<AssignedValue<F>> {
        self.values
    }

    /// Concatenated output data computed from the witness values.
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let encoded = self
            .values
            .iter()
            .zip_eq(&self.widths)
            .map(|(value, bits)| encode_uint(fe_to_u256(value.value()), *bits))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(encoded.concat())
    }
}
