use anyhow::ensure;
use axiom_eth::{
    halo2_base::{
        gates::{GateInstructions, RangeInstructions},
        AssignedValue, Context,
        QuantumCell::Constant,
    },
    utils::{encode_addr_to_field, hilo::HiLo, is_zero_vec},
    Field,
};
use ethers_core::types::{H256, I256, U256};
use itertools::Itertools;

use crate::{
    chip::IvChip,
    params::{IvCircuitParams, BLOCK_NUMBER_BITS},
    stream::{AssignedReceipt, DataStream},
    types::ReceiptRecord,
    utils::h256_to_u256,
};

/// Reads `word` as an `int{amount_bits}` sign extended to 256 bits.
///
/// Errors if the upper bits are not a sign extension; the circuit has no satisfying witness for such
/// a word.
pub fn decode_signed_amount(word: H256, amount_bits: usize) -> anyhow::Result<I256> {
    let value = I256::from_raw(h256_to_u256(word));
    let half = I256::from_raw(U256::one() << (amount_bits - 1));
    ensure!(
        -half <= value && value < half,
        "Swap amount {value} does not fit in int{amount_bits}"
    );
    Ok(value)
}

/// Whether `receipt` carries a swap in its volume field, as opposed to being padding.
///
/// Mirrors the constraints of [IvChip::swap_receipt_flags]: a volume field is either a swap from the
/// pool, or has a zero event id. Real receipts must form a prefix of the stream.
pub fn swap_receipt_flags(
    params: &IvCircuitParams,
    receipts: DataStream<'_, ReceiptRecord>,
    storage_block: u64,
) -> anyhow::Result<Vec<bool>> {
    let flags = receipts
        .iter()
        .enumerate()
        .map(|(i, receipt)| {
            let field = &receipt.fields[params.volume_field];
            let is_real = field.event_id == params.swap_event_id;
            ensure!(
                is_real || field.event_id.is_zero(),
                "Receipt {i}: event id {:?} is neither a swap nor padding",
                field.event_id
            );
            if is_real {
                ensure!(field.contract == params.pool_address, "Receipt {i}: log not from pool");
                ensure!(!field.is_topic, "Receipt {i}: swap amount must be read from log data");
                ensure!(
                    field.field_index == params.amount_field_index,
                    "Receipt {i}: field index {} != {}",
                    field.field_index,
                    params.amount_field_index
                );
            }
            ensure!(
                receipt.block_number <= storage_block,
                "Receipt {i}: block {} is after the storage block {storage_block}",
                receipt.block_number
            );
            Ok(is_real)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    for (i, (prev, cur)) in flags.iter().tuple_windows().enumerate() {
        ensure!(*prev || !*cur, "Receipt {}: swap receipt follows padding", i + 1);
    }
    Ok(flags)
}

/// Sum of `|amount|` over every swap receipt.
pub fn total_swap_volume(
    params: &IvCircuitParams,
    receipts: DataStream<'_, ReceiptRecord>,
    storage_block: u64,
) -> anyhow::Result<U256> {
    let flags = swap_receipt_flags(params, receipts, storage_block)?;
    let magnitudes = receipts
        .iter()
        .map(|receipt| {
            decode_signed_amount(receipt.fields[params.volume_field].value, params.amount_bits)
                .map(|amount| amount.unsigned_abs())
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(magnitudes
        .into_iter()
        .zip_eq(flags)
        .filter(|(_, is_real)| *is_real)
        .fold(U256::zero(), |acc, (magnitude, _)| acc + magnitude))
}

impl<'r, F: Field> IvChip<'r, F> {
    /// `|value|` of a `bytes32` holding an `int{amount_bits}` sign extended to 256 bits.
    ///
    /// Constrains the bits above `amount_bits` to equal the sign bit. The magnitude is selected between
    /// the raw low bits and their two's complement negation by the sign bit.
    pub fn signed_word_abs(
        &self,
        ctx: &mut Context<F>,
        word: HiLo<AssignedValue<F>>,
        amount_bits: usize,
    ) -> AssignedValue<F> {
        let gate = self.gate();
        let bits = self.word_to_bits(ctx, word);
        let sign = bits[amount_bits - 1];
        for bit in &bits[amount_bits..] {
            ctx.constrain_equal(bit, &sign);
        }
        let raw = self.bits_to_num(ctx, &bits[..amount_bits]);
        let negated = gate.sub(ctx, Constant(gate.pow_of_two()[amount_bits]), raw);
        gate.select(ctx, negated, raw, sign)
    }

    /// Returns `is_real` for each receipt and constrains the per-receipt rules of
    /// [swap_receipt_flags].
    pub fn swap_receipt_flags(
        &self,
        ctx: &mut Context<F>,
        params: &IvCircuitParams,
        receipts: DataStream<'_, AssignedReceipt<F>>,
        storage_block: AssignedValue<F>,
    ) -> Vec<AssignedValue<F>> {
        let gate = self.gate();
        let range = self.range();
        let swap_id = HiLo::<F>::from(params.swap_event_id);
        let pool = encode_addr_to_field::<F>(&params.pool_address);
        let amount_index = F::from(params.amount_field_index as u64);

        range.range_check(ctx, storage_block, BLOCK_NUMBER_BITS);
        let block_bound = gate.add(ctx, storage_block, Constant(F::ONE));

        let flags = receipts.map(|receipt| {
            let field = &receipt.fields[params.volume_field];
            let id_hi = gate.is_equal(ctx, field.event_id.hi(), Constant(swap_id.hi()));
            let id_lo = gate.is_equal(ctx, field.event_id.lo(), Constant(swap_id.lo()));
            let is_real = gate.and(ctx, id_hi, id_lo);
            let is_padding = is_zero_vec(ctx, gate, &field.event_id.hi_lo());
            let is_either = gate.add(ctx, is_real, is_padding);
            gate.assert_is_const(ctx, &is_either, &F::ONE);

            self.constrain_equal_if(ctx, field.contract, pool, is_real);
            self.constrain_equal_if(ctx, field.is_topic, F::ZERO, is_real);
            self.constrain_equal_if(ctx, field.field_index, amount_index, is_real);

            range.range_check(ctx, receipt.block_number, BLOCK_NUMBER_BITS);
            range.check_less_than(ctx, receipt.block_number, block_bound, BLOCK_NUMBER_BITS + 1);
            is_real
        });
        // 1, ..., 1, 0, ..., 0
        for (prev, cur) in flags.iter().tuple_windows() {
            let after_padding = gate.sub_mul(ctx, *cur, *cur, *prev);
            gate.assert_is_const(ctx, &after_padding, &F::ZERO);
        }
        flags
    }

    /// Total swap volume over all receipt slots. Padding contributes zero.
    pub fn total_swap_volume(
        &self,
        ctx: &mut Context<F>,
        params: &IvCircuitParams,
        receipts: DataStream<'_, AssignedReceipt<F>>,
        storage_block: AssignedValue<F>,
    ) -> AssignedValue<F> {
        let gate = self.gate();
        let flags = self.swap_receipt_flags(ctx, params, receipts, storage_block);
        let magnitudes = receipts.map(|receipt| {
            self.signed_word_abs(ctx, receipt.fields[params.volume_field].value, params.amount_bits)
        });
        let volumes = magnitudes
            .into_iter()
            .zip_eq(flags)
            .map(|(magnitude, is_real)| gate.mul(ctx, magnitude, is_real))
            .collect_vec();
        gate.sum(ctx, volumes)
    }
}
