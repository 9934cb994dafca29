use anyhow::ensure;
use axiom_eth::{
    halo2_base::{AssignedValue, Context},
    utils::{encode_addr_to_field, hilo::HiLo},
    Field,
};
use serde::{Deserialize, Serialize};

use crate::types::{DataInput, LogField, ReceiptRecord, StorageRecord};

/// Every non-zero capacity must be a multiple of this.
pub const CAPACITY_MULTIPLE: usize = 32;

/// Number of records of each kind the circuit allocates. Declared once, at circuit setup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacities {
    pub max_receipts: usize,
    pub max_storage: usize,
    pub max_transactions: usize,
}

impl Capacities {
    pub fn new(max_receipts: usize, max_storage: usize, max_transactions: usize) -> Self {
        Self { max_receipts, max_storage, max_transactions }
    }

    /// Receipts and storage slots must be positive multiples of [CAPACITY_MULTIPLE].
    /// Transactions may be zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, cap) in [("max_receipts", self.max_receipts), ("max_storage", self.max_storage)]
        {
            ensure!(
                cap > 0 && cap % CAPACITY_MULTIPLE == 0,
                "InvalidCapacity: {name} = {cap} must be a positive multiple of {CAPACITY_MULTIPLE}"
            );
        }
        ensure!(
            self.max_transactions % CAPACITY_MULTIPLE == 0,
            "InvalidCapacity: max_transactions = {} must be a multiple of {CAPACITY_MULTIPLE}",
            self.max_transactions
        );
        Ok(())
    }
}

/// Resizes `items` to `capacity` by appending `pad`. Errors if there are more items than capacity.
pub fn pad_to_capacity<T: Clone>(
    mut items: Vec<T>,
    capacity: usize,
    pad: T,
    name: &str,
) -> anyhow::Result<Vec<T>> {
    ensure!(
        items.len() <= capacity,
        "Input capacity exceeded: {} {name} > allocated {capacity}",
        items.len()
    );
    items.resize(capacity, pad);
    Ok(items)
}

/// Read-only view of exactly `capacity` records, padding included.
///
/// There is no notion of a "length" smaller than the capacity: every map and sum runs over all slots,
/// so padding must be neutral for whatever is computed.
#[derive(Debug)]
pub struct DataStream<'a, T> {
    items: &'a [T],
}

// Derives would require `T: Copy`.
impl<'a, T> Clone for DataStream<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, T> Copy for DataStream<'a, T> {}

impl<'a, T> DataStream<'a, T> {
    pub fn new(items: &'a [T], capacity: usize) -> anyhow::Result<Self> {
        ensure!(
            items.len() == capacity,
            "Stream has {} records but capacity {capacity}",
            items.len()
        );
        Ok(Self { items })
    }

    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Panics if `idx >= capacity`; indices are circuit constants.
    pub fn get(&self, idx: usize) -> &'a T {
        &self.items[idx]
    }

    pub fn iter(&self) -> std::slice::Iter<'a, T> {
        self.items.iter()
    }

    pub fn map<U>(&self, f: impl FnMut(&'a T) -> U) -> Vec<U> {
        self.items.iter().map(f).collect()
    }

    /// Folds over every slot. `f` must be associative and commutative for the result to be
    /// independent of record order.
    pub fn reduce<U>(&self, init: U, f: impl FnMut(U, &'a T) -> U) -> U {
        self.items.iter().fold(init, f)
    }
}

/// In-circuit [LogField]. 256-bit words are `HiLo` pairs of 128-bit limbs; nothing is range checked
/// on load.
#[derive(Clone, Copy, Debug)]
pub struct AssignedLogField<F: Field> {
    pub contract: AssignedValue<F>,
    pub event_id: HiLo<AssignedValue<F>>,
    pub is_topic: AssignedValue<F>,
    pub field_index: AssignedValue<F>,
    pub log_position: AssignedValue<F>,
    pub value: HiLo<AssignedValue<F>>,
}

#[derive(Clone, Debug)]
pub struct AssignedReceipt<F: Field> {
    pub block_number: AssignedValue<F>,
    pub fields: Vec<AssignedLogField<F>>,
}

#[derive(Clone, Copy, Debug)]
pub struct AssignedStorage<F: Field> {
    pub block_number: AssignedValue<F>,
    pub address: AssignedValue<F>,
    pub slot: HiLo<AssignedValue<F>>,
    pub value: HiLo<AssignedValue<F>>,
}

/// [DataInput] loaded as private witnesses. Transactions are not assigned: no circuit reads them.
#[derive(Clone, Debug)]
pub struct AssignedDataInput<F: Field> {
    pub receipts: Vec<AssignedReceipt<F>>,
    pub storage_slots: Vec<AssignedStorage<F>>,
}

impl<F: Field> AssignedDataInput<F> {
    pub fn receipts(&self) -> DataStream<'_, AssignedReceipt<F>> {
        DataStream { items: &self.receipts }
    }

    pub fn storage_slots(&self) -> DataStream<'_, AssignedStorage<F>> {
        DataStream { items: &self.storage_slots }
    }
}

impl LogField {
    pub fn assign<F: Field>(&self, ctx: &mut Context<F>) -> AssignedLogField<F> {
        AssignedLogField {
            contract: ctx.load_witness(encode_addr_to_field(&self.contract)),
            event_id: HiLo::<F>::from(self.event_id).assign(ctx),
            is_topic: ctx.load_witness(F::from(self.is_topic)),
            field_index: ctx.load_witness(F::from(self.field_index as u64)),
            log_position: ctx.load_witness(F::from(self.log_position as u64)),
            value: HiLo::<F>::from(self.value).assign(ctx),
        }
    }
}

impl ReceiptRecord {
    pub fn assign<F: Field>(&self, ctx: &mut Context<F>) -> AssignedReceipt<F> {
        AssignedReceipt {
            block_number: ctx.load_witness(F::from(self.block_number)),
            fields: self.fields.iter().map(|field| field.assign(ctx)).collect(),
        }
    }
}

impl StorageRecord {
    pub fn assign<F: Field>(&self, ctx: &mut Context<F>) -> AssignedStorage<F> {
        AssignedStorage {
            block_number: ctx.load_witness(F::from(self.block_number)),
            address: ctx.load_witness(encode_addr_to_field(&self.address)),
            slot: HiLo::<F>::from(self.slot).assign(ctx),
            value: HiLo::<F>::from(self.value).assign(ctx),
        }
    }
}

impl DataInput {
    /// Assumes [DataInput::check_capacities] has passed.
    pub fn assign<F: Field>(&self, ctx: &mut Context<F>) -> AssignedDataInput<F> {
        AssignedDataInput {
            receipts: self.receipts.iter().map(|r| r.assign(ctx)).collect(),
            storage_slots: self.storage_slots.iter().map(|s| s.assign(ctx)).collect(),
        }
    }

    pub fn receipts(&self) -> DataStream<'_, ReceiptRecord> {
        DataStream { items: &self.receipts }
    }

    pub fn storage_slots(&self) -> DataStream<'_, StorageRecord> {
        DataStream { items: &self.storage_slots }
    }
}
