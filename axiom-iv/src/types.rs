//! Human readable circuit inputs. All records are plain values; a [DataInput] is owned by a single
//! circuit evaluation and resized to the declared [Capacities] before it is assigned.
use anyhow::ensure;
use ethers_core::types::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::stream::{pad_to_capacity, Capacities};

/// Maximum number of log fields extracted from a single receipt.
pub const MAX_FIELDS_PER_RECEIPT: usize = 4;

/// A single field of a log, located by event, topic/data section and index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogField {
    /// Address of the contract that emitted the log.
    pub contract: Address,
    /// `topics[0]` of the log.
    pub event_id: H256,
    /// Whether the field is read from the topics (`true`) or from the data section (`false`).
    pub is_topic: bool,
    /// Index within the topics or within the 32 byte words of the data section.
    pub field_index: u32,
    /// Position of the log within the receipt. Not the block-wide log index.
    pub log_position: u32,
    pub value: H256,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRecord {
    pub block_number: u64,
    pub tx_hash: H256,
    /// Resized to [MAX_FIELDS_PER_RECEIPT] with zero fields by [DataInput::into_padded].
    pub fields: Vec<LogField>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRecord {
    pub block_number: u64,
    pub address: Address,
    pub slot: H256,
    pub value: H256,
}

/// Receipt, storage and transaction streams supplied to the circuit.
///
/// Real records occupy a prefix of each stream; the remainder is all-zero padding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataInput {
    pub receipts: Vec<ReceiptRecord>,
    pub storage_slots: Vec<StorageRecord>,
    #[serde(default)]
    pub transactions: Vec<H256>,
}

impl DataInput {
    /// Resizes every stream to its capacity with default records.
    pub fn into_padded(self, capacities: &Capacities) -> anyhow::Result<Self> {
        let receipts = self
            .receipts
            .into_iter()
            .map(|mut receipt| {
                ensure!(
                    receipt.fields.len() <= MAX_FIELDS_PER_RECEIPT,
                    "Receipt {:?} has {} fields, at most {MAX_FIELDS_PER_RECEIPT} are supported",
                    receipt.tx_hash,
                    receipt.fields.len()
                );
                receipt.fields.resize(MAX_FIELDS_PER_RECEIPT, LogField::default());
                Ok(receipt)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let receipt_pad = ReceiptRecord {
            fields: vec![LogField::default(); MAX_FIELDS_PER_RECEIPT],
            ..Default::default()
        };
        Ok(Self {
            receipts: pad_to_capacity(receipts, capacities.max_receipts, receipt_pad, "receipts")?,
            storage_slots: pad_to_capacity(
                self.storage_slots,
                capacities.max_storage,
                StorageRecord::default(),
                "storage slots",
            )?,
            transactions: pad_to_capacity(
                self.transactions,
                capacities.max_transactions,
                H256::zero(),
                "transactions",
            )?,
        })
    }

    /// Checks that every stream has exactly its declared capacity.
    pub fn check_capacities(&self, capacities: &Capacities) -> anyhow::Result<()> {
        let lens = [
            ("receipts", self.receipts.len(), capacities.max_receipts),
            ("storage slots", self.storage_slots.len(), capacities.max_storage),
            ("transactions", self.transactions.len(), capacities.max_transactions),
        ];
        for (name, len, cap) in lens {
            ensure!(len == cap, "InvalidInput: {len} {name} supplied, circuit allocates {cap}");
        }
        for receipt in &self.receipts {
            ensure!(
                receipt.fields.len() == MAX_FIELDS_PER_RECEIPT,
                "InvalidInput: receipt {:?} must have exactly {MAX_FIELDS_PER_RECEIPT} fields",
                receipt.tx_hash
            );
        }
        Ok(())
    }
}
