#![warn(clippy::useless_conversion)]
//! Implied volatility of a Uniswap V3 pool, computed inside a halo2 circuit.
//!
//! The circuit reads a fixed-capacity stream of `Swap` receipt fields and a fixed-capacity stream of
//! pool storage slots, and outputs
//!
//! ```text
//! iv = 2 * feeTier * isqrt(dailyVolume / tickTvl) * sqrt365
//! ```
//!
//! in fee tier units. Every in-circuit step is a total function built from selects and range checks,
//! so the circuit shape never depends on witness values. A native evaluator in [native] computes the
//! same value off-circuit and rejects the same inputs the circuit cannot satisfy.

pub use axiom_eth;
pub use axiom_eth::Field;

/// The [AppCircuit](circuit::AppCircuit) interface, the IV circuit, and `BaseCircuitBuilder` wiring.
pub mod circuit;
/// Chip holding the range chip shared by all IV gadgets.
pub mod chip;
/// Off-circuit preparation of circuit inputs from swap logs and storage reads.
pub mod input;
/// Tick-range liquidity estimate used as the TVL denominator.
pub mod liquidity;
/// Native reference evaluation.
pub mod native;
/// Output packing at a declared bit width.
pub mod output;
/// Serde-loadable circuit parameters.
pub mod params;
/// Packed storage field decoding.
pub mod slot;
/// Fixed-capacity input streams.
pub mod stream;
/// Native receipt and storage records.
pub mod types;
pub mod utils;
/// Volatility formula: ratio, integer square root, fee tier scaling.
pub mod volatility;
/// Swap volume aggregation.
pub mod volume;

#[cfg(test)]
mod tests;
