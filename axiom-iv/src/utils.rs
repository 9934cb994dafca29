use axiom_eth::{halo2_base::utils::ScalarField, Field};
use ethers_core::types::{H256, I256, U256};

/// Reads `word` as a big endian `uint256`.
pub fn h256_to_u256(word: H256) -> U256 {
    U256::from_big_endian(word.as_bytes())
}

pub fn u256_to_h256(value: U256) -> H256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    H256(bytes)
}

/// Two's complement `int256` encoding of `value` as `bytes32`.
pub fn i256_to_h256(value: I256) -> H256 {
    u256_to_h256(value.into_raw())
}

/// Assumes `value` is less than the field modulus; otherwise the result is reduced.
pub fn u256_to_fe<F: Field>(value: U256) -> F {
    let mut bytes = [0u8; 32];
    value.to_little_endian(&mut bytes);
    F::from_bytes_le(&bytes)
}

pub fn fe_to_u256<F: ScalarField>(fe: &F) -> U256 {
    U256::from_little_endian(&fe.to_bytes_le())
}

/// Smallest `b` such that `2^b >= n`. Returns 0 for `n <= 1`.
pub fn log2_ceil(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}
