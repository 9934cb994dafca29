use ethers_core::types::I256;
use test_case::test_case;
use test_log::test;

use crate::{chip::IvChip, liquidity::tick_range_liquidity};

use super::*;

const TICK_BITS: usize = 25;

fn i256(value: i64) -> I256 {
    I256::from_dec_str(&value.to_string()).unwrap()
}

fn mock_tick_range_liquidity(tick_a: i64, tick_b: i64, liquidity: u128) -> (Vec<Fr>, bool) {
    mock_gadget(|ctx, range| {
        let chip = IvChip::new(range);
        let [a, b] = [tick_a, tick_b].map(|tick| ctx.load_witness(i256_to_fe::<Fr>(i256(tick))));
        let liquidity = ctx.load_witness(fe(liquidity));
        vec![chip.tick_range_liquidity(ctx, a, b, liquidity, TICK_BITS)]
    })
}

#[test]
fn test_tick_range_liquidity_symmetric() {
    let liquidity = U256::from(SCENARIO_A_LIQUIDITY);
    for (a, b) in [(200169, 200170), (-5, 7), (0, 0), (-887272, 887272)] {
        let forward = tick_range_liquidity(i256(a), i256(b), liquidity);
        let backward = tick_range_liquidity(i256(b), i256(a), liquidity);
        assert_eq!(forward, backward);
    }
}

#[test]
fn test_tick_range_liquidity_monotone_in_liquidity() {
    let mut prev = U256::zero();
    for liquidity in [0u64, 1, 1000, 1 << 40, u64::MAX] {
        let tvl = tick_range_liquidity(i256(-3), i256(10), U256::from(liquidity));
        assert!(tvl >= prev);
        prev = tvl;
    }
}

#[test_case(200169, 200170, SCENARIO_A_LIQUIDITY; "single tick")]
#[test_case(200170, 200169, SCENARIO_A_LIQUIDITY; "reversed")]
#[test_case(-10, 10, 3; "across zero")]
#[test_case(-100, -90, 3; "negative")]
#[test_case(42, 42, u128::MAX; "empty band")]
#[test_case(-(1 << 23), 1 << 23, 1; "widest band")]
#[test_case(5, 6, 0; "no liquidity")]
fn test_mock_tick_range_liquidity(tick_a: i64, tick_b: i64, liquidity: u128) {
    let expected = tick_range_liquidity(i256(tick_a), i256(tick_b), U256::from(liquidity));
    let (values, verified) = mock_tick_range_liquidity(tick_a, tick_b, liquidity);
    assert!(verified);
    assert_eq!(values, vec![u256_to_fe::<Fr>(expected)]);
}
