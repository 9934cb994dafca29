use ethers_core::types::{Chain, I256};
use test_case::test_case;
use test_log::test;

use crate::{
    circuit::IvCircuit,
    input::{
        approximate_blocks_for_timestamp, build_data_input, select_largest_swaps, BlockStamp,
        Interval, SwapLog,
    },
    params::USDC_WETH_500_POOL,
};

use super::*;

fn swap(block_number: u64, amount1: i128) -> SwapLog {
    SwapLog {
        block_number,
        tx_hash: H256::from_low_u64_be(block_number),
        log_position: 3,
        contract: *USDC_WETH_500_POOL,
        amount1: I256::from_dec_str(&amount1.to_string()).unwrap(),
    }
}

fn scenario_a_swaps() -> Vec<SwapLog> {
    vec![
        swap(22131500, 1000),
        swap(22131566, 1564800000000000000000),
        swap(22131570, -20),
        swap(22131577, 1469250000000000000000),
    ]
}

#[test]
fn test_select_largest_swaps() {
    let largest = select_largest_swaps(&scenario_a_swaps(), 2);
    assert_eq!(largest.iter().map(|s| s.block_number).collect::<Vec<_>>(), [22131566, 22131577]);
    assert_eq!(select_largest_swaps(&scenario_a_swaps(), 10).len(), 4);
    assert!(select_largest_swaps(&scenario_a_swaps(), 0).is_empty());
}

#[test]
fn test_select_largest_swaps_stable_ties() {
    let swaps = vec![swap(1, 5), swap(2, -7), swap(3, -5), swap(4, 7), swap(5, 5)];
    let largest = select_largest_swaps(&swaps, 4);
    assert_eq!(largest.iter().map(|s| s.block_number).collect::<Vec<_>>(), [2, 4, 1, 3]);
}

#[test]
fn test_build_data_input_scenario_a() {
    let params = IvCircuitParams::default();
    let expected = scenario_a_input();
    let swaps = select_largest_swaps(&scenario_a_swaps(), 2);
    let input = build_data_input(
        &params,
        &swaps,
        22135817,
        expected.storage_slots[0].value,
        expected.storage_slots[1].value,
    )
    .unwrap();
    input.check_capacities(&params.capacities).unwrap();
    assert_eq!(input.storage_slots, expected.storage_slots);
    for (built, expected) in input.receipts.iter().zip(&expected.receipts) {
        assert_eq!(built.block_number, expected.block_number);
        assert_eq!(built.fields, expected.fields);
    }
    let circuit = IvCircuit::<Fr>::new(params).unwrap();
    assert_eq!(circuit.evaluate_native(&input).unwrap().metric, U256::from(SCENARIO_A_METRIC));
}

#[test]
fn test_build_data_input_keeps_largest() {
    let params = IvCircuitParams::default();
    let swaps = (0..40).map(|i| swap(100 + i, i as i128 - 20)).collect::<Vec<_>>();
    let input = build_data_input(&params, &swaps, 200, H256::zero(), H256::zero()).unwrap();
    let circuit = IvCircuit::<Fr>::new(params).unwrap();
    let values = circuit.evaluate_native(&input).unwrap();
    // |-20..20| without the 8 smallest magnitudes 0, 1, 1, 2, 2, 3, 3, 4
    let all: u64 = (0..40).map(|i: i64| (i - 20).unsigned_abs()).sum();
    assert_eq!(values.total_volume, U256::from(all - 16));
}

#[test_case("1d", Interval::Day)]
#[test_case("1h", Interval::Hour)]
#[test_case("6h", Interval::SixHours)]
#[test_case("12h", Interval::TwelveHours)]
fn test_parse_interval(s: &str, interval: Interval) {
    assert_eq!(s.parse::<Interval>().unwrap(), interval);
}

#[test]
fn test_parse_interval_unknown() {
    assert!("2d".parse::<Interval>().is_err());
}

#[test]
fn test_approximate_day_ago_block() {
    let latest = BlockStamp { number: 22135817, timestamp: 1_742_900_000 };
    let day_ago = latest.timestamp - 86400;
    let (interval, chain) = (Interval::Day, Chain::Mainnet);
    let blocks = approximate_blocks_for_timestamp(day_ago, latest, interval, 1, chain).unwrap();
    assert_eq!(blocks, vec![BlockStamp { number: 22135817 - 7200, timestamp: 1_742_813_600 }]);
}

#[test]
fn test_approximate_blocks_oldest_first() {
    let latest = BlockStamp { number: 1_000_000, timestamp: 1_700_000_000 };
    let at = latest.timestamp;
    let blocks =
        approximate_blocks_for_timestamp(at, latest, Interval::Hour, 3, Chain::Sepolia).unwrap();
    assert_eq!(
        blocks,
        vec![
            BlockStamp { number: 1_000_000 - 600, timestamp: 1_700_000_000 - 7200 },
            BlockStamp { number: 1_000_000 - 300, timestamp: 1_700_000_000 - 3600 },
            latest,
        ]
    );
}

#[test]
fn test_approximate_blocks_errors() {
    let latest = BlockStamp { number: 100, timestamp: 1_700_000_000 };
    let approximate = |at, periods, chain| {
        approximate_blocks_for_timestamp(at, latest, Interval::Day, periods, chain)
    };
    let at = latest.timestamp;
    assert!(approximate(at, 0, Chain::Mainnet).is_err());
    assert!(approximate(at, 1, Chain::Polygon).is_err());
    // before genesis
    assert!(approximate(at, 2, Chain::Mainnet).is_err());
    assert!(approximate(at + 1, 1, Chain::Mainnet).is_err());
    assert!(approximate(at, 1, Chain::Mainnet).is_ok());
}
