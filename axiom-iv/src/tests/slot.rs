use axiom_eth::utils::hilo::HiLo;
use ethers_core::types::I256;
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use test_case::test_case;
use test_log::test;

use crate::{
    chip::IvChip,
    params::IvCircuitParams,
    slot::{decode_packed_field, pack_packed_field, PackedField},
    utils::{h256_to_u256, u256_to_h256},
};

use super::*;

fn tick_field() -> PackedField {
    IvCircuitParams::default().tick_field
}

fn i256(value: i64) -> I256 {
    I256::from_dec_str(&value.to_string()).unwrap()
}

#[test]
fn test_decode_scenario_a_slot0() {
    let input = scenario_a_input();
    let slot0 = h256_to_u256(input.storage_slots[0].value);
    assert_eq!(decode_packed_field(slot0, tick_field()), i256(SCENARIO_A_TICK));
    let slot4 = h256_to_u256(input.storage_slots[1].value);
    let liquidity = decode_packed_field(slot4, IvCircuitParams::default().liquidity_field);
    assert_eq!(liquidity.into_raw(), U256::from(SCENARIO_A_LIQUIDITY));
}

#[test_case(0; "zero")]
#[test_case(200169; "positive")]
#[test_case(-1; "minus one")]
#[test_case(-887272; "min usable tick")]
#[test_case(887272; "max usable tick")]
#[test_case(-(1 << 23); "int24 min")]
#[test_case((1 << 23) - 1; "int24 max")]
fn test_pack_then_decode_tick(tick: i64) {
    let mut rng = ChaCha8Rng::seed_from_u64(tick as u64);
    let background = U256::from_big_endian(&rng.gen::<[u8; 32]>());
    let word = pack_packed_field(background, tick_field(), i256(tick)).unwrap();
    assert_eq!(decode_packed_field(word, tick_field()), i256(tick));
    // other bits untouched
    let mask = ((U256::one() << 24) - 1) << 160;
    assert_eq!(word & !mask, background & !mask);
}

#[test]
fn test_pack_out_of_range() {
    assert!(pack_packed_field(U256::zero(), tick_field(), i256(1 << 23)).is_err());
    assert!(pack_packed_field(U256::zero(), tick_field(), i256(-(1 << 23) - 1)).is_err());
    let unsigned = PackedField::new(0, 8, false);
    assert!(pack_packed_field(U256::zero(), unsigned, i256(-1)).is_err());
    assert!(pack_packed_field(U256::zero(), unsigned, i256(255)).is_ok());
}

#[test_case(PackedField::new(0, 0, false), false; "empty")]
#[test_case(PackedField::new(0, 129, false), false; "too wide")]
#[test_case(PackedField::new(200, 64, false), false; "past word end")]
#[test_case(PackedField::new(128, 128, false), true; "high limb")]
fn test_packed_field_validate(field: PackedField, valid: bool) {
    assert_eq!(field.validate().is_ok(), valid);
}

#[test_case(200169; "positive")]
#[test_case(-200169; "negative")]
#[test_case(-(1 << 23); "int24 min")]
fn test_mock_decode_tick(tick: i64) {
    // set bits on both sides of the field
    let background = U256::one() | (U256::one() << 255);
    let word = pack_packed_field(background, tick_field(), i256(tick)).unwrap();
    let (values, verified) = mock_gadget(|ctx, range| {
        let chip = IvChip::new(range);
        let word = HiLo::<Fr>::from(u256_to_h256(word)).assign(ctx);
        vec![chip.decode_packed_field(ctx, word, tick_field())]
    });
    assert!(verified);
    assert_eq!(values, vec![i256_to_fe::<Fr>(i256(tick))]);
}

#[test]
fn test_mock_decode_liquidity_in_low_limb() {
    let input = scenario_a_input();
    let (values, verified) = mock_gadget(|ctx, range| {
        let chip = IvChip::new(range);
        let word = HiLo::<Fr>::from(input.storage_slots[1].value).assign(ctx);
        vec![chip.decode_packed_field(ctx, word, IvCircuitParams::default().liquidity_field)]
    });
    assert!(verified);
    assert_eq!(values, vec![fe(SCENARIO_A_LIQUIDITY)]);
}

#[test]
fn test_mock_decode_field_in_high_limb() {
    let field = PackedField::new(200, 16, false);
    let word = pack_packed_field(U256::MAX, field, i256(0xbeef)).unwrap();
    let (values, verified) = mock_gadget(|ctx, range| {
        let chip = IvChip::new(range);
        let word = HiLo::<Fr>::from(u256_to_h256(word)).assign(ctx);
        vec![chip.decode_packed_field(ctx, word, field)]
    });
    assert!(verified);
    assert_eq!(values, vec![fe(0xbeef)]);
}
