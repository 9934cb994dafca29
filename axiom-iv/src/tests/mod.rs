use std::{fs::File, path::Path};

use axiom_eth::{
    halo2_base::{
        gates::{
            circuit::{builder::BaseCircuitBuilder, CircuitBuilderStage},
            RangeChip,
        },
        AssignedValue, Context,
    },
    halo2_proofs::dev::MockProver,
    halo2curves::bn256::Fr,
    Field,
};
use ethers_core::types::{H256, I256, U256};

use crate::{
    circuit::{app_instances, create_iv_circuit, DEFAULT_K},
    params::IvCircuitParams,
    types::DataInput,
    utils::{u256_to_fe, u256_to_h256},
};

mod input;
mod liquidity;
mod slot;

const DEGREE: usize = 12;
const SCENARIO_A_PATH: &str = "data/tests/scenario_a.json";
const PARAMS_PATH: &str = "configs/usdc_weth_500.json";

/// Total swap volume, tick TVL and metric of [SCENARIO_A_PATH].
const SCENARIO_A_VOLUME: u128 = 3034050000000000000000;
const SCENARIO_A_TICK: i64 = 200169;
const SCENARIO_A_LIQUIDITY: u128 = 17525466147715557006;
const SCENARIO_A_METRIC: u64 = 247000;

pub fn scenario_a_input() -> DataInput {
    let f = File::open(Path::new(SCENARIO_A_PATH)).unwrap();
    let input: DataInput = serde_json::from_reader(f).unwrap();
    input.into_padded(&IvCircuitParams::default().capacities).unwrap()
}

pub fn fe(value: u128) -> Fr {
    u256_to_fe(U256::from(value))
}

/// Field encoding of a signed integer: negative values map to `p - |value|`.
pub fn i256_to_fe<F: Field>(value: I256) -> F {
    let magnitude = u256_to_fe::<F>(value.unsigned_abs());
    if value.is_negative() {
        -magnitude
    } else {
        magnitude
    }
}

/// Runs `f` in a fresh mock circuit and exposes its return values as public instances.
///
/// Returns the instance values and whether the mock prover is satisfied.
pub fn mock_gadget(
    f: impl FnOnce(&mut Context<Fr>, &RangeChip<Fr>) -> Vec<AssignedValue<Fr>>,
) -> (Vec<Fr>, bool) {
    let mut builder = BaseCircuitBuilder::<Fr>::from_stage(CircuitBuilderStage::Mock)
        .use_k(DEGREE)
        .use_lookup_bits(8)
        .use_instance_columns(1);
    let range = builder.range_chip();
    let outputs = f(builder.main(0), &range);
    let values = outputs.iter().map(|v| *v.value()).collect::<Vec<_>>();
    builder.assigned_instances[0].extend(outputs);
    builder.calculate_params(Some(9));
    let verified =
        MockProver::run(DEGREE as u32, &builder, vec![values.clone()]).unwrap().verify().is_ok();
    (values, verified)
}

/// Builds the IV circuit on `input` and runs the mock prover against `instance`.
pub fn mock_iv(params: IvCircuitParams, input: &DataInput, instance: Option<Vec<Fr>>) -> bool {
    let builder = create_iv_circuit::<Fr>(CircuitBuilderStage::Mock, params, input).unwrap();
    let instances = match instance {
        Some(instance) => vec![instance],
        None => app_instances(&builder),
    };
    MockProver::run(DEFAULT_K as u32, &builder, instances).unwrap().verify().is_ok()
}
