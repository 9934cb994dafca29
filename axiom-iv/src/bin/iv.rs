use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, ensure, Context};
use axiom_eth::{
    halo2_base::gates::circuit::CircuitBuilderStage, halo2_proofs::dev::MockProver,
    halo2curves::bn256::Fr,
};
use axiom_iv::{
    circuit::{app_instances, create_app_circuit, IvCircuit, DEFAULT_K, DEFAULT_LOOKUP_BITS},
    output::encode_uint,
    params::IvCircuitParams,
    types::DataInput,
    utils::u256_to_fe,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
pub struct Cli {
    /// Circuit params JSON. Defaults to the mainnet USDC/WETH 5 bps pool.
    #[arg(long = "params")]
    pub params_path: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the IV metric off-circuit.
    Evaluate {
        #[arg(long = "input")]
        input_path: PathBuf,
    },
    /// Compute the IV metric and check it against the mock prover.
    Mock {
        #[arg(long = "input")]
        input_path: PathBuf,
        #[arg(short, long, default_value_t = DEFAULT_K)]
        k: usize,
        #[arg(long = "lookup-bits", default_value_t = DEFAULT_LOOKUP_BITS)]
        lookup_bits: usize,
    },
}

fn read_input(path: &Path, params: &IvCircuitParams) -> anyhow::Result<DataInput> {
    let f = File::open(path)
        .with_context(|| format!("Failed to open input file {}", path.display()))?;
    let input: DataInput = serde_json::from_reader(f)
        .with_context(|| format!("Failed to parse input file {}", path.display()))?;
    input.into_padded(&params.capacities)
}

fn main() -> anyhow::Result<()> {
    env_logger::try_init()?;
    let cli = Cli::parse();
    let params = match &cli.params_path {
        Some(path) => IvCircuitParams::from_path(path)?,
        None => IvCircuitParams::default(),
    };
    let circuit = IvCircuit::<Fr>::new(params.clone())?;

    let input_path = match &cli.command {
        Command::Evaluate { input_path } | Command::Mock { input_path, .. } => input_path,
    };
    let input = read_input(input_path, &params)?;
    let values = circuit.evaluate_native(&input)?;
    log::info!("{values:?}");
    println!("iv: {}", values.metric);
    println!("output: 0x{}", hex::encode(encode_uint(values.metric, params.output_bits)?));

    if let Command::Mock { k, lookup_bits, .. } = cli.command {
        let builder =
            create_app_circuit(CircuitBuilderStage::Mock, &circuit, &input, k, lookup_bits)?;
        let instances = app_instances(&builder);
        ensure!(
            instances[0] == vec![u256_to_fe::<Fr>(values.metric)],
            "Circuit output does not match native evaluation"
        );
        MockProver::run(k as u32, &builder, instances)?
            .verify()
            .map_err(|failures| anyhow!("Mock prover failed: {failures:?}"))?;
        println!("Mock prover satisfied");
    }
    Ok(())
}
