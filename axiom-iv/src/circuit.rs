use std::marker::PhantomData;

use axiom_eth::{
    halo2_base::{
        gates::{
            circuit::{builder::BaseCircuitBuilder, CircuitBuilderStage},
            GateInstructions, RangeChip,
        },
        utils::ScalarField,
        Context,
        QuantumCell::Constant,
    },
    utils::{encode_addr_to_field, hilo::HiLo},
    Field,
};

use crate::{
    chip::IvChip,
    native::{evaluate, IvValues},
    output::OutputBuffer,
    params::{IvCircuitParams, LIQUIDITY_STORAGE_IDX, TICK_STORAGE_IDX},
    stream::{AssignedDataInput, AssignedStorage, Capacities},
    types::DataInput,
};

/// Default circuit degree for the IV circuit at the default capacities.
pub const DEFAULT_K: usize = 15;
/// Lookup table size for range checks.
pub const DEFAULT_LOOKUP_BITS: usize = 8;
/// Rows reserved for blinding factors when auto-configuring.
pub const MINIMUM_ROWS: usize = 9;

/// An application circuit over fixed-capacity receipt and storage streams.
pub trait AppCircuit<F: Field> {
    /// Capacities of the receipt, storage and transaction streams. Called once at circuit setup.
    fn allocate(&self) -> Capacities;

    /// Constrains the computation over the assigned inputs and declares its outputs.
    ///
    /// Must not branch on witness values: the circuit shape has to be identical for every input.
    fn define(
        &self,
        ctx: &mut Context<F>,
        range: &RangeChip<F>,
        input: &AssignedDataInput<F>,
        output: &mut OutputBuffer<F>,
    );
}

/// The Uniswap V3 implied volatility circuit.
#[derive(Clone, Debug)]
pub struct IvCircuit<F> {
    pub params: IvCircuitParams,
    metric_scale: u64,
    _marker: PhantomData<F>,
}

impl<F: Field> IvCircuit<F> {
    pub fn new(params: IvCircuitParams) -> anyhow::Result<Self> {
        params.validate(F::CAPACITY as usize)?;
        let metric_scale =
            params.metric_scale().ok_or_else(|| anyhow::anyhow!("fee tier scale overflows u64"))?;
        Ok(Self { params, metric_scale, _marker: PhantomData })
    }

    /// Off-circuit evaluation with the same acceptance rules as the circuit.
    pub fn evaluate_native(&self, input: &DataInput) -> anyhow::Result<IvValues> {
        evaluate(&self.params, input)
    }
}

impl<'r, F: Field> IvChip<'r, F> {
    /// In-circuit version of [check_pool_storage](crate::native::check_pool_storage).
    pub fn constrain_pool_storage(
        &self,
        ctx: &mut Context<F>,
        params: &IvCircuitParams,
        tick_record: &AssignedStorage<F>,
        liquidity_record: &AssignedStorage<F>,
    ) {
        let gate = self.gate();
        let pool = encode_addr_to_field::<F>(&params.pool_address);
        for (record, slot) in
            [(tick_record, params.tick_slot), (liquidity_record, params.liquidity_slot)]
        {
            let slot = HiLo::<F>::from(slot);
            gate.assert_is_const(ctx, &record.slot.hi(), &slot.hi());
            gate.assert_is_const(ctx, &record.slot.lo(), &slot.lo());
            gate.assert_is_const(ctx, &record.address, &pool);
        }
        ctx.constrain_equal(&tick_record.block_number, &liquidity_record.block_number);
    }
}

impl<F: Field> AppCircuit<F> for IvCircuit<F> {
    fn allocate(&self) -> Capacities {
        self.params.capacities
    }

    fn define(
        &self,
        ctx: &mut Context<F>,
        range: &RangeChip<F>,
        input: &AssignedDataInput<F>,
        output: &mut OutputBuffer<F>,
    ) {
        let params = &self.params;
        let chip = IvChip::new(range);
        let gate = chip.gate();

        let storage = input.storage_slots();
        let tick_record = storage.get(TICK_STORAGE_IDX);
        let liquidity_record = storage.get(LIQUIDITY_STORAGE_IDX);
        chip.constrain_pool_storage(ctx, params, tick_record, liquidity_record);
        let tick = chip.decode_packed_field(ctx, tick_record.value, params.tick_field);
        let liquidity =
            chip.decode_packed_field(ctx, liquidity_record.value, params.liquidity_field);

        let total_volume =
            chip.total_swap_volume(ctx, params, input.receipts(), tick_record.block_number);

        let band_end = gate.add(ctx, tick, Constant(F::from(params.tick_band)));
        let tick_tvl =
            chip.tick_range_liquidity(ctx, tick, band_end, liquidity, params.tick_bits());
        let metric = chip.volatility(ctx, params, self.metric_scale, total_volume, tick_tvl);
        log::debug!(
            "volume: {:?}, tick tvl: {:?}, iv: {:?}",
            total_volume.value(),
            tick_tvl.value(),
            metric.value()
        );
        output.output_uint(ctx, range, metric, params.output_bits);
    }
}

/// Builds a single-phase halo2 circuit for `app` on `input`, with the outputs as the only public
/// instances.
///
/// Capacities and input lengths are checked before anything is assigned. For stages other than
/// [CircuitBuilderStage::Prover] the circuit configuration is auto-calculated for degree `k`; a prover
/// must set the keygen configuration and break points on the returned builder.
pub fn create_app_circuit<F: Field, A: AppCircuit<F>>(
    stage: CircuitBuilderStage,
    app: &A,
    input: &DataInput,
    k: usize,
    lookup_bits: usize,
) -> anyhow::Result<BaseCircuitBuilder<F>> {
    let capacities = app.allocate();
    capacities.validate()?;
    input.check_capacities(&capacities)?;

    let mut builder = BaseCircuitBuilder::from_stage(stage)
        .use_k(k)
        .use_lookup_bits(lookup_bits)
        .use_instance_columns(1);
    let range = builder.range_chip();
    let ctx = builder.main(0);
    let assigned = input.assign(ctx);
    let mut output = OutputBuffer::default();
    app.define(ctx, &range, &assigned, &mut output);
    builder.assigned_instances[0].extend(output.into_values());

    if !stage.witness_gen_only() {
        let params = builder.calculate_params(Some(MINIMUM_ROWS));
        log::info!("AppCircuit auto-calculated config params:\n {params:#?}");
    }
    Ok(builder)
}

/// Values of the public instances of a circuit built by [create_app_circuit].
pub fn app_instances<F: ScalarField>(builder: &BaseCircuitBuilder<F>) -> Vec<Vec<F>> {
    builder
        .assigned_instances
        .iter()
        .map(|instance| instance.iter().map(|v| *v.value()).collect())
        .collect()
}

/// Convenience for the mock prover: the IV circuit with default degree and lookup bits.
pub fn create_iv_circuit<F: Field>(
    stage: CircuitBuilderStage,
    params: IvCircuitParams,
    input: &DataInput,
) -> anyhow::Result<BaseCircuitBuilder<F>> {
    let app = IvCircuit::<F>::new(params)?;
    create_app_circuit(stage, &app, input, DEFAULT_K, DEFAULT_LOOKUP_BITS)
}
