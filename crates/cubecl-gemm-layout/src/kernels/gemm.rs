use cubecl::prelude::*;
use std::any::type_name;

use crate::components::layout::{
    Fragment, Layout, LayoutEnum, PhysicalLayout, TileConfig, allocate_fragment, fragment_coords,
    fragment_value,
};
use crate::components::memory::Workspace;
use crate::components::{
    FormattedConfigError, GemmProblem, GemmSelection, GemmSetupError, InvalidConfigError,
    Operand, Tile,
};
use crate::config::gemm::GemmLogLevel;
use crate::config::{Logger, TypeNameFormatLevel, type_name_format};

/// Most units a cube may hold on every supported backend.
pub const MAX_UNITS_PER_CUBE: usize = 256;

static UNROLL: bool = false;

static LOGGER: spin::Mutex<Option<Logger>> = spin::Mutex::new(None);

/// Comptime configuration of [gemm_kernel], one tile geometry per operand.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct GemmKernelConfig {
    pub block_m: u32,
    pub block_n: u32,
    pub block_k: u32,
    pub unit_m: u32,
    pub unit_n: u32,
    pub lhs: TileConfig,
    pub rhs: TileConfig,
    pub acc: TileConfig,
    pub out: TileConfig,
}

/// Computes `D = alpha * A * B + beta * C`.
///
/// Each operand is read or written through its own layout, chosen at compile time. The
/// output is split in block tiles, each the work of one cube; every unit of the cube owns
/// a sub-tile of the block and walks the `k` dimension in steps of `block.k`,
/// accumulating in `f32` like a tensor-core multiply-accumulate.
///
/// Everything the layouts rely on is checked here, once, before the kernel is launched:
/// see [validate].
#[allow(clippy::too_many_arguments)]
pub fn launch<R: Runtime, LA: Layout, LB: Layout, LC: Layout, LD: Layout>(
    client: &ComputeClient<R::Server>,
    problem: &GemmProblem,
    selection: &GemmSelection,
    alpha: f32,
    a: &Workspace<R, LA::Elem>,
    b: &Workspace<R, LB::Elem>,
    beta: f32,
    c: &Workspace<R, LC::Elem>,
    d: &Workspace<R, LD::Elem>,
) -> Result<(), GemmSetupError> {
    let shapes = [a.shape(), b.shape(), c.shape(), d.shape()];
    let config = match validate::<LA, LB, LC, LD>(
        problem,
        selection,
        R::supported_line_sizes(),
        shapes,
    ) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("{err}");
            return Err(err);
        }
    };

    let (grid_m, grid_n) = selection.block.grid(problem);
    let (units_m, units_n) = selection.units();
    let cube_count = CubeCount::Static(grid_n as u32, grid_m as u32, 1);
    let cube_dim = CubeDim::new(units_n as u32, units_m as u32, 1);
    let num_k_steps = (problem.k / selection.block.k) as u32;

    log_launch::<LA, LB, LC, LD>(problem, selection, &config, (grid_m, grid_n));

    unsafe {
        gemm_kernel::launch_unchecked::<LA, LB, LC, LD, R>(
            client,
            cube_count,
            cube_dim,
            a.as_tensor_arg(LA::vectorization(config.lhs.line_size)),
            b.as_tensor_arg(LB::vectorization(config.rhs.line_size)),
            c.as_tensor_arg(LC::vectorization(config.acc.line_size)),
            d.as_tensor_arg(LD::vectorization(config.out.line_size)),
            ScalarArg::new(alpha),
            ScalarArg::new(beta),
            ScalarArg::new(num_k_steps),
            config,
        );
    }

    Ok(())
}

/// Checks a launch on the host and builds the kernel configuration.
///
/// The output layout must store every element, operands must be real, the problem must
/// be divisible by the block tile and the block by the unit tile, every tile must be
/// accepted by its layout, and every workspace must have its layout's physical size.
pub fn validate<LA: Layout, LB: Layout, LC: Layout, LD: Layout>(
    problem: &GemmProblem,
    selection: &GemmSelection,
    supported_line_sizes: &[u8],
    shapes: [&[usize]; 4],
) -> Result<GemmKernelConfig, GemmSetupError> {
    let problem = *problem;
    let selection = *selection;
    let block = selection.block;

    let output = LD::to_enum();
    if matches!(output, LayoutEnum::Zero | LayoutEnum::Diagonal) {
        return Err(FormattedConfigError::new(move || {
            format!("Layout {output:?} can't hold the output D, it doesn't store every element")
        })
        .into());
    }

    check_real(Operand::A, LA::to_enum())?;
    check_real(Operand::B, LB::to_enum())?;
    check_real(Operand::C, LC::to_enum())?;
    check_real(Operand::D, output)?;

    if block.m == 0 || block.n == 0 || block.k == 0 || selection.unit_m == 0 || selection.unit_n == 0
    {
        return Err(FormattedConfigError::new(move || {
            format!("Selection {selection} can't have an empty tile")
        })
        .into());
    }

    if problem.m % block.m != 0 || problem.n % block.n != 0 || problem.k % block.k != 0 {
        return Err(FormattedConfigError::new(move || {
            format!("Problem {problem} is not divisible by the block tile {block}")
        })
        .into());
    }

    if block.m % selection.unit_m != 0 || block.n % selection.unit_n != 0 {
        return Err(FormattedConfigError::new(move || {
            format!("Block tile {block} is not divisible by the unit tile of {selection}")
        })
        .into());
    }

    if selection.num_units() > MAX_UNITS_PER_CUBE {
        return Err(FormattedConfigError::new(move || {
            format!(
                "Selection {selection} needs {} units per cube, at most {MAX_UNITS_PER_CUBE} are available",
                selection.num_units()
            )
        })
        .into());
    }

    LA::check_logical_size(problem.lhs_shape())?;
    LB::check_logical_size(problem.rhs_shape())?;
    LC::check_logical_size(problem.out_shape())?;
    LD::check_logical_size(problem.out_shape())?;

    let (unit_m, unit_n, block_k) = (
        selection.unit_m as u32,
        selection.unit_n as u32,
        block.k as u32,
    );
    let config = GemmKernelConfig {
        block_m: block.m as u32,
        block_n: block.n as u32,
        block_k,
        unit_m,
        unit_n,
        lhs: LA::tile_config(unit_m, block_k, supported_line_sizes),
        rhs: LB::tile_config(block_k, unit_n, supported_line_sizes),
        acc: LC::tile_config(unit_m, unit_n, supported_line_sizes),
        out: LD::tile_config(unit_m, unit_n, supported_line_sizes),
    };

    LA::check(&config.lhs)?;
    LB::check(&config.rhs)?;
    LC::check(&config.acc)?;
    LD::check(&config.out)?;

    let [a, b, c, d] = shapes;
    check_shape(Operand::A, LA::physical_size(problem.lhs_shape()), a)?;
    check_shape(Operand::B, LB::physical_size(problem.rhs_shape()), b)?;
    check_shape(Operand::C, LC::physical_size(problem.out_shape()), c)?;
    check_shape(Operand::D, LD::physical_size(problem.out_shape()), d)?;

    Ok(config)
}

// The kernel multiplies real numbers only.
fn check_real(operand: Operand, layout: LayoutEnum) -> Result<(), InvalidConfigError> {
    match layout {
        LayoutEnum::Interleaved(_) | LayoutEnum::Split(_) => Err(FormattedConfigError::new(
            move || format!("Operand {operand:?} has complex layout {layout:?}, gemm is real-only"),
        )),
        _ => Ok(()),
    }
}

fn check_shape(operand: Operand, expected: Vec<usize>, actual: &[usize]) -> Result<(), GemmSetupError> {
    if expected == actual {
        Ok(())
    } else {
        Err(GemmSetupError::ShapeMismatch {
            operand,
            expected,
            actual: actual.to_vec(),
        })
    }
}

#[cube(launch_unchecked)]
fn gemm_kernel<LA: Layout, LB: Layout, LC: Layout, LD: Layout>(
    a: &Tensor<Line<LA::Elem>>,
    b: &Tensor<Line<LB::Elem>>,
    c: &Tensor<Line<LC::Elem>>,
    d: &mut Tensor<Line<LD::Elem>>,
    alpha: f32,
    beta: f32,
    num_k_steps: u32,
    #[comptime] config: GemmKernelConfig,
) {
    let block_row = CUBE_POS_Y * config.block_m;
    let block_col = CUBE_POS_X * config.block_n;
    let unit_row = UNIT_POS_Y * config.unit_m;
    let unit_col = UNIT_POS_X * config.unit_n;

    let mut acc = Array::<f32>::new(comptime!(config.unit_m * config.unit_n));
    #[unroll]
    for i in 0..comptime!(config.unit_m * config.unit_n) {
        acc[i] = f32::new(0.0);
    }

    let mut lhs = allocate_fragment::<LA::Elem>(config.lhs);
    let mut rhs = allocate_fragment::<LB::Elem>(config.rhs);

    for step in 0..num_k_steps {
        let k_offset = step * config.block_k;
        LA::load(
            a,
            &mut lhs,
            Tile::new((block_row, k_offset), (unit_row, 0u32)),
            config.lhs,
        );
        LB::load(
            b,
            &mut rhs,
            Tile::new((k_offset, block_col), (0u32, unit_col)),
            config.rhs,
        );
        multiply_accumulate::<LA::Elem, LB::Elem>(&lhs, &rhs, &mut acc, config);
    }

    let out_tile = Tile::new((block_row, block_col), (unit_row, unit_col));
    let mut c_fragment = allocate_fragment::<LC::Elem>(config.acc);
    LC::load(c, &mut c_fragment, out_tile, config.acc);

    let mut d_fragment = allocate_fragment::<LD::Elem>(config.out);
    combine::<LC::Elem, LD::Elem>(&acc, &c_fragment, &mut d_fragment, alpha, beta, config);
    LD::store(d, &d_fragment, out_tile, config.out);
}

/// Accumulates the product of two fragments into a row-major `unit_m x unit_n` array.
#[cube]
fn multiply_accumulate<EA: Numeric, EB: Numeric>(
    lhs: &Fragment<EA>,
    rhs: &Fragment<EB>,
    acc: &mut Array<f32>,
    #[comptime] config: GemmKernelConfig,
) {
    #[unroll(UNROLL)]
    for i in 0..config.unit_m {
        #[unroll(UNROLL)]
        for k in 0..config.block_k {
            let lhs_value = f32::cast_from(fragment_value::<EA>(lhs, i, k, config.lhs));
            #[unroll(UNROLL)]
            for j in 0..config.unit_n {
                let rhs_value = f32::cast_from(fragment_value::<EB>(rhs, k, j, config.rhs));
                acc[i * config.unit_n + j] += lhs_value * rhs_value;
            }
        }
    }
}

/// Fills the output fragment with `alpha * acc + beta * C`, in the output load order.
#[cube]
fn combine<EC: Numeric, ED: Numeric>(
    acc: &Array<f32>,
    c_fragment: &Fragment<EC>,
    d_fragment: &mut Fragment<ED>,
    alpha: f32,
    beta: f32,
    #[comptime] config: GemmKernelConfig,
) {
    let out = comptime!(config.out);

    #[unroll]
    for register in 0..comptime!(out.num_registers()) {
        let mut line = Line::empty(out.register_size);
        #[unroll]
        for lane in 0..out.register_size {
            let (row, col) = fragment_coords(register, lane, out);
            let c_value = f32::cast_from(fragment_value::<EC>(c_fragment, row, col, config.acc));
            line[lane] = ED::cast_from(alpha * acc[row * config.unit_n + col] + beta * c_value);
        }
        d_fragment[register] = line;
    }
}

fn log_launch<LA: Layout, LB: Layout, LC: Layout, LD: Layout>(
    problem: &GemmProblem,
    selection: &GemmSelection,
    config: &GemmKernelConfig,
    grid: (usize, usize),
) {
    let mut state = LOGGER.lock();
    let logger = state.get_or_insert_with(Logger::new);
    let level = logger.log_level_gemm();

    if level == GemmLogLevel::Disabled {
        return;
    }

    let name = |name: &str| type_name_format(name, TypeNameFormatLevel::Balanced);
    logger.log_gemm(&format!(
        "Gemm {problem} {selection} a={} b={} c={} d={}",
        name(type_name::<LA>()),
        name(type_name::<LB>()),
        name(type_name::<LC>()),
        name(type_name::<LD>()),
    ));

    if level == GemmLogLevel::Full {
        logger.log_gemm(&format!(
            "Gemm grid={}x{} units={}x{} config={config:?}",
            grid.0,
            grid.1,
            selection.units().0,
            selection.units().1,
        ));
    }
}
