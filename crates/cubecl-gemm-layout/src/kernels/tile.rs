use cubecl::prelude::*;

use crate::components::layout::{HostFragment, Layout, PhysicalLayout, TileConfig, allocate_fragment};
use crate::components::memory::Workspace;
use crate::components::{Coords2d, FormattedConfigError, GemmSetupError, Tile};

#[cube(launch_unchecked)]
fn load_tile_kernel<L: Layout>(
    workspace: &Tensor<Line<L::Elem>>,
    output: &mut Array<Line<L::Elem>>,
    base_row: u32,
    base_col: u32,
    offset_row: u32,
    offset_col: u32,
    #[comptime] config: TileConfig,
) {
    let tile = Tile::new((base_row, base_col), (offset_row, offset_col));
    let mut fragment = allocate_fragment::<L::Elem>(config);
    L::load(workspace, &mut fragment, tile, config);

    #[unroll]
    for register in 0..comptime!(config.num_registers()) {
        output[register] = fragment[register];
    }
}

#[cube(launch_unchecked)]
fn store_tile_kernel<L: Layout>(
    workspace: &mut Tensor<Line<L::Elem>>,
    input: &Array<Line<L::Elem>>,
    base_row: u32,
    base_col: u32,
    offset_row: u32,
    offset_col: u32,
    #[comptime] config: TileConfig,
) {
    let tile = Tile::new((base_row, base_col), (offset_row, offset_col));
    let mut fragment = allocate_fragment::<L::Elem>(config);

    #[unroll]
    for register in 0..comptime!(config.num_registers()) {
        fragment[register] = input[register];
    }

    L::store(workspace, &fragment, tile, config);
}

/// Loads the `size` tile at `base + offset` of a workspace with a single unit.
///
/// Fragments are what one unit of [gemm](crate::kernels::gemm) would hold,
/// copied back to the host.
pub fn load_tile<R: Runtime, L: Layout>(
    client: &ComputeClient<R::Server>,
    workspace: &Workspace<R, L::Elem>,
    base: Coords2d,
    offset: Coords2d,
    size: Coords2d,
) -> Result<HostFragment<L::Elem>, GemmSetupError> {
    let config = L::tile_config(size.0, size.1, R::supported_line_sizes());
    L::check(&config)?;

    let len = (config.num_registers() * config.register_size) as usize;
    let output = client.empty(len * size_of::<L::Elem>());

    unsafe {
        load_tile_kernel::launch_unchecked::<L, R>(
            client,
            CubeCount::Static(1, 1, 1),
            CubeDim::new(1, 1, 1),
            workspace.as_tensor_arg(L::vectorization(config.line_size)),
            ArrayArg::from_raw_parts::<L::Elem>(&output, len, config.register_size as u8),
            ScalarArg::new(base.0),
            ScalarArg::new(base.1),
            ScalarArg::new(offset.0),
            ScalarArg::new(offset.1),
            config,
        );
    }

    let bytes = client.read_one(output);
    Ok(HostFragment::new(
        L::Elem::from_bytes(&bytes)[..len].to_vec(),
        config,
    ))
}

/// Stores `fragment` to the tile at `base + offset` of a workspace with a single unit.
pub fn store_tile<R: Runtime, L: Layout>(
    client: &ComputeClient<R::Server>,
    workspace: &Workspace<R, L::Elem>,
    fragment: &HostFragment<L::Elem>,
    base: Coords2d,
    offset: Coords2d,
) -> Result<(), GemmSetupError> {
    let config = fragment.config();
    let expected = L::tile_config(config.rows, config.cols, R::supported_line_sizes());
    if config != expected {
        return Err(FormattedConfigError::new(move || {
            format!("Fragment of {config:?} doesn't match the layout tiles {expected:?}")
        })
        .into());
    }
    L::check(&config)?;

    let input = client.create(L::Elem::as_bytes(fragment.values()));

    unsafe {
        store_tile_kernel::launch_unchecked::<L, R>(
            client,
            CubeCount::Static(1, 1, 1),
            CubeDim::new(1, 1, 1),
            workspace.as_tensor_arg(L::vectorization(config.line_size)),
            ArrayArg::from_raw_parts::<L::Elem>(
                &input,
                fragment.values().len(),
                config.register_size as u8,
            ),
            ScalarArg::new(base.0),
            ScalarArg::new(base.1),
            ScalarArg::new(offset.0),
            ScalarArg::new(offset.1),
            config,
        );
    }

    Ok(())
}
