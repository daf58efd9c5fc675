mod common;

use common::*;
use cubecl_gemm_layout::kernels::gemm::launch;
use cubecl_gemm_layout::kernels::naive::{expand_diagonal, gemm_reference};
use cubecl_gemm_layout::layout::*;
use cubecl_gemm_layout::memory::Workspace;
use cubecl_gemm_layout::{Element, GemmProblem, GemmSelection, GemmSetupError, Operand, TileSize};
use half::f16;

/// Runs `D = alpha * A * B + beta * C` on random operands and compares with the reference.
///
/// Returns without running when the backend lacks one of the elements.
fn run<LA: Layout, LB: Layout, LC: Layout, LD: Layout>(
    problem: GemmProblem,
    selection: GemmSelection,
    seed: u64,
) where
    LA::Elem: Sample,
    LB::Elem: Sample,
    LC::Elem: Sample,
    LD::Elem: Sample,
{
    let client = client();
    if !(supports::<LA::Elem>(&client)
        && supports::<LB::Elem>(&client)
        && supports::<LC::Elem>(&client)
        && supports::<LD::Elem>(&client))
    {
        return;
    }

    let (alpha, beta) = (random_scalar(seed + 100), random_scalar(seed + 101));
    let a_ref = random_matrix::<LA>(problem.lhs_shape(), seed);
    let b_ref = random_matrix::<LB>(problem.rhs_shape(), seed + 1);
    let c_ref = random_matrix::<LC>(problem.out_shape(), seed + 2);

    let a = workspace::<LA>(&client, &a_ref, problem.lhs_shape());
    let b = workspace::<LB>(&client, &b_ref, problem.rhs_shape());
    let c = workspace::<LC>(&client, &c_ref, problem.out_shape());
    let d = TestWorkspace::<LD::Elem>::zeros::<LD>(&client, problem.out_shape());

    launch::<TestRuntime, LA, LB, LC, LD>(&client, &problem, &selection, alpha, &a, &b, beta, &c, &d)
        .unwrap();

    let actual = read_matrix::<LD>(&client, &d, problem.out_shape());
    let expected = gemm_reference(&problem, alpha, &a_ref, &b_ref, beta, &c_ref);
    let tolerance = [
        LA::Elem::tolerance(),
        LB::Elem::tolerance(),
        LC::Elem::tolerance(),
        LD::Elem::tolerance(),
    ]
    .into_iter()
    .fold(0.0, f32::max);

    if let Err(err) = assert_equals_approx(&actual, &expected, tolerance) {
        panic!("{problem} with {selection}: {err}");
    }
}

fn selection(block: (usize, usize, usize), unit: (usize, usize)) -> GemmSelection {
    GemmSelection::new(TileSize::new(block.0, block.1, block.2), unit.0, unit.1)
}

#[test_log::test]
fn gemm_128_no_transpose() {
    run::<AlignedColMajor<f16>, AlignedColMajor<f16>, AlignedColMajor<f32>, AlignedColMajor<f32>>(
        GemmProblem::new(128, 128, 128),
        selection((64, 64, 16), (8, 8)),
        1,
    );
}

#[test_log::test]
fn gemm_256_lhs_transposed() {
    run::<AlignedRowMajor<f16>, AlignedColMajor<f16>, AlignedColMajor<f32>, AlignedColMajor<f32>>(
        GemmProblem::new(256, 256, 256),
        selection((64, 64, 16), (8, 8)),
        2,
    );
}

#[test_log::test]
fn gemm_all_transposes_small_sizes() {
    fn sizes<LA: Layout, LB: Layout>(seed: u64)
    where
        LA::Elem: Sample,
        LB::Elem: Sample,
    {
        for (index, (m, n, k)) in [(16, 16, 16), (32, 16, 64), (64, 32, 32), (16, 64, 16)]
            .into_iter()
            .enumerate()
        {
            run::<LA, LB, AlignedColMajor<f32>, AlignedRowMajor<f32>>(
                GemmProblem::new(m, n, k),
                selection((16, 16, 16), (8, 8)),
                seed + index as u64 * 10,
            );
        }
    }

    sizes::<AlignedColMajor<f32>, AlignedColMajor<f32>>(10);
    sizes::<AlignedRowMajor<f32>, AlignedColMajor<f32>>(20);
    sizes::<AlignedColMajor<f32>, AlignedRowMajor<f32>>(30);
    sizes::<AlignedRowMajor<f32>, AlignedRowMajor<f32>>(40);

    sizes::<AlignedColMajor<f16>, AlignedColMajor<f16>>(50);
    sizes::<AlignedRowMajor<f16>, AlignedColMajor<f16>>(60);
    sizes::<AlignedColMajor<f16>, AlignedRowMajor<f16>>(70);
    sizes::<AlignedRowMajor<f16>, AlignedRowMajor<f16>>(80);
}

#[test_log::test]
fn gemm_128_diagonal_lhs() {
    let client = client();
    if !supports::<f16>(&client) {
        return;
    }
    let problem = GemmProblem::new(128, 128, 128);
    let (alpha, beta) = (random_scalar(200), random_scalar(201));

    let diagonal = random_samples::<f16>(problem.m, 3);
    let b_ref = random_matrix::<AlignedColMajor<f16>>(problem.rhs_shape(), 4);
    let c_ref = random_matrix::<AlignedColMajor<f32>>(problem.out_shape(), 5);

    let diagonal_data = diagonal.iter().map(|value| f16::from_f32(*value)).collect::<Vec<_>>();
    let a = Workspace::from_data(
        &client,
        Diagonal::<f16>::physical_size(problem.lhs_shape()),
        &diagonal_data,
    );
    let b = workspace::<AlignedColMajor<f16>>(&client, &b_ref, problem.rhs_shape());
    let c = workspace::<AlignedColMajor<f32>>(&client, &c_ref, problem.out_shape());
    let d = TestWorkspace::<f32>::zeros::<AlignedColMajor<f32>>(&client, problem.out_shape());

    launch::<TestRuntime, Diagonal<f16>, AlignedColMajor<f16>, AlignedColMajor<f32>, AlignedColMajor<f32>>(
        &client,
        &problem,
        &selection((64, 64, 16), (8, 8)),
        alpha,
        &a,
        &b,
        beta,
        &c,
        &d,
    )
    .unwrap();

    let actual = read_matrix::<AlignedColMajor<f32>>(&client, &d, problem.out_shape());
    let expected = gemm_reference(&problem, alpha, &expand_diagonal(&diagonal), &b_ref, beta, &c_ref);
    assert_equals_approx(&actual, &expected, f16::tolerance()).unwrap();
}

#[test_log::test]
fn gemm_diagonal_rhs() {
    run::<AlignedRowMajor<f32>, Diagonal<f32>, AlignedColMajor<f32>, AlignedColMajor<f32>>(
        GemmProblem::new(64, 64, 64),
        selection((32, 32, 16), (8, 8)),
        6,
    );
}

#[test_log::test]
fn gemm_padded_operands() {
    run::<
        Padded<AlignedColMajor<f32>, 4>,
        Padded<AlignedRowMajor<f32>, 8>,
        Padded<AlignedColMajor<f32>, 4>,
        Padded<AlignedRowMajor<f32>, 4>,
    >(GemmProblem::new(64, 32, 32), selection((32, 16, 16), (8, 8)), 7);
}

#[test_log::test]
fn gemm_zero_accumulator() {
    run::<AlignedColMajor<f32>, AlignedRowMajor<f32>, Zero<f32>, AlignedColMajor<f32>>(
        GemmProblem::new(64, 64, 32),
        selection((32, 32, 16), (8, 8)),
        8,
    );
}

#[test_log::test]
fn gemm_half_output() {
    run::<AlignedColMajor<f16>, AlignedColMajor<f16>, AlignedColMajor<f16>, AlignedRowMajor<f16>>(
        GemmProblem::new(64, 64, 64),
        selection((32, 32, 16), (8, 8)),
        9,
    );
}

#[test_log::test]
fn launch_rejects_outputs_that_drop_elements() {
    let client = client();
    let problem = GemmProblem::new(32, 32, 32);
    let selection = selection((16, 16, 16), (8, 8));
    let a = TestWorkspace::<f32>::zeros::<AlignedColMajor<f32>>(&client, problem.lhs_shape());
    let b = TestWorkspace::<f32>::zeros::<AlignedColMajor<f32>>(&client, problem.rhs_shape());
    let c = TestWorkspace::<f32>::zeros::<AlignedColMajor<f32>>(&client, problem.out_shape());
    let zero = TestWorkspace::<f32>::zeros::<Zero<f32>>(&client, problem.out_shape());
    let diagonal = TestWorkspace::<f32>::zeros::<Diagonal<f32>>(&client, problem.out_shape());

    let into_zero = launch::<TestRuntime, AlignedColMajor<f32>, AlignedColMajor<f32>, AlignedColMajor<f32>, Zero<f32>>(
        &client, &problem, &selection, 1.0, &a, &b, 0.0, &c, &zero,
    );
    let into_diagonal = launch::<
        TestRuntime,
        AlignedColMajor<f32>,
        AlignedColMajor<f32>,
        AlignedColMajor<f32>,
        Diagonal<f32>,
    >(&client, &problem, &selection, 1.0, &a, &b, 0.0, &c, &diagonal);

    assert!(matches!(into_zero, Err(GemmSetupError::InvalidConfig(_))));
    assert!(matches!(into_diagonal, Err(GemmSetupError::InvalidConfig(_))));
}

#[test_log::test]
fn launch_rejects_misshapen_output() {
    let client = client();
    let problem = GemmProblem::new(32, 32, 32);
    let a = TestWorkspace::<f32>::zeros::<AlignedColMajor<f32>>(&client, problem.lhs_shape());
    let b = TestWorkspace::<f32>::zeros::<AlignedColMajor<f32>>(&client, problem.rhs_shape());
    let c = TestWorkspace::<f32>::zeros::<AlignedColMajor<f32>>(&client, problem.out_shape());
    // Row-major physical shape given to a column-major output.
    let d = TestWorkspace::<f32>::zeros::<AlignedColMajor<f32>>(&client, (32, 16));

    let result = launch::<
        TestRuntime,
        AlignedColMajor<f32>,
        AlignedColMajor<f32>,
        AlignedColMajor<f32>,
        AlignedColMajor<f32>,
    >(
        &client,
        &problem,
        &selection((16, 16, 16), (8, 8)),
        1.0,
        &a,
        &b,
        0.0,
        &c,
        &d,
    );

    match result {
        Err(GemmSetupError::ShapeMismatch { operand, .. }) => assert_eq!(operand, Operand::D),
        other => panic!("Expected a shape mismatch on D, got {other:?}"),
    }
}

#[test_log::test]
fn launch_rejects_tiles_of_partial_lines() {
    if f32::line_size(supported_line_sizes()) == 1 {
        return;
    }
    let client = client();
    let problem = GemmProblem::new(32, 32, 32);
    let a = TestWorkspace::<f32>::zeros::<Diagonal<f32>>(&client, problem.lhs_shape());
    let padded = TestWorkspace::<f32>::zeros::<Padded<AlignedColMajor<f32>, 1>>(
        &client,
        problem.lhs_shape(),
    );
    let b = TestWorkspace::<f32>::zeros::<AlignedRowMajor<f32>>(&client, problem.rhs_shape());
    let c = TestWorkspace::<f32>::zeros::<AlignedRowMajor<f32>>(&client, problem.out_shape());
    let d = TestWorkspace::<f32>::zeros::<AlignedRowMajor<f32>>(&client, problem.out_shape());

    // Units of two rows can't hold whole column-major lines of A.
    let diagonal = launch::<
        TestRuntime,
        Diagonal<f32>,
        AlignedRowMajor<f32>,
        AlignedRowMajor<f32>,
        AlignedRowMajor<f32>,
    >(
        &client,
        &problem,
        &selection((16, 16, 16), (2, 8)),
        1.0,
        &a,
        &b,
        0.0,
        &c,
        &d,
    );
    let misaligned_padding = launch::<
        TestRuntime,
        Padded<AlignedColMajor<f32>, 1>,
        AlignedRowMajor<f32>,
        AlignedRowMajor<f32>,
        AlignedRowMajor<f32>,
    >(
        &client,
        &problem,
        &selection((16, 16, 16), (8, 8)),
        1.0,
        &padded,
        &b,
        0.0,
        &c,
        &d,
    );

    assert!(matches!(diagonal, Err(GemmSetupError::InvalidConfig(_))));
    assert!(matches!(misaligned_padding, Err(GemmSetupError::InvalidConfig(_))));
    assert!(d.read(&client).iter().all(|value| *value == 0.0));
}
