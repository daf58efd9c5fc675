#![allow(dead_code)]

use cubecl::prelude::*;
use cubecl_gemm_layout::layout::{LayoutEnum, PhysicalLayout};
use cubecl_gemm_layout::memory::Workspace;
use cubecl_gemm_layout::{Element, MatrixSize, linearise};
use half::{bf16, f16};
use num_complex::Complex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

cfg_if::cfg_if! {
    if #[cfg(feature = "cuda")] {
        pub type TestRuntime = cubecl::cuda::CudaRuntime;
    } else if #[cfg(feature = "cpu")] {
        pub type TestRuntime = cubecl::cpu::CpuRuntime;
    } else {
        pub type TestRuntime = cubecl::wgpu::WgpuRuntime;
    }
}

pub type TestClient =
    ComputeClient<<TestRuntime as Runtime>::Server>;

pub type TestWorkspace<E> = Workspace<TestRuntime, E>;

pub fn client() -> TestClient {
    TestRuntime::client(&Default::default())
}

pub fn supported_line_sizes() -> &'static [u8] {
    TestRuntime::supported_line_sizes()
}

/// Whether the backend computes with `E`. Tests on unsupported elements return early.
pub fn supports<E: Element>(client: &TestClient) -> bool {
    client
        .properties()
        .supports_type(E::as_type_native_unchecked())
}

/// Element the tests can generate data for.
pub trait Sample: Element {
    fn from_f32(value: f32) -> Self;
    fn into_f32(self) -> f32;
    /// Norm-relative tolerance of a gemm computed from operands of this precision.
    fn tolerance() -> f32;
}

impl Sample for f16 {
    fn from_f32(value: f32) -> Self {
        f16::from_f32(value)
    }
    fn into_f32(self) -> f32 {
        self.to_f32()
    }
    fn tolerance() -> f32 {
        f16::EPSILON.to_f32().sqrt()
    }
}

impl Sample for bf16 {
    fn from_f32(value: f32) -> Self {
        bf16::from_f32(value)
    }
    fn into_f32(self) -> f32 {
        self.to_f32()
    }
    fn tolerance() -> f32 {
        bf16::EPSILON.to_f32().sqrt()
    }
}

impl Sample for f32 {
    fn from_f32(value: f32) -> Self {
        value
    }
    fn into_f32(self) -> f32 {
        self
    }
    fn tolerance() -> f32 {
        1e-4
    }
}

/// Generates `len` random f32 in `[-1, 1)` with a fixed seed.
pub fn random_data(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(-1.0f32..1.0)).collect()
}

/// Random data rounded to `E`, so that it survives a trip through a workspace.
pub fn random_samples<E: Sample>(len: usize, seed: u64) -> Vec<f32> {
    random_data(len, seed)
        .into_iter()
        .map(|value| E::from_f32(value).into_f32())
        .collect()
}

pub fn random_scalar(seed: u64) -> f32 {
    random_data(1, seed)[0]
}

/// Random row-major logical values of a matrix `L` can represent: zero off the diagonal
/// for diagonal layouts, zero everywhere for zero layouts.
pub fn random_matrix<L: PhysicalLayout>(size: MatrixSize, seed: u64) -> Vec<f32>
where
    L::Elem: Sample,
{
    let (rows, cols) = size;
    let mut values = random_samples::<L::Elem>(rows * cols, seed);
    match L::to_enum() {
        LayoutEnum::Diagonal => {
            for row in 0..rows {
                for col in (0..cols).filter(|col| *col != row) {
                    values[row * cols + col] = 0.0;
                }
            }
        }
        LayoutEnum::Zero => values.iter_mut().for_each(|value| *value = 0.0),
        _ => {}
    }
    values
}

/// Physical data of `L` for a real matrix given by its row-major logical values.
pub fn pack<L: PhysicalLayout>(values: &[f32], size: MatrixSize) -> Vec<L::Elem>
where
    L::Elem: Sample,
{
    let (rows, cols) = size;
    assert_eq!(values.len(), rows * cols);

    let shape = L::physical_size(size);
    let mut data = vec![L::Elem::from_f32(0.0); shape.iter().product()];
    match L::to_enum() {
        LayoutEnum::Aligned(major) => {
            for row in 0..rows {
                for col in 0..cols {
                    let index = linearise(&major.physical_index(row, col), &shape);
                    data[index] = L::Elem::from_f32(values[row * cols + col]);
                }
            }
        }
        LayoutEnum::Diagonal => {
            for row in 0..rows {
                data[row] = L::Elem::from_f32(values[row * cols + row]);
            }
        }
        LayoutEnum::Zero => {}
        layout => panic!("{layout:?} doesn't hold a real matrix"),
    }
    data
}

/// Row-major logical values of a real matrix from the physical data of `L`.
pub fn unpack<L: PhysicalLayout>(data: &[L::Elem], size: MatrixSize) -> Vec<f32>
where
    L::Elem: Sample,
{
    let (rows, cols) = size;
    let shape = L::physical_size(size);
    let mut values = vec![0.0; rows * cols];
    match L::to_enum() {
        LayoutEnum::Aligned(major) => {
            for row in 0..rows {
                for col in 0..cols {
                    let index = linearise(&major.physical_index(row, col), &shape);
                    values[row * cols + col] = data[index].into_f32();
                }
            }
        }
        LayoutEnum::Diagonal => {
            for row in 0..rows {
                values[row * cols + row] = data[row].into_f32();
            }
        }
        LayoutEnum::Zero => {}
        layout => panic!("{layout:?} doesn't hold a real matrix"),
    }
    values
}

/// Workspace of `L` holding a real matrix given by its row-major logical values.
pub fn workspace<L: PhysicalLayout>(
    client: &TestClient,
    values: &[f32],
    size: MatrixSize,
) -> TestWorkspace<L::Elem>
where
    L::Elem: Sample,
{
    Workspace::from_data(client, L::physical_size(size), &pack::<L>(values, size))
}

/// Reads back the row-major logical values of a real matrix.
pub fn read_matrix<L: PhysicalLayout>(
    client: &TestClient,
    workspace: &TestWorkspace<L::Elem>,
    size: MatrixSize,
) -> Vec<f32>
where
    L::Elem: Sample,
{
    unpack::<L>(&workspace.read(client), size)
}

/// Random row-major complex matrix.
pub fn random_complex(size: MatrixSize, seed: u64) -> Vec<Complex<f32>> {
    let len = size.0 * size.1;
    random_data(len, seed)
        .into_iter()
        .zip(random_data(len, seed + 1))
        .map(|(re, im)| Complex::new(re, im))
        .collect()
}

/// Workspace of an interleaved or split layout holding a complex matrix.
pub fn complex_workspace<L: PhysicalLayout<Elem = f32>>(
    client: &TestClient,
    values: &[Complex<f32>],
    size: MatrixSize,
) -> TestWorkspace<f32> {
    let (rows, cols) = size;
    let shape = L::physical_size(size);

    match L::to_enum() {
        LayoutEnum::Interleaved(major) => {
            let mut data = vec![Complex::new(0.0, 0.0); shape.iter().product()];
            for row in 0..rows {
                for col in 0..cols {
                    data[linearise(&major.physical_index(row, col), &shape)] =
                        values[row * cols + col];
                }
            }
            Workspace::from_complex(client, shape, &data)
        }
        LayoutEnum::Split(major) => {
            let mut data = vec![0.0; shape.iter().product()];
            for row in 0..rows {
                for col in 0..cols {
                    let [x, y] = major.physical_index(row, col);
                    let value = values[row * cols + col];
                    data[linearise(&[x, y, 0], &shape)] = value.re;
                    data[linearise(&[x, y, 1], &shape)] = value.im;
                }
            }
            Workspace::from_data(client, shape, &data)
        }
        layout => panic!("{layout:?} doesn't hold a complex matrix"),
    }
}

/// Reads back the row-major logical values of a complex matrix.
pub fn read_complex_matrix<L: PhysicalLayout<Elem = f32>>(
    client: &TestClient,
    workspace: &TestWorkspace<f32>,
    size: MatrixSize,
) -> Vec<Complex<f32>> {
    let (rows, cols) = size;
    let shape = L::physical_size(size);
    let mut values = vec![Complex::new(0.0, 0.0); rows * cols];

    match L::to_enum() {
        LayoutEnum::Interleaved(major) => {
            let data = workspace.read_complex(client);
            for row in 0..rows {
                for col in 0..cols {
                    values[row * cols + col] =
                        data[linearise(&major.physical_index(row, col), &shape)];
                }
            }
        }
        LayoutEnum::Split(major) => {
            let data = workspace.read(client);
            for row in 0..rows {
                for col in 0..cols {
                    let [x, y] = major.physical_index(row, col);
                    values[row * cols + col] = Complex::new(
                        data[linearise(&[x, y, 0], &shape)],
                        data[linearise(&[x, y, 1], &shape)],
                    );
                }
            }
        }
        layout => panic!("{layout:?} doesn't hold a complex matrix"),
    }
    values
}

/// Checks that `actual` is close to `expected` in the norm sense:
/// `||actual - expected|| <= rtol * max(||actual||, ||expected||)`.
pub fn assert_equals_approx(actual: &[f32], expected: &[f32], rtol: f32) -> Result<(), String> {
    if actual.len() != expected.len() {
        return Err(format!(
            "Lengths differ: actual={} expected={}",
            actual.len(),
            expected.len()
        ));
    }

    let norm = |values: &mut dyn Iterator<Item = f32>| values.map(|v| v * v).sum::<f32>().sqrt();
    let diff = norm(&mut actual.iter().zip(expected).map(|(a, e)| a - e));
    let scale = norm(&mut actual.iter().copied()).max(norm(&mut expected.iter().copied()));

    if diff > rtol * scale {
        let (index, a, e) = actual
            .iter()
            .zip(expected)
            .enumerate()
            .map(|(i, (a, e))| (i, *a, *e))
            .max_by(|x, y| (x.1 - x.2).abs().total_cmp(&(y.1 - y.2).abs()))
            .unwrap_or((0, 0.0, 0.0));

        return Err(format!(
            "Values differ more than rtol: diff={diff} scale={scale} rtol={rtol}, worst index={index} actual={a} expected={e}"
        ));
    }

    Ok(())
}
