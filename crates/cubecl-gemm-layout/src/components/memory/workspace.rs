use cubecl::prelude::*;
use cubecl::server::Handle;
use num_complex::Complex;
use std::marker::PhantomData;

use crate::components::layout::PhysicalLayout;
use crate::components::{Element, MatrixSize, TRANSACTION_BYTES, contiguous_strides};

/// Device buffer holding the physical representation of one operand.
///
/// The buffer is contiguous, with the first physical dimension varying fastest.
/// Interleaved complex workspaces hold two scalars per physical element, so the tensor
/// seen by kernels has a leading dimension twice as long as the physical shape.
pub struct Workspace<R: Runtime, E: Element> {
    pub handle: Handle,
    shape: Vec<usize>,
    tensor_shape: Vec<usize>,
    strides: Vec<usize>,
    len: usize,
    _runtime: PhantomData<(R, E)>,
}

impl<R: Runtime, E: Element> Workspace<R, E> {
    /// A zero-filled workspace with the physical shape of `L` for a matrix of
    /// `logical_size`.
    pub fn zeros<L: PhysicalLayout<Elem = E>>(
        client: &ComputeClient<R::Server>,
        logical_size: MatrixSize,
    ) -> Self {
        let shape = L::physical_size(logical_size);
        let len = shape.iter().product::<usize>() * L::ENTRY_SIZE;
        let handle = client.create(&vec![0u8; allocation_bytes::<E>(len)]);

        Self::new(handle, shape, len, L::ENTRY_SIZE)
    }

    /// A workspace of the given physical shape filled with `data`, in memory order.
    pub fn from_data(
        client: &ComputeClient<R::Server>,
        shape: Vec<usize>,
        data: &[E],
    ) -> Self {
        Self::from_entries(client, shape, data, 1)
    }

    /// A complex workspace of the given physical shape, with `(re, im)` pairs in memory order.
    pub fn from_complex(
        client: &ComputeClient<R::Server>,
        shape: Vec<usize>,
        data: &[Complex<E>],
    ) -> Self {
        Self::from_entries(client, shape, bytemuck::cast_slice(data), 2)
    }

    fn from_entries(
        client: &ComputeClient<R::Server>,
        shape: Vec<usize>,
        data: &[E],
        entry_size: usize,
    ) -> Self {
        let handle = if data.is_empty() {
            client.create(&vec![0u8; allocation_bytes::<E>(0)])
        } else {
            client.create(E::as_bytes(data))
        };

        Self::new(handle, shape, data.len(), entry_size)
    }

    /// Copies the workspace back to the host.
    pub fn read(&self, client: &ComputeClient<R::Server>) -> Vec<E> {
        let bytes = client.read_one(self.handle.clone());
        E::from_bytes(&bytes)[..self.len].to_vec()
    }

    /// Copies a complex workspace back to the host as `(re, im)` pairs.
    pub fn read_complex(&self, client: &ComputeClient<R::Server>) -> Vec<Complex<E>> {
        self.read(client)
            .chunks_exact(2)
            .map(|pair| Complex::new(pair[0], pair[1]))
            .collect()
    }

    /// Physical shape, in physical elements.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Scalars held by the workspace.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Kernel argument viewing the workspace with lines of `line_size` scalars.
    pub(crate) fn as_tensor_arg(&self, line_size: u32) -> TensorArg<'_, R> {
        unsafe {
            TensorArg::from_raw_parts::<E>(
                &self.handle,
                &self.strides,
                &self.tensor_shape,
                line_size as u8,
            )
        }
    }

    fn new(handle: Handle, shape: Vec<usize>, len: usize, entry_size: usize) -> Self {
        let tensor_shape = scalar_shape(&shape, entry_size);
        let strides = contiguous_strides(&tensor_shape);
        Self {
            handle,
            shape,
            tensor_shape,
            strides,
            len,
            _runtime: PhantomData,
        }
    }
}

fn scalar_shape(shape: &[usize], entry_size: usize) -> Vec<usize> {
    let mut shape = shape.to_vec();
    if let Some(leading) = shape.first_mut() {
        *leading *= entry_size;
    }
    shape
}

// Empty bindings are rejected by some backends, so every workspace owns at least one
// transaction.
fn allocation_bytes<E: Element>(len: usize) -> usize {
    (len * size_of::<E>()).max(TRANSACTION_BYTES)
}
