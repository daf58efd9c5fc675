use cubecl::prelude::*;
use half::{bf16, f16};

/// Width in bytes of a single vectorized global memory transaction.
pub const TRANSACTION_BYTES: usize = 16;

/// Scalar type that can live in a [workspace](crate::memory::Workspace).
///
/// The all-zero bit pattern of an element must be its zero value.
pub trait Element: Numeric + CubeElement + bytemuck::Pod {
    /// Number of elements filling one transaction.
    const TRANSACTION_LINE_SIZE: u32 = (TRANSACTION_BYTES / size_of::<Self>()) as u32;

    /// Widest line among `supported` that doesn't exceed one transaction.
    ///
    /// Backends list the line sizes they can vectorize to. Falls back to scalar
    /// accesses when none fits.
    fn line_size(supported: &[u8]) -> u32 {
        supported
            .iter()
            .map(|size| *size as u32)
            .filter(|size| *size <= Self::TRANSACTION_LINE_SIZE)
            .max()
            .unwrap_or(1)
    }
}

impl Element for f16 {}
impl Element for bf16 {}
impl Element for f32 {}
impl Element for f64 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn one_line_fills_one_transaction() {
        assert_eq!(f16::TRANSACTION_LINE_SIZE, 8);
        assert_eq!(bf16::TRANSACTION_LINE_SIZE, 8);
        assert_eq!(f32::TRANSACTION_LINE_SIZE, 4);
        assert_eq!(f64::TRANSACTION_LINE_SIZE, 2);
    }

    #[test_log::test]
    fn line_size_is_capped_by_the_backend() {
        assert_eq!(f16::line_size(&[4, 2, 1]), 4);
        assert_eq!(f16::line_size(&[16, 8, 4, 2, 1]), 8);
        assert_eq!(f32::line_size(&[16, 8, 4, 2, 1]), 4);
        assert_eq!(f64::line_size(&[4, 2, 1]), 2);
    }

    #[test_log::test]
    fn no_supported_line_size_means_scalar_accesses() {
        assert_eq!(f32::line_size(&[]), 1);
        assert_eq!(f64::line_size(&[8, 4]), 1);
    }
}
