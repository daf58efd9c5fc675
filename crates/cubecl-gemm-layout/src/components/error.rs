use std::fmt::{Debug, Display};

/// Errors that can occur during the setup phase of a gemm launch.
///
/// The layouts themselves have no error path: a workspace whose shape disagrees with
/// `physical_size`, or a tile outside the logical matrix, is undefined behavior. Those
/// conditions are therefore rejected once, here, before any tile is touched.
pub enum GemmSetupError {
    /// The problem or tiling configuration is invalid or rejected by a component.
    InvalidConfig(InvalidConfigError),

    /// A workspace doesn't have the physical shape its layout expects.
    ShapeMismatch {
        operand: Operand,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// Identifies a gemm operand.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Operand {
    A,
    B,
    C,
    D,
}

impl From<InvalidConfigError> for GemmSetupError {
    fn from(value: InvalidConfigError) -> Self {
        Self::InvalidConfig(value)
    }
}

impl Display for GemmSetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Debug for GemmSetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GemmSetupError::InvalidConfig(err) => {
                writeln!(
                    f,
                    "Unable to launch gemm because the config is invalid: {:?}",
                    err.to_string()
                )
            }
            GemmSetupError::ShapeMismatch {
                operand,
                expected,
                actual,
            } => {
                writeln!(
                    f,
                    "Unable to launch gemm because operand {operand:?} has shape {actual:?}, expected {expected:?}"
                )
            }
        }
    }
}

impl std::error::Error for GemmSetupError {}

/// Error that arises from invalid configurations
pub type InvalidConfigError = Box<dyn Display + Send + Sync>;

/// Error that arises from invalid configurations
pub struct FormattedConfigError {
    func: Box<dyn Fn() -> String + Send + Sync>,
}

impl FormattedConfigError {
    #[allow(clippy::new_ret_no_self)]
    pub fn new<F: Fn() -> String + 'static + Send + Sync>(func: F) -> Box<dyn Display + Send + Sync> {
        Box::new(Self {
            func: Box::new(func),
        })
    }
}

impl Display for FormattedConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = (self.func)();
        write!(f, "{string}")
    }
}
