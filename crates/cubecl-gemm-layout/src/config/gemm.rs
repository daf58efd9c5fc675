use super::logger::{LogLevel, LoggerConfig};

/// Configuration of the gemm launches.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GemmConfig {
    #[serde(default)]
    pub logger: LoggerConfig<GemmLogLevel>,
}

/// How much of each gemm launch gets logged.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GemmLogLevel {
    /// Nothing is logged.
    #[default]
    #[serde(rename = "disabled")]
    Disabled,
    /// One line per launch: problem, tiling and layouts.
    #[serde(rename = "basic")]
    Basic,
    /// Also one line per block tile.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for GemmLogLevel {}
