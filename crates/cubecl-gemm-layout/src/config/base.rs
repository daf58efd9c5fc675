use super::gemm::GemmConfig;
use std::sync::Arc;

/// Static mutex holding the global configuration, initialized as `None`.
static GLOBAL_CONFIG: spin::Mutex<Option<Arc<GlobalConfig>>> = spin::Mutex::new(None);

/// Represents the global configuration of the gemm layouts.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlobalConfig {
    /// Configuration for gemm launches.
    #[serde(default)]
    pub gemm: GemmConfig,
}

impl GlobalConfig {
    /// Retrieves the current global configuration, loading it from the current directory if not set.
    ///
    /// If no configuration is set, it attempts to load one from `cubecl.toml` or `CubeCL.toml` in the
    /// current directory or its parents. If no file is found, a default configuration is used.
    /// Sections other than `[gemm]` are ignored, so the file can be shared with the rest of CubeCL.
    ///
    /// # Notes
    ///
    /// Calling this function is somewhat expensive, because of a global static lock. Fetch it once
    /// at initialization rather than on every launch.
    pub fn get() -> Arc<Self> {
        let mut state = GLOBAL_CONFIG.lock();
        if let Some(config) = state.as_ref() {
            return config.clone();
        }

        cfg_if::cfg_if! {
            if #[cfg(std_io)] {
                let config = Self::from_current_dir();
                let config = config.override_from_env();
            } else {
                let config = Self::default();
            }
        }

        let config = Arc::new(config);
        *state = Some(config.clone());
        config
    }

    /// Sets the global configuration to the provided value.
    ///
    /// # Panics
    /// Panics if the configuration has already been set or read, as it cannot be overridden.
    ///
    /// # Warning
    /// This method must be called at the start of the program, before any calls to `get`.
    pub fn set(config: Self) {
        let mut state = GLOBAL_CONFIG.lock();
        if state.is_some() {
            panic!("Cannot set the global configuration multiple times.");
        }
        *state = Some(Arc::new(config));
    }

    /// Parses a configuration from the content of a toml file.
    #[cfg(std_io)]
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[cfg(std_io)]
    /// Save the current configuration to the provided file path.
    pub fn save_default<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<()> {
        let config = Self::get();
        let content = toml::to_string_pretty(config.as_ref()).map_err(std::io::Error::other)?;
        std::fs::write(path, content)
    }

    #[cfg(std_io)]
    /// Overrides configuration fields based on environment variables.
    pub fn override_from_env(mut self) -> Self {
        use super::gemm::GemmLogLevel;

        if let Ok(val) = std::env::var("CUBECL_DEBUG_LOG") {
            self.gemm.logger.level = GemmLogLevel::Basic;

            match val.as_str() {
                "stdout" => self.gemm.logger.stdout = true,
                "stderr" => self.gemm.logger.stderr = true,
                "1" | "true" => self.gemm.logger.file = Some("/tmp/cubecl.log".into()),
                "0" | "false" => self.gemm.logger.level = GemmLogLevel::Disabled,
                file_path => self.gemm.logger.file = Some(file_path.into()),
            }
        };

        if let Ok(val) = std::env::var("CUBECL_DEBUG_OPTION") {
            match val.as_str() {
                "debug" => self.gemm.logger.level = GemmLogLevel::Basic,
                "debug-full" => self.gemm.logger.level = GemmLogLevel::Full,
                _ => {}
            }
        };

        self
    }

    // Loads configuration from `cubecl.toml` or `CubeCL.toml` in the current directory or its parents.
    //
    // Traverses up the directory tree until a valid configuration file is found or the root is reached.
    // Returns a default configuration if no file is found.
    #[cfg(std_io)]
    fn from_current_dir() -> Self {
        let Ok(mut dir) = std::env::current_dir() else {
            return Self::default();
        };

        loop {
            for name in ["cubecl.toml", "CubeCL.toml"] {
                if let Some(config) = Self::from_file_path(dir.join(name)) {
                    return config;
                }
            }

            if !dir.pop() {
                break;
            }
        }

        Self::default()
    }

    #[cfg(std_io)]
    fn from_file_path<P: AsRef<std::path::Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).ok()?;

        match Self::from_toml(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("Ignoring {}, it doesn't have the right format: {err}", path.display());
                None
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
/// How to format type names.
pub enum TypeNameFormatLevel {
    /// No formatting apply, full information is included.
    Full,
    /// Module paths are removed, generics are kept.
    Balanced,
    /// Generics and module paths are removed.
    Short,
}

/// Format a type name with different options.
pub fn type_name_format(name: &str, level: TypeNameFormatLevel) -> String {
    match level {
        TypeNameFormatLevel::Full => name.to_string(),
        TypeNameFormatLevel::Short => {
            let before_generic = name.split('<').next().unwrap_or(name);
            before_generic
                .rsplit("::")
                .next()
                .unwrap_or(before_generic)
                .to_string()
        }
        TypeNameFormatLevel::Balanced => {
            let mut formatted = String::with_capacity(name.len());
            let mut segment = String::new();

            // Keep only the last segment of every path, generics included.
            for c in name.chars() {
                match c {
                    '<' | '>' | ',' | ' ' | ';' | '[' | ']' | '(' | ')' => {
                        formatted += segment.rsplit("::").next().unwrap_or(&segment);
                        segment.clear();
                        formatted.push(c);
                    }
                    _ => segment.push(c),
                }
            }
            formatted += segment.rsplit("::").next().unwrap_or(&segment);
            formatted
        }
    }
}
