//! Analysis configuration and precedence resolution.
//!
//! Configuration is assembled from four layers, lowest to highest:
//!
//! 1. Built-in defaults
//! 2. `typecorr.toml` (next to the package, or given with `--config`)
//! 3. Environment variables (`TYPECORR_TRACE_FOLDER`, `TYPECORR_OUTPUT_DIR`,
//!    `TYPECORR_MAP_DIR`)
//! 4. CLI flags
//!
//! Each resolved value remembers its [`ConfigSource`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::ReportOptions;
use crate::catalog::TypeCatalog;

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "typecorr.toml";

pub const ENV_TRACE_FOLDER: &str = "TYPECORR_TRACE_FOLDER";
pub const ENV_OUTPUT_DIR: &str = "TYPECORR_OUTPUT_DIR";
pub const ENV_MAP_DIR: &str = "TYPECORR_MAP_DIR";

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

// ============================================================================
// Configuration Sources
// ============================================================================

/// Configuration value source (for precedence tracking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in default value.
    Default = 0,
    /// From `typecorr.toml`.
    ConfigFile = 1,
    /// From environment variable.
    EnvVar = 2,
    /// From CLI flag (highest precedence).
    CliFlag = 3,
}

/// A configuration value with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    /// Merge with another value, preferring higher precedence.
    pub fn merge(self, other: Self) -> Self {
        if other.source >= self.source {
            other
        } else {
            self
        }
    }

    fn set(&mut self, value: Option<T>, source: ConfigSource) {
        if let Some(value) = value {
            if source >= self.source {
                *self = ConfigValue::new(value, source);
            }
        }
    }
}

// ============================================================================
// Analysis Configuration
// ============================================================================

/// Effective options for one analysis pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Walk nested packages.
    pub include_submodules: bool,
    /// Emit counts in report lines.
    pub include_counts: bool,
    /// Emit trivial entries instead of suppressing them.
    pub dump_all: bool,
    /// Directory holding `<package>.json` trace files.
    pub trace_folder: PathBuf,
    /// Directory reports and correlation files are written to.
    pub output_dir: PathBuf,
    /// Directory holding `<package>.<section>.map` known-type maps.
    pub map_dir: PathBuf,
    /// Recognized runtime types.
    pub catalog: TypeCatalog,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            include_submodules: true,
            include_counts: true,
            dump_all: true,
            trace_folder: PathBuf::from("tracing"),
            output_dir: PathBuf::from("analysis"),
            map_dir: PathBuf::from("analysis"),
            catalog: TypeCatalog::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            include_counts: self.include_counts,
            dump_all: self.dump_all,
        }
    }
}

/// Contents of `typecorr.toml`; every key optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    include_submodules: Option<bool>,
    include_counts: Option<bool>,
    dump_all: Option<bool>,
    trace_folder: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    map_dir: Option<PathBuf>,
    catalog: Option<TypeCatalog>,
}

impl FileConfig {
    fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// CLI configuration overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--config FILE`
    pub config_file: Option<PathBuf>,
    /// `--no-submodules` sets `Some(false)`.
    pub include_submodules: Option<bool>,
    /// `--no-counts` sets `Some(false)`.
    pub include_counts: Option<bool>,
    /// `--compact` sets `Some(false)`.
    pub dump_all: Option<bool>,
    pub trace_folder: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub map_dir: Option<PathBuf>,
}

/// Resolved configuration with precedence information.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub include_submodules: ConfigValue<bool>,
    pub include_counts: ConfigValue<bool>,
    pub dump_all: ConfigValue<bool>,
    pub trace_folder: ConfigValue<PathBuf>,
    pub output_dir: ConfigValue<PathBuf>,
    pub map_dir: ConfigValue<PathBuf>,
    pub catalog: ConfigValue<TypeCatalog>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let d = AnalysisConfig::default();
        ResolvedConfig {
            include_submodules: ConfigValue::new(d.include_submodules, ConfigSource::Default),
            include_counts: ConfigValue::new(d.include_counts, ConfigSource::Default),
            dump_all: ConfigValue::new(d.dump_all, ConfigSource::Default),
            trace_folder: ConfigValue::new(d.trace_folder, ConfigSource::Default),
            output_dir: ConfigValue::new(d.output_dir, ConfigSource::Default),
            map_dir: ConfigValue::new(d.map_dir, ConfigSource::Default),
            catalog: ConfigValue::new(d.catalog, ConfigSource::Default),
        }
    }
}

impl ResolvedConfig {
    /// Resolve configuration from all sources.
    ///
    /// `project_dir` is searched for `typecorr.toml` unless the CLI names a
    /// config file explicitly. A named file that cannot be read is an error;
    /// a missing project file is not.
    pub fn resolve(project_dir: &Path, cli: &CliOverrides) -> ConfigResult<Self> {
        Self::resolve_with_env(project_dir, cli, |key| std::env::var(key).ok())
    }

    /// Like [`resolve`](Self::resolve) with an explicit environment lookup.
    pub fn resolve_with_env(
        project_dir: &Path,
        cli: &CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        let mut config = ResolvedConfig::default();

        let file = match &cli.config_file {
            Some(path) => Some(FileConfig::load(path)?),
            None => {
                let path = project_dir.join(CONFIG_FILE_NAME);
                if path.exists() {
                    Some(FileConfig::load(&path)?)
                } else {
                    None
                }
            }
        };
        if let Some(file) = file {
            config.apply_file(file);
        }

        config.apply_env(env);
        config.apply_cli(cli);

        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        let src = ConfigSource::ConfigFile;
        self.include_submodules.set(file.include_submodules, src);
        self.include_counts.set(file.include_counts, src);
        self.dump_all.set(file.dump_all, src);
        self.trace_folder.set(file.trace_folder, src);
        self.output_dir.set(file.output_dir, src);
        self.map_dir.set(file.map_dir, src);
        self.catalog.set(file.catalog, src);
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let src = ConfigSource::EnvVar;
        self.trace_folder.set(env(ENV_TRACE_FOLDER).map(PathBuf::from), src);
        self.output_dir.set(env(ENV_OUTPUT_DIR).map(PathBuf::from), src);
        self.map_dir.set(env(ENV_MAP_DIR).map(PathBuf::from), src);
    }

    fn apply_cli(&mut self, cli: &CliOverrides) {
        let src = ConfigSource::CliFlag;
        self.include_submodules.set(cli.include_submodules, src);
        self.include_counts.set(cli.include_counts, src);
        self.dump_all.set(cli.dump_all, src);
        self.trace_folder.set(cli.trace_folder.clone(), src);
        self.output_dir.set(cli.output_dir.clone(), src);
        self.map_dir.set(cli.map_dir.clone(), src);
    }

    /// Drop the source information.
    pub fn into_config(self) -> AnalysisConfig {
        AnalysisConfig {
            include_submodules: self.include_submodules.value,
            include_counts: self.include_counts.value,
            dump_all: self.dump_all.value,
            trace_folder: self.trace_folder.value,
            output_dir: self.output_dir.value,
            map_dir: self.map_dir.value,
            catalog: self.catalog.value,
        }
    }
}
