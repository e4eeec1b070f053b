use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::BenchmarkError;
use crate::types::{DEFAULT_REPETITIONS, OutputFormat};

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub repetitions: Option<usize>,
    pub format: Option<OutputFormat>,
}

impl Config {
    /// Parses a config file. The file must exist.
    pub fn load(path: &Path) -> Result<Config, BenchmarkError> {
        let raw = std::fs::read_to_string(path).map_err(|source| BenchmarkError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Config::parse(&raw, path)
    }

    /// Loads the file at [`default_path`] if there is one, otherwise defaults.
    pub fn load_default() -> Result<Config, BenchmarkError> {
        match default_path() {
            Some(path) if path.is_file() => Config::load(&path),
            _ => Ok(Config::default()),
        }
    }

    fn parse(raw: &str, path: &Path) -> Result<Config, BenchmarkError> {
        let config: Config = toml::from_str(raw).map_err(|e| BenchmarkError::ConfigParse {
            path: path.to_path_buf(),
            detail: e.message().to_string(),
        })?;

        if config.repetitions == Some(0) {
            return Err(BenchmarkError::ConfigParse {
                path: path.to_path_buf(),
                detail: "repetitions must be at least 1".to_string(),
            });
        }
        Ok(config)
    }

    /// CLI value first, then the file, then [`DEFAULT_REPETITIONS`].
    pub fn resolve_repetitions(&self, cli: Option<usize>) -> usize {
        cli.or(self.repetitions).unwrap_or(DEFAULT_REPETITIONS)
    }

    pub fn resolve_format(&self, cli: Option<OutputFormat>) -> OutputFormat {
        cli.or(self.format).unwrap_or(OutputFormat::Default)
    }
}

/// `<config_dir>/benchmarker/config.toml`, e.g. `~/.config/benchmarker/config.toml` on Linux.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("benchmarker").join("config.toml"))
}
