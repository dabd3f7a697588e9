//! Render profile — optional TOML file holding the inputs of a render run.
//!
//! Every field is optional; command-line flags fill in or override them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default output file name for the rendered script.
pub const DEFAULT_OUTPUT: &str = "trade_plotter_pinescript_updated.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read profile {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse profile TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderProfile {
    /// Broker trade-history export.
    pub csv: Option<PathBuf>,
    /// Pine Script template.
    pub template: Option<PathBuf>,
    pub instrument: Option<String>,
    /// First trade to render, 1-based.
    pub start: Option<usize>,
    /// Last trade to render, inclusive. Defaults to the largest allowed window.
    pub end: Option<usize>,
    pub output: Option<PathBuf>,
    /// Where to write the JSON (or `.csv`) dump of the selection.
    pub dump: Option<PathBuf>,
}

impl RenderProfile {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Fill unset fields from `other`; fields set here win.
    pub fn or(self, other: RenderProfile) -> RenderProfile {
        RenderProfile {
            csv: self.csv.or(other.csv),
            template: self.template.or(other.template),
            instrument: self.instrument.or(other.instrument),
            start: self.start.or(other.start),
            end: self.end.or(other.end),
            output: self.output.or(other.output),
            dump: self.dump.or(other.dump),
        }
    }

    pub fn output_or_default(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }
}
