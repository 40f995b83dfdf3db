use crate::constants::*;
use crate::errors::AppResult;
use crate::pipeline::RunConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved output configuration with all values filled in (no Options).
///
/// Mirrors the CLI flags and can be deserialized from the `[pipeline]` table
/// of a TOML file. All fields have concrete values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    /// Directory the table files are written into
    pub out_dir: PathBuf,
    /// Steps table filename; `.gz` compresses, empty disables the table
    pub steps: String,
    /// Workouts table filename; `.gz` compresses, empty disables the table
    pub workouts: String,
    /// Progress line every N `Record` elements, 0 disables
    pub progress_every: u64,
    /// Suppress progress lines and the final summary
    pub quiet: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            steps: DEFAULT_STEPS_FILE.to_string(),
            workouts: DEFAULT_WORKOUTS_FILE.to_string(),
            progress_every: DEFAULT_PROGRESS_EVERY,
            quiet: false,
        }
    }
}

impl ResolvedConfig {
    /// Joins the table filenames onto `out_dir` for a run over `source`.
    pub fn run_config(&self, source: &Path) -> RunConfig {
        RunConfig {
            source: source.to_path_buf(),
            steps_path: self.table_path(&self.steps),
            workouts_path: self.table_path(&self.workouts),
            progress_every: self.progress_every,
        }
    }

    fn table_path(&self, filename: &str) -> Option<PathBuf> {
        let filename = filename.trim();
        if filename.is_empty() {
            None
        } else {
            Some(self.out_dir.join(filename))
        }
    }
}

/// Run definition loaded from a TOML file.
///
/// ```toml
/// source = "export.xml"
///
/// [pipeline]
/// out_dir = "data"
/// steps = "steps.csv.gz"
/// workouts = ""
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolvedConfigFile {
    /// Path to the export document
    pub source: PathBuf,
    /// Output settings; every key is optional
    #[serde(default)]
    pub pipeline: ResolvedConfig,
}

impl ResolvedConfigFile {
    /// Loads configuration from a TOML file.
    ///
    /// Unknown keys are rejected so typos are not silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read and `InvalidInput` if the
    /// TOML is malformed or `source` is missing.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ResolvedConfigFile = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn run_config(&self) -> RunConfig {
        self.pipeline.run_config(&self.source)
    }
}
