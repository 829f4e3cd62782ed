use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use scout_engine::{AtomicFileWriter, ScoutConfig};
use scout_logging::scout_info;

pub(crate) const DEFAULT_CONFIG: &str = "scout.ron";

/// An explicitly named file must exist; `./scout.ron` is optional.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<ScoutConfig> {
    match explicit {
        Some(path) => read_config(path, true),
        None => read_config(Path::new(DEFAULT_CONFIG), false),
    }
}

fn read_config(path: &Path, required: bool) -> Result<ScoutConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
            scout_info!("No {} found, using built-in configuration", path.display());
            return Ok(ScoutConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()))
        }
    };

    let config: ScoutConfig = ron::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    scout_info!("Loaded configuration from {}", path.display());
    Ok(config)
}

pub(crate) fn write_config(path: &Path, config: &ScoutConfig) -> Result<PathBuf> {
    let pretty = ron::ser::PrettyConfig::new();
    let content =
        ron::ser::to_string_pretty(config, pretty).context("failed to serialize configuration")?;

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let written = AtomicFileWriter::new(dir)
        .write(filename, content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    scout_info!("Wrote configuration to {}", written.display());
    Ok(written)
}
