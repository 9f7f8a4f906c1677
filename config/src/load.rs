use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::{digest_value, Error, GlobalConfig};

/// Top-level keys whose string values may contain environment variables.
const DIGESTED_KEYS: [&str; 2] = ["LFS", "validations"];

/// Serialization formats accepted for the global config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        match ext {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(Error::UnknownExtension(other.to_owned())),
        }
    }
}

/// Read and resolve the global config at `path`,
/// expanding environment variables from the process environment.
pub fn load(path: &Path) -> Result<GlobalConfig> {
    let format = Format::from_path(path)?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("while reading config file {:?}", path))?;
    parse_str(&text, format, &|var| std::env::var(var).ok())
        .with_context(|| format!("while parsing config file {:?}", path))
}

/// Parse `text` into a fully resolved, immutable `GlobalConfig`.
///
/// Environment variables are digested on the raw document before it is
/// typed, so nothing downstream ever sees (or rewrites) an unexpanded path.
/// Only `LFS` and the validation blocks are digested.
pub fn parse_str<F>(text: &str, format: Format, env: &F) -> Result<GlobalConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut raw: Value = match format {
        Format::Json => serde_json::from_str(text).context("invalid json")?,
        Format::Yaml => serde_yaml::from_str(text).context("invalid yaml")?,
    };

    // only paths are digested; names, titles and conditions are kept as written:
    if let Value::Object(map) = &mut raw {
        for key in DIGESTED_KEYS {
            if let Some(value) = map.get_mut(key) {
                digest_value(value, env)?;
            }
        }
    }

    let config: GlobalConfig = serde_json::from_value(raw).context("invalid config layout")?;
    config.check_names()?;
    log::debug!(
        "Loaded config \"{}\" with {} alignments and {} validations",
        config.name,
        config.alignments.len(),
        config.validations.len()
    );
    Ok(config)
}
