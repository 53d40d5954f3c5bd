use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{get_config_path, Config};

const HEADER: &str = "\
# cb-alpha configuration
#
# Macro Score = rate_weight * Z(rate) + inflation_weight * Z(CPI YoY)
#             - liquidity_weight * Z(liquidity)
#
# Series ids are FRED identifiers. Set the API key here or in CB_ALPHA_FRED_KEY.
";

/// Write the default configuration to `path` (or the default location).
///
/// Refuses to replace an existing file unless `force` is set. The file is
/// written atomically so a failed write never leaves a truncated config.
pub fn write_default_config(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let config_path = match path {
        Some(p) => p,
        None => get_config_path()?,
    };

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        ensure_dir(parent)?;
    }

    let yaml = serde_saphyr::to_string(&Config::default())
        .context("Failed to serialize default config")?;

    let mut file = AtomicWriteFile::open(&config_path)
        .with_context(|| format!("Failed to open atomic write file at {}", config_path.display()))?;
    file.write_all(HEADER.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .and_then(|_| file.write_all(yaml.as_bytes()))
        .context("Failed to write config")?;
    file.commit()
        .with_context(|| format!("Failed to save config to {}", config_path.display()))?;

    Ok(config_path)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory at {}", dir.display()))?;
    }
    Ok(())
}
