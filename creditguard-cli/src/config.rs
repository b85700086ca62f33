use std::path::Path;

use anyhow::{Context, Result};

use creditguard_core::config::CreditGuardConfig;

/// Load and deserialize config from a TOML file.
pub fn load_config(path: &Path) -> Result<CreditGuardConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config: {}", path.display()))?;
    let config: CreditGuardConfig =
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate config for internal consistency.
pub fn validate_config(config: &CreditGuardConfig) -> Result<()> {
    if config.telemetry.log_path.as_os_str().is_empty() {
        anyhow::bail!("telemetry.log_path must not be empty");
    }
    if config.telemetry.log_path.is_dir() {
        anyhow::bail!(
            "telemetry.log_path '{}' is a directory",
            config.telemetry.log_path.display()
        );
    }
    Ok(())
}
