//! Config command implementation

use anyhow::{bail, Result};
use bpq_core::{load_config, write_default_config, ConfigLoad};
use serde_json::json;

use super::Output;
use crate::state::DataDir;

/// Print the effective configuration and where it came from
///
/// # Errors
///
/// Returns an error if the config cannot be rendered.
pub fn show(data: &DataDir, output: Output) -> Result<()> {
    let path = data.config_path();
    let load = load_config(&path);
    let source = match &load {
        ConfigLoad::Loaded(_) => path.display().to_string(),
        ConfigLoad::Missing => "built-in default (no config file)".to_string(),
        ConfigLoad::Invalid(reason) => format!("built-in default ({reason})"),
    };
    let config = load.resolve();

    let text = format!("# source: {source}\n{}", config.to_toml()?);
    output.emit(
        text.trim_end(),
        &json!({ "type": "config", "source": source, "items": config.items }),
    );
    Ok(())
}

/// Write the default configuration
///
/// # Errors
///
/// Returns an error if a config file already exists and `force` is not set,
/// or the file cannot be written.
pub fn init(data: &DataDir, force: bool, output: Output) -> Result<()> {
    let path = data.config_path();
    if path.exists() && !force {
        bail!(
            "Config already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    write_default_config(&path)?;
    output.emit(
        &format!("Wrote default config to {}", path.display()),
        &json!({ "type": "config_written", "path": path }),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use bpq_core::Config;

    use super::*;

    #[test]
    fn test_init_refuses_overwrite() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let data = DataDir::new(dir.path());

        init(&data, false, Output::new(true))?;
        assert!(init(&data, false, Output::new(true)).is_err());
        init(&data, true, Output::new(true))?;

        assert_eq!(load_config(&data.config_path()), ConfigLoad::Loaded(Config::default()));
        Ok(())
    }

    #[test]
    fn test_show_without_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        show(&DataDir::new(dir.path()), Output::new(false))
    }
}
