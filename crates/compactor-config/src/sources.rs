// Configuration source loading.
//
// Priority order:
// 1. Environment variables (COMPACTOR_* prefix, then legacy names)
// 2. Config file path from COMPACTOR_CONFIG
// 3. Inline config content from COMPACTOR_CONFIG_CONTENT
// 4. Default config file (./compactor.toml)
// 5. Platform defaults (based on auto-detected Platform)
//
// File content is merged key-by-key over the platform defaults, so a file only
// needs the settings it changes.

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::platform::Platform;
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "./compactor.toml";

/// Load configuration for a platform, reading files and overrides through `env`.
pub fn load_config_with<E: EnvSource>(platform: Platform, env: &E) -> Result<RuntimeConfig> {
    let defaults = RuntimeConfig::from_platform_defaults(platform);

    let mut config = match load_file_table(env)? {
        Some(table) => merge_over(defaults, table)?,
        None => defaults,
    };

    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a specific file path (for the CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path<E: EnvSource>(
    path: impl AsRef<Path>,
    platform: Platform,
    env: &E,
) -> Result<RuntimeConfig> {
    let path = path.as_ref();
    let table = read_table(path)?;

    let mut config = merge_over(RuntimeConfig::from_platform_defaults(platform), table)?;
    env_overrides::apply_env_overrides(&mut config, env)?;

    config.validate()?;
    Ok(config)
}

fn load_file_table<E: EnvSource>(env: &E) -> Result<Option<toml::Table>> {
    if let Some(path) = env.get("CONFIG") {
        return read_table(Path::new(&path)).map(Some);
    }

    if let Some(content) = env.get("CONFIG_CONTENT") {
        let table: toml::Table = toml::from_str(&content).with_context(|| {
            format!("Failed to parse inline config from {}CONFIG_CONTENT", ENV_PREFIX)
        })?;
        return Ok(Some(table));
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        return read_table(default_path).map(Some);
    }

    Ok(None)
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn merge_over(defaults: RuntimeConfig, overlay: toml::Table) -> Result<RuntimeConfig> {
    let mut base = match toml::Value::try_from(&defaults)
        .context("Failed to serialise default configuration")?
    {
        toml::Value::Table(table) => table,
        _ => anyhow::bail!("default configuration did not serialise to a table"),
    };
    merge_tables(&mut base, overlay);
    toml::Value::Table(base)
        .try_into()
        .context("Config file does not match the expected layout")
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Reads from the process environment.
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}
