use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::cli::ModuleFormat;

pub const CONFIG_FILE_NAME: &str = "minroll.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the external toolchain lives
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Defaults applied to every bundle
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// node_modules directory holding rollup, its plugins and @babel/preset-env
    #[serde(default = "default_node_modules")]
    pub node_modules: PathBuf,

    /// Explicit rollup executable
    pub rollup: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default module format
    #[serde(default)]
    pub format: ModuleFormat,

    #[serde(default)]
    pub terser: bool,

    #[serde(default)]
    pub babel: bool,

    #[serde(default)]
    pub uglify: bool,

    #[serde(default)]
    pub drop_console: bool,

    #[serde(default)]
    pub drop_debugger: bool,

    #[serde(default)]
    pub eval: bool,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            node_modules: default_node_modules(),
            rollup: None,
        }
    }
}

impl ToolchainConfig {
    /// Location of the babel preset referenced from generated `.babelrc` files
    pub fn babel_preset_env(&self) -> PathBuf {
        absolute(&self.node_modules).join("@babel").join("preset-env")
    }

    /// Rollup installed alongside the plugins
    pub fn local_rollup(&self) -> PathBuf {
        absolute(&self.node_modules).join(".bin").join("rollup")
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::find_config_file()?,
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Initialize configuration file
    pub fn init(output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

        let config_path = output_dir.join(CONFIG_FILE_NAME);
        let config = Config::default();

        let content = toml::to_string_pretty(&config)
            .context("Failed to serialize default configuration")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(config_path)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Result<PathBuf> {
        let current_dir = std::env::current_dir()
            .context("Failed to get current directory")?;

        // Look for minroll.toml in current directory and parents
        for dir in current_dir.ancestors() {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("minroll").join("config.toml");
            if config_path.exists() {
                return Ok(config_path);
            }
        }

        // Return default path (may not exist)
        Ok(current_dir.join(CONFIG_FILE_NAME))
    }
}

fn default_node_modules() -> PathBuf {
    PathBuf::from("node_modules")
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.toolchain.node_modules, PathBuf::from("node_modules"));
        assert!(config.toolchain.rollup.is_none());
        assert_eq!(config.defaults.format, ModuleFormat::Umd);
        assert!(!config.defaults.babel);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config.toolchain.node_modules, deserialized.toolchain.node_modules);
        assert_eq!(config.defaults.format, deserialized.defaults.format);
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str("[defaults]\nuglify = true\nformat = \"esm\"\n").unwrap();
        assert!(config.defaults.uglify);
        assert!(!config.defaults.terser);
        assert_eq!(config.defaults.format, ModuleFormat::Es);
        assert_eq!(config.toolchain.node_modules, PathBuf::from("node_modules"));
    }

    #[test]
    fn test_config_init() {
        let temp_dir = TempDir::new().unwrap();
        let path = Config::init(temp_dir.path()).unwrap();

        assert_eq!(path, temp_dir.path().join("minroll.toml"));
        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.defaults.format, ModuleFormat::Umd);
    }

    #[test]
    fn test_preset_path_is_absolute() {
        let config = ToolchainConfig::default();
        let preset = config.babel_preset_env();
        assert!(preset.is_absolute());
        assert!(preset.ends_with("node_modules/@babel/preset-env"));
    }
}
