//! Bundling engines.
//!
//! The engine owns module graph resolution, linking, rendering and the
//! transpile/minify plugins. [`RollupEngine`] drives the rollup CLI with a
//! generated config file.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;
use tokio::process::Command;
use tracing::{debug, info};

use crate::cli::ModuleFormat;
use crate::config::ToolchainConfig;
use crate::errors::{MinrollError, Result};
use crate::pipeline::Stage;

const CONFIG_TEMPLATE: &str = "rollup.config";

/// Everything the engine needs to build and render one bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    /// Absolute entry path
    pub input: PathBuf,

    /// Engine stages, in the order they run
    pub plugins: Vec<Stage>,

    pub format: ModuleFormat,

    /// Global variable the bundle is exposed as
    pub name: String,
}

/// Builds a module graph from an entry and renders it to a single chunk
pub trait BundleEngine {
    /// Resolve, link and render `request`, returning the chunk's code without banner or source map
    fn render(&self, request: &BundleRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Runs rollup and its plugins from a node_modules directory
pub struct RollupEngine {
    toolchain: ToolchainConfig,
    handlebars: Handlebars<'static>,
}

/// One `plugins` entry of the generated config; every field is already a JS expression
#[derive(Debug, Serialize)]
struct RollupPlugin {
    binding: &'static str,
    module: String,
    export: String,
    args: String,
}

#[derive(Debug, Serialize)]
struct ConfigContext {
    input: String,
    file: String,
    format: String,
    name: String,
    plugins: Vec<RollupPlugin>,
}

impl RollupEngine {
    pub fn new(toolchain: ToolchainConfig) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_template_string(
            CONFIG_TEMPLATE,
            include_str!("../templates/rollup.config.cjs.hbs"),
        )?;

        Ok(Self { toolchain, handlebars })
    }

    /// Find the rollup executable: configured path, then node_modules/.bin, then PATH
    pub fn locate_rollup(&self) -> Result<PathBuf> {
        if let Some(rollup) = &self.toolchain.rollup {
            return Ok(rollup.clone());
        }

        let local = self.toolchain.local_rollup();
        if local.exists() {
            return Ok(local);
        }

        which::which("rollup").map_err(|e| {
            debug!("rollup not found in PATH: {}", e);
            MinrollError::tool_not_found("rollup")
        })
    }

    /// Render the CommonJS rollup config for `request`, writing the chunk to `file`
    pub fn render_config(&self, request: &BundleRequest, file: &Path) -> Result<String> {
        let context = ConfigContext {
            input: js_string(&request.input.to_string_lossy()),
            file: js_string(&file.to_string_lossy()),
            format: js_string(request.format.as_str()),
            name: js_string(&request.name),
            plugins: request.plugins.iter().filter_map(rollup_plugin).collect(),
        };

        Ok(self.handlebars.render(CONFIG_TEMPLATE, &context)?)
    }
}

impl BundleEngine for RollupEngine {
    async fn render(&self, request: &BundleRequest) -> Result<String> {
        let rollup = self.locate_rollup()?;

        // Config and chunk live in a scratch dir removed on drop
        let work_dir = tempfile::Builder::new().prefix("minroll-").tempdir()?;
        let config_path = work_dir.path().join("rollup.config.cjs");
        let chunk_path = work_dir.path().join("bundle.js");

        let config = self.render_config(request, &chunk_path)?;
        tokio::fs::write(&config_path, config).await?;

        info!("Running {} on {}", rollup.display(), request.input.display());

        let output = Command::new(&rollup)
            .arg("--config")
            .arg(&config_path)
            .arg("--silent")
            .env("NODE_PATH", std::path::absolute(&self.toolchain.node_modules)?)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                MinrollError::stage_failed("rollup", format!("failed to run {}: {}", rollup.display(), e))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(MinrollError::stage_failed("rollup", stderr.trim()));
        }
        if !stderr.trim().is_empty() {
            debug!("rollup: {}", stderr.trim());
        }

        let code = tokio::fs::read_to_string(&chunk_path).await.map_err(|e| {
            MinrollError::stage_failed("rollup", format!("no chunk written to {}: {}", chunk_path.display(), e))
        })?;

        Ok(code)
    }
}

/// Declaration of `stage` as a rollup plugin; render stages have none
fn rollup_plugin(stage: &Stage) -> Option<RollupPlugin> {
    let plugin = match stage {
        Stage::TypeScript => RollupPlugin {
            binding: "typescript",
            module: js_string("rollup-plugin-typescript2"),
            export: "null".to_string(),
            args: json!({
                "tsconfigOverride": {
                    "compilerOptions": {
                        "declaration": false,
                        "module": "ESNext",
                        "target": "ES6"
                    }
                }
            })
            .to_string(),
        },
        Stage::NodeResolve => RollupPlugin {
            binding: "resolve",
            module: js_string("rollup-plugin-node-resolve"),
            export: "null".to_string(),
            args: String::new(),
        },
        Stage::Babel { extensions } => RollupPlugin {
            binding: "babel",
            module: js_string("@rollup/plugin-babel"),
            export: js_string("babel"),
            args: json!({
                "extensions": extensions,
                "exclude": "node_modules/*",
                "babelHelpers": "bundled"
            })
            .to_string(),
        },
        Stage::Terser => RollupPlugin {
            binding: "terser",
            module: js_string("rollup-plugin-terser"),
            export: js_string("terser"),
            args: String::new(),
        },
        Stage::Uglify { drop_console, drop_debugger } => RollupPlugin {
            binding: "uglify",
            module: js_string("rollup-plugin-uglify"),
            export: js_string("uglify"),
            args: format!(
                "{}, require(\"uglify-js\").minify",
                json!({
                    "compress": {
                        "drop_console": drop_console,
                        "drop_debugger": drop_debugger
                    }
                })
            ),
        },
        Stage::EvalPack => return None,
    };

    Some(plugin)
}

/// Quote `s` as a JS string literal
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RollupEngine {
        RollupEngine::new(ToolchainConfig::default()).unwrap()
    }

    fn request(plugins: Vec<Stage>) -> BundleRequest {
        BundleRequest {
            input: PathBuf::from("/proj/lib/foo.ts"),
            plugins,
            format: ModuleFormat::Umd,
            name: "foo".to_string(),
        }
    }

    #[test]
    fn test_config_without_plugins() {
        let config = engine()
            .render_config(&request(Vec::new()), Path::new("/tmp/x/bundle.js"))
            .unwrap();

        assert!(config.contains(r#"input: "/proj/lib/foo.ts","#));
        assert!(config.contains(r#"file: "/tmp/x/bundle.js","#));
        assert!(config.contains(r#"format: "umd","#));
        assert!(config.contains(r#"name: "foo","#));
        assert!(config.contains("sourcemap: false"));
        assert!(!config.contains("require("));
    }

    #[test]
    fn test_config_plugins_in_order() {
        let plugins = vec![
            Stage::TypeScript,
            Stage::NodeResolve,
            Stage::Babel { extensions: vec![".js".to_string(), ".ts".to_string()] },
            Stage::Terser,
            Stage::Uglify { drop_console: true, drop_debugger: false },
            Stage::EvalPack,
        ];
        let config = engine()
            .render_config(&request(plugins), Path::new("/tmp/x/bundle.js"))
            .unwrap();

        let positions: Vec<usize> = ["typescript(", "resolve(", "babel(", "terser(", "uglify("]
            .iter()
            .map(|call| config.find(&format!("    {call}")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(config.contains(r#"const babel = load(require("@rollup/plugin-babel"), "babel");"#));
        assert!(config.contains(r#"const resolve = load(require("rollup-plugin-node-resolve"), null);"#));
        assert!(config.contains(r#""babelHelpers":"bundled""#));
        assert!(config.contains(r#""extensions":[".js",".ts"]"#));
        assert!(config.contains(r#""drop_console":true"#));
        assert!(config.contains(r#"require("uglify-js").minify"#));
        assert!(config.contains(r#""declaration":false"#));
    }

    #[test]
    fn test_name_is_quoted() {
        let mut req = request(Vec::new());
        req.name = "my\"lib".to_string();
        let config = engine().render_config(&req, Path::new("/b.js")).unwrap();
        assert!(config.contains(r#"name: "my\"lib","#));
    }

    #[test]
    fn test_configured_rollup_wins() {
        let toolchain = ToolchainConfig {
            rollup: Some(PathBuf::from("/opt/rollup/bin/rollup")),
            ..ToolchainConfig::default()
        };
        let engine = RollupEngine::new(toolchain).unwrap();
        assert_eq!(engine.locate_rollup().unwrap(), PathBuf::from("/opt/rollup/bin/rollup"));
    }

    #[tokio::test]
    async fn test_failing_rollup_reports_stage_error() {
        let toolchain = ToolchainConfig {
            rollup: Some(PathBuf::from("/definitely/not/rollup")),
            ..ToolchainConfig::default()
        };
        let engine = RollupEngine::new(toolchain).unwrap();

        let err = engine.render(&request(Vec::new())).await.unwrap_err();
        assert!(matches!(err, MinrollError::PipelineStage { ref stage, .. } if stage == "rollup"));
    }
}
