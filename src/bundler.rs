use std::path::PathBuf;
use std::time::Instant;
use serde::Serialize;
use tracing::{debug, info};

use crate::banner::Banner;
use crate::cli::ModuleFormat;
use crate::config::Config;
use crate::engine::{BundleEngine, BundleRequest, RollupEngine};
use crate::errors::Result;
use crate::options::{entry_dir, BuildOptions, ResolvedOptions};
use crate::output;
use crate::pipeline::Pipeline;
use crate::scaffold::BabelRcGuard;

/// Orchestrates a build: defaults, babel scaffold, pipeline, engine, banner, write
pub struct Bundler<E = RollupEngine> {
    config: Config,
    engine: E,
}

/// Result of a finished build
#[derive(Debug, Serialize)]
pub struct BundleReport {
    /// Path of the written bundle
    pub output_path: PathBuf,

    /// Global name the bundle was built with
    pub library_name: String,

    pub format: ModuleFormat,

    /// Stages that ran, in order
    pub stages: Vec<&'static str>,

    /// Size of the written file in bytes
    pub size: usize,

    pub elapsed_ms: u64,
}

/// What a build would do, computed without touching the filesystem
#[derive(Debug, Serialize)]
pub struct BuildPlan {
    pub options: ResolvedOptions,
    pub babelrc: Option<PathBuf>,

    /// Whether the build would write (and later delete) the babelrc
    pub creates_babelrc: bool,

    pub pipeline: Pipeline,
}

impl Bundler<RollupEngine> {
    /// Bundler backed by rollup from `config.toolchain`
    pub fn new(config: Config) -> Result<Self> {
        let engine = RollupEngine::new(config.toolchain.clone())?;
        Ok(Self { config, engine })
    }
}

impl<E: BundleEngine> Bundler<E> {
    pub fn with_engine(config: Config, engine: E) -> Self {
        Self { config, engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Resolve `options` and describe the build without running it
    pub fn plan(&self, options: &BuildOptions) -> Result<BuildPlan> {
        let resolved = options.resolve()?;
        let pipeline = Pipeline::for_options(&resolved);

        let babelrc = resolved
            .enable_babel
            .then(|| BabelRcGuard::path_in(&entry_dir(&resolved.input)));
        let creates_babelrc = babelrc.as_ref().is_some_and(|path| !path.exists());

        Ok(BuildPlan {
            options: resolved,
            babelrc,
            creates_babelrc,
            pipeline,
        })
    }

    /// Bundle the entry in `options` into a single file.
    ///
    /// A `.babelrc` created for the build is removed before this returns,
    /// whether the build succeeded or not.
    pub async fn bundle(&self, options: &BuildOptions) -> Result<BundleReport> {
        let start_time = Instant::now();

        // Step 1: Validate the entry and fill in defaults
        let resolved = options.resolve()?;
        info!("Bundling {} as {}", resolved.input.display(), resolved.library_name);

        // Step 2: Babel needs a config next to the sources; the guard removes one we create
        let _babelrc = if resolved.enable_babel {
            Some(BabelRcGuard::acquire(
                &entry_dir(&resolved.input),
                &self.config.toolchain.babel_preset_env(),
            )?)
        } else {
            None
        };

        // Step 3: Assemble the stage pipeline
        let pipeline = Pipeline::for_options(&resolved);
        debug!("Pipeline: {:?}", pipeline.names());

        // Step 4: Build and render the module graph
        let request = BundleRequest {
            input: std::path::absolute(&resolved.input)?,
            plugins: pipeline.engine_stages().cloned().collect(),
            format: resolved.format,
            name: resolved.library_name.clone(),
        };
        let code = self.engine.render(&request).await?;

        // Step 5: Render stages work on the finished chunk text
        let code = pipeline
            .render_stages()
            .fold(code, |code, stage| stage.render(code));

        // Step 6: Stamp and write
        let banner = Banner::now(&resolved.library_name);
        let size = output::write_bundle(&resolved.output, &banner, &code).await?;

        let elapsed = start_time.elapsed();
        info!(
            "Bundle written to {} ({} bytes) in {}ms",
            resolved.output.display(),
            size,
            elapsed.as_millis()
        );

        Ok(BundleReport {
            output_path: resolved.output,
            library_name: resolved.library_name,
            format: resolved.format,
            stages: pipeline.names(),
            size,
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use crate::errors::MinrollError;

    /// Engine returning fixed code and recording what it was asked
    #[derive(Default)]
    struct FakeEngine {
        requests: Mutex<Vec<BundleRequest>>,
    }

    impl BundleEngine for FakeEngine {
        async fn render(&self, request: &BundleRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            Ok("var lib = 1;\n".to_string())
        }
    }

    fn entry(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "export default 1;").unwrap();
        path
    }

    #[tokio::test]
    async fn test_bundle_writes_banner_and_code() {
        let temp_dir = TempDir::new().unwrap();
        let input = entry(&temp_dir, "foo.js");
        let bundler = Bundler::with_engine(Config::default(), FakeEngine::default());

        let report = bundler.bundle(&BuildOptions::new(&input)).await.unwrap();

        assert_eq!(report.output_path, temp_dir.path().join("foo.min.js"));
        let written = std::fs::read_to_string(&report.output_path).unwrap();
        assert!(written.starts_with("/*!\n * foo\n * Date: "));
        assert!(written.ends_with("var lib = 1;\n"));

        let requests = bundler.engine().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].input.is_absolute());
        assert_eq!(requests[0].format, ModuleFormat::Umd);
        assert_eq!(requests[0].name, "foo");
    }

    #[tokio::test]
    async fn test_missing_entry_never_reaches_engine() {
        let bundler = Bundler::with_engine(Config::default(), FakeEngine::default());
        let err = bundler.bundle(&BuildOptions::new("./missing.js")).await.unwrap_err();

        assert!(matches!(err, MinrollError::InvalidEntry { .. }));
        assert!(bundler.engine().requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_plan_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let input = entry(&temp_dir, "foo.ts");
        let bundler = Bundler::with_engine(Config::default(), FakeEngine::default());

        let options = BuildOptions { enable_babel: true, ..BuildOptions::new(&input) };
        let plan = bundler.plan(&options).unwrap();

        assert!(plan.creates_babelrc);
        assert_eq!(plan.babelrc, Some(temp_dir.path().join(".babelrc")));
        assert_eq!(plan.pipeline.names(), vec!["typescript", "node-resolve", "babel"]);
        assert!(!temp_dir.path().join(".babelrc").exists());
        assert!(!temp_dir.path().join("foo.min.js").exists());
    }
}
