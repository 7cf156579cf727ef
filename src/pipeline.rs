//! Ordered list of optional build stages.
//!
//! Engine stages run inside the bundler on the module graph; render stages run
//! afterwards on the rendered chunk text. Each stage sees the output of the
//! previous one, so the order in which they are appended is part of the result.

use serde::Serialize;

use crate::options::{ResolvedOptions, SourceKind};
use crate::packer;

/// A single step of the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum Stage {
    /// Strip types, no declaration output, ESNext modules targeting ES6
    TypeScript,

    /// Resolve bare imports from node_modules
    NodeResolve,

    /// Transpile with babel and bundled helpers
    Babel { extensions: Vec<String> },

    /// Minify with terser defaults
    Terser,

    /// Minify with uglify-js
    Uglify { drop_console: bool, drop_debugger: bool },

    /// Wrap the rendered bundle in a self-executing eval
    EvalPack,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::NodeResolve => "node-resolve",
            Self::Babel { .. } => "babel",
            Self::Terser => "terser",
            Self::Uglify { .. } => "uglify",
            Self::EvalPack => "eval-pack",
        }
    }

    /// Stages that transform rendered code text instead of modules
    pub fn is_render_stage(&self) -> bool {
        matches!(self, Self::EvalPack)
    }

    /// Run a render stage over `code`; engine stages leave it unchanged
    pub fn render(&self, code: String) -> String {
        match self {
            Self::EvalPack => packer::pack(&code),
            _ => code,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Assemble the stages `options` ask for, in their fixed order
    pub fn for_options(options: &ResolvedOptions) -> Self {
        let typescript = options.source_kind == SourceKind::TypeScript;
        let mut pipeline = Self::default();

        pipeline.push_if(typescript, || Stage::TypeScript);

        if options.enable_babel {
            pipeline.push(Stage::NodeResolve);
            let mut extensions = vec![".js".to_string()];
            if typescript {
                extensions.push(".ts".to_string());
            }
            pipeline.push(Stage::Babel { extensions });
        }

        pipeline.push_if(options.enable_terser, || Stage::Terser);
        pipeline.push_if(options.enable_uglify, || Stage::Uglify {
            drop_console: options.drop_console,
            drop_debugger: options.drop_debugger,
        });
        pipeline.push_if(options.eval, || Stage::EvalPack);

        pipeline
    }

    fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    fn push_if(&mut self, enabled: bool, stage: impl FnOnce() -> Stage) {
        if enabled {
            self.stages.push(stage());
        }
    }

    pub fn engine_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|s| !s.is_render_stage())
    }

    pub fn render_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|s| s.is_render_stage())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }
}
