use std::fmt;
use std::path::PathBuf;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use serde::{Deserialize, Serialize};

/// Bundle a library entry point into a single minified file
#[derive(Parser)]
#[command(
    name = "minroll",
    version,
    about = "Bundle a library entry point into a single minified file",
    long_about = "minroll configures and runs Rollup to turn a JavaScript or TypeScript library entry into one distributable file. It derives the output path and global name from the entry, wires the TypeScript, Babel, Terser and Uglify plugins on demand, and stamps the result with a banner."
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bundle an entry file
    Bundle {
        /// Entry source file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file path (defaults to <input dir>/<input stem>.min.js)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Global name of the bundle (defaults to the entry file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Output module format
        #[arg(short, long)]
        format: Option<ModuleFormat>,

        /// Minify with terser
        #[arg(long)]
        terser: bool,

        /// Transpile with babel (preset-env)
        #[arg(long)]
        babel: bool,

        /// Minify with uglify-js
        #[arg(long)]
        uglify: bool,

        /// Drop console.* calls (uglify only)
        #[arg(long)]
        drop_console: bool,

        /// Drop debugger statements (uglify only)
        #[arg(long)]
        drop_debugger: bool,

        /// Pack the bundle into a self-executing eval wrapper
        #[arg(long)]
        eval: bool,

        /// Print the resolved build plan without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Initialize minroll configuration
    Init {
        /// Output directory for configuration
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Module format of the written bundle, named as rollup names them
#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    #[default]
    #[value(name = "umd")]
    Umd,
    #[value(name = "es", alias = "esm", alias = "module")]
    #[serde(alias = "esm", alias = "module")]
    Es,
    #[value(name = "cjs", alias = "commonjs")]
    #[serde(alias = "commonjs")]
    Cjs,
    #[value(name = "iife")]
    Iife,
    #[value(name = "amd")]
    Amd,
    #[value(name = "system", alias = "systemjs")]
    #[serde(alias = "systemjs")]
    System,
}

impl ModuleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Umd => "umd",
            Self::Es => "es",
            Self::Cjs => "cjs",
            Self::Iife => "iife",
            Self::Amd => "amd",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}
