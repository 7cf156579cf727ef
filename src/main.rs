use std::time::Duration;
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minroll::cli::{self, Cli, Commands};
use minroll::config::Config;
use minroll::{BuildOptions, Bundler};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose)?;

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    info!("Starting minroll v{}", minroll::VERSION);

    // Handle commands
    match cli.command {
        Commands::Bundle {
            input,
            output,
            name,
            format,
            terser,
            babel,
            uglify,
            drop_console,
            drop_debugger,
            eval,
            dry_run,
        } => {
            let defaults = &config.defaults;
            let options = BuildOptions {
                input,
                output,
                library_name: name,
                enable_terser: terser || defaults.terser,
                enable_babel: babel || defaults.babel,
                enable_uglify: uglify || defaults.uglify,
                drop_console: drop_console || defaults.drop_console,
                drop_debugger: drop_debugger || defaults.drop_debugger,
                module: Some(format.unwrap_or(defaults.format)),
                eval: eval || defaults.eval,
            };

            let bundler = Bundler::new(config)?;

            if dry_run {
                info!("Dry run mode - resolving build without running it");
                match bundler.plan(&options) {
                    Ok(plan) => println!("{}", serde_json::to_string_pretty(&plan)?),
                    Err(e) => {
                        eprintln!("❌ Bundle failed: {}", e);
                        std::process::exit(1);
                    }
                }
                return Ok(());
            }

            let spinner = spinner(&format!("Bundling {}", options.input.display()))?;
            let result = bundler.bundle(&options).await;
            spinner.finish_and_clear();

            match result {
                Ok(report) => {
                    let stages = if report.stages.is_empty() {
                        "no plugins".to_string()
                    } else {
                        report.stages.join(" → ")
                    };
                    println!(
                        "{} {} ({} bytes, {})",
                        "✓".green(),
                        report.output_path.display(),
                        report.size,
                        stages.dimmed()
                    );
                }
                Err(e) => {
                    eprintln!("❌ Bundle failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init { output_dir } => {
            let path = Config::init(&output_dir)?;
            info!("Initialized minroll configuration in {}", path.display());
        }

        Commands::Completions { shell } => {
            cli::generate_completions(shell);
        }
    }

    Ok(())
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_filter = if verbose { "minroll=debug" } else { "minroll=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
        )
        .with(filter)
        .init();

    Ok(())
}
