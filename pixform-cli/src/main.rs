use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pixform", version, about = "Run one image transform over one image")]
struct Cli {
    /// Input image.
    #[arg(long, value_name = "FILE", required_unless_present = "list")]
    input: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long, value_name = "FILE", required_unless_present = "list")]
    output: Option<PathBuf>,

    /// Transform name: a built-in or a plugin library name.
    #[arg(long, value_name = "NAME", required_unless_present = "list")]
    plugin: Option<String>,

    /// JSON parameter file.
    #[arg(long, value_name = "FILE", required_unless_present = "list")]
    params: Option<PathBuf>,

    /// Plugin search directory. Repeatable; a value may list several directories joined by the
    /// platform path separator.
    #[arg(long = "plugin-path", value_name = "DIR", env = "PIXFORM_PLUGIN_PATH")]
    plugin_path: Vec<PathBuf>,

    /// Worker threads for the transform (defaults to the rayon global pool).
    #[arg(long)]
    threads: Option<NonZeroUsize>,

    /// Print the built-in transform names and exit.
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    if cli.list {
        for name in pixform::PluginRegistry::builtin_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let config = pixform::RunConfig {
        input: cli.input.context("--input is required")?,
        output: cli.output.context("--output is required")?,
        plugin: cli.plugin.context("--plugin is required")?,
        params: cli.params.context("--params is required")?,
        plugin_paths: split_search_paths(&cli.plugin_path),
        threads: cli.threads.map(NonZeroUsize::get),
    };
    tracing::debug!(?config, "starting run");

    let report = pixform::run(&config)?;
    eprintln!(
        "wrote {} ({}x{}, {} via {}, {:.1} ms)",
        config.output.display(),
        report.width,
        report.height,
        report.plugin,
        report.origin,
        report.total.as_secs_f64() * 1e3
    );
    Ok(())
}

fn split_search_paths(values: &[PathBuf]) -> Vec<PathBuf> {
    values
        .iter()
        .flat_map(|v| std::env::split_paths(v.as_os_str()))
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}
