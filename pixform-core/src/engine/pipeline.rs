use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::{
    codec::{encode_png, read_image, write_atomic},
    foundation::{
        error::{PixformError, PixformResult},
        image::ImageBuffer,
    },
    kernels::Transform,
    params::{
        bind::{BoundParams, bind},
        document::ParamDocument,
    },
    plugin::registry::{PluginOrigin, PluginRegistry},
};

/// Step of a run, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Read and decode the input image.
    Decode,
    /// Read and parse the parameter document.
    LoadParams,
    /// Find the transform by name.
    Resolve,
    /// Check the parameters against the transform's schema.
    Bind,
    /// Run the transform.
    Execute,
    /// Encode the result and write it into place.
    Encode,
}

impl Stage {
    /// Every stage, in execution order.
    pub const ALL: [Stage; 6] = [
        Stage::Decode,
        Stage::LoadParams,
        Stage::Resolve,
        Stage::Bind,
        Stage::Execute,
        Stage::Encode,
    ];

    /// Lower-case stage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::LoadParams => "load_params",
            Stage::Resolve => "resolve",
            Stage::Bind => "bind",
            Stage::Execute => "execute",
            Stage::Encode => "encode",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs of a single run.
#[derive(Clone, Debug, Default)]
pub struct RunConfig {
    /// Encoded source image.
    pub input: PathBuf,
    /// Destination PNG. Only written when every earlier stage succeeded.
    pub output: PathBuf,
    /// Transform name: a built-in or a plugin library name.
    pub plugin: String,
    /// JSON parameter document.
    pub params: PathBuf,
    /// Directories searched for plugin libraries, in order. Empty means built-ins only.
    pub plugin_paths: Vec<PathBuf>,
    /// Worker threads for the transform. `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

/// A failed run: the stage it stopped at and why. The cause is exposed as the error source.
#[derive(thiserror::Error, Debug)]
#[error("{stage} stage failed for plugin '{plugin}'")]
pub struct RunError {
    /// Stage that failed.
    pub stage: Stage,
    /// Requested plugin name.
    pub plugin: String,
    /// Underlying failure.
    #[source]
    pub error: PixformError,
}

/// Summary of a successful run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Name the transform was resolved by.
    pub plugin: String,
    /// Where the transform came from.
    pub origin: PluginOrigin,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Wall time of each stage, in execution order.
    pub stage_timings: Vec<(Stage, Duration)>,
    /// Wall time of the whole run.
    pub total: Duration,
}

struct StageClock<'a> {
    plugin: &'a str,
    timings: Vec<(Stage, Duration)>,
}

impl<'a> StageClock<'a> {
    fn new(plugin: &'a str) -> Self {
        Self {
            plugin,
            timings: Vec::with_capacity(Stage::ALL.len()),
        }
    }

    fn time<T>(
        &mut self,
        stage: Stage,
        f: impl FnOnce() -> PixformResult<T>,
    ) -> Result<T, RunError> {
        let t0 = Instant::now();
        let out = f();
        let elapsed = t0.elapsed();
        self.timings.push((stage, elapsed));
        match out {
            Ok(v) => {
                tracing::debug!(%stage, elapsed_us = elapsed.as_micros() as u64, "stage complete");
                Ok(v)
            }
            Err(error) => Err(RunError {
                stage,
                plugin: self.plugin.to_string(),
                error,
            }),
        }
    }
}

/// Transform execution against a plugin registry, without any file IO.
#[derive(Clone, Debug, Default)]
pub struct Engine {
    registry: PluginRegistry,
    threads: Option<usize>,
}

impl Engine {
    /// Engine resolving built-ins plus libraries under `plugin_paths`.
    pub fn new(plugin_paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            registry: PluginRegistry::new(plugin_paths),
            threads: None,
        }
    }

    /// Run transforms on a dedicated pool of `threads` workers.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// The registry transforms are resolved from.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Resolve `plugin`, bind `params` and run it over `image`.
    pub fn process(
        &self,
        plugin: &str,
        image: &ImageBuffer,
        params: &ParamDocument,
    ) -> Result<ImageBuffer, RunError> {
        let mut clock = StageClock::new(plugin);
        let resolved = clock.time(Stage::Resolve, || self.registry.resolve(plugin))?;
        let bound = clock.time(Stage::Bind, || bind(params, resolved.transform.schema()))?;
        clock.time(Stage::Execute, || {
            execute(resolved.transform.as_ref(), image, &bound, self.threads)
        })
    }
}

/// Run one transform from files to file.
///
/// Stages run in [`Stage::ALL`] order and the first failure aborts the run. The output file is
/// only created by the final rename, so a failed run never leaves one behind. Any plugin library
/// loaded for the run is released before this returns.
#[tracing::instrument(skip(config), fields(plugin = %config.plugin))]
pub fn run(config: &RunConfig) -> Result<RunReport, RunError> {
    let started = Instant::now();
    let engine = Engine::new(config.plugin_paths.iter().cloned()).with_threads(config.threads);
    let mut clock = StageClock::new(&config.plugin);

    let image = clock.time(Stage::Decode, || read_image(&config.input))?;
    let doc = clock.time(Stage::LoadParams, || ParamDocument::read(&config.params))?;
    let resolved = clock.time(Stage::Resolve, || engine.registry.resolve(&config.plugin))?;
    let bound = clock.time(Stage::Bind, || bind(&doc, resolved.transform.schema()))?;
    let output = clock.time(Stage::Execute, || {
        execute(resolved.transform.as_ref(), &image, &bound, engine.threads)
    })?;
    let origin = resolved.origin.clone();
    drop(resolved);

    clock.time(Stage::Encode, || {
        let png = encode_png(&output)?;
        write_atomic(&config.output, &png)
    })?;

    let report = RunReport {
        plugin: config.plugin.clone(),
        origin,
        width: image.width(),
        height: image.height(),
        stage_timings: clock.timings,
        total: started.elapsed(),
    };
    tracing::info!(
        origin = %report.origin,
        width = report.width,
        height = report.height,
        total_ms = report.total.as_millis() as u64,
        output = %config.output.display(),
        "run complete"
    );
    Ok(report)
}

fn execute(
    transform: &dyn Transform,
    image: &ImageBuffer,
    params: &BoundParams,
    threads: Option<usize>,
) -> PixformResult<ImageBuffer> {
    match threads {
        None => transform.execute(image, params),
        Some(n) => build_thread_pool(n)?.install(|| transform.execute(image, params)),
    }
}

fn build_thread_pool(threads: usize) -> PixformResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(PixformError::config("thread count must be at least 1"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| PixformError::config(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/engine/pipeline.rs"]
mod tests;
