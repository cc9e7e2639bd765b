//! Pixform runs one named image transform over one image.
//!
//! A transform is either compiled in (`mirror`, `blur`, `gaussian_blur`) or loaded from a plugin
//! library found on a caller-supplied search path. Every run goes through the same stages:
//!
//! 1. **Decode** the input into a straight RGBA8 [`ImageBuffer`].
//! 2. **Load params**: parse the JSON [`ParamDocument`].
//! 3. **Resolve** the transform by name through the [`PluginRegistry`].
//! 4. **Bind** the document against the transform's [`Schema`] into [`BoundParams`].
//! 5. **Execute** the [`Transform`].
//! 6. **Encode** the result as PNG and move it into place atomically.
//!
//! Input is validated before any plugin code is loaded, and a failed run never leaves an output
//! file behind.
//!
//! # Writing a plugin
//!
//! Build a `cdylib` that implements [`Transform`] and exports it with [`export_plugin!`]. The
//! library file must be named after the plugin (`lib<name>.so` on Linux) and declare the same
//! name. See [`plugin::abi`] for the raw contract.
#![deny(unsafe_code)]
#![deny(missing_docs)]

mod codec;
mod engine;
mod foundation;
mod kernels;
mod params;

/// Plugin ABI, library loader and name resolution.
pub mod plugin;

pub use codec::{decode_image, encode_png, read_image, write_atomic};
pub use engine::pipeline::{Engine, RunConfig, RunError, RunReport, Stage, run};
pub use foundation::error::{PixformError, PixformResult};
pub use foundation::image::{CHANNELS, ImageBuffer, byte_len};
pub use kernels::Transform;
pub use kernels::blur::{
    BOX_BLUR, BoxBlurConfig, BoxBlurTransform, GAUSSIAN_BLUR, GaussianBlurConfig,
    GaussianBlurTransform, MAX_ITERATIONS, MAX_RADIUS, MAX_SIGMA, box_blur, gaussian_blur,
    gaussian_kernel, gaussian_radius,
};
pub use kernels::mirror::{Axis, MIRROR, MirrorConfig, MirrorTransform, mirror_image};
pub use params::bind::{BoundParams, ROOT_FIELD, bind};
pub use params::document::ParamDocument;
pub use params::schema::{FieldKind, FieldSpec, Schema};
pub use plugin::loader::{DynamicTransform, PluginLoader};
pub use plugin::registry::{PluginOrigin, PluginRegistry, ResolvedPlugin};
