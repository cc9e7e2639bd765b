//! The box blur transform as a dynamically loadable plugin.
//!
//! Accepts the same parameters as the built-in `blur`: `radius` and an optional `iterations`.

pixform::export_plugin! {
    name: "blur_plugin",
    version: env!("CARGO_PKG_VERSION"),
    transform: pixform::BoxBlurTransform,
}
