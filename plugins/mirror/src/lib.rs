//! The mirror transform as a dynamically loadable plugin.
//!
//! Build the workspace and point the host at the output directory:
//!
//! ```text
//! pixform --plugin mirror_plugin --plugin-path target/debug \
//!     --input in.png --output out.png --params mirror.json
//! ```

pixform::export_plugin! {
    name: "mirror_plugin",
    version: env!("CARGO_PKG_VERSION"),
    transform: pixform::MirrorTransform,
}
