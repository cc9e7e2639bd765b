//! Adapter between encoded image files and [`ImageBuffer`].

use std::io::Write;
use std::path::Path;

use image::{ExtendedColorType, ImageEncoder, codecs::png::PngEncoder};

use crate::foundation::{
    error::{PixformError, PixformResult},
    image::ImageBuffer,
};

/// Decode encoded image bytes (any format the `image` crate was built with) into straight RGBA8.
pub fn decode_image(bytes: &[u8]) -> PixformResult<ImageBuffer> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| PixformError::image(format!("decode failed: {e}")))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    ImageBuffer::from_raw(width, height, rgba.into_raw())
}

/// Read and decode the image at `path`.
#[tracing::instrument]
pub fn read_image(path: &Path) -> PixformResult<ImageBuffer> {
    let bytes = std::fs::read(path).map_err(|e| PixformError::input_io(path, e))?;
    decode_image(&bytes).map_err(|e| match e {
        PixformError::InvalidImage(reason) => PixformError::input_io(path, reason),
        other => other,
    })
}

/// Encode an RGBA8 buffer as PNG.
pub fn encode_png(image: &ImageBuffer) -> PixformResult<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            image.as_bytes(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| PixformError::image(format!("png encode failed: {e}")))?;
    Ok(out)
}

/// Write `bytes` to `path` through a temporary file in the same directory, renamed into place
/// only after the write completed. On failure `path` is left untouched.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn write_atomic(path: &Path, bytes: &[u8]) -> PixformResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let io_err = |e: std::io::Error| PixformError::input_io(path, e);

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/codec/mod.rs"]
mod tests;
