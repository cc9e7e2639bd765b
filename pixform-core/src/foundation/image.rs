use crate::foundation::error::{PixformError, PixformResult};

/// Bytes per pixel of the fixed RGBA8 format.
pub const CHANNELS: usize = 4;

/// Owned, row-major RGBA8 pixel store.
///
/// The store length always equals `width * height * 4`. Transforms never mutate their input;
/// they produce a fresh buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Wrap an existing pixel store, checking the size invariant.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> PixformResult<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(PixformError::image(format!(
                "pixel store has {} bytes, expected {expected} for {width}x{height} RGBA8",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Allocate a zeroed buffer. Allocation failure maps to [`PixformError::DimensionOverflow`].
    pub fn zeroed(width: u32, height: u32) -> PixformResult<Self> {
        let data = try_alloc(byte_len(width, height)?, width, height)?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a buffer with every pixel set to `px`.
    pub fn filled(width: u32, height: u32, px: [u8; 4]) -> PixformResult<Self> {
        let mut img = Self::zeroed(width, height)?;
        for dst in img.data.chunks_exact_mut(CHANNELS) {
            dst.copy_from_slice(&px);
        }
        Ok(img)
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Raw RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw bytes. The length cannot change through this view.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer and return its store.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Read one pixel. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Write one pixel. Panics when out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = self.index(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&px);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel ({x},{y}) out of bounds");
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

impl std::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// `width * height * 4`, rejecting empty images and sizes past `isize::MAX`.
pub fn byte_len(width: u32, height: u32) -> PixformResult<usize> {
    if width == 0 || height == 0 {
        return Err(PixformError::image(format!(
            "dimensions must be non-zero, got {width}x{height}"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(CHANNELS))
        .filter(|&v| v <= isize::MAX as usize)
        .ok_or(PixformError::DimensionOverflow { width, height })
}

/// Fallible zero-initialised allocation for image-sized scratch buffers.
pub(crate) fn try_alloc<T: Clone + Default>(
    len: usize,
    width: u32,
    height: u32,
) -> PixformResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| PixformError::DimensionOverflow { width, height })?;
    v.resize(len, T::default());
    Ok(v)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/image.rs"]
mod tests;
