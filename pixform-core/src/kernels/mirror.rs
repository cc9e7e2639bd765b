use serde::{Deserialize, Serialize};

use crate::{
    foundation::{
        error::PixformResult,
        image::{CHANNELS, ImageBuffer},
    },
    kernels::Transform,
    params::{
        bind::BoundParams,
        schema::{FieldSpec, Schema},
    },
};

/// Built-in name of the mirror transform.
pub const MIRROR: &str = "mirror";

/// Reflection axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Reverse column order within each row.
    Horizontal,
    /// Reverse row order.
    Vertical,
    /// Both reflections (a 180 degree rotation).
    Both,
}

impl Axis {
    const NAMES: [&'static str; 3] = ["horizontal", "vertical", "both"];

    fn flips(self) -> (bool, bool) {
        match self {
            Axis::Horizontal => (true, false),
            Axis::Vertical => (false, true),
            Axis::Both => (true, true),
        }
    }
}

/// Typed mirror configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    /// Axis to reflect across.
    pub axis: Axis,
}

/// Reflect `src` across `axis` into a new buffer.
///
/// Pure index permutation: the output holds exactly the input pixels.
pub fn mirror_image(src: &ImageBuffer, axis: Axis) -> PixformResult<ImageBuffer> {
    let (flip_x, flip_y) = axis.flips();
    let h = src.height() as usize;
    let stride = src.stride();
    let src_bytes = src.as_bytes();

    let mut out = ImageBuffer::zeroed(src.width(), src.height())?;
    for (y, dst_row) in out.as_bytes_mut().chunks_exact_mut(stride).enumerate() {
        let sy = if flip_y { h - 1 - y } else { y };
        let src_row = &src_bytes[sy * stride..(sy + 1) * stride];
        if flip_x {
            for (d, s) in dst_row
                .chunks_exact_mut(CHANNELS)
                .zip(src_row.chunks_exact(CHANNELS).rev())
            {
                d.copy_from_slice(s);
            }
        } else {
            dst_row.copy_from_slice(src_row);
        }
    }
    Ok(out)
}

/// The `mirror` transform.
#[derive(Debug)]
pub struct MirrorTransform {
    schema: Schema,
}

impl Default for MirrorTransform {
    fn default() -> Self {
        Self {
            schema: Schema::new().field(
                FieldSpec::one_of("axis", &Axis::NAMES).describe("reflection axis"),
            ),
        }
    }
}

impl Transform for MirrorTransform {
    fn name(&self) -> &str {
        MIRROR
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn execute(&self, image: &ImageBuffer, params: &BoundParams) -> PixformResult<ImageBuffer> {
        let cfg: MirrorConfig = params.decode()?;
        tracing::debug!(axis = ?cfg.axis, "mirror");
        mirror_image(image, cfg.axis)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/mirror.rs"]
mod tests;
