//! Transform kernels and the capability trait every plugin implements.

pub(crate) mod blur;
pub(crate) mod mirror;

use crate::{
    foundation::{error::PixformResult, image::ImageBuffer},
    params::{bind::BoundParams, schema::Schema},
};

/// A named image transform.
///
/// Built-ins and dynamically loaded plugins both surface through this trait, so the engine never
/// needs to know where a transform came from once it is resolved. Implementations must be pure:
/// no I/O and no shared mutable state.
pub trait Transform: Send + Sync {
    /// Name the transform is resolved by.
    fn name(&self) -> &str;

    /// Parameters the transform accepts.
    fn schema(&self) -> &Schema;

    /// Produce a new image from `image`. `params` has already been bound against
    /// [`Transform::schema`].
    fn execute(&self, image: &ImageBuffer, params: &BoundParams) -> PixformResult<ImageBuffer>;
}
