//! Name resolution over the built-in table and the plugin search path.

use std::path::PathBuf;

use crate::{
    foundation::error::PixformResult,
    kernels::{
        Transform,
        blur::{BOX_BLUR, BoxBlurTransform, GAUSSIAN_BLUR, GaussianBlurTransform},
        mirror::{MIRROR, MirrorTransform},
    },
    plugin::loader::PluginLoader,
};

type Factory = fn() -> Box<dyn Transform>;

const BUILTINS: &[(&str, Factory)] = &[
    (MIRROR, builtin::<MirrorTransform>),
    (BOX_BLUR, builtin::<BoxBlurTransform>),
    (GAUSSIAN_BLUR, builtin::<GaussianBlurTransform>),
];

fn builtin<T: Transform + Default + 'static>() -> Box<dyn Transform> {
    Box::new(T::default())
}

/// Where a resolved transform came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PluginOrigin {
    /// Compiled into the host.
    BuiltIn,
    /// Loaded from a plugin library.
    Dynamic {
        /// Library file.
        path: PathBuf,
        /// Version the plugin declared.
        version: String,
    },
}

impl std::fmt::Display for PluginOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginOrigin::BuiltIn => f.write_str("built-in"),
            PluginOrigin::Dynamic { path, version } => {
                write!(f, "{} (v{version})", path.display())
            }
        }
    }
}

/// A transform ready to bind and execute.
///
/// Dropping it releases any library it was loaded from.
pub struct ResolvedPlugin {
    /// Where the transform came from.
    pub origin: PluginOrigin,
    /// The transform itself.
    pub transform: Box<dyn Transform>,
}

impl std::fmt::Debug for ResolvedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedPlugin")
            .field("name", &self.transform.name())
            .field("origin", &self.origin)
            .finish()
    }
}

/// Name-to-transform resolution: the built-in table first, then the plugin search path.
#[derive(Clone, Debug, Default)]
pub struct PluginRegistry {
    loader: PluginLoader,
}

impl PluginRegistry {
    /// Registry over the built-ins plus `search_paths`.
    pub fn new(search_paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            loader: PluginLoader::new(search_paths),
        }
    }

    /// Names of the compiled-in transforms.
    pub fn builtin_names() -> Vec<&'static str> {
        BUILTINS.iter().map(|(name, _)| *name).collect()
    }

    /// Directories searched for plugin libraries.
    pub fn search_paths(&self) -> &[PathBuf] {
        self.loader.search_paths()
    }

    /// Resolve `name` to a transform.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, name: &str) -> PixformResult<ResolvedPlugin> {
        if let Some((_, factory)) = BUILTINS.iter().find(|(n, _)| *n == name) {
            tracing::debug!(plugin = name, "resolved built-in");
            return Ok(ResolvedPlugin {
                origin: PluginOrigin::BuiltIn,
                transform: factory(),
            });
        }

        let transform = self.loader.find(name)?;
        Ok(ResolvedPlugin {
            origin: PluginOrigin::Dynamic {
                path: transform.path().to_path_buf(),
                version: transform.version().to_string(),
            },
            transform: Box::new(transform),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plugin/registry.rs"]
mod tests;
