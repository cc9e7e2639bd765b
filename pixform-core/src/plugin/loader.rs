//! Dynamic plugin discovery and loading with `libloading`.
//!
//! Loading a library runs its initialisers, so only directories the caller trusts should be
//! placed on the search path. Everything the library hands back is validated before use.
#![allow(unsafe_code)]

use std::ffi::{CStr, CString, c_char};
use std::path::{Path, PathBuf};

use libloading::Library;

use crate::{
    foundation::{
        error::{PixformError, PixformResult},
        image::ImageBuffer,
    },
    kernels::Transform,
    params::{bind::BoundParams, schema::Schema},
    plugin::abi::{
        ABI_VERSION_SYMBOL, AbiVersionFn, DECLARATION_SYMBOL, DeclarationFn, ExecuteFn,
        PIXFORM_ABI_VERSION, PluginDeclaration, PluginStatus,
    },
};

/// Owned copy of a validated [`PluginDeclaration`].
#[derive(Clone, Debug)]
pub struct DeclarationInfo {
    /// Declared plugin name.
    pub name: String,
    /// Declared plugin version.
    pub version: String,
    /// Parsed and validated parameter schema.
    pub schema: Schema,
    /// Transform entry point.
    pub execute: ExecuteFn,
}

/// Validate a raw declaration and copy it out of plugin memory.
///
/// `name` is the requested plugin name, used for error reporting only.
///
/// # Safety
///
/// `decl` must be null or point to a `PluginDeclaration` whose non-null string fields are
/// NUL-terminated and remain valid for the duration of the call.
pub unsafe fn read_declaration(
    name: &str,
    decl: *const PluginDeclaration,
) -> PixformResult<DeclarationInfo> {
    if decl.is_null() {
        return Err(PixformError::incompatible(name, "declaration pointer is null"));
    }
    // SAFETY: non-null, and valid per the contract above.
    let decl = unsafe { &*decl };
    if decl.abi_version != PIXFORM_ABI_VERSION {
        return Err(PixformError::incompatible(
            name,
            format!(
                "declaration ABI version {} does not match host version {PIXFORM_ABI_VERSION}",
                decl.abi_version
            ),
        ));
    }

    // SAFETY: forwarded from the contract above.
    let declared_name = unsafe { read_str(name, "name", decl.name) }?;
    let version = unsafe { read_str(name, "version", decl.version) }?;
    let schema_json = unsafe { read_str(name, "schema_json", decl.schema_json) }?;

    if declared_name.is_empty() {
        return Err(PixformError::incompatible(name, "declared name is empty"));
    }
    let schema = Schema::from_json(&schema_json)
        .map_err(|reason| PixformError::incompatible(name, reason))?;

    Ok(DeclarationInfo {
        name: declared_name,
        version,
        schema,
        execute: decl.execute,
    })
}

unsafe fn read_str(name: &str, field: &str, ptr: *const c_char) -> PixformResult<String> {
    if ptr.is_null() {
        return Err(PixformError::incompatible(
            name,
            format!("declaration field '{field}' is null"),
        ));
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    let s = unsafe { CStr::from_ptr(ptr) };
    s.to_str().map(str::to_owned).map_err(|_| {
        PixformError::incompatible(name, format!("declaration field '{field}' is not UTF-8"))
    })
}

/// A transform backed by a loaded plugin library.
///
/// Holds the library open; dropping the transform unloads it.
pub struct DynamicTransform {
    name: String,
    version: String,
    path: PathBuf,
    schema: Schema,
    execute: ExecuteFn,
    _library: Library,
}

impl DynamicTransform {
    /// Version string the plugin declared.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Library file the plugin was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for DynamicTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicTransform")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Transform for DynamicTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn execute(&self, image: &ImageBuffer, params: &BoundParams) -> PixformResult<ImageBuffer> {
        let params_json = CString::new(params.to_json_string())
            .map_err(|e| PixformError::config(format!("bound parameters contain NUL: {e}")))?;
        let (width, height) = (image.width(), image.height());
        let mut out = ImageBuffer::zeroed(width, height)?;
        let len = out.as_bytes().len();

        // SAFETY: `src` and `dst` are distinct buffers of exactly `len` bytes, `params_json` is
        // NUL-terminated, and the library stays loaded for as long as `self` lives.
        let code = unsafe {
            (self.execute)(
                width,
                height,
                image.as_bytes().as_ptr(),
                out.as_bytes_mut().as_mut_ptr(),
                len,
                params_json.as_ptr(),
            )
        };
        PluginStatus::check(code, &self.name, width, height)?;
        Ok(out)
    }
}

impl Drop for DynamicTransform {
    fn drop(&mut self) {
        tracing::debug!(plugin = %self.name, path = %self.path.display(), "unloading plugin library");
    }
}

/// Finds plugin libraries by name across an ordered list of directories.
#[derive(Clone, Debug, Default)]
pub struct PluginLoader {
    search_paths: Vec<PathBuf>,
}

impl PluginLoader {
    /// Loader over `search_paths`, searched in order.
    pub fn new(search_paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Directories searched, in order.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Load the first library in the search path that declares itself as `name`.
    ///
    /// A library whose declared name differs is released and the search continues.
    #[tracing::instrument(skip(self))]
    pub fn find(&self, name: &str) -> PixformResult<DynamicTransform> {
        let file_name = libloading::library_filename(name);
        for dir in &self.search_paths {
            let path = dir.join(&file_name);
            if !path.is_file() {
                tracing::trace!(path = %path.display(), "no candidate");
                continue;
            }
            let transform = load_library(name, &path)?;
            if transform.name() != name {
                tracing::warn!(
                    path = %path.display(),
                    declared = transform.name(),
                    requested = name,
                    "plugin declares a different name, skipping"
                );
                continue;
            }
            tracing::info!(
                plugin = name,
                version = transform.version(),
                path = %path.display(),
                "loaded dynamic plugin"
            );
            return Ok(transform);
        }
        Err(PixformError::PluginNotFound {
            name: name.to_string(),
            searched: self.search_paths.clone(),
        })
    }
}

/// Open `path`, check the ABI version, then read and validate the declaration.
///
/// `name` is the requested plugin name, used for error reporting.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_library(name: &str, path: &Path) -> PixformResult<DynamicTransform> {
    // SAFETY: loading runs the library's initialisers; search directories are trusted.
    let library = unsafe { Library::new(path) }.map_err(|e| PixformError::PluginLoadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let abi_version: AbiVersionFn = {
        // SAFETY: the symbol type is fixed by the plugin ABI.
        let sym = unsafe { library.get::<AbiVersionFn>(ABI_VERSION_SYMBOL) }.map_err(|_| {
            PixformError::incompatible(name, "missing symbol 'pixform_abi_version'")
        })?;
        *sym
    };
    // SAFETY: takes no arguments and only returns a constant.
    let version = unsafe { abi_version() };
    if version != PIXFORM_ABI_VERSION {
        return Err(PixformError::incompatible(
            name,
            format!("ABI version {version} does not match host version {PIXFORM_ABI_VERSION}"),
        ));
    }

    let declaration: DeclarationFn = {
        // SAFETY: the symbol type is fixed by the plugin ABI.
        let sym = unsafe { library.get::<DeclarationFn>(DECLARATION_SYMBOL) }.map_err(|_| {
            PixformError::incompatible(name, "missing symbol 'pixform_plugin_declaration'")
        })?;
        *sym
    };
    // SAFETY: the ABI version matched, so the declaration layout is the one we expect; the
    // pointed-to data lives as long as `library`.
    let info = unsafe { read_declaration(name, declaration()) }?;

    Ok(DynamicTransform {
        name: info.name,
        version: info.version,
        path: path.to_path_buf(),
        schema: info.schema,
        execute: info.execute,
        _library: library,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/plugin/loader.rs"]
mod tests;
