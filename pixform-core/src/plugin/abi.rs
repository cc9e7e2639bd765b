//! C-compatible surface shared by the host and dynamically loaded plugins.
//!
//! A plugin library exports two unmangled symbols:
//!
//! ```c
//! uint32_t pixform_abi_version(void);
//! const PluginDeclaration* pixform_plugin_declaration(void);
//! ```
//!
//! The host reads the version first and refuses to touch the declaration on mismatch. Plugins
//! written in Rust should use [`export_plugin!`](crate::export_plugin) rather than filling the
//! structures by hand.
#![allow(unsafe_code)]

use std::ffi::{CStr, CString, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::{
    foundation::{
        error::{PixformError, PixformResult},
        image::{ImageBuffer, byte_len},
    },
    kernels::Transform,
    params::{bind::bind, document::ParamDocument},
};

/// Current ABI version. Plugins must match it exactly to be loaded.
pub const PIXFORM_ABI_VERSION: u32 = 1;

/// Symbol returning the plugin's ABI version.
pub const ABI_VERSION_SYMBOL: &[u8] = b"pixform_abi_version\0";

/// Symbol returning the plugin's [`PluginDeclaration`].
pub const DECLARATION_SYMBOL: &[u8] = b"pixform_plugin_declaration\0";

/// Signature of [`ABI_VERSION_SYMBOL`].
pub type AbiVersionFn = unsafe extern "C" fn() -> u32;

/// Signature of [`DECLARATION_SYMBOL`].
pub type DeclarationFn = unsafe extern "C" fn() -> *const PluginDeclaration;

/// Transform entry point.
///
/// Reads `len` bytes of RGBA8 from `src` and writes exactly `len` bytes to `dst`; output
/// dimensions equal input dimensions. `params_json` is the NUL-terminated, host-bound parameter
/// object. Returns a [`PluginStatus`] code.
pub type ExecuteFn = unsafe extern "C" fn(
    width: u32,
    height: u32,
    src: *const u8,
    dst: *mut u8,
    len: usize,
    params_json: *const c_char,
) -> i32;

/// Status codes returned by [`ExecuteFn`].
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PluginStatus {
    /// Success; `dst` holds the result.
    Ok = 0,
    /// The plugin rejected the parameters.
    InvalidParams = 1,
    /// A pointer argument was null.
    NullPointer = 2,
    /// The transform panicked; the panic was caught at the boundary.
    Panic = 3,
    /// `width * height * 4` does not fit or does not match `len`.
    SizeIsTooBig = 4,
    /// Any other transform failure.
    ExecutionFailed = 5,
}

impl PluginStatus {
    /// Map a raw code, `None` for codes this ABI version does not define.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::InvalidParams),
            2 => Some(Self::NullPointer),
            3 => Some(Self::Panic),
            4 => Some(Self::SizeIsTooBig),
            5 => Some(Self::ExecutionFailed),
            _ => None,
        }
    }

    /// Host-side interpretation of a returned code.
    pub fn check(code: i32, name: &str, width: u32, height: u32) -> PixformResult<()> {
        let failed = |reason: &str| PixformError::PluginExecution {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        match Self::from_code(code) {
            Some(Self::Ok) => Ok(()),
            Some(Self::InvalidParams) => Err(PixformError::config(format!(
                "plugin '{name}' rejected host-validated parameters"
            ))),
            Some(Self::SizeIsTooBig) => Err(PixformError::DimensionOverflow { width, height }),
            Some(Self::NullPointer) => Err(failed("received a null pointer")),
            Some(Self::Panic) => Err(failed("panicked during execution")),
            Some(Self::ExecutionFailed) => Err(failed("transform reported an error")),
            None => Err(failed(&format!("returned unknown status code {code}"))),
        }
    }

    fn from_error(err: &PixformError) -> Self {
        match err {
            PixformError::ParamSchema { .. }
            | PixformError::ParamParse { .. }
            | PixformError::InvalidConfiguration(_) => Self::InvalidParams,
            PixformError::DimensionOverflow { .. } => Self::SizeIsTooBig,
            _ => Self::ExecutionFailed,
        }
    }
}

/// Plugin descriptor returned by `pixform_plugin_declaration()`.
#[repr(C)]
pub struct PluginDeclaration {
    /// Must equal [`PIXFORM_ABI_VERSION`].
    pub abi_version: u32,
    /// NUL-terminated plugin name; must match the name it is resolved by.
    pub name: *const c_char,
    /// NUL-terminated plugin version.
    pub version: *const c_char,
    /// NUL-terminated JSON schema descriptor (the [`Schema`](crate::Schema) serde form).
    pub schema_json: *const c_char,
    /// Transform entry point.
    pub execute: ExecuteFn,
}

// SAFETY: the declaration only points at immutable data owned by the plugin for as long as the
// library stays loaded.
unsafe impl Send for PluginDeclaration {}
unsafe impl Sync for PluginDeclaration {}

/// Owned strings plus the declaration that points into them. Lives in a static inside the plugin.
pub struct ExportedPlugin {
    _name: CString,
    _version: CString,
    _schema_json: CString,
    declaration: PluginDeclaration,
}

impl ExportedPlugin {
    /// Describe `transform` under `name`. Fails only if the schema cannot be serialized.
    pub fn new(
        name: &str,
        version: &str,
        transform: &dyn Transform,
        execute: ExecuteFn,
    ) -> PixformResult<Self> {
        let schema_json = transform.schema().to_json().map_err(|e| {
            PixformError::config(format!("cannot serialize schema of '{name}': {e}"))
        })?;
        let name = c_string(name);
        let version = c_string(version);
        let schema_json = c_string(&schema_json);
        let declaration = PluginDeclaration {
            abi_version: PIXFORM_ABI_VERSION,
            name: name.as_ptr(),
            version: version.as_ptr(),
            schema_json: schema_json.as_ptr(),
            execute,
        };
        Ok(Self {
            _name: name,
            _version: version,
            _schema_json: schema_json,
            declaration,
        })
    }

    /// Pointer handed out through `pixform_plugin_declaration()`.
    pub fn declaration(&self) -> *const PluginDeclaration {
        &self.declaration
    }
}

fn c_string(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

/// Body of an exported [`ExecuteFn`]: validate the raw arguments, re-bind the parameters against
/// the transform's own schema, run it, and copy the result into `dst`. Never unwinds.
///
/// # Safety
///
/// `src` must be readable and `dst` writable for `len` bytes, and `params_json` must point to a
/// NUL-terminated string; null pointers are detected and reported.
pub unsafe fn execute_exported(
    transform: &dyn Transform,
    width: u32,
    height: u32,
    src: *const u8,
    dst: *mut u8,
    len: usize,
    params_json: *const c_char,
) -> i32 {
    if src.is_null() || dst.is_null() || params_json.is_null() {
        return PluginStatus::NullPointer as i32;
    }
    match byte_len(width, height) {
        Ok(expected) if expected == len => {}
        _ => return PluginStatus::SizeIsTooBig as i32,
    }

    let result = catch_unwind(AssertUnwindSafe(|| -> PixformResult<()> {
        // SAFETY: non-null and NUL-terminated per the contract above.
        let params = unsafe { CStr::from_ptr(params_json) };
        // SAFETY: `src` is readable for `len` bytes per the contract above.
        let pixels = unsafe { std::slice::from_raw_parts(src, len) };

        let doc = ParamDocument::from_slice(params.to_bytes())?;
        let bound = bind(&doc, transform.schema())?;
        let image = ImageBuffer::from_raw(width, height, pixels.to_vec())?;
        let out = transform.execute(&image, &bound)?;
        if out.as_bytes().len() != len {
            return Err(PixformError::image("transform changed the image dimensions"));
        }
        // SAFETY: `dst` is writable for `len` bytes and does not alias the copy we read from.
        unsafe { std::ptr::copy_nonoverlapping(out.as_bytes().as_ptr(), dst, len) };
        Ok(())
    }));

    match result {
        Ok(Ok(())) => PluginStatus::Ok as i32,
        Ok(Err(err)) => PluginStatus::from_error(&err) as i32,
        Err(_) => PluginStatus::Panic as i32,
    }
}

/// Export a [`Transform`] from a `cdylib` under the plugin ABI.
///
/// ```ignore
/// pixform::export_plugin! {
///     name: "mirror_plugin",
///     version: env!("CARGO_PKG_VERSION"),
///     transform: pixform::MirrorTransform,
/// }
/// ```
///
/// The transform type must implement `Default`; one instance is created lazily and shared.
#[macro_export]
macro_rules! export_plugin {
    (
        name: $name:expr,
        version: $version:expr,
        transform: $transform:ty $(,)?
    ) => {
        fn __pixform_exported_transform() -> &'static $transform {
            static TRANSFORM: ::std::sync::OnceLock<$transform> = ::std::sync::OnceLock::new();
            TRANSFORM.get_or_init(<$transform as ::std::default::Default>::default)
        }

        unsafe extern "C" fn __pixform_execute(
            width: u32,
            height: u32,
            src: *const u8,
            dst: *mut u8,
            len: usize,
            params_json: *const ::std::ffi::c_char,
        ) -> i32 {
            // SAFETY: forwarded verbatim; the host upholds the `ExecuteFn` contract.
            unsafe {
                $crate::plugin::abi::execute_exported(
                    __pixform_exported_transform(),
                    width,
                    height,
                    src,
                    dst,
                    len,
                    params_json,
                )
            }
        }

        /// ABI version this plugin was built against.
        #[unsafe(no_mangle)]
        pub extern "C" fn pixform_abi_version() -> u32 {
            $crate::plugin::abi::PIXFORM_ABI_VERSION
        }

        /// Plugin declaration read by the host after the ABI check. Null if the declaration
        /// could not be built.
        #[unsafe(no_mangle)]
        pub extern "C" fn pixform_plugin_declaration()
        -> *const $crate::plugin::abi::PluginDeclaration {
            static EXPORTED: ::std::sync::OnceLock<
                ::std::option::Option<$crate::plugin::abi::ExportedPlugin>,
            > = ::std::sync::OnceLock::new();
            EXPORTED
                .get_or_init(|| {
                    $crate::plugin::abi::ExportedPlugin::new(
                        $name,
                        $version,
                        __pixform_exported_transform(),
                        __pixform_execute,
                    )
                    .ok()
                })
                .as_ref()
                .map_or(::std::ptr::null(), $crate::plugin::abi::ExportedPlugin::declaration)
        }
    };
}

#[cfg(test)]
#[path = "../../tests/unit/plugin/abi.rs"]
mod tests;
