use std::ffi::CStr;

use super::*;
use crate::{
    kernels::mirror::MirrorTransform,
    params::{bind::BoundParams, schema::Schema},
};

unsafe extern "C" fn mirror_execute(
    width: u32,
    height: u32,
    src: *const u8,
    dst: *mut u8,
    len: usize,
    params_json: *const c_char,
) -> i32 {
    let t = MirrorTransform::default();
    unsafe { execute_exported(&t, width, height, src, dst, len, params_json) }
}

fn call(width: u32, height: u32, src: &[u8], dst: &mut [u8], params: &CStr) -> i32 {
    unsafe {
        mirror_execute(
            width,
            height,
            src.as_ptr(),
            dst.as_mut_ptr(),
            dst.len(),
            params.as_ptr(),
        )
    }
}

#[test]
fn status_codes_round_trip() {
    for status in [
        PluginStatus::Ok,
        PluginStatus::InvalidParams,
        PluginStatus::NullPointer,
        PluginStatus::Panic,
        PluginStatus::SizeIsTooBig,
        PluginStatus::ExecutionFailed,
    ] {
        assert_eq!(PluginStatus::from_code(status as i32), Some(status));
    }
    assert_eq!(PluginStatus::from_code(-1), None);
    assert_eq!(PluginStatus::from_code(6), None);
}

#[test]
fn check_maps_codes_to_errors() {
    assert!(PluginStatus::check(0, "p", 2, 2).is_ok());
    assert!(matches!(
        PluginStatus::check(1, "p", 2, 2),
        Err(PixformError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        PluginStatus::check(4, "p", 7, 9),
        Err(PixformError::DimensionOverflow {
            width: 7,
            height: 9
        })
    ));
    match PluginStatus::check(3, "p", 1, 1) {
        Err(PixformError::PluginExecution { name, reason }) => {
            assert_eq!(name, "p");
            assert!(reason.contains("panicked"), "{reason}");
        }
        other => panic!("expected PluginExecution, got {other:?}"),
    }
    match PluginStatus::check(99, "p", 1, 1) {
        Err(PixformError::PluginExecution { reason, .. }) => assert!(reason.contains("99")),
        other => panic!("expected PluginExecution, got {other:?}"),
    }
}

#[test]
fn exported_declaration_describes_the_transform() {
    let t = MirrorTransform::default();
    let exported = ExportedPlugin::new("mirror_plugin", "0.3.1", &t, mirror_execute).unwrap();
    let decl = unsafe { &*exported.declaration() };

    assert_eq!(decl.abi_version, PIXFORM_ABI_VERSION);
    let name = unsafe { CStr::from_ptr(decl.name) };
    let version = unsafe { CStr::from_ptr(decl.version) };
    let schema_json = unsafe { CStr::from_ptr(decl.schema_json) };
    assert_eq!(name.to_str().unwrap(), "mirror_plugin");
    assert_eq!(version.to_str().unwrap(), "0.3.1");

    let schema = Schema::from_json(schema_json.to_str().unwrap()).unwrap();
    assert_eq!(&schema, t.schema());
}

#[test]
fn exported_entry_point_runs_the_transform() {
    let src = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let mut dst = [0u8; 8];
    let code = call(2, 1, &src, &mut dst, c"{\"axis\":\"horizontal\"}");
    assert_eq!(code, PluginStatus::Ok as i32);
    assert_eq!(dst, [5, 6, 7, 8, 1, 2, 3, 4]);
}

#[test]
fn null_pointers_are_reported() {
    let mut dst = [0u8; 4];
    let code = unsafe {
        mirror_execute(
            1,
            1,
            std::ptr::null(),
            dst.as_mut_ptr(),
            4,
            c"{}".as_ptr(),
        )
    };
    assert_eq!(code, PluginStatus::NullPointer as i32);
}

#[test]
fn length_mismatch_is_size_error() {
    let src = [0u8; 8];
    let mut dst = [0u8; 8];
    let code = call(3, 1, &src, &mut dst, c"{\"axis\":\"both\"}");
    assert_eq!(code, PluginStatus::SizeIsTooBig as i32);
    assert_eq!(dst, [0; 8]);
}

#[test]
fn bad_parameters_are_rejected() {
    let src = [9u8; 4];
    let mut dst = [0u8; 4];
    for params in [
        c"{\"axis\":\"sideways\"}",
        c"{\"axis\":\"both\",\"extra\":1}",
        c"not json",
    ] {
        assert_eq!(
            call(1, 1, &src, &mut dst, params),
            PluginStatus::InvalidParams as i32,
            "{params:?}"
        );
    }
}

struct Shrink(Schema);

impl Transform for Shrink {
    fn name(&self) -> &str {
        "shrink"
    }

    fn schema(&self) -> &Schema {
        &self.0
    }

    fn execute(&self, _image: &ImageBuffer, _params: &BoundParams) -> PixformResult<ImageBuffer> {
        ImageBuffer::zeroed(1, 1)
    }
}

#[test]
fn resized_output_is_an_execution_failure() {
    let t = Shrink(Schema::new());
    let src = [7u8; 8];
    let mut dst = [0u8; 8];
    let code = unsafe {
        execute_exported(
            &t,
            2,
            1,
            src.as_ptr(),
            dst.as_mut_ptr(),
            dst.len(),
            c"{}".as_ptr(),
        )
    };
    assert_eq!(code, PluginStatus::ExecutionFailed as i32);
    assert_eq!(dst, [0; 8]);
    assert!(matches!(
        PluginStatus::check(code, "shrink", 2, 1),
        Err(PixformError::PluginExecution { .. })
    ));
}
