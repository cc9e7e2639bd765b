use super::*;
use crate::PixformError;

#[test]
fn builtins_resolve_without_search_paths() {
    let registry = PluginRegistry::new(Vec::<PathBuf>::new());
    for name in ["mirror", "blur", "gaussian_blur"] {
        let resolved = registry.resolve(name).unwrap();
        assert_eq!(resolved.transform.name(), name);
        assert_eq!(resolved.origin, PluginOrigin::BuiltIn);
    }
}

#[test]
fn builtin_names_are_listed() {
    assert_eq!(
        PluginRegistry::builtin_names(),
        vec!["mirror", "blur", "gaussian_blur"]
    );
}

#[test]
fn builtins_shadow_the_search_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(libloading::library_filename("mirror")),
        b"junk",
    )
    .unwrap();
    let registry = PluginRegistry::new([dir.path()]);
    assert_eq!(
        registry.resolve("mirror").unwrap().origin,
        PluginOrigin::BuiltIn
    );
}

#[test]
fn unknown_name_lists_searched_directories() {
    let dir = tempfile::tempdir().unwrap();
    let registry = PluginRegistry::new([dir.path()]);
    let err = registry.resolve("nonexistent").unwrap_err();
    match &err {
        PixformError::PluginNotFound { name, searched } => {
            assert_eq!(name, "nonexistent");
            assert_eq!(searched.as_slice(), [dir.path().to_path_buf()]);
        }
        other => panic!("expected PluginNotFound, got {other:?}"),
    }
    assert!(err.to_string().contains("nonexistent"));
}

#[test]
fn names_are_case_sensitive() {
    let registry = PluginRegistry::default();
    assert!(matches!(
        registry.resolve("Mirror"),
        Err(PixformError::PluginNotFound { .. })
    ));
}

#[test]
fn origin_display() {
    assert_eq!(PluginOrigin::BuiltIn.to_string(), "built-in");
    let dynamic = PluginOrigin::Dynamic {
        path: PathBuf::from("/p/libx.so"),
        version: "0.2.0".into(),
    };
    assert_eq!(dynamic.to_string(), "/p/libx.so (v0.2.0)");
}
