use super::*;

#[test]
fn schema_error_names_the_field() {
    let err = PixformError::schema("radius", "must be >= 1");
    let msg = err.to_string();
    assert!(msg.contains("'radius'"));
    assert!(msg.contains("must be >= 1"));
}

#[test]
fn not_found_lists_searched_dirs() {
    let err = PixformError::PluginNotFound {
        name: "nonexistent".to_string(),
        searched: vec![PathBuf::from("/a"), PathBuf::from("/b")],
    };
    let msg = err.to_string();
    assert!(msg.contains("'nonexistent'"));
    assert!(msg.contains("/a, /b"));

    let err = PixformError::PluginNotFound {
        name: "x".to_string(),
        searched: Vec::new(),
    };
    assert!(err.to_string().contains("built-ins only"));
}

#[test]
fn io_error_includes_path() {
    let err = PixformError::input_io("in.png", std::io::Error::other("boom"));
    let msg = err.to_string();
    assert!(msg.contains("in.png"));
    assert!(msg.contains("boom"));
}

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PixformError::config("x")
            .to_string()
            .starts_with("invalid configuration:")
    );
    assert!(
        PixformError::image("x")
            .to_string()
            .starts_with("invalid image:")
    );
    assert!(
        PixformError::incompatible("p", "abi")
            .to_string()
            .contains("is incompatible: abi")
    );
}
