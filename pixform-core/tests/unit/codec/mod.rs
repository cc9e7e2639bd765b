use super::*;

fn sample() -> ImageBuffer {
    let mut img = ImageBuffer::zeroed(3, 2).unwrap();
    img.set_pixel(0, 0, [255, 0, 0, 255]);
    img.set_pixel(2, 1, [10, 20, 30, 40]);
    img.set_pixel(1, 1, [0, 0, 0, 0]);
    img
}

#[test]
fn png_preserves_straight_rgba() {
    let img = sample();
    let png = encode_png(&img).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(decode_image(&png).unwrap(), img);
}

#[test]
fn garbage_bytes_are_invalid_image() {
    assert!(matches!(
        decode_image(b"not an image"),
        Err(PixformError::InvalidImage(_))
    ));
}

#[test]
fn read_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.png");
    match read_image(&missing) {
        Err(PixformError::InputIo { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected InputIo, got {other:?}"),
    }

    let junk = dir.path().join("junk.png");
    std::fs::write(&junk, b"junk").unwrap();
    assert!(matches!(
        read_image(&junk),
        Err(PixformError::InputIo { .. })
    ));
}

#[test]
fn atomic_write_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    std::fs::write(&path, b"old").unwrap();

    write_atomic(&path, b"new contents").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"new contents");
    let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn atomic_write_into_missing_directory_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope").join("out.png");
    assert!(matches!(
        write_atomic(&path, b"x"),
        Err(PixformError::InputIo { .. })
    ));
    assert!(!path.exists());
}
