use super::*;

#[test]
fn from_raw_checks_store_length() {
    let ok = ImageBuffer::from_raw(2, 1, vec![0u8; 8]).unwrap();
    assert_eq!((ok.width(), ok.height(), ok.stride()), (2, 1, 8));

    let err = ImageBuffer::from_raw(2, 2, vec![0u8; 8]).unwrap_err();
    assert!(matches!(err, PixformError::InvalidImage(_)));
}

#[test]
fn zero_dimensions_are_rejected() {
    assert!(matches!(
        ImageBuffer::zeroed(0, 4),
        Err(PixformError::InvalidImage(_))
    ));
    assert!(matches!(
        ImageBuffer::from_raw(3, 0, Vec::new()),
        Err(PixformError::InvalidImage(_))
    ));
}

#[test]
fn oversized_dimensions_overflow() {
    assert!(matches!(
        byte_len(u32::MAX, u32::MAX),
        Err(PixformError::DimensionOverflow { .. })
    ));
}

#[cfg(target_pointer_width = "64")]
#[test]
fn unallocatable_buffer_overflows_instead_of_aborting() {
    // Addressable, but no allocator can satisfy it.
    assert!(matches!(
        ImageBuffer::zeroed(u32::MAX, u32::MAX / 8),
        Err(PixformError::DimensionOverflow { .. })
    ));
}

#[test]
fn pixel_accessors_round_trip() {
    let mut img = ImageBuffer::filled(3, 2, [1, 2, 3, 4]).unwrap();
    assert_eq!(img.pixel(2, 1), [1, 2, 3, 4]);
    img.set_pixel(2, 1, [9, 8, 7, 6]);
    assert_eq!(img.pixel(2, 1), [9, 8, 7, 6]);
    assert_eq!(&img.as_bytes()[20..24], &[9, 8, 7, 6]);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn pixel_out_of_bounds_panics() {
    let img = ImageBuffer::zeroed(1, 1).unwrap();
    let _ = img.pixel(1, 0);
}
