use ipc_pack::{Error, OnOff, Packer, ResultCode, SafeRef, Unpacker};


#[test]
fn test_u32_native_order() {
    let mut buf = [0u8; 4];
    let mut packer = Packer::new(&mut buf);
    packer.pack_u32(0xDEADBEEF).unwrap();
    assert_eq!(packer.position(), 4);
    assert_eq!(packer.remaining(), 0);
    assert_eq!(buf, 0xDEADBEEFu32.to_ne_bytes());
    assert_eq!(Unpacker::new(&buf).unpack_u32().unwrap(), 0xDEADBEEF);
}

#[test]
fn test_mixed_scalars_no_padding() {
    let mut buf = [0u8; 15];
    let mut packer = Packer::new(&mut buf);
    packer.pack_u8(7).unwrap();
    packer.pack_i16(-2).unwrap();
    packer.pack_u64(1 << 40).unwrap();
    packer.pack_i32(i32::MIN).unwrap();
    assert_eq!(packer.position(), 15);
    assert_eq!(packer.remaining(), 0);

    assert_eq!(buf[0], 7);
    assert_eq!(buf[1..3], (-2i16).to_ne_bytes());
    assert_eq!(buf[3..11], (1u64 << 40).to_ne_bytes());

    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(unpacker.unpack_u8().unwrap(), 7);
    assert_eq!(unpacker.unpack_i16().unwrap(), -2);
    assert_eq!(unpacker.unpack_u64().unwrap(), 1 << 40);
    assert_eq!(unpacker.unpack_i32().unwrap(), i32::MIN);
    assert_eq!(unpacker.remaining(), 0);
}

#[test]
fn test_scalar_roundtrip_all_widths() {
    let mut buf = [0u8; 64];
    let mut packer = Packer::new(&mut buf);
    packer.pack_u8(u8::MAX).unwrap();
    packer.pack_i8(i8::MIN).unwrap();
    packer.pack_u16(0xBEEF).unwrap();
    packer.pack_i16(i16::MIN).unwrap();
    packer.pack_u32(u32::MAX).unwrap();
    packer.pack_i32(i32::MAX).unwrap();
    packer.pack_u64(u64::MAX).unwrap();
    packer.pack_i64(i64::MIN).unwrap();
    packer.pack_f32(f32::MIN).unwrap();
    packer.pack_f64(f64::MAX).unwrap();
    packer.pack_bool(true).unwrap();
    packer.pack_char(char::MAX).unwrap();
    packer.pack_result(ResultCode::Suspended).unwrap();
    packer.pack_on_off(OnOff::Off).unwrap();
    // 1 + 1 + 2 + 2 + 4 + 4 + 8 + 8 + 4 + 8 + 1 + 4 + 4 + 4
    assert_eq!(packer.position(), 55);
    assert_eq!(packer.remaining(), 64 - 55);

    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(unpacker.unpack_u8().unwrap(), u8::MAX);
    assert_eq!(unpacker.unpack_i8().unwrap(), i8::MIN);
    assert_eq!(unpacker.unpack_u16().unwrap(), 0xBEEF);
    assert_eq!(unpacker.unpack_i16().unwrap(), i16::MIN);
    assert_eq!(unpacker.unpack_u32().unwrap(), u32::MAX);
    assert_eq!(unpacker.unpack_i32().unwrap(), i32::MAX);
    assert_eq!(unpacker.unpack_u64().unwrap(), u64::MAX);
    assert_eq!(unpacker.unpack_i64().unwrap(), i64::MIN);
    assert_eq!(unpacker.unpack_f32().unwrap(), f32::MIN);
    assert_eq!(unpacker.unpack_f64().unwrap(), f64::MAX);
    assert!(unpacker.unpack_bool().unwrap());
    assert_eq!(unpacker.unpack_char().unwrap(), char::MAX);
    assert_eq!(unpacker.unpack_result().unwrap(), ResultCode::Suspended);
    assert_eq!(unpacker.unpack_on_off().unwrap(), OnOff::Off);
    assert_eq!(unpacker.position(), 55);
    assert_eq!(unpacker.remaining(), 64 - 55);
}

#[test]
fn test_c_char_field_is_one_byte() {
    let mut buf = [0u8; 8];
    let mut packer = Packer::new(&mut buf);
    packer.pack_u8(b'x').unwrap();
    assert_eq!(packer.position(), 1);
    packer.pack_char('x').unwrap();
    assert_eq!(packer.position(), 5);
    assert_eq!(buf[0], b'x');
    assert_eq!(buf[1..5], u32::from('x').to_ne_bytes());
}

#[test]
fn test_float_bits_preserved() {
    let mut buf = [0u8; 12];
    let mut packer = Packer::new(&mut buf);
    packer.pack_f32(f32::NAN).unwrap();
    packer.pack_f64(-0.0).unwrap();

    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(unpacker.unpack_f32().unwrap().to_bits(), f32::NAN.to_bits());
    assert_eq!(unpacker.unpack_f64().unwrap().to_bits(), (-0.0f64).to_bits());
}

#[test]
fn test_bool_single_byte() {
    let mut buf = [0u8; 2];
    let mut packer = Packer::new(&mut buf);
    packer.pack_bool(true).unwrap();
    packer.pack_bool(false).unwrap();
    assert_eq!(buf, [1, 0]);

    // Any nonzero byte decodes as true
    let raw = [7u8];
    assert!(Unpacker::new(&raw).unpack_bool().unwrap());
}

#[test]
fn test_char_as_u32() {
    let mut buf = [0u8; 4];
    Packer::new(&mut buf).pack_char('é').unwrap();
    assert_eq!(buf, 0xE9u32.to_ne_bytes());
    assert_eq!(Unpacker::new(&buf).unpack_char().unwrap(), 'é');
}

#[test]
fn test_char_surrogate_rejected() {
    let raw = 0xD800u32.to_ne_bytes();
    let mut unpacker = Unpacker::new(&raw);
    assert_eq!(unpacker.unpack_char(), Err(Error::InvalidChar(0xD800)));
    assert_eq!(unpacker.position(), 0);
    assert_eq!(unpacker.remaining(), 4);
}

#[test]
fn test_result_code_i32() {
    let mut buf = [0u8; 8];
    let mut packer = Packer::new(&mut buf);
    packer.pack_result(ResultCode::Timeout).unwrap();
    packer.pack_on_off(OnOff::On).unwrap();
    assert_eq!(buf[..4], (-7i32).to_ne_bytes());
    assert_eq!(buf[4..], 1i32.to_ne_bytes());

    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(unpacker.unpack_result().unwrap(), ResultCode::Timeout);
    assert_eq!(unpacker.unpack_on_off().unwrap(), OnOff::On);
}

#[test]
fn test_unknown_result_code() {
    let raw = 5i32.to_ne_bytes();
    assert_eq!(
        Unpacker::new(&raw).unpack_result(),
        Err(Error::InvalidEnum { kind: "result code", value: 5 })
    );
    assert_eq!(ResultCode::try_from(-23), Ok(ResultCode::Suspended));
    assert!(ResultCode::Ok.is_ok());
    assert!(!ResultCode::Busy.is_ok());
}

#[test]
fn test_on_off_bool_conversion() {
    assert_eq!(OnOff::from(true), OnOff::On);
    assert!(!bool::from(OnOff::Off));
    let raw = 2i32.to_ne_bytes();
    assert!(Unpacker::new(&raw).unpack_on_off().is_err());
}

#[test]
fn test_scalar_insufficient_capacity() {
    let mut buf = [0u8; 3];
    let mut packer = Packer::new(&mut buf);
    assert_eq!(
        packer.pack_u32(1),
        Err(Error::InsufficientCapacity { needed: 4, remaining: 3 })
    );
    assert_eq!(packer.position(), 0);
    assert_eq!(packer.remaining(), 3);

    let mut unpacker = Unpacker::new(&buf);
    assert!(unpacker.unpack_u32().is_err());
    assert_eq!(unpacker.remaining(), 3);
}

#[test]
fn test_with_capacity() {
    let mut buf = [0u8; 16];
    assert_eq!(
        Packer::with_capacity(&mut buf, 17).err(),
        Some(Error::CapacityExceedsBuffer { capacity: 17, len: 16 })
    );

    let mut packer = Packer::with_capacity(&mut buf, 4).unwrap();
    assert_eq!(
        packer.pack_u64(1),
        Err(Error::InsufficientCapacity { needed: 8, remaining: 4 })
    );
    packer.pack_u32(9).unwrap();
    assert_eq!(packer.remaining(), 0);

    let unpacker = Unpacker::with_capacity(&buf, 4).unwrap();
    assert_eq!(unpacker.remaining(), 4);
    assert!(Unpacker::with_capacity(&buf, 17).is_err());
}

#[test]
fn test_size_field_is_32_bits() {
    let mut buf = [0u8; 4];
    Packer::new(&mut buf).pack_size(300).unwrap();
    assert_eq!(buf, 300u32.to_ne_bytes());
    assert_eq!(Unpacker::new(&buf).unpack_size().unwrap(), 300);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_size_overflow() {
    let mut buf = [0u8; 4];
    let big = u32::MAX as usize + 1;
    let mut packer = Packer::new(&mut buf);
    assert_eq!(packer.pack_size(big), Err(Error::SizeOverflow(big)));
    assert_eq!(packer.remaining(), 4);
}

// ── References ─────────────────────────────────────────────────────────────

#[test]
fn test_reference_tagged_and_null() {
    let mut buf = [0u8; 8];
    let mut packer = Packer::new(&mut buf);
    packer.pack_raw_reference(0x11).unwrap();
    packer.pack_reference(SafeRef::NULL).unwrap();
    assert_eq!(buf[..4], 0x11u32.to_ne_bytes());

    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(unpacker.unpack_reference().unwrap().as_raw(), 0x11);
    assert!(unpacker.unpack_reference().unwrap().is_null());
}

#[test]
fn test_reference_untagged_rejected() {
    let mut buf = [0u8; 4];
    let mut packer = Packer::new(&mut buf);
    assert_eq!(packer.pack_raw_reference(0x10), Err(Error::InvalidReference(0x10)));
    assert_eq!(packer.position(), 0);
    assert_eq!(packer.remaining(), 4);

    let raw = 2u32.to_ne_bytes();
    let mut unpacker = Unpacker::new(&raw);
    assert_eq!(unpacker.unpack_reference(), Err(Error::InvalidReference(2)));
    assert_eq!(unpacker.position(), 0);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_reference_wider_than_32_bits() {
    let raw = (1usize << 32) | 1;
    assert_eq!(SafeRef::from_raw(raw), Err(Error::InvalidReference(raw)));
}

// ── Strings ────────────────────────────────────────────────────────────────

#[test]
fn test_string_reserves_declared_max() {
    let mut buf = [0u8; 64];
    let mut packer = Packer::new(&mut buf);
    packer.pack_u32(42).unwrap();
    packer.pack_string("abc", 10).unwrap();
    assert_eq!(packer.position(), 11);
    assert_eq!(packer.remaining(), 46);
    assert_eq!(buf[4..8], 3u32.to_ne_bytes());
    assert_eq!(&buf[8..11], b"abc");

    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(unpacker.unpack_u32().unwrap(), 42);
    assert_eq!(unpacker.unpack_str(10).unwrap(), "abc");
    assert_eq!(unpacker.position(), 11);
    assert_eq!(unpacker.remaining(), 46);
}

#[test]
fn test_string_one_below_max() {
    let mut buf = [0u8; 64];
    let mut packer = Packer::new(&mut buf);
    packer.pack_u32(42).unwrap();
    packer.pack_string("abcdefghi", 10).unwrap();
    assert_eq!(packer.position(), 4 + 4 + 9);
    assert_eq!(packer.remaining(), 46);

    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(unpacker.unpack_u32().unwrap(), 42);
    assert_eq!(unpacker.unpack_str(10).unwrap(), "abcdefghi");
    assert_eq!(unpacker.position(), 17);
    assert_eq!(unpacker.remaining(), 46);
}

#[test]
fn test_string_exact_fit() {
    let mut buf = [0u8; 14];
    let mut packer = Packer::new(&mut buf);
    packer.pack_string("", 10).unwrap();
    assert_eq!(packer.position(), 4);
    assert_eq!(packer.remaining(), 0);
}

#[test]
fn test_string_reservation_checked_before_length() {
    let mut buf = [0u8; 13];
    let mut packer = Packer::new(&mut buf);
    assert_eq!(
        packer.pack_string("a", 10),
        Err(Error::InsufficientCapacity { needed: 14, remaining: 13 })
    );
    assert_eq!(packer.position(), 0);
}

#[test]
fn test_string_too_long() {
    let mut buf = [0u8; 32];
    let mut packer = Packer::new(&mut buf);
    assert_eq!(
        packer.pack_string("hello", 4),
        Err(Error::LengthOverflow { max: 4, got: 5 })
    );
    assert_eq!(packer.position(), 0);
    assert_eq!(packer.remaining(), 32);
}

#[test]
fn test_string_stops_at_nul() {
    let mut buf = [0u8; 16];
    let mut packer = Packer::new(&mut buf);
    packer.pack_string_bytes(b"ab\0cd", 10).unwrap();
    let mut expected = 2u32.to_ne_bytes().to_vec();
    expected.extend_from_slice(b"ab");
    assert_eq!(packer.written(), expected.as_slice());
}

#[test]
fn test_decoded_string_longer_than_max() {
    let mut buf = [0u8; 32];
    Packer::new(&mut buf).pack_string("hello", 10).unwrap();

    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(unpacker.unpack_str(4), Err(Error::LengthOverflow { max: 4, got: 5 }));
    assert_eq!(unpacker.position(), 0);
    assert_eq!(unpacker.unpack_string(10).unwrap(), "hello");
}

#[test]
fn test_string_not_utf8() {
    let mut buf = [0u8; 16];
    Packer::new(&mut buf).pack_string_bytes(&[0xFF, 0xFE], 4).unwrap();

    assert_eq!(Unpacker::new(&buf).unpack_str(4), Err(Error::InvalidString));

    let mut dest = [0xAAu8; 3];
    let n = Unpacker::new(&buf).unpack_string_into(Some(&mut dest[..]), 4).unwrap();
    assert_eq!(n, 2);
    assert_eq!(dest, [0xFF, 0xFE, 0]);
}

#[test]
fn test_string_into_destination() {
    let mut buf = [0u8; 32];
    Packer::new(&mut buf).pack_string("abc", 8).unwrap();

    let mut small = [0u8; 3];
    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(
        unpacker.unpack_string_into(Some(&mut small[..]), 8),
        Err(Error::DestinationTooSmall { needed: 4, len: 3 })
    );
    assert_eq!(unpacker.position(), 0);

    let mut dest = [0xFFu8; 4];
    assert_eq!(unpacker.unpack_string_into(Some(&mut dest[..]), 8).unwrap(), 3);
    assert_eq!(&dest, b"abc\0");
    assert_eq!(unpacker.position(), 7);
    assert_eq!(unpacker.remaining(), 32 - 12);
}

#[test]
fn test_string_into_missing_destination() {
    let mut buf = [0u8; 32];
    let mut packer = Packer::new(&mut buf);
    packer.pack_string("", 8).unwrap();
    packer.pack_string("x", 8).unwrap();

    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(unpacker.unpack_string_into(None, 8).unwrap(), 0);
    assert_eq!(unpacker.position(), 4);
    assert_eq!(unpacker.remaining(), 32 - 12);
    assert_eq!(unpacker.unpack_string_into(None, 8), Err(Error::MissingDestination(1)));
}

// ── Arrays ─────────────────────────────────────────────────────────────────

#[test]
fn test_scalar_array_layout() {
    let mut buf = [0u8; 64];
    let mut packer = Packer::new(&mut buf);
    packer.pack_scalar_array(&[1u16, 2, 3], 5).unwrap();
    assert_eq!(packer.position(), 10);
    assert_eq!(packer.remaining(), 64 - (5 * 2 + 4));

    let mut expected = 3u32.to_ne_bytes().to_vec();
    for v in [1u16, 2, 3] {
        expected.extend_from_slice(&v.to_ne_bytes());
    }
    assert_eq!(packer.written(), expected.as_slice());

    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(unpacker.unpack_scalar_array::<u16>(5).unwrap(), [1, 2, 3]);
    assert_eq!(unpacker.position(), 10);
    assert_eq!(unpacker.remaining(), 50);
}

#[test]
fn test_array_capacity_pinned_to_worst_case() {
    // Elements declared at 8 bytes but only 4 written each
    let mut buf = [0u8; 64];
    let mut packer = Packer::new(&mut buf);
    packer
        .pack_array(&[1u32, 2], 4, 8, |p, v| p.pack_u32(*v))
        .unwrap();
    assert_eq!(packer.position(), 12);
    assert_eq!(packer.remaining(), 64 - 36);

    let mut unpacker = Unpacker::new(&buf);
    let items = unpacker.unpack_array(4, 8, |u| u.unpack_u32()).unwrap();
    assert_eq!(items, [1, 2]);
    assert_eq!(unpacker.remaining(), 64 - 36);
}

#[test]
fn test_array_count_overflow() {
    let mut buf = [0u8; 64];
    let mut packer = Packer::new(&mut buf);
    assert_eq!(
        packer.pack_scalar_array(&[1u8, 2, 3], 2),
        Err(Error::CountOverflow { max: 2, got: 3 })
    );
    assert_eq!(packer.position(), 0);
    assert_eq!(packer.remaining(), 64);
}

#[test]
fn test_array_reservation_refused() {
    let mut buf = [0u8; 10];
    let mut packer = Packer::new(&mut buf);
    assert_eq!(
        packer.pack_scalar_array::<u16>(&[], 4),
        Err(Error::InsufficientCapacity { needed: 12, remaining: 10 })
    );
}

#[test]
fn test_decoded_array_count_overflow() {
    let mut buf = [0u8; 64];
    Packer::new(&mut buf).pack_scalar_array(&[1u32, 2, 3], 3).unwrap();

    let mut called = false;
    let mut unpacker = Unpacker::new(&buf);
    let err = unpacker
        .unpack_array(2, 4, |u| {
            called = true;
            u.unpack_u32()
        })
        .unwrap_err();
    assert_eq!(err, Error::CountOverflow { max: 2, got: 3 });
    assert!(!called);
    assert_eq!(unpacker.position(), 0);
}

#[test]
#[should_panic(expected = "array element 1 failed")]
fn test_array_element_failure_panics() {
    let mut buf = [0u8; 64];
    let mut packer = Packer::new(&mut buf);
    let _ = packer.pack_array(&[0x11usize, 0x10], 2, 4, |p, r| p.pack_raw_reference(*r));
}

#[test]
#[should_panic(expected = "reserved more than their declared element size")]
fn test_array_element_larger_than_declared_panics() {
    let mut buf = [0u8; 64];
    let mut packer = Packer::new(&mut buf);
    let _ = packer.pack_array(&[1u32, 2], 2, 2, |p, v| p.pack_u32(*v));
}

#[test]
fn test_array_element_decode_error_rolls_back() {
    let mut buf = [0u8; 64];
    Packer::new(&mut buf)
        .pack_scalar_array(&[0x41u32, 0xD800], 4)
        .unwrap();

    let mut unpacker = Unpacker::new(&buf);
    let err = unpacker.unpack_array(4, 4, |u| u.unpack_char()).unwrap_err();
    assert_eq!(
        err,
        Error::ArrayElement {
            index: 1,
            source: Box::new(Error::InvalidChar(0xD800)),
        }
    );
    assert_eq!(unpacker.position(), 0);
    assert_eq!(unpacker.remaining(), 64);
}

#[test]
fn test_array_into_destination() {
    let mut buf = [0u8; 64];
    Packer::new(&mut buf).pack_scalar_array(&[5i32, 6], 4).unwrap();

    let mut small = [0i32; 1];
    let mut unpacker = Unpacker::new(&buf);
    assert_eq!(
        unpacker.unpack_array_into(Some(&mut small[..]), 4, 4, |u| u.unpack_i32()),
        Err(Error::DestinationTooSmall { needed: 2, len: 1 })
    );
    assert_eq!(unpacker.position(), 0);

    let mut dest = [0i32; 4];
    let n = unpacker
        .unpack_array_into(Some(&mut dest[..]), 4, 4, |u| u.unpack_i32())
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(dest, [5, 6, 0, 0]);
    assert_eq!(unpacker.remaining(), 64 - 20);
}

#[test]
fn test_empty_array_without_destination() {
    let mut buf = [0u8; 64];
    let mut packer = Packer::new(&mut buf);
    packer.pack_scalar_array::<u8>(&[], 8).unwrap();
    packer.pack_scalar_array(&[1u8], 8).unwrap();

    let mut unpacker = Unpacker::new(&buf);
    let n = unpacker
        .unpack_array_into::<u8, _>(None, 8, 1, |u| u.unpack_u8())
        .unwrap();
    assert_eq!(n, 0);
    assert_eq!(unpacker.position(), 4);
    assert_eq!(unpacker.remaining(), 64 - 12);
    assert_eq!(
        unpacker.unpack_array_into::<u8, _>(None, 8, 1, |u| u.unpack_u8()),
        Err(Error::MissingDestination(1))
    );
}

#[test]
fn test_array_of_strings() {
    let mut buf = [0u8; 64];
    let mut packer = Packer::new(&mut buf);
    packer
        .pack_array(&["ab", ""], 3, 4 + 4, |p, s| p.pack_string(s, 4))
        .unwrap();
    assert_eq!(packer.position(), 4 + 6 + 4);
    assert_eq!(packer.remaining(), 64 - 28);

    let mut unpacker = Unpacker::new(&buf);
    let items = unpacker.unpack_array(3, 8, |u| u.unpack_string(4)).unwrap();
    assert_eq!(items, ["ab", ""]);
}

#[test]
fn test_sequence_independent_of_content() {
    // Same schema, different content: same remaining capacity
    for s in ["", "a", "abcdefghij"] {
        let mut buf = [0u8; 64];
        let mut packer = Packer::new(&mut buf);
        packer.pack_u32(42).unwrap();
        packer.pack_string(s, 10).unwrap();
        assert_eq!(packer.remaining(), 46);
        assert_eq!(packer.position(), 8 + s.len());
    }
}

#[test]
fn test_into_written() {
    let mut buf = [0u8; 16];
    let mut packer = Packer::new(&mut buf);
    packer.pack_u16(0x0102).unwrap();
    let written = packer.into_written();
    assert_eq!(&written[..], &0x0102u16.to_ne_bytes()[..]);
}
