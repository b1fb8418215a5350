use crate::{
    resolve, ByteCursor, ByteCursorMut, CharCursor, CharCursorMut, CoderPhase, CoderResult,
    CodingError, DecoderActions, EncoderActions, ErrorAction, LookupError, ISO_8859_1, KOI8_R,
    UTF_16BE, UTF_32LE, UTF_8,
};

/// Tests that a truncated sequence is left unconsumed until the end of input makes it malformed.
#[test]
fn underflow_then_malformed() {
    super::init_tracing();

    let mut decoder = UTF_8.new_decoder();
    let mut storage = [0u16; 4];
    let mut output = CharCursorMut::new(&mut storage[..]);

    let mut input = ByteCursor::new(&[0xC2][..]);
    assert_eq!(decoder.decode(&mut input, &mut output, false), Ok(CoderResult::Underflow));
    assert_eq!(input.position(), 0);

    let mut input = ByteCursor::new(&[0xC2, 0x41][..]);
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Malformed(1)));
    assert_eq!(input.position(), 0);
    assert_eq!(decoder.flush(&mut output), Err(CodingError::UnresolvedError));

    input.skip(1).unwrap();
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Success));
    assert_eq!(decoder.flush(&mut output), Ok(CoderResult::Success));
    assert_eq!(decoder.phase(), CoderPhase::Done);
    assert_eq!(output.written(), &[0x41]);
}

/// Tests that a supplementary character is replaced by a single `?` in a single-byte charset.
#[test]
fn supplementary_char_replaced_once() {
    for charset in [ISO_8859_1, KOI8_R] {
        let actions = EncoderActions {
            unmappable: ErrorAction::replace(b"?").unwrap(),
            ..Default::default()
        };
        let mut encoder = charset.new_encoder_with(actions).unwrap();
        let mut storage = [0u8; 4];
        let mut output = ByteCursorMut::new(&mut storage[..]);
        let mut input = CharCursor::new(&[0xD83D, 0xDE00][..]);
        assert_eq!(encoder.encode(&mut input, &mut output, true), Ok(CoderResult::Success));
        assert_eq!(encoder.flush(&mut output), Ok(CoderResult::Success));
        assert_eq!(output.written(), b"?");
    }
}

/// Tests that an engine emits exactly the characters that fit and consumes only their input.
#[test]
fn overflow_is_atomic() {
    let src = "aé😀b".as_bytes();
    let mut decoder = UTF_8.new_decoder();
    let mut input = ByteCursor::new(src);

    let mut storage = [0u16; 3];
    let mut output = CharCursorMut::new(&mut storage[..]);
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Overflow));
    assert_eq!(input.position(), 3);
    assert_eq!(output.written(), &[0x61, 0xE9]);

    let mut storage = [0u16; 3];
    let mut output = CharCursorMut::new(&mut storage[..]);
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Success));
    assert_eq!(output.written(), &[0xD83D, 0xDE00, 0x62]);

    let units: Vec<u16> = "€€".encode_utf16().collect();
    let mut encoder = UTF_8.new_encoder();
    let mut input = CharCursor::new(&units[..]);
    let mut storage = [0u8; 5];
    let mut output = ByteCursorMut::new(&mut storage[..]);
    assert_eq!(encoder.encode(&mut input, &mut output, false), Ok(CoderResult::Overflow));
    assert_eq!(input.position(), 1);
    assert_eq!(output.written(), "€".as_bytes());

    // a bounded limit behaves like a smaller buffer
    let mut storage = [0u8; 8];
    let mut output = ByteCursorMut::new(&mut storage[..]);
    output.set_limit(2).unwrap();
    assert_eq!(encoder.encode(&mut input, &mut output, true), Ok(CoderResult::Overflow));
    assert_eq!(output.position(), 0);
    output.set_limit(8).unwrap();
    assert_eq!(encoder.encode(&mut input, &mut output, true), Ok(CoderResult::Success));
    assert_eq!(output.written(), "€".as_bytes());
}

/// Tests each error action against the same malformed input.
#[test]
fn error_actions_are_deterministic() {
    let src: &[u8] = &[0x41, 0xFF, 0x42];

    let mut decoder = UTF_8.new_decoder();
    let mut storage = [0u16; 4];
    let mut output = CharCursorMut::new(&mut storage[..]);
    let mut input = ByteCursor::new(src);
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Malformed(1)));
    assert_eq!(input.position(), 1);
    assert_eq!(output.written(), &[0x41]);

    let mut decoder = UTF_8
        .new_decoder_with(DecoderActions::both(ErrorAction::Ignore))
        .unwrap();
    assert_eq!(decoder.decode_all(src).unwrap(), &[0x41, 0x42]);

    let mut decoder = UTF_8.new_decoder();
    decoder
        .set_malformed_action(ErrorAction::replace_str("?").unwrap())
        .unwrap();
    assert_eq!(decoder.decode_all(src).unwrap(), &[0x41, 0x3F, 0x42]);

    // actions take effect from the next step
    let mut decoder = UTF_8.new_decoder();
    let mut storage = [0u16; 4];
    let mut output = CharCursorMut::new(&mut storage[..]);
    let mut input = ByteCursor::new(src);
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Malformed(1)));
    decoder.set_malformed_action(ErrorAction::Ignore).unwrap();
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Success));
    assert_eq!(output.written(), &[0x41, 0x42]);
}

/// Tests that a substitute too large for the output stops the step without consuming input.
#[test]
fn substitute_overflow() {
    let mut decoder = UTF_8
        .new_decoder_with(DecoderActions::both(ErrorAction::replace_str("<?>").unwrap()))
        .unwrap();
    let mut storage = [0u16; 3];
    let mut output = CharCursorMut::new(&mut storage[..]);
    let mut input = ByteCursor::new(&[0x41, 0xFF][..]);
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Overflow));
    assert_eq!(input.position(), 1);

    let mut storage = [0u16; 3];
    let mut output = CharCursorMut::new(&mut storage[..]);
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Success));
    assert_eq!(String::from_utf16_lossy(output.written()), "<?>");
}

/// Tests the calls the lifecycle forbids.
#[test]
fn lifecycle_violations() {
    let mut decoder = UTF_16BE.new_decoder();
    let mut storage = [0u16; 4];
    let mut output = CharCursorMut::new(&mut storage[..]);
    let mut input = ByteCursor::new(&[0x00, 0x41][..]);
    assert_eq!(decoder.phase(), CoderPhase::Fresh);

    assert!(matches!(
        decoder.flush(&mut output),
        Err(CodingError::IllegalState {
            operation: "flush",
            phase: CoderPhase::Fresh,
        })
    ));
    assert_eq!(decoder.decode(&mut input, &mut output, false), Ok(CoderResult::Underflow));
    assert_eq!(decoder.phase(), CoderPhase::Coding);
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Success));
    assert_eq!(decoder.phase(), CoderPhase::Flushing);
    assert!(matches!(
        decoder.decode(&mut input, &mut output, false),
        Err(CodingError::IllegalState {
            operation: "decode",
            phase: CoderPhase::Flushing,
        })
    ));
    // repeating the final step is legal
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Success));
    assert_eq!(decoder.flush(&mut output), Ok(CoderResult::Success));
    assert!(matches!(
        decoder.decode(&mut input, &mut output, true),
        Err(CodingError::IllegalState {
            operation: "decode",
            phase: CoderPhase::Done,
        })
    ));
    assert!(decoder.flush(&mut output).is_err());

    decoder.reset();
    assert_eq!(decoder.phase(), CoderPhase::Fresh);
    let mut input = ByteCursor::new(&[0x00, 0x42][..]);
    assert_eq!(decoder.decode(&mut input, &mut output, true), Ok(CoderResult::Success));
    assert_eq!(output.written(), &[0x41, 0x42]);

    let mut encoder = UTF_32LE.new_encoder();
    let mut storage = [0u8; 8];
    let mut output = ByteCursorMut::new(&mut storage[..]);
    let mut input = CharCursor::new(&[0xDC00][..]);
    assert_eq!(encoder.encode(&mut input, &mut output, true), Ok(CoderResult::Malformed(1)));
    assert_eq!(encoder.flush(&mut output), Err(CodingError::UnresolvedError));
    input.skip(1).unwrap();
    assert_eq!(encoder.encode(&mut input, &mut output, true), Ok(CoderResult::Success));
    assert_eq!(encoder.flush(&mut output), Ok(CoderResult::Success));
}

/// Tests cursor misuse reported as bounds errors.
#[test]
fn cursor_bounds() {
    let mut input = ByteCursor::new(&[1, 2, 3][..]);
    assert!(input.skip(4).is_err());
    assert_eq!(input.get(), Ok(1));
    assert!(input.set_limit(0).is_err());
    input.set_limit(2).unwrap();
    let mut pair = [0u8; 2];
    assert!(input.get_sequence(&mut pair).is_err());
    assert_eq!(input.remaining_slice(), &[2]);

    let mut storage = [0u16; 1];
    let mut output = CharCursorMut::new(&mut storage[..]);
    output.put(0x41).unwrap();
    let e = output.put(0x42).unwrap_err();
    assert_eq!((e.requested(), e.remaining()), (1, 0));
}

#[test]
fn lookup_by_alias() {
    assert_eq!(resolve("Latin1"), Ok(ISO_8859_1));
    assert_eq!(resolve("koi8"), Ok(KOI8_R));
    assert!(matches!(resolve("no such"), Err(LookupError::IllegalName(_))));
    assert!(matches!(resolve("x-no-such"), Err(LookupError::Unsupported(_))));
}
