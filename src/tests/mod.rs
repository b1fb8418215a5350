mod engines;

/// Installs a `tracing` subscriber writing to the test output, filtered by `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn transcode_through_adapters() -> std::io::Result<()> {
    use std::io::prelude::*;

    use super::{DecodingReader, EncodingWriter, KOI8_R, UTF_16LE};

    init_tracing();

    let koi8: &[u8] = &[72, 101, 108, 108, 111, 32, 0xED, 0xC9, 0xD2];
    let utf16: &[u8] = &[72, 0, 101, 0, 108, 0, 108, 0, 111, 0, 32, 0, 0x1C, 4, 0x38, 4, 0x40, 4];

    let mut reader = DecodingReader::new(koi8, KOI8_R.new_decoder());
    let mut writer = EncodingWriter::new(Vec::new(), UTF_16LE.new_encoder());

    let mut utf8 = String::new();
    reader.read_to_string(&mut utf8)?;
    assert_eq!(utf8, "Hello Мир");

    write!(writer, "{}", utf8)?;
    writer.flush()?;
    assert_eq!(writer.writer_ref(), utf16);

    Ok(())
}
