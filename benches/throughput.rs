//! Compares the throughput of the engines and the stream adapters across charset families.

use std::io::{self, prelude::*};

use charset_coder::{
    ByteCursor, CharCursorMut, Charset, DecodingReader, EncoderActions, EncodingWriter,
    ErrorAction, ISO_8859_1, KOI8_R, UTF_16LE, UTF_8, WINDOWS_1252,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const TEXT: &str = "Grüße aus Köln! Привет, мир! Καλημέρα κόσμε. 5 € bitte. ";

fn charsets() -> [&'static Charset; 4] {
    [UTF_8, UTF_16LE, WINDOWS_1252, KOI8_R]
}

/// Decodes `src` step by step through a fixed-size output buffer, returning the unit count.
fn decode_in_steps(charset: &'static Charset, src: &[u8], out_len: usize) -> usize {
    let mut decoder = charset.new_decoder();
    let mut storage = vec![0u16; out_len];
    let mut input = ByteCursor::new(src);
    let mut produced = 0;
    loop {
        let mut output = CharCursorMut::new(&mut storage[..]);
        let result = decoder.decode(&mut input, &mut output, true).unwrap();
        produced += output.position();
        if !result.is_overflow() {
            break;
        }
    }
    decoder.flush(&mut CharCursorMut::new(&mut storage[..])).unwrap();
    produced
}

fn bench_decode(c: &mut Criterion) {
    let text = TEXT.repeat(256);
    let mut group = c.benchmark_group("decode");
    for charset in charsets() {
        let src = charset.encode(&text);
        group.throughput(Throughput::Bytes(src.len() as u64));
        for out_len in [64usize, 4096] {
            group.bench_with_input(
                BenchmarkId::new(charset.name(), out_len),
                &src,
                |b, src| b.iter(|| black_box(decode_in_steps(charset, black_box(src), out_len))),
            );
        }
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let text = TEXT.repeat(256);
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(units.len() as u64));
    for charset in charsets() {
        group.bench_function(BenchmarkId::new("replace", charset.name()), |b| {
            let actions = EncoderActions::both(ErrorAction::replace(b"?").unwrap());
            let mut encoder = charset.new_encoder_with(actions).unwrap();
            b.iter(|| black_box(encoder.encode_all(black_box(&units)).unwrap()));
        });
    }
    group.finish();
}

fn bench_streams(c: &mut Criterion) {
    let text = TEXT.repeat(256);
    let mut group = c.benchmark_group("streams");
    group.throughput(Throughput::Bytes(text.len() as u64));
    for charset in [UTF_16LE, ISO_8859_1] {
        let src = charset.encode(&text);
        group.bench_function(BenchmarkId::new("reader", charset.name()), |b| {
            b.iter(|| {
                let mut reader = DecodingReader::new(black_box(&src[..]), charset.new_decoder());
                let mut dst = String::with_capacity(text.len());
                reader.lossy().read_to_string(&mut dst).unwrap();
                black_box(dst)
            });
        });
        group.bench_function(BenchmarkId::new("writer", charset.name()), |b| {
            b.iter(|| {
                let mut writer = EncodingWriter::new(io::sink(), charset.new_encoder());
                let mut src = black_box(text.as_str());
                while !src.is_empty() {
                    match writer.write_str(src) {
                        Ok(n) => src = &src[n..],
                        Err(_) => writer.passthrough().write_all(b"?").unwrap(),
                    }
                }
                writer.flush().unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode, bench_streams);
criterion_main!(benches);
