// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec Benchmark
//!
//! Measures encode and decode throughput of the CDR writer/reader with:
//! - Primitive-heavy payloads (telemetry-style structs)
//! - Strings of different lengths
//! - XCDR1 vs XCDR2 framing (DHEADER overhead)
//! - Sizer pre-pass vs actual write
//!
//! This benchmark isolates codec overhead without arena or registry work.

#![allow(clippy::uninlined_format_args)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ddsmarshal::cdr::{CdrEncoding, CdrReader, CdrSizer, CdrWriter, SliceSink, VecSink};
use std::hint::black_box as bb;

/// Telemetry-style payload: mixed primitive widths plus a short string.
struct BenchSample {
    id: i32,
    flags: u8,
    reading: f64,
    count: u64,
    label: String,
}

impl BenchSample {
    fn new(label_len: usize) -> Self {
        Self {
            id: -123_456,
            flags: 0xC0,
            reading: std::f64::consts::E,
            count: 0xDEAD_BEEF_CAFE,
            label: "x".repeat(label_len),
        }
    }

    fn encode<S: ddsmarshal::cdr::BufferSink>(
        &self,
        writer: &mut CdrWriter<'_, S>,
    ) -> ddsmarshal::cdr::CdrResult<()> {
        writer.write_i32(self.id)?;
        writer.write_byte(self.flags)?;
        writer.align(8)?;
        writer.write_f64(self.reading)?;
        writer.write_u64(self.count)?;
        writer.write_string(&self.label)
    }
}

fn bench_encode_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_primitives");
    let sample = BenchSample::new(16);

    for encoding in [CdrEncoding::Xcdr1, CdrEncoding::Xcdr2] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{encoding:?}")),
            &encoding,
            |b, &encoding| {
                let mut buf = [0u8; 256];
                b.iter(|| {
                    let mut sink = SliceSink::new(&mut buf);
                    let mut writer = CdrWriter::new(&mut sink, encoding);
                    bb(&sample).encode(&mut writer).expect("encode");
                    bb(writer.complete());
                });
            },
        );
    }

    group.finish();
}

fn bench_encode_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_string_by_len");

    for len in [8, 64, 512, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let value = "s".repeat(len);
            b.iter(|| {
                let mut sink = VecSink::with_capacity(len + 16);
                let mut writer = CdrWriter::new(&mut sink, CdrEncoding::Xcdr2);
                writer.write_string(bb(&value)).expect("encode");
                bb(writer.complete());
            });
        });
    }

    group.finish();
}

fn bench_dheader_framing(c: &mut Criterion) {
    let mut group = c.benchmark_group("dheader_framing");
    let sample = BenchSample::new(16);

    group.bench_function("xcdr2_framed", |b| {
        let mut buf = [0u8; 256];
        b.iter(|| {
            let mut sink = SliceSink::new(&mut buf);
            let mut writer = CdrWriter::new(&mut sink, CdrEncoding::Xcdr2);
            let mark = writer.begin_dheader().expect("dheader");
            bb(&sample).encode(&mut writer).expect("encode");
            writer.end_dheader(mark).expect("dheader patch");
            bb(writer.complete());
        });
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_primitives");
    let sample = BenchSample::new(16);

    for encoding in [CdrEncoding::Xcdr1, CdrEncoding::Xcdr2] {
        let mut sink = VecSink::new();
        let mut writer = CdrWriter::new(&mut sink, encoding);
        sample.encode(&mut writer).expect("encode");
        writer.complete();
        let bytes = sink.into_bytes();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{encoding:?}")),
            &bytes,
            |b, bytes| {
                b.iter(|| {
                    let mut reader = CdrReader::new(bb(bytes), encoding);
                    bb(reader.read_i32().expect("id"));
                    bb(reader.read_byte().expect("flags"));
                    reader.align(8).expect("pad");
                    bb(reader.read_f64().expect("reading"));
                    bb(reader.read_u64().expect("count"));
                    bb(reader.read_string().expect("label"));
                });
            },
        );
    }

    group.finish();
}

fn bench_sizer(c: &mut Criterion) {
    let sample = BenchSample::new(16);

    c.bench_function("sizer_prepass", |b| {
        b.iter(|| {
            let mut sizer = CdrSizer::new(0, CdrEncoding::Xcdr2);
            sizer.write_i32();
            sizer.write_byte();
            sizer.write_f64();
            sizer.write_u64();
            sizer.write_string(bb(&sample.label));
            bb(sizer.position());
        });
    });
}

criterion_group!(
    benches,
    bench_encode_primitives,
    bench_encode_strings,
    bench_dheader_framing,
    bench_decode,
    bench_sizer
);
criterion_main!(benches);
