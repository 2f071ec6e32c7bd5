// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Encode/decode symmetry driven by seeded pseudo-random payloads: whatever
// the writer produces, the reader must hand back, under both variants, and
// the sizer must agree with the writer about every position along the way.

use ddsmarshal::cdr::CdrResult;
use ddsmarshal::{CdrEncoding, CdrReader, CdrSizer, CdrWriter, VecSink};

const SEED: u64 = 0x5eed_cd12;
const ROUNDS: usize = 200;

fn encode<F>(encoding: CdrEncoding, fill: F) -> Vec<u8>
where
    F: FnOnce(&mut CdrWriter<'_, VecSink>) -> CdrResult<()>,
{
    let mut sink = VecSink::new();
    let mut writer = CdrWriter::new(&mut sink, encoding);
    fill(&mut writer).expect("encode should succeed");
    writer.complete();
    sink.into_bytes()
}

fn random_string(rng: &mut fastrand::Rng) -> String {
    let len = rng.usize(0..32);
    (0..len)
        .map(|_| rng.alphanumeric())
        .collect()
}

#[test]
fn symmetry_primitives() {
    let mut rng = fastrand::Rng::with_seed(SEED);
    for _ in 0..ROUNDS {
        let b = rng.bool();
        let x8 = rng.u8(..);
        let x16 = rng.i16(..);
        let x32 = rng.u32(..);
        let x64 = rng.i64(..);
        let f = f64::from_bits(rng.u64(..));

        let bytes = encode(CdrEncoding::Xcdr2, |w| {
            w.write_bool(b)?;
            w.write_byte(x8)?;
            w.align(2)?;
            w.write_i16(x16)?;
            w.align(4)?;
            w.write_u32(x32)?;
            w.align(8)?;
            w.write_i64(x64)?;
            w.write_f64(f)
        });

        let mut r = CdrReader::new(&bytes, CdrEncoding::Xcdr2);
        assert_eq!(r.read_bool().unwrap(), b);
        assert_eq!(r.read_byte().unwrap(), x8);
        r.align(2).unwrap();
        assert_eq!(r.read_i16().unwrap(), x16);
        r.align(4).unwrap();
        assert_eq!(r.read_u32().unwrap(), x32);
        r.align(8).unwrap();
        assert_eq!(r.read_i64().unwrap(), x64);
        let back = r.read_f64().unwrap();
        assert_eq!(back.to_bits(), f.to_bits());
        assert_eq!(r.remaining(), 0);
    }
}

#[test]
fn symmetry_strings_both_variants() {
    for encoding in [CdrEncoding::Xcdr1, CdrEncoding::Xcdr2] {
        let mut rng = fastrand::Rng::with_seed(SEED);
        for _ in 0..ROUNDS {
            let text = random_string(&mut rng);
            let bytes = encode(encoding, |w| w.write_string(&text));
            let mut r = CdrReader::new(&bytes, encoding);
            assert_eq!(r.read_string().unwrap(), text);
            assert_eq!(r.remaining(), 0);
        }
    }
}

#[test]
fn symmetry_sequences() {
    let mut rng = fastrand::Rng::with_seed(SEED);
    for _ in 0..ROUNDS {
        let values: Vec<u32> = (0..rng.usize(0..24)).map(|_| rng.u32(..)).collect();
        let bytes = encode(CdrEncoding::Xcdr2, |w| {
            w.write_u32(values.len() as u32)?;
            for &v in &values {
                w.write_u32(v)?;
            }
            Ok(())
        });

        let mut r = CdrReader::new(&bytes, CdrEncoding::Xcdr2);
        let count = r.read_sequence_length().unwrap() as usize;
        assert_eq!(count, values.len());
        let decoded: Vec<u32> = (0..count).map(|_| r.read_u32().unwrap()).collect();
        assert_eq!(decoded, values);
        assert_eq!(r.remaining(), 0);
    }
}

#[test]
fn symmetry_fixed_bytes() {
    let mut rng = fastrand::Rng::with_seed(SEED);
    for _ in 0..ROUNDS {
        let data: Vec<u8> = (0..rng.usize(0..16)).map(|_| rng.u8(..)).collect();
        let fixed = 8;
        let bytes = encode(CdrEncoding::Xcdr2, |w| w.write_fixed_bytes(&data, fixed));
        assert_eq!(bytes.len(), fixed);

        let mut r = CdrReader::new(&bytes, CdrEncoding::Xcdr2);
        let back = r.read_fixed_bytes(fixed).unwrap();
        let kept = data.len().min(fixed);
        assert_eq!(&back[..kept], &data[..kept]);
        assert!(back[kept..].iter().all(|&b| b == 0));
    }
}

/// Sizer/writer positional agreement over random operation sequences: the
/// sizer must predict exactly the byte count the writer commits.
#[test]
fn symmetry_sizer_matches_writer() {
    for encoding in [CdrEncoding::Xcdr1, CdrEncoding::Xcdr2] {
        let mut rng = fastrand::Rng::with_seed(SEED);
        for _ in 0..ROUNDS {
            let op_count = rng.usize(1..16);
            let ops: Vec<u8> = (0..op_count).map(|_| rng.u8(0..6)).collect();
            let text = random_string(&mut rng);

            let mut sizer = CdrSizer::new(0, encoding);
            let bytes = encode(encoding, |w| {
                for &op in &ops {
                    match op {
                        0 => {
                            sizer.write_byte();
                            w.write_byte(1)?;
                        }
                        1 => {
                            sizer.write_u16();
                            w.align(2)?;
                            w.write_u16(2)?;
                        }
                        2 => {
                            sizer.write_u32();
                            w.align(4)?;
                            w.write_u32(3)?;
                        }
                        3 => {
                            sizer.write_f64();
                            w.align(8)?;
                            w.write_f64(4.0)?;
                        }
                        4 => {
                            sizer.align(4);
                            sizer.write_string(&text);
                            w.align(4)?;
                            w.write_string(&text)?;
                        }
                        _ => {
                            sizer.write_fixed_bytes(6);
                            w.write_fixed_bytes(b"abc", 6)?;
                        }
                    }
                }
                Ok(())
            });

            assert_eq!(
                sizer.position(),
                bytes.len(),
                "sizer disagrees with writer for ops {ops:?} under {encoding:?}"
            );
        }
    }
}

/// Alignment invariant: after align(n), position % n == 0 for any prior
/// position the stream can reach.
#[test]
fn symmetry_alignment_invariant() {
    let mut rng = fastrand::Rng::with_seed(SEED);
    for _ in 0..ROUNDS {
        let lead = rng.usize(0..32);
        for n in [1usize, 2, 4, 8] {
            let mut sink = VecSink::new();
            let mut w = CdrWriter::new(&mut sink, CdrEncoding::Xcdr2);
            for _ in 0..lead {
                w.write_byte(0xAA).unwrap();
            }
            w.align(n).unwrap();
            assert_eq!(w.position() % n, 0);
            let pad = w.position() - lead;
            assert!(pad < n);
            w.complete();
        }
    }
}
