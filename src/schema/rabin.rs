//! Rabin 64-bit fingerprint, per the
//! [Avro Parsing Canonical Form spec](https://avro.apache.org/docs/current/specification/#schema-fingerprints).
//!
//! Hand-rolled (not via the `digest` crate) since there's no generic
//! `Digest` trait surface needed here — this crate only ever computes one
//! specific 64-bit Rabin fingerprint over a canonical-form string.

use std::sync::OnceLock;

const EMPTY64: i64 = -4513414715797952619;

fn fp_table() -> &'static [i64; 256] {
    static TABLE: OnceLock<[i64; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0i64; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let mut fp = i as i64;
            for _ in 0..8 {
                fp = ((fp as u64) >> 1) as i64 ^ (EMPTY64 & -(fp & 1));
            }
            *slot = fp;
        }
        table
    })
}

pub struct Rabin {
    result: i64,
}

impl Default for Rabin {
    fn default() -> Self {
        Self { result: EMPTY64 }
    }
}

impl Rabin {
    pub fn write(&mut self, data: &[u8]) {
        let table = fp_table();
        for &byte in data {
            let index = ((self.result ^ byte as i64) & 0xff) as usize;
            self.result = ((self.result as u64) >> 8) as i64 ^ table[index];
        }
    }

    pub fn finish(self) -> [u8; 8] {
        self.result.to_le_bytes()
    }
}

impl std::fmt::Write for Rabin {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.write(s.as_bytes());
        Ok(())
    }
}

pub fn fingerprint(canonical_form: &str) -> [u8; 8] {
    let mut rabin = Rabin::default();
    rabin.write(canonical_form.as_bytes());
    rabin.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_vectors() {
        let data: &[(&str, i64)] = &[
            (r#""null""#, 7195948357588979594),
            (r#""boolean""#, -6970731678124411036),
            (r#"{"name":"foo","type":"fixed","size":15}"#, 1756455273707447556),
            (
                r#"{"name":"PigValue","type":"record","fields":[{"name":"value","type":["null","int","long","PigValue"]}]}"#,
                -1759257747318642341,
            ),
            ("hello world", 2906301498937520992),
        ];
        for &(input, expected) in data {
            let mut rabin = Rabin::default();
            rabin.write(input.as_bytes());
            let got = i64::from_le_bytes(rabin.finish());
            assert_eq!(got, expected, "input {input:?}");
        }
    }
}
