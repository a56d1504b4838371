// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! CRC-32/MPEG-2 engine.
//!
//! Polynomial `0x04C11DB7`, initial value `0xFFFFFFFF`, no reflection of
//! input or output, no final XOR. Host and device must agree bit-for-bit, so
//! both sides go through this single function rather than hand-rolling the
//! 256-entry lookup table twice.

use crc::{Crc, CRC_32_MPEG_2};

const CRC32_MPEG2: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Compute the CRC-32/MPEG-2 checksum of `data`.
pub fn crc32(data: &[u8]) -> u32 {
    CRC32_MPEG2.checksum(data)
}

/// Incremental digest, for computing a CRC over flash contents read in
/// chunks (used by the End-state integrity check and by bank validation).
pub struct Crc32Digest(crc::Digest<'static, u32>);

impl Crc32Digest {
    pub fn new() -> Self {
        Self(CRC32_MPEG2.digest())
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    pub fn finalize(self) -> u32 {
        self.0.finalize()
    }
}

impl Default for Crc32Digest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector_matches_crc32_mpeg2() {
        // "123456789" is the standard CRC catalog check string.
        assert_eq!(crc32(b"123456789"), 0x0376_E6E7);
    }

    #[test]
    fn empty_input_is_the_initial_value_unmodified() {
        assert_eq!(crc32(&[]), 0xFFFF_FFFF);
    }

    #[test]
    fn deterministic_across_calls() {
        let data = [0x11u8, 0x22, 0x33, 0x44, 0x55];
        assert_eq!(crc32(&data), crc32(&data));
    }

    #[test]
    fn digest_matches_one_shot() {
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let mut digest = Crc32Digest::new();
        digest.update(&data[..4]);
        digest.update(&data[4..]);
        assert_eq!(digest.finalize(), crc32(&data));
    }
}
