// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The flash abstraction the receiver, sender-side host, and Firmware-Update
//! Config Store all build on: `unlock`, `erase`, `program_word`, `lock`,
//! `read`, operating on absolute addresses
//! across a single flash device shared by the Bootloader slot, Application
//! slot, and FUCS pages.
//!
//! Real hardware backs this with RP2040 ROM routines (see
//! [`crate::flash_hw`], `embedded` feature only). Tests and host-side tools
//! back it with [`crate::fakes::FakeFlash`], an in-memory array.

use crate::error::FlashError;

/// Value an erased flash cell reads back as.
pub const ERASED_BYTE: u8 = 0xFF;

pub trait FlashDevice {
    /// Enable writes. Must be paired with `lock`.
    fn unlock(&mut self) -> Result<(), FlashError>;

    /// Disable writes, releasing the non-reentrant erase/program sequence.
    fn lock(&mut self) -> Result<(), FlashError>;

    /// Erase `len` bytes starting at `addr`. Must be page/sector aligned per
    /// the concrete device's geometry.
    fn erase(&mut self, addr: u32, len: u32) -> Result<(), FlashError>;

    /// Program exactly one 4-byte word at `addr` (must be word-aligned).
    fn program_word(&mut self, addr: u32, word: [u8; 4]) -> Result<(), FlashError>;

    /// Read `buf.len()` bytes starting at `addr`.
    fn read(&self, addr: u32, buf: &mut [u8]);
}

/// Write `data` word-by-word starting at `addr`, padding a trailing partial
/// word with [`ERASED_BYTE`]. Returns the number of bytes actually sourced
/// from `data` (always
/// `data.len()`; the padding bytes are synthesized, not counted twice).
pub fn program_padded<F: FlashDevice>(
    flash: &mut F,
    addr: u32,
    data: &[u8],
) -> Result<(), FlashError> {
    let mut offset = 0usize;
    while offset + 4 <= data.len() {
        let word = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        flash.program_word(addr + offset as u32, word)?;
        offset += 4;
    }

    let remainder = data.len() - offset;
    if remainder > 0 {
        let mut word = [ERASED_BYTE; 4];
        word[..remainder].copy_from_slice(&data[offset..]);
        flash.program_word(addr + offset as u32, word)?;
    }

    Ok(())
}

/// Number of bytes `program_padded` will actually advance the cursor by for
/// a block of `data_len` bytes (rounds up to the next word).
pub fn padded_len(data_len: u32) -> u32 {
    data_len.div_ceil(4) * 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeFlash;

    #[test]
    fn program_padded_pads_trailing_bytes_with_erased_value() {
        let mut flash = FakeFlash::new(0, 64);
        program_padded(&mut flash, 0, &[1, 2, 3, 4, 5, 6]).unwrap();

        let mut out = [0u8; 8];
        flash.read(0, &mut out);
        assert_eq!(out, [1, 2, 3, 4, 5, 6, ERASED_BYTE, ERASED_BYTE]);
    }

    #[test]
    fn program_padded_exact_word_multiple_has_no_padding() {
        let mut flash = FakeFlash::new(0, 64);
        program_padded(&mut flash, 0, &[1, 2, 3, 4]).unwrap();

        let mut out = [0u8; 4];
        flash.read(0, &mut out);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn padded_len_rounds_up_to_word_boundary() {
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(1), 4);
        assert_eq!(padded_len(4), 4);
        assert_eq!(padded_len(5), 8);
    }
}
