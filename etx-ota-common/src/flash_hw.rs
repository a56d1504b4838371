// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! RP2040 flash backing for [`FlashDevice`], via the on-chip ROM routines.
//!
//! On RP2040, flash operations (erase/program) require disabling XIP first.
//! The full sequence is:
//!   1. connect_internal_flash()
//!   2. flash_exit_xip()
//!   3. flash_range_erase() or flash_range_program()
//!   4. flash_flush_cache()
//!   5. flash_enter_cmd_xip()
//!
//! All code executing during steps 1-5 must run from RAM, not flash, since
//! flash itself is unreadable (not in XIP mode) for the duration. We use
//! `#[link_section = ".data"]` to place those functions in RAM, and
//! pre-resolve all ROM function pointers once at `RomFlash::new` time
//! (also before flash is touched).

use crate::error::FlashError;
use crate::flash::FlashDevice;

const FLASH_BASE: u32 = 0x1000_0000;

// ROM function pointer types, per the RP2040 bootrom API.
type RomFnVoid = unsafe extern "C" fn();
type RomFnErase = unsafe extern "C" fn(u32, usize, u32, u8);
type RomFnProgram = unsafe extern "C" fn(u32, *const u8, usize);

unsafe extern "C" fn dummy_void() {}
unsafe extern "C" fn dummy_erase(_: u32, _: usize, _: u32, _: u8) {}
unsafe extern "C" fn dummy_program(_: u32, _: *const u8, _: usize) {}

/// Look up a ROM function by its two-character tag. The ROM function
/// table pointer lives at a fixed address (0x14) and the lookup helper
/// itself at 0x18, both 16-bit halfword pointers per the bootrom ABI.
unsafe fn rom_func_lookup(tag: &[u8; 2]) -> usize {
    let fn_table = *(0x14 as *const u16) as *const u16;
    let lookup: unsafe extern "C" fn(*const u16, u32) -> usize =
        core::mem::transmute::<usize, unsafe extern "C" fn(*const u16, u32) -> usize>(
            *(0x18 as *const u16) as usize,
        );
    let code = u16::from_le_bytes(*tag) as u32;
    lookup(fn_table, code)
}

/// A [`FlashDevice`] backed by the RP2040's internal QSPI flash, driven
/// through ROM routines resolved once at construction. Absolute addresses
/// passed to `erase`/`program_word`/`read` are XIP addresses (`0x1000_0000`
/// and up); the bootloader, application, and FUCS regions all share the
/// same physical device and this same instance.
pub struct RomFlash {
    connect_internal_flash: RomFnVoid,
    flash_exit_xip: RomFnVoid,
    flash_range_erase: RomFnErase,
    flash_range_program: RomFnProgram,
    flash_flush_cache: RomFnVoid,
    flash_enter_cmd_xip: RomFnVoid,
    unlocked: bool,
}

impl RomFlash {
    /// Resolve the ROM function pointers this device needs. Must run with
    /// XIP active (i.e. before any `erase`/`program_word` call), which is
    /// always true at boot.
    pub fn new() -> Self {
        unsafe {
            Self {
                connect_internal_flash: core::mem::transmute::<usize, RomFnVoid>(
                    rom_func_lookup(b"IF"),
                ),
                flash_exit_xip: core::mem::transmute::<usize, RomFnVoid>(rom_func_lookup(b"EX")),
                flash_range_erase: core::mem::transmute::<usize, RomFnErase>(rom_func_lookup(
                    b"RE",
                )),
                flash_range_program: core::mem::transmute::<usize, RomFnProgram>(
                    rom_func_lookup(b"RP"),
                ),
                flash_flush_cache: core::mem::transmute::<usize, RomFnVoid>(rom_func_lookup(
                    b"FC",
                )),
                flash_enter_cmd_xip: core::mem::transmute::<usize, RomFnVoid>(rom_func_lookup(
                    b"CX",
                )),
                unlocked: false,
            }
        }
    }

    fn offset(addr: u32) -> u32 {
        addr - FLASH_BASE
    }
}

impl Default for RomFlash {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the erase teardown/setup sequence entirely from RAM; flash is not
/// readable (not in XIP mode) while the ROM routine executes.
#[link_section = ".data"]
#[inline(never)]
unsafe fn ram_erase(flash: &RomFlash, offset: u32, size: u32) {
    cortex_m::interrupt::disable();
    (flash.connect_internal_flash)();
    (flash.flash_exit_xip)();
    (flash.flash_range_erase)(offset, size as usize, size, 0xd8);
    (flash.flash_flush_cache)();
    (flash.flash_enter_cmd_xip)();
    cortex_m::interrupt::enable();
}

/// Runs the program teardown/setup sequence entirely from RAM.
#[link_section = ".data"]
#[inline(never)]
unsafe fn ram_program(flash: &RomFlash, offset: u32, data: *const u8, len: usize) {
    cortex_m::interrupt::disable();
    (flash.connect_internal_flash)();
    (flash.flash_exit_xip)();
    (flash.flash_range_program)(offset, data, len);
    (flash.flash_flush_cache)();
    (flash.flash_enter_cmd_xip)();
    cortex_m::interrupt::enable();
}

impl FlashDevice for RomFlash {
    fn unlock(&mut self) -> Result<(), FlashError> {
        self.unlocked = true;
        Ok(())
    }

    fn lock(&mut self) -> Result<(), FlashError> {
        self.unlocked = false;
        Ok(())
    }

    fn erase(&mut self, addr: u32, len: u32) -> Result<(), FlashError> {
        if !self.unlocked {
            return Err(FlashError::Unlock);
        }
        unsafe { ram_erase(self, Self::offset(addr), len) };
        Ok(())
    }

    fn program_word(&mut self, addr: u32, word: [u8; 4]) -> Result<(), FlashError> {
        if !self.unlocked {
            return Err(FlashError::Unlock);
        }
        unsafe { ram_program(self, Self::offset(addr), word.as_ptr(), word.len()) };
        Ok(())
    }

    fn read(&self, addr: u32, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = unsafe { ((addr + i as u32) as *const u8).read_volatile() };
        }
    }
}
