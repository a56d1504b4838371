// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Pre-Bootloader Promotion: the very first thing to run on cold reset.
//! Either jumps straight to the installed bootloader, or, if a bootloader
//! image has been staged into the application slot, promotes it into the
//! bootloader slot first, then resets so the freshly-promoted bootloader
//! starts from a clean state.

#![no_std]
#![no_main]

mod boot;

use defmt_rtt as _;
use panic_probe as _;

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;
use embedded_hal::delay::DelayNs;

use etx_ota_common::config::{
    APP_SLOT_BASE, BL_SLOT_LEN, FLASH_XIP_BASE, FUCS_INIT_RETRY_DELAY_MS, FUCS_PAGE0_ADDR,
    FUCS_PAGE1_ADDR, FUCS_SECTOR_LEN,
};
use etx_ota_common::crc::Crc32Digest;
use etx_ota_common::flash::{program_padded, FlashDevice};
use etx_ota_common::flash_hw::RomFlash;
use etx_ota_common::fucs::{FirmUpdConfRecord, FirmUpdConfStore, UNSET_U32};

#[unsafe(link_section = ".boot2")]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

fn app_image_crc_consistent(flash: &impl FlashDevice, record: &FirmUpdConfRecord) -> bool {
    if record.app_fw_size == 0 || record.app_fw_size == UNSET_U32 {
        return false;
    }
    let mut digest = Crc32Digest::new();
    let mut chunk = [0u8; 64];
    let mut offset = 0u32;
    while offset < record.app_fw_size {
        let n = core::cmp::min(chunk.len() as u32, record.app_fw_size - offset) as usize;
        flash.read(APP_SLOT_BASE + offset, &mut chunk[..n]);
        digest.update(&chunk[..n]);
        offset += n as u32;
    }
    digest.finalize() == record.app_fw_rec_crc
}

/// Copies the staged bootloader image out of the application slot and into
/// the bootloader slot, then clears the pending flag.
/// Idempotent: a power loss before the final `store.write` simply repeats
/// the copy next boot, since the source bytes in the app slot are
/// untouched by this function.
fn promote<F: FlashDevice>(
    store: &mut FirmUpdConfStore<F>,
    mut record: FirmUpdConfRecord,
) -> Result<(), ()> {
    let flash = store.flash_mut();
    flash.unlock().map_err(|_| ())?;
    flash.erase(FLASH_XIP_BASE, BL_SLOT_LEN).map_err(|_| ())?;

    let mut chunk = [0u8; 256];
    let mut offset = 0u32;
    while offset < record.app_fw_size {
        let n = core::cmp::min(chunk.len() as u32, record.app_fw_size - offset) as usize;
        flash.read(APP_SLOT_BASE + offset, &mut chunk[..n]);
        program_padded(flash, FLASH_XIP_BASE + offset, &chunk[..n]).map_err(|_| ())?;
        offset += n as u32;
    }
    flash.lock().map_err(|_| ())?;

    record.bl_fw_size = record.app_fw_size;
    record.bl_fw_rec_crc = record.app_fw_rec_crc;
    record.is_bl_fw_install_pending = false;
    store.write(record).map_err(|_| ())
}

#[entry]
fn main() -> ! {
    defmt::println!("Pre-bootloader: initializing FUCS");

    let mut timer_spin = SpinDelay;
    let flash = RomFlash::new();
    let mut store = FirmUpdConfStore::new(flash, FUCS_PAGE0_ADDR, FUCS_PAGE1_ADDR, FUCS_SECTOR_LEN);

    let record = match store.init(|| timer_spin.delay_ms(FUCS_INIT_RETRY_DELAY_MS)) {
        Ok(r) => r,
        Err(_) => {
            defmt::println!("FUCS unusable, halting");
            loop {
                cortex_m::asm::wfi();
            }
        }
    };

    if !record.is_bl_fw_install_pending {
        defmt::println!("No promotion pending, jumping to bootloader");
        unsafe { boot::jump_to_bootloader(FLASH_XIP_BASE) }
    }

    let valid = record.is_bl_fw_stored_in_app_fw && app_image_crc_consistent(store.flash_mut(), &record);
    if !valid {
        defmt::println!("Staged image invalid, jumping to bootloader without promoting");
        unsafe { boot::jump_to_bootloader(FLASH_XIP_BASE) }
    }

    defmt::println!("Promoting staged bootloader image");
    if promote(&mut store, record).is_err() {
        defmt::println!("Promotion failed, jumping to the (unpromoted) bootloader");
        unsafe { boot::jump_to_bootloader(FLASH_XIP_BASE) }
    }

    defmt::println!("Promotion committed, resetting");
    cortex_m::peripheral::SCB::sys_reset();
}

/// A timer-free millisecond delay for the one 500 ms FUCS-retry wait this
/// stage ever needs, so it doesn't have to bring up the RP2040 clock tree
/// just to retry a flash read.
struct SpinDelay;

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        // Calibrated against a 125 MHz system clock default; close enough
        // for a best-effort retry backoff, not a timing-critical path.
        let cycles = (ns as u64 * 125) / 1000;
        cortex_m::asm::delay(cycles as u32);
    }
}
