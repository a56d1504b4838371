// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Bootloader firmware for RP2040: runs the ETX OTA Device-Side Receiver
//! in `ReceiverRole::Bootloader`, accepting both `AppFirmware` and
//! `BootloaderFirmware` updates over UART.
//!
//! Flash layout (example device): a Bootloader slot this image itself
//! occupies, an Application slot immediately above it, and the FUCS
//! two-page region above that. The exact base addresses are a deployment
//! concern (normally fixed by the target's linker script); the values below
//! are the reference layout used throughout this workspace's tests.

#![no_std]
#![no_main]

mod hooks;
mod peripherals;
mod transport;

use defmt_rtt as _;
use panic_probe as _;

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;
use embedded_hal::delay::DelayNs;

use etx_ota_common::config::{
    APP_SLOT_BASE, APP_SLOT_LEN, BL_SLOT_LEN, FUCS_PAGE0_ADDR, FUCS_PAGE1_ADDR, FUCS_SECTOR_LEN,
};
use etx_ota_common::flash_hw::RomFlash;
use etx_ota_common::fucs::FirmUpdConfStore;
use etx_ota_common::receiver::{Receiver, ReceiverConfig, ReceiverRole, StepOutcome};

use hooks::DeviceHooks;
use transport::DirectUartTransport;

#[unsafe(link_section = ".boot2")]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

#[entry]
fn main() -> ! {
    defmt::println!("ETX OTA bootloader init");

    let mut p = peripherals::init();
    etx_ota_common::blink(&mut p.led_pin, &mut p.timer, 3, 200);

    let flash = RomFlash::new();
    let store = FirmUpdConfStore::new(flash, FUCS_PAGE0_ADDR, FUCS_PAGE1_ADDR, FUCS_SECTOR_LEN);

    let hooks = DeviceHooks::new(p.led_pin);
    let config = ReceiverConfig {
        role: ReceiverRole::Bootloader,
        app_slot_base: APP_SLOT_BASE,
        app_slot_len: APP_SLOT_LEN,
        bl_slot_len: BL_SLOT_LEN,
        timeout_ms: etx_ota_common::config::ETX_CUSTOM_HAL_TIMEOUT_MS,
    };

    let mut receiver = match Receiver::new(config, store, hooks, || p.timer.delay_ms(
        etx_ota_common::config::FUCS_INIT_RETRY_DELAY_MS,
    )) {
        Ok(r) => r,
        Err(_) => {
            defmt::println!("FUCS init failed, halting");
            loop {
                cortex_m::asm::wfi();
            }
        }
    };

    let mut uart_transport = DirectUartTransport::new(p.uart, p.timer);

    defmt::println!("Entering OTA receive loop");
    loop {
        match receiver.step(&mut uart_transport) {
            StepOutcome::Continue => {}
            StepOutcome::Done(status) => {
                defmt::println!("Transaction concluded: {:?}", defmt::Debug2Format(&status));
            }
        }
    }
}
