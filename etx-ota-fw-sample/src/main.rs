// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Sample application firmware exercising the Application-Side Integration
//! Hooks: it runs the Device-Side Receiver in `ReceiverRole::Application`,
//! registers a custom-data buffer, and reacts to a bootloader-image request
//! by software-resetting so the pre-bootloader's next boot hands control to
//! the bootloader, which can actually serve it.
//!
//! The `pause_pin` demonstrates the explicit stop/start control an
//! integrator has over the receive loop. Holding it low simply means the
//! main loop stops calling `receiver.step`, so the peer sees silence until
//! it's released; there is no separate "pause" message in the wire protocol
//! itself.

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
use embedded_hal::digital::InputPin;

use etx_ota_common::config::{
    APP_SLOT_BASE, APP_SLOT_LEN, BL_SLOT_LEN, FUCS_PAGE0_ADDR, FUCS_PAGE1_ADDR, FUCS_SECTOR_LEN,
};
use etx_ota_common::flash_hw::RomFlash;
use etx_ota_common::fucs::FirmUpdConfStore;
use etx_ota_common::receiver::{Receiver, ReceiverConfig, ReceiverRole};

use hooks::{AppAction, AppHooks};
use transport::DirectUartTransport;

#[unsafe(link_section = ".boot2")]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

#[entry]
fn main() -> ! {
    defmt::println!("Application firmware started");

    let mut p = peripherals::init();
    etx_ota_common::blink(&mut p.led_pin, &mut p.timer, 5, 100);

    let flash = RomFlash::new();
    let store = FirmUpdConfStore::new(flash, FUCS_PAGE0_ADDR, FUCS_PAGE1_ADDR, FUCS_SECTOR_LEN);

    let hooks = AppHooks::new();
    let config = ReceiverConfig {
        role: ReceiverRole::Application,
        app_slot_base: APP_SLOT_BASE,
        app_slot_len: APP_SLOT_LEN,
        bl_slot_len: BL_SLOT_LEN,
        timeout_ms: etx_ota_common::config::ETX_CUSTOM_HAL_TIMEOUT_MS,
    };

    let mut receiver = match Receiver::new(config, store, hooks, || {
        p.timer
            .delay_ms(etx_ota_common::config::FUCS_INIT_RETRY_DELAY_MS)
    }) {
        Ok(r) => r,
        Err(_) => {
            defmt::println!("FUCS init failed, halting");
            loop {
                cortex_m::asm::wfi();
            }
        }
    };

    let mut uart_transport = DirectUartTransport::new(p.uart, p.timer);

    defmt::println!("Entering ETX OTA receive loop");
    loop {
        if p.pause_pin.is_low().unwrap_or(false) {
            continue;
        }

        receiver.step(&mut uart_transport);

        match receiver.hooks_mut().take_action() {
            AppAction::None => {}
            AppAction::CustomDataReady => {
                let data = receiver.hooks_mut().custom_data_buffer();
                defmt::println!(
                    "ETX OTA: custom data received, first byte {=u8}",
                    data[0]
                );
            }
            AppAction::ResetIntoDfu => {
                defmt::println!("ETX OTA: resetting to let the bootloader serve this request");
                cortex_m::asm::delay(1_000_000);
                cortex_m::peripheral::SCB::sys_reset();
            }
        }
    }
}
