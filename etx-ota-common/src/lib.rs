// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Shared protocol engine for the ETX OTA firmware update system.
//!
//! This crate supports both `no_std` (embedded) and `std` (host) environments:
//! - Default: `no_std` mode, usable by device-side and host-side code alike
//! - `std` feature: enables the host-side sender driver
//! - `embedded` feature: enables RP2040 flash/board glue (rp2040-hal)

#![cfg_attr(not(feature = "std"), no_std)]

pub mod config;
pub mod crc;
pub mod error;
pub mod fakes;
pub mod flash;
pub mod frame;
pub mod fucs;
pub mod hooks;
pub mod protocol;
pub mod receiver;
pub mod transport;

#[cfg(feature = "std")]
pub mod sender;

// Flash driver glue for the RP2040 (requires embedded feature)
#[cfg(feature = "embedded")]
pub mod flash_hw;

// Re-export commonly used types
pub use error::{EtxOtaStatus, FirmUpdConfError, FlashError, FrameError, TransportError};
pub use frame::{decode, encode, Packet};
pub use hooks::ReceiverHooks;
pub use protocol::{AckStatus, Command, PacketType, PayloadType};
pub use receiver::{Receiver, ReceiverConfig, ReceiverRole};
pub use transport::Transport;

// Embedded-specific exports (only with embedded feature)
#[cfg(feature = "embedded")]
use embedded_hal::delay::DelayNs;
#[cfg(feature = "embedded")]
use embedded_hal::digital::OutputPin;
#[cfg(feature = "embedded")]
use rp2040_hal as hal;

#[cfg(feature = "embedded")]
pub type LedPin =
    hal::gpio::Pin<hal::gpio::bank0::Gpio25, hal::gpio::FunctionSioOutput, hal::gpio::PullDown>;

/// Initialize RP2040 board peripherals.
///
/// # Safety
/// Uses `Peripherals::steal()`, so the caller must ensure exclusive peripheral access.
#[cfg(feature = "embedded")]
pub fn init_board() -> (hal::Timer, LedPin) {
    let mut pac = unsafe { hal::pac::Peripherals::steal() };

    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);
    let clocks = hal::clocks::init_clocks_and_plls(
        12_000_000u32,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .unwrap();

    let timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);
    let sio = hal::Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    (timer, pins.gpio25.into_push_pull_output())
}

/// Drive the fault LED (active-low): on for unrecoverable init failures.
#[cfg(feature = "embedded")]
pub fn set_fault(led: &mut impl OutputPin, active: bool) {
    if active {
        led.set_low().ok();
    } else {
        led.set_high().ok();
    }
}

/// Blink an LED a specified number of times.
#[cfg(feature = "embedded")]
pub fn blink(led: &mut impl OutputPin, timer: &mut impl DelayNs, count: u32, period_ms: u32) {
    for _ in 0..count {
        led.set_high().ok();
        timer.delay_ms(period_ms);
        led.set_low().ok();
        timer.delay_ms(period_ms);
    }
}
