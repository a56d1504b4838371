// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Peripheral initialization for the sample application: the status LED,
//! the UART shared with the receiver, and a "pause" input demonstrating the
//! explicit stop/start control an integrator has over the receive loop.
//! Holding it low simply means the loop stops calling `receiver.step`, so
//! the bootloader never observes anything but silence.

use fugit::RateExtU32;
use rp2040_hal as hal;
use rp2040_hal::gpio::FunctionUart;
use rp2040_hal::uart::{DataBits, StopBits, UartConfig, UartPeripheral};

pub type LedPin =
    hal::gpio::Pin<hal::gpio::bank0::Gpio25, hal::gpio::FunctionSioOutput, hal::gpio::PullDown>;
pub type PausePin =
    hal::gpio::Pin<hal::gpio::bank0::Gpio3, hal::gpio::FunctionSioInput, hal::gpio::PullUp>;

type UartTxPin = hal::gpio::Pin<hal::gpio::bank0::Gpio0, FunctionUart, hal::gpio::PullNone>;
type UartRxPin = hal::gpio::Pin<hal::gpio::bank0::Gpio1, FunctionUart, hal::gpio::PullNone>;
pub type Uart = UartPeripheral<hal::uart::Enabled, hal::pac::UART0, (UartTxPin, UartRxPin)>;

pub struct Peripherals {
    pub led_pin: LedPin,
    pub pause_pin: PausePin,
    pub timer: hal::Timer,
    pub uart: Uart,
}

pub fn init() -> Peripherals {
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

    let uart_pins = (
        pins.gpio0.into_function::<FunctionUart>(),
        pins.gpio1.into_function::<FunctionUart>(),
    );
    let uart = UartPeripheral::new(pac.UART0, uart_pins, &mut pac.RESETS)
        .enable(
            UartConfig::new(
                etx_ota_common::config::DEFAULT_BAUD_RATE.Hz(),
                DataBits::Eight,
                None,
                StopBits::One,
            ),
            clocks.peripheral_clock.freq(),
        )
        .unwrap();

    Peripherals {
        led_pin: pins.gpio25.into_push_pull_output(),
        pause_pin: pins.gpio3.into_pull_up_input(),
        timer,
        uart,
    }
}
