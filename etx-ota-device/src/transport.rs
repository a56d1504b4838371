// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Device-side [`Transport`] variants: direct UART and BT-serial. Both
//! speak the identical byte-stream contract over the same
//! physical UART peripheral; `BtSerialTransport` additionally drives the
//! Bluetooth module's own AT-command setup once at construction, which is
//! external to the protocol core (it never runs again once bytes start
//! flowing).

use embedded_hal::delay::DelayNs;
use embedded_hal_nb::serial::{Read, Write};
use etx_ota_common::error::TransportError;
use etx_ota_common::transport::Transport;

/// What a concrete Bluetooth-serial module must expose to get set up:
/// name, pin, role, work mode, and a factory-reset ("AT+RENEW"-style) flow,
/// performed only when a reset-to-defaults signal is asserted at init.
/// None of this is part of the wire protocol itself.
pub trait BtModule {
    fn factory_reset(&mut self);
    fn configure(&mut self, name: &str, pin: &str);
}

/// Polls `uart` for up to `timeout_ms`, treating the device's own timer as
/// the clock source (mirrors `ETX_CUSTOM_HAL_TIMEOUT`).
fn recv_bytes<U: Read<u8>>(
    uart: &mut U,
    timer: &mut impl DelayNs,
    buf: &mut [u8],
    timeout_ms: u32,
) -> Result<(), TransportError> {
    let mut elapsed_ms = 0u32;
    for slot in buf.iter_mut() {
        loop {
            match uart.read() {
                Ok(byte) => {
                    *slot = byte;
                    break;
                }
                Err(nb::Error::WouldBlock) => {
                    if elapsed_ms >= timeout_ms {
                        return Err(TransportError::NoResponse);
                    }
                    timer.delay_ms(1);
                    elapsed_ms += 1;
                }
                Err(nb::Error::Other(_)) => return Err(TransportError::Failure),
            }
        }
    }
    Ok(())
}

fn send_bytes<U: Write<u8>>(uart: &mut U, buf: &[u8]) -> Result<(), TransportError> {
    for &byte in buf {
        nb::block!(uart.write(byte)).map_err(|_| TransportError::Failure)?;
    }
    nb::block!(uart.flush()).map_err(|_| TransportError::Failure)
}

/// A raw UART link with no collaborator setup beyond the peripheral itself.
pub struct DirectUartTransport<U, D> {
    uart: U,
    timer: D,
}

impl<U, D> DirectUartTransport<U, D> {
    pub fn new(uart: U, timer: D) -> Self {
        Self { uart, timer }
    }
}

impl<U, D> Transport for DirectUartTransport<U, D>
where
    U: Read<u8> + Write<u8>,
    D: DelayNs,
{
    fn recv(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError> {
        recv_bytes(&mut self.uart, &mut self.timer, buf, timeout_ms)
    }

    fn send(&mut self, buf: &[u8], _timeout_ms: u32) -> Result<(), TransportError> {
        send_bytes(&mut self.uart, buf)
    }
}

/// The same UART link, fronted by a Bluetooth-serial module that has
/// already been configured (and, if requested, factory-reset) at
/// construction time.
pub struct BtSerialTransport<U, D, B> {
    uart: U,
    timer: D,
    _bt: B,
}

impl<U, D, B: BtModule> BtSerialTransport<U, D, B> {
    /// `reset_requested` mirrors a GPIO "reset-to-defaults" strap read at
    /// boot; the BT module's AT-command setup only runs when it is
    /// asserted.
    pub fn new(uart: U, timer: D, mut bt: B, reset_requested: bool, name: &str, pin: &str) -> Self {
        if reset_requested {
            bt.factory_reset();
        }
        bt.configure(name, pin);
        Self {
            uart,
            timer,
            _bt: bt,
        }
    }
}

impl<U, D, B> Transport for BtSerialTransport<U, D, B>
where
    U: Read<u8> + Write<u8>,
    D: DelayNs,
{
    fn recv(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError> {
        recv_bytes(&mut self.uart, &mut self.timer, buf, timeout_ms)
    }

    fn send(&mut self, buf: &[u8], _timeout_ms: u32) -> Result<(), TransportError> {
        send_bytes(&mut self.uart, buf)
    }
}
