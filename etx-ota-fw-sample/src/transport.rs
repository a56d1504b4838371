// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! A raw UART [`Transport`], identical to the bootloader's direct-serial
//! variant. This sample only ever talks over UART, with no Bluetooth-module
//! setup.

use embedded_hal::delay::DelayNs;
use embedded_hal_nb::serial::{Read, Write};
use etx_ota_common::error::TransportError;
use etx_ota_common::transport::Transport;

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
