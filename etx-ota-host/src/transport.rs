// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Host-side [`Transport`]: a real serial port via the `serialport` crate.
//!
//! Byte-level pacing (`SEND_PACKET_BYTES_DELAY_MS`) is this transport's job,
//! not the sender driver's. It sleeps between each byte it writes so the
//! [`etx_ota_common::sender`] unit tests can run against an in-memory fake
//! at full speed.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use etx_ota_common::config::SEND_PACKET_BYTES_DELAY_MS;
use etx_ota_common::error::TransportError;
use etx_ota_common::transport::Transport;

pub struct SerialTransport {
    port_name: String,
    baud_rate: u32,
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(
                etx_ota_common::config::ETX_CUSTOM_HAL_TIMEOUT_MS as u64,
            ))
            .open()
            .with_context(|| format!("failed to open serial port {port_name}"))?;
        Ok(Self {
            port_name: port_name.to_string(),
            baud_rate,
            port,
        })
    }
}

impl Transport for SerialTransport {
    fn recv(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);
        let mut filled = 0;
        while filled < buf.len() {
            if Instant::now() > deadline {
                return Err(TransportError::NoResponse);
            }
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => return Err(TransportError::NoResponse),
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    return Err(TransportError::NoResponse)
                }
                Err(_) => return Err(TransportError::Failure),
            }
        }
        Ok(())
    }

    fn send(&mut self, buf: &[u8], _timeout_ms: u32) -> Result<(), TransportError> {
        for &byte in buf {
            self.port
                .write_all(&[byte])
                .map_err(|_| TransportError::Failure)?;
            if SEND_PACKET_BYTES_DELAY_MS > 0 {
                std::thread::sleep(Duration::from_millis(SEND_PACKET_BYTES_DELAY_MS as u64));
            }
        }
        self.port.flush().map_err(|_| TransportError::Failure)
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        let port = serialport::new(&self.port_name, self.baud_rate)
            .timeout(Duration::from_millis(
                etx_ota_common::config::ETX_CUSTOM_HAL_TIMEOUT_MS as u64,
            ))
            .open()
            .map_err(|_| TransportError::Failure)?;
        self.port = port;
        Ok(())
    }
}
