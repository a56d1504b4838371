// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The byte-in/byte-out Transport Adapter contract.
//!
//! Both the direct-UART and BT-serial device transports, and the host's
//! serial-port transport, implement this single trait. Neither the frame
//! codec nor the receiver/sender ever branch on which concrete transport is
//! in use.

use crate::error::TransportError;

pub trait Transport {
    /// Fill `buf` with exactly `buf.len()` bytes, blocking up to
    /// `timeout_ms`. Returns `Err(TransportError::NoResponse)` on timeout.
    fn recv(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError>;

    /// Write all of `buf`, blocking until every byte has left (subject to
    /// `timeout_ms`).
    fn send(&mut self, buf: &[u8], timeout_ms: u32) -> Result<(), TransportError>;

    /// Close and reopen the underlying link, if that concept applies (real
    /// serial ports do; in-memory fakes are a no-op). Used by the host
    /// sender's one-shot retry policy.
    fn reset(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
