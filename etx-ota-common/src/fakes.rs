// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! In-memory test doubles for [`crate::transport::Transport`] and
//! [`crate::flash::FlashDevice`], used by the unit tests in this crate and
//! available to downstream crates under `#[cfg(test)]` via the `std`
//! feature's `alloc`-free `heapless` buffers.

use heapless::Vec as HVec;

use crate::error::{FlashError, TransportError};
use crate::flash::{FlashDevice, ERASED_BYTE};
use crate::transport::Transport;

/// A fixed-capacity byte pipe: writes from one side become reads on the
/// other. Used to wire a `FakeTransport` pair together in sender/receiver
/// integration tests without a real serial port.
pub struct FakeTransport {
    inbox: HVec<u8, 8192>,
    read_cursor: usize,
    pub outbox: HVec<u8, 8192>,
    pub fail_next_recv: bool,
    pub fail_next_send: bool,
    pub reset_count: u32,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            inbox: HVec::new(),
            read_cursor: 0,
            outbox: HVec::new(),
            fail_next_recv: false,
            fail_next_send: false,
            reset_count: 0,
        }
    }

    /// Queue bytes that the next `recv` calls will hand out, as though a
    /// peer had sent them.
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbox.extend_from_slice(bytes).unwrap();
    }

    pub fn drain_outbound(&mut self) -> HVec<u8, 8192> {
        let out = self.outbox.clone();
        self.outbox.clear();
        out
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for FakeTransport {
    fn recv(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<(), TransportError> {
        if self.fail_next_recv {
            self.fail_next_recv = false;
            return Err(TransportError::NoResponse);
        }
        let available = self.inbox.len() - self.read_cursor;
        if available < buf.len() {
            return Err(TransportError::NoResponse);
        }
        buf.copy_from_slice(&self.inbox[self.read_cursor..self.read_cursor + buf.len()]);
        self.read_cursor += buf.len();
        Ok(())
    }

    fn send(&mut self, buf: &[u8], _timeout_ms: u32) -> Result<(), TransportError> {
        if self.fail_next_send {
            self.fail_next_send = false;
            return Err(TransportError::Failure);
        }
        self.outbox
            .extend_from_slice(buf)
            .map_err(|_| TransportError::Failure)
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.reset_count += 1;
        Ok(())
    }
}

/// An in-memory flash device backed by a heap-free byte array, for tests.
/// `base` is the address the first byte of `cells` represents.
pub struct FakeFlash {
    base: u32,
    cells: HVec<u8, 16384>,
    pub locked: bool,
    pub fail_next_erase: bool,
    pub fail_next_program: bool,
}

impl FakeFlash {
    pub fn new(base: u32, len: usize) -> Self {
        let mut cells = HVec::new();
        cells.resize(len, ERASED_BYTE).unwrap();
        Self {
            base,
            cells,
            locked: true,
            fail_next_erase: false,
            fail_next_program: false,
        }
    }

    fn index(&self, addr: u32) -> usize {
        (addr - self.base) as usize
    }
}

impl FlashDevice for FakeFlash {
    fn unlock(&mut self) -> Result<(), FlashError> {
        self.locked = false;
        Ok(())
    }

    fn lock(&mut self) -> Result<(), FlashError> {
        self.locked = true;
        Ok(())
    }

    fn erase(&mut self, addr: u32, len: u32) -> Result<(), FlashError> {
        if self.fail_next_erase {
            self.fail_next_erase = false;
            return Err(FlashError::Erase);
        }
        if self.locked {
            return Err(FlashError::Unlock);
        }
        let start = self.index(addr);
        let end = start + len as usize;
        self.cells[start..end].fill(ERASED_BYTE);
        Ok(())
    }

    fn program_word(&mut self, addr: u32, word: [u8; 4]) -> Result<(), FlashError> {
        if self.fail_next_program {
            self.fail_next_program = false;
            return Err(FlashError::Program);
        }
        if self.locked {
            return Err(FlashError::Unlock);
        }
        let start = self.index(addr);
        self.cells[start..start + 4].copy_from_slice(&word);
        Ok(())
    }

    fn read(&self, addr: u32, buf: &mut [u8]) {
        let start = self.index(addr);
        buf.copy_from_slice(&self.cells[start..start + buf.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_transport_echoes_queued_bytes() {
        let mut t = FakeTransport::new();
        t.push_inbound(&[1, 2, 3, 4]);
        let mut buf = [0u8; 4];
        t.recv(&mut buf, 0).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn fake_transport_recv_underrun_is_no_response() {
        let mut t = FakeTransport::new();
        t.push_inbound(&[1, 2]);
        let mut buf = [0u8; 4];
        assert_eq!(t.recv(&mut buf, 0), Err(TransportError::NoResponse));
    }

    #[test]
    fn fake_flash_rejects_writes_while_locked() {
        let mut f = FakeFlash::new(0x1000, 16);
        assert_eq!(f.program_word(0x1000, [1, 2, 3, 4]), Err(FlashError::Unlock));
        f.unlock().unwrap();
        assert!(f.program_word(0x1000, [1, 2, 3, 4]).is_ok());
    }

    #[test]
    fn fake_flash_erase_resets_to_erased_byte() {
        let mut f = FakeFlash::new(0x1000, 16);
        f.unlock().unwrap();
        f.program_word(0x1000, [1, 2, 3, 4]).unwrap();
        f.erase(0x1000, 16).unwrap();
        let mut out = [0u8; 4];
        f.read(0x1000, &mut out);
        assert_eq!(out, [ERASED_BYTE; 4]);
    }
}
