// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware-Update Config Store: a two-page flash-backed append log holding
//! one [`FirmUpdConfRecord`] at a time. Each page holds
//! one or more fixed-size slots; a slot's first word doubling as its
//! "occupied" marker (`0xFFFF_FFFF` means free) is what makes `read_latest`
//! crash-safe without a separate index structure.

use crate::config::{CUSTOM_DATA_MAX_SIZE, FUCS_INIT_MAX_ATTEMPTS};
use crate::error::{FirmUpdConfError, FlashError};
use crate::flash::{program_padded, FlashDevice, ERASED_BYTE};

/// Sentinel written into size/CRC fields that have never been set.
pub const UNSET_U32: u32 = 0xFFFF_FFFF;
/// Sequence number marking a slot as never written.
const EMPTY_SEQ: u32 = 0xFFFF_FFFF;

const FLAG_BL_STORED_IN_APP: u8 = 0b0000_0001;
const FLAG_BL_INSTALL_PENDING: u8 = 0b0000_0010;

/// Byte length of the fixed header fields of one slot (seq + 4 u32 fields +
/// flags byte, padded to a 4-byte boundary so the data area that follows is
/// itself word-aligned for `program_word`).
pub const FUCS_HEADER_LEN: usize = 4 + 4 + 4 + 4 + 4 + 4;
/// Total byte length of one slot (header + custom-data area).
pub const FUCS_SLOT_LEN: usize = FUCS_HEADER_LEN + CUSTOM_DATA_MAX_SIZE;

/// One Firmware-Update Config Store record.
#[derive(Debug, Clone)]
pub struct FirmUpdConfRecord {
    seq: u32,
    pub app_fw_size: u32,
    pub app_fw_rec_crc: u32,
    pub bl_fw_size: u32,
    pub bl_fw_rec_crc: u32,
    pub is_bl_fw_stored_in_app_fw: bool,
    pub is_bl_fw_install_pending: bool,
    pub data: [u8; CUSTOM_DATA_MAX_SIZE],
}

impl FirmUpdConfRecord {
    /// The record a freshly-erased device starts with: nothing staged, no
    /// firmware recorded yet.
    pub fn unset() -> Self {
        Self {
            seq: 0,
            app_fw_size: UNSET_U32,
            app_fw_rec_crc: UNSET_U32,
            bl_fw_size: UNSET_U32,
            bl_fw_rec_crc: UNSET_U32,
            is_bl_fw_stored_in_app_fw: false,
            is_bl_fw_install_pending: false,
            data: [ERASED_BYTE; CUSTOM_DATA_MAX_SIZE],
        }
    }

    fn flags(&self) -> u8 {
        let mut f = 0u8;
        if self.is_bl_fw_stored_in_app_fw {
            f |= FLAG_BL_STORED_IN_APP;
        }
        if self.is_bl_fw_install_pending {
            f |= FLAG_BL_INSTALL_PENDING;
        }
        f
    }

    fn write_into(&self, buf: &mut [u8; FUCS_SLOT_LEN]) {
        buf[0..4].copy_from_slice(&self.seq.to_le_bytes());
        buf[4..8].copy_from_slice(&self.app_fw_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.app_fw_rec_crc.to_le_bytes());
        buf[12..16].copy_from_slice(&self.bl_fw_size.to_le_bytes());
        buf[16..20].copy_from_slice(&self.bl_fw_rec_crc.to_le_bytes());
        buf[20] = self.flags();
        buf[21..24].fill(ERASED_BYTE);
        buf[FUCS_HEADER_LEN..].copy_from_slice(&self.data);
    }

    fn read_from(buf: &[u8; FUCS_SLOT_LEN]) -> Self {
        let flags = buf[20];
        let mut data = [ERASED_BYTE; CUSTOM_DATA_MAX_SIZE];
        data.copy_from_slice(&buf[FUCS_HEADER_LEN..]);
        Self {
            seq: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            app_fw_size: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            app_fw_rec_crc: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            bl_fw_size: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
            bl_fw_rec_crc: u32::from_le_bytes(buf[16..20].try_into().unwrap()),
            is_bl_fw_stored_in_app_fw: flags & FLAG_BL_STORED_IN_APP != 0,
            is_bl_fw_install_pending: flags & FLAG_BL_INSTALL_PENDING != 0,
            data,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Page {
    Zero,
    One,
}

impl Page {
    fn other(self) -> Self {
        match self {
            Page::Zero => Page::One,
            Page::One => Page::Zero,
        }
    }
}

/// Drives the two-page append log over a [`FlashDevice`]. `page_len` is the
/// erase unit reserved for each page; slots-per-page degrades to 1 when
/// `page_len < FUCS_SLOT_LEN`, which is the expected case at the default
/// 2048-byte custom-data area.
pub struct FirmUpdConfStore<F: FlashDevice> {
    flash: F,
    page0_addr: u32,
    page1_addr: u32,
    page_len: u32,
    active: Page,
    next_slot: u32,
}

impl<F: FlashDevice> FirmUpdConfStore<F> {
    pub fn new(flash: F, page0_addr: u32, page1_addr: u32, page_len: u32) -> Self {
        Self {
            flash,
            page0_addr,
            page1_addr,
            page_len,
            active: Page::Zero,
            next_slot: 0,
        }
    }

    /// Borrow the underlying flash device, for callers that need to write
    /// outside the FUCS pages (e.g. the receiver writing firmware bytes
    /// into the application slot of the same physical flash).
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    fn slots_per_page(&self) -> u32 {
        core::cmp::max(1, self.page_len / FUCS_SLOT_LEN as u32)
    }

    fn page_addr(&self, page: Page) -> u32 {
        match page {
            Page::Zero => self.page0_addr,
            Page::One => self.page1_addr,
        }
    }

    fn slot_addr(&self, page: Page, slot: u32) -> u32 {
        self.page_addr(page) + slot * FUCS_SLOT_LEN as u32
    }

    fn read_slot(&self, page: Page, slot: u32) -> [u8; FUCS_SLOT_LEN] {
        let mut buf = [0u8; FUCS_SLOT_LEN];
        self.flash.read(self.slot_addr(page, slot), &mut buf);
        buf
    }

    /// Scan both pages and return the highest-sequence record found, along
    /// with which page it lives on and the next free slot index on that
    /// page (`slots_per_page` if the page is full).
    fn scan(&self) -> Option<(Page, u32, FirmUpdConfRecord)> {
        let mut best: Option<(Page, u32, FirmUpdConfRecord)> = None;
        for page in [Page::Zero, Page::One] {
            for slot in 0..self.slots_per_page() {
                let raw = self.read_slot(page, slot);
                let seq = u32::from_le_bytes(raw[0..4].try_into().unwrap());
                if seq == EMPTY_SEQ {
                    break;
                }
                let record = FirmUpdConfRecord::read_from(&raw);
                let better = match &best {
                    None => true,
                    Some((_, _, prev)) => seq_is_newer(seq, prev.seq),
                };
                if better {
                    best = Some((page, slot, record));
                }
            }
        }
        best
    }

    /// Initialize the store, retrying flash access up to
    /// [`FUCS_INIT_MAX_ATTEMPTS`] times. `delay` is invoked before each
    /// retry; pass a no-op for tests, a real sleep on target.
    pub fn init(&mut self, mut delay: impl FnMut()) -> Result<FirmUpdConfRecord, FirmUpdConfError> {
        let mut last_err = FirmUpdConfError::NotInitialized;
        for attempt in 0..FUCS_INIT_MAX_ATTEMPTS {
            if attempt > 0 {
                delay();
            }
            match self.try_init_once() {
                Ok(record) => return Ok(record),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    fn try_init_once(&mut self) -> Result<FirmUpdConfRecord, FirmUpdConfError> {
        self.flash.unlock().map_err(FirmUpdConfError::from)?;
        self.flash.lock().map_err(FirmUpdConfError::from)?;

        match self.scan() {
            Some((page, slot, record)) => {
                self.active = page;
                self.next_slot = slot + 1;
                Ok(record)
            }
            None => {
                self.active = Page::Zero;
                self.next_slot = 0;
                Ok(FirmUpdConfRecord::unset())
            }
        }
    }

    /// Append `record` to the log, swapping pages when the active one is
    /// full.
    pub fn write(&mut self, mut record: FirmUpdConfRecord) -> Result<(), FirmUpdConfError> {
        let prev_seq = self.scan().map(|(_, _, r)| r.seq).unwrap_or(EMPTY_SEQ);
        record.seq = next_seq(prev_seq);

        if self.next_slot >= self.slots_per_page() {
            let stale = self.active;
            let target = self.active.other();

            self.flash.unlock().map_err(FirmUpdConfError::from)?;
            self.flash
                .erase(self.page_addr(target), self.page_len)
                .map_err(FirmUpdConfError::from)?;
            self.flash.lock().map_err(FirmUpdConfError::from)?;

            self.write_slot(target, 0, &record)?;

            self.flash.unlock().map_err(FirmUpdConfError::from)?;
            self.flash
                .erase(self.page_addr(stale), self.page_len)
                .map_err(FirmUpdConfError::from)?;
            self.flash.lock().map_err(FirmUpdConfError::from)?;

            self.active = target;
            self.next_slot = 1;
        } else {
            self.write_slot(self.active, self.next_slot, &record)?;
            self.next_slot += 1;
        }

        Ok(())
    }

    fn write_slot(
        &mut self,
        page: Page,
        slot: u32,
        record: &FirmUpdConfRecord,
    ) -> Result<(), FirmUpdConfError> {
        let mut buf = [0u8; FUCS_SLOT_LEN];
        record.write_into(&mut buf);
        let addr = self.slot_addr(page, slot);

        self.flash.unlock().map_err(FirmUpdConfError::from)?;
        let result = program_padded(&mut self.flash, addr, &buf);
        self.flash.lock().map_err(FirmUpdConfError::from)?;
        result.map_err(FirmUpdConfError::from)
    }
}

fn seq_is_newer(candidate: u32, current: u32) -> bool {
    candidate.wrapping_sub(current) != 0 && candidate.wrapping_sub(current) < u32::MAX / 2
}

fn next_seq(prev: u32) -> u32 {
    if prev == EMPTY_SEQ {
        0
    } else {
        prev.wrapping_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeFlash;

    fn store(page_len: u32) -> FirmUpdConfStore<FakeFlash> {
        let total = page_len as usize * 2;
        let flash = FakeFlash::new(0x1000, total);
        FirmUpdConfStore::new(flash, 0x1000, 0x1000 + page_len, page_len)
    }

    #[test]
    fn init_on_blank_flash_returns_unset_record() {
        let mut s = store(FUCS_SLOT_LEN as u32);
        let record = s.init(|| {}).unwrap();
        assert_eq!(record.app_fw_size, UNSET_U32);
        assert!(!record.is_bl_fw_install_pending);
    }

    #[test]
    fn write_then_reinit_reads_back_latest() {
        let mut s = store(FUCS_SLOT_LEN as u32);
        s.init(|| {}).unwrap();

        let mut record = FirmUpdConfRecord::unset();
        record.app_fw_size = 2048;
        record.app_fw_rec_crc = 0xDEAD_BEEF;
        s.write(record).unwrap();

        let reread = s.init(|| {}).unwrap();
        assert_eq!(reread.app_fw_size, 2048);
        assert_eq!(reread.app_fw_rec_crc, 0xDEAD_BEEF);
    }

    #[test]
    fn successive_writes_swap_pages_when_one_slot_per_page() {
        let mut s = store(FUCS_SLOT_LEN as u32);
        s.init(|| {}).unwrap();

        for size in [1u32, 2, 3, 4] {
            let mut record = FirmUpdConfRecord::unset();
            record.app_fw_size = size;
            s.write(record).unwrap();
        }

        let latest = s.init(|| {}).unwrap();
        assert_eq!(latest.app_fw_size, 4);
    }

    #[test]
    fn bl_staging_flags_round_trip() {
        let mut s = store(FUCS_SLOT_LEN as u32);
        s.init(|| {}).unwrap();

        let mut record = FirmUpdConfRecord::unset();
        record.is_bl_fw_stored_in_app_fw = true;
        record.is_bl_fw_install_pending = true;
        record.bl_fw_size = 4096;
        record.bl_fw_rec_crc = 0x1234_5678;
        s.write(record).unwrap();

        let reread = s.init(|| {}).unwrap();
        assert!(reread.is_bl_fw_stored_in_app_fw);
        assert!(reread.is_bl_fw_install_pending);
        assert_eq!(reread.bl_fw_size, 4096);
        assert_eq!(reread.bl_fw_rec_crc, 0x1234_5678);
    }

    #[test]
    fn custom_data_area_round_trips_byte_for_byte() {
        let mut s = store(FUCS_SLOT_LEN as u32);
        s.init(|| {}).unwrap();

        let mut record = FirmUpdConfRecord::unset();
        for (i, b) in record.data.iter_mut().enumerate() {
            *b = (i % 256) as u8;
        }
        s.write(record.clone()).unwrap();

        let reread = s.init(|| {}).unwrap();
        assert_eq!(reread.data, record.data);
    }
}
