// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Device-Side Receiver State Machine.
//!
//! Drives `Start → Header → Data → End`, with the universal Abort rule
//! checked ahead of every state's own packet-type check. One [`step`] call
//! decodes exactly one packet, sends exactly one Response, and reports
//! whether the transaction continues or has concluded.
//!
//! [`step`]: Receiver::step

use crate::crc::Crc32Digest;
use crate::error::{EtxOtaStatus, FrameError};
use crate::flash::{program_padded, FlashDevice};
use crate::frame;
use crate::fucs::{FirmUpdConfRecord, FirmUpdConfStore};
use crate::hooks::ReceiverHooks;
use crate::protocol::{
    AckStatus, Command, HeaderData, PacketType, PayloadType, HEADER_DATA_LEN, MAX_DATA_LEN,
};
use crate::transport::Transport;

/// Which firmware is running this receiver. The wire protocol is identical
/// either way, structurally, with only the flash target address differing,
/// but a `BootloaderFirmware` Header is only meaningful to the bootloader
/// itself. The application firmware cannot stage a bootloader image into
/// its own flash region, so it always answers that request with
/// `NotApplicable` and leaves the actual staging to the bootloader on the
/// next boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverRole {
    Bootloader,
    Application,
}

/// Flash geometry and I/O timeout the receiver needs, independent of any
/// particular target.
#[derive(Debug, Clone, Copy)]
pub struct ReceiverConfig {
    pub role: ReceiverRole,
    pub app_slot_base: u32,
    pub app_slot_len: u32,
    pub bl_slot_len: u32,
    pub timeout_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiverState {
    Start,
    Header,
    Data,
    End,
}

/// Result of one [`Receiver::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The transaction is still in progress; call `step` again for the next
    /// packet.
    Continue,
    /// The transaction (or this lone step, for `NoResponse`) concluded with
    /// this status.
    Done(EtxOtaStatus),
}

/// Drives one ETX OTA receive transaction end to end over a [`Transport`],
/// writing firmware bytes through a [`FlashDevice`] shared with its
/// [`FirmUpdConfStore`].
pub struct Receiver<F: FlashDevice, H: ReceiverHooks> {
    config: ReceiverConfig,
    store: FirmUpdConfStore<F>,
    hooks: H,
    state: ReceiverState,
    record: FirmUpdConfRecord,
    received_size: u32,
    declared_size: u32,
    declared_crc: u32,
    payload_type: Option<PayloadType>,
    custom_offset: usize,
    first_data_block: bool,
}

impl<F: FlashDevice, H: ReceiverHooks> Receiver<F, H> {
    /// Initializes the backing FUCS (up to 3 attempts) and returns a
    /// receiver ready to enter `Start`.
    pub fn new(
        config: ReceiverConfig,
        mut store: FirmUpdConfStore<F>,
        hooks: H,
        delay: impl FnMut(),
    ) -> Result<Self, crate::error::FirmUpdConfError> {
        let record = store.init(delay)?;
        Ok(Self {
            config,
            store,
            hooks,
            state: ReceiverState::Start,
            record,
            received_size: 0,
            declared_size: 0,
            declared_crc: 0,
            payload_type: None,
            custom_offset: 0,
            first_data_block: false,
        })
    }

    /// Unwrap the receiver, handing its hooks back to the caller. Used by
    /// callers that registered a hooks impl to inspect what it captured
    /// (e.g. a custom-data buffer) once the transaction has concluded.
    pub fn into_hooks(self) -> H {
        self.hooks
    }

    /// Borrow the registered hooks, for callers that poll state the hooks
    /// impl accumulated (e.g. a pending DFU-reset request) after each
    /// `step` without giving up ownership of the receiver.
    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Decode and fully handle exactly one packet.
    pub fn step<T: Transport>(&mut self, transport: &mut T) -> StepOutcome {
        let mut scratch = [0u8; MAX_DATA_LEN];
        let packet = match frame::decode(transport, &mut scratch, self.config.timeout_ms) {
            Ok(p) => p,
            Err(FrameError::Truncated) | Err(FrameError::Transport(_)) => {
                return self.finish(EtxOtaStatus::NoResponse);
            }
            Err(_) => {
                self.respond(transport, AckStatus::Nack);
                self.state = ReceiverState::Start;
                return self.finish(EtxOtaStatus::Error);
            }
        };

        if packet.packet_type == PacketType::Command
            && Command::from_byte(packet.data[0]) == Some(Command::Abort)
        {
            self.respond(transport, AckStatus::Ack);
            self.state = ReceiverState::Start;
            self.received_size = 0;
            return self.finish(EtxOtaStatus::Stopped);
        }

        match self.state {
            ReceiverState::Start => self.handle_start(transport, packet.packet_type, packet.data),
            ReceiverState::Header => self.handle_header(transport, packet.packet_type, packet.data),
            ReceiverState::Data => self.handle_data(transport, packet.packet_type, packet.data),
            ReceiverState::End => self.handle_end(transport, packet.packet_type, packet.data),
        }
    }

    fn finish(&mut self, status: EtxOtaStatus) -> StepOutcome {
        self.hooks.on_status(status);
        StepOutcome::Done(status)
    }

    fn reject(&mut self, transport: &mut impl Transport, status: EtxOtaStatus) -> StepOutcome {
        self.respond(transport, AckStatus::Nack);
        self.state = ReceiverState::Start;
        self.finish(status)
    }

    fn respond(&mut self, transport: &mut impl Transport, status: AckStatus) {
        let mut buf = [0u8; crate::protocol::FRAME_OVERHEAD + 1];
        if let Ok(n) = frame::encode(PacketType::Response, &[status.as_byte()], &mut buf) {
            let _ = transport.send(&buf[..n], self.config.timeout_ms);
        }
    }

    fn handle_start(
        &mut self,
        transport: &mut impl Transport,
        packet_type: PacketType,
        data: &[u8],
    ) -> StepOutcome {
        let is_start =
            packet_type == PacketType::Command && Command::from_byte(data[0]) == Some(Command::Start);
        if !is_start {
            return self.reject(transport, EtxOtaStatus::Error);
        }
        self.hooks.on_pre_transaction();
        self.state = ReceiverState::Header;
        self.respond(transport, AckStatus::Ack);
        StepOutcome::Continue
    }

    fn handle_header(
        &mut self,
        transport: &mut impl Transport,
        packet_type: PacketType,
        data: &[u8],
    ) -> StepOutcome {
        if packet_type != PacketType::Header || data.len() != HEADER_DATA_LEN {
            return self.reject(transport, EtxOtaStatus::Error);
        }
        let mut raw = [0u8; HEADER_DATA_LEN];
        raw.copy_from_slice(data);
        let header = HeaderData::from_bytes(&raw);

        let payload_type = match header.payload_type() {
            Some(t) => t,
            None => return self.reject(transport, EtxOtaStatus::NotApplicable),
        };

        match payload_type {
            PayloadType::AppFirmware => {
                if header.package_size > self.config.app_slot_len {
                    return self.reject(transport, EtxOtaStatus::NotApplicable);
                }
                self.record.app_fw_size = header.package_size;
                self.record.app_fw_rec_crc = header.package_crc;
                self.record.is_bl_fw_stored_in_app_fw = false;
                self.record.is_bl_fw_install_pending = false;
            }
            PayloadType::BootloaderFirmware => {
                if self.config.role == ReceiverRole::Application {
                    self.hooks.on_bootloader_image_rejected();
                    return self.reject(transport, EtxOtaStatus::NotApplicable);
                }
                if header.package_size > self.config.bl_slot_len {
                    return self.reject(transport, EtxOtaStatus::NotApplicable);
                }
                self.record.app_fw_size = header.package_size;
                self.record.app_fw_rec_crc = header.package_crc;
                self.record.is_bl_fw_stored_in_app_fw = true;
                self.record.is_bl_fw_install_pending = true;
            }
            PayloadType::CustomData => {
                let fits = match self.hooks.expose_custom_data_buffer() {
                    Some(buf) => header.package_size as usize <= buf.len(),
                    None => false,
                };
                if !fits {
                    return self.reject(transport, EtxOtaStatus::NotApplicable);
                }
                self.declared_size = header.package_size;
                self.declared_crc = header.package_crc;
                self.payload_type = Some(PayloadType::CustomData);
                self.received_size = 0;
                self.custom_offset = 0;
                self.state = ReceiverState::Data;
                self.respond(transport, AckStatus::Ack);
                return StepOutcome::Continue;
            }
        }

        if self.store.write(self.record.clone()).is_err() {
            return self.reject(transport, EtxOtaStatus::Error);
        }

        self.declared_size = header.package_size;
        self.declared_crc = header.package_crc;
        self.payload_type = Some(payload_type);
        self.received_size = 0;
        self.first_data_block = true;
        self.state = ReceiverState::Data;
        self.respond(transport, AckStatus::Ack);
        StepOutcome::Continue
    }

    fn handle_data(
        &mut self,
        transport: &mut impl Transport,
        packet_type: PacketType,
        data: &[u8],
    ) -> StepOutcome {
        if packet_type != PacketType::Data {
            return self.reject(transport, EtxOtaStatus::Error);
        }

        let remaining = self.declared_size - self.received_size;
        let is_final = data.len() as u32 >= remaining;
        if data.len() as u32 % 4 != 0 && !is_final {
            return self.reject(transport, EtxOtaStatus::Error);
        }

        let write_ok = match self.payload_type {
            Some(PayloadType::CustomData) => self.write_custom_data(data),
            _ => self.write_firmware_data(data),
        };
        if !write_ok {
            return self.reject(transport, EtxOtaStatus::Error);
        }

        self.received_size += data.len() as u32;
        if self.received_size >= self.declared_size {
            self.state = ReceiverState::End;
        }
        self.respond(transport, AckStatus::Ack);
        StepOutcome::Continue
    }

    fn write_custom_data(&mut self, data: &[u8]) -> bool {
        match self.hooks.expose_custom_data_buffer() {
            Some(buf) => {
                let end = self.custom_offset + data.len();
                if end > buf.len() {
                    return false;
                }
                buf[self.custom_offset..end].copy_from_slice(data);
                self.custom_offset = end;
                true
            }
            None => false,
        }
    }

    fn write_firmware_data(&mut self, data: &[u8]) -> bool {
        if self.first_data_block {
            if self.store.flash_mut().unlock().is_err() {
                return false;
            }
            if self
                .store
                .flash_mut()
                .erase(self.config.app_slot_base, self.config.app_slot_len)
                .is_err()
            {
                return false;
            }
            self.first_data_block = false;
        }

        let addr = self.config.app_slot_base + self.received_size;
        if self.store.flash_mut().unlock().is_err() {
            return false;
        }
        let result = program_padded(self.store.flash_mut(), addr, data);
        self.store.flash_mut().lock().ok();
        result.is_ok()
    }

    fn handle_end(
        &mut self,
        transport: &mut impl Transport,
        packet_type: PacketType,
        data: &[u8],
    ) -> StepOutcome {
        let is_end =
            packet_type == PacketType::Command && Command::from_byte(data[0]) == Some(Command::End);
        if !is_end {
            return self.reject(transport, EtxOtaStatus::Error);
        }

        if self.payload_type == Some(PayloadType::CustomData) {
            self.respond(transport, AckStatus::Ack);
            self.state = ReceiverState::Start;
            return self.finish(EtxOtaStatus::Ok);
        }

        let mut digest = Crc32Digest::new();
        let mut chunk = [0u8; 64];
        let mut offset = 0u32;
        while offset < self.declared_size {
            let n = core::cmp::min(chunk.len() as u32, self.declared_size - offset) as usize;
            self.store
                .flash_mut()
                .read(self.config.app_slot_base + offset, &mut chunk[..n]);
            digest.update(&chunk[..n]);
            offset += n as u32;
        }

        if digest.finalize() != self.declared_crc {
            return self.reject(transport, EtxOtaStatus::Error);
        }

        self.respond(transport, AckStatus::Ack);
        self.state = ReceiverState::Start;
        self.finish(EtxOtaStatus::Ok)
    }
}
