// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Wire-level types for the ETX OTA packet envelope.
//!
//! The envelope is a fixed, length-prefixed layout, not a self-describing
//! serde format, so these types are plain structs/enums with explicit
//! byte conversions rather than `#[derive(Serialize)]`. See
//! [`crate::frame`] for the encoder/decoder that puts them on the wire.

/// Start-of-Frame marker byte.
pub const SOF: u8 = 0xAA;
/// End-of-Frame marker byte.
pub const EOF: u8 = 0xBB;

/// Size in bytes of the SOF + type + length + CRC + EOF fields combined
/// (everything in a packet except `data`).
pub const FRAME_OVERHEAD: usize = 1 + 1 + 2 + 4 + 1;

/// Maximum size in bytes of the `data` field of any packet.
pub const MAX_DATA_LEN: usize = crate::config::ETX_OTA_DATA_MAX_SIZE;

/// Size in bytes of a Header packet's `data` field.
pub const HEADER_DATA_LEN: usize = 16;

/// The four kinds of ETX OTA packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Command = 0,
    Data = 1,
    Header = 2,
    Response = 3,
}

impl PacketType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(PacketType::Command),
            1 => Some(PacketType::Data),
            2 => Some(PacketType::Header),
            3 => Some(PacketType::Response),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Command packet payload: a single byte selecting one of three control
/// operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start = 0,
    End = 1,
    Abort = 2,
}

impl Command {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Command::Start),
            1 => Some(Command::End),
            2 => Some(Command::Abort),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Response packet payload: ACK or NACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Ack = 0,
    Nack = 1,
}

impl AckStatus {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(AckStatus::Ack),
            1 => Some(AckStatus::Nack),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// What kind of payload a Header packet announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadType {
    AppFirmware = 0,
    BootloaderFirmware = 1,
    CustomData = 2,
}

impl PayloadType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(PayloadType::AppFirmware),
            1 => Some(PayloadType::BootloaderFirmware),
            2 => Some(PayloadType::CustomData),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// The 16-byte Header packet payload, little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderData {
    pub package_size: u32,
    pub package_crc: u32,
    pub reserved1: u32,
    pub reserved2: u16,
    pub reserved3: u8,
    pub payload_type: u8,
}

impl HeaderData {
    pub fn new(package_size: u32, package_crc: u32, payload_type: PayloadType) -> Self {
        Self {
            package_size,
            package_crc,
            reserved1: 0xFFFF_FFFF,
            reserved2: 0xFFFF,
            reserved3: 0xFF,
            payload_type: payload_type.as_byte(),
        }
    }

    pub fn payload_type(&self) -> Option<PayloadType> {
        PayloadType::from_byte(self.payload_type)
    }

    pub fn to_bytes(self) -> [u8; HEADER_DATA_LEN] {
        let mut out = [0u8; HEADER_DATA_LEN];
        out[0..4].copy_from_slice(&self.package_size.to_le_bytes());
        out[4..8].copy_from_slice(&self.package_crc.to_le_bytes());
        out[8..12].copy_from_slice(&self.reserved1.to_le_bytes());
        out[12..14].copy_from_slice(&self.reserved2.to_le_bytes());
        out[14] = self.reserved3;
        out[15] = self.payload_type;
        out
    }

    pub fn from_bytes(b: &[u8; HEADER_DATA_LEN]) -> Self {
        Self {
            package_size: u32::from_le_bytes(b[0..4].try_into().unwrap()),
            package_crc: u32::from_le_bytes(b[4..8].try_into().unwrap()),
            reserved1: u32::from_le_bytes(b[8..12].try_into().unwrap()),
            reserved2: u16::from_le_bytes(b[12..14].try_into().unwrap()),
            reserved3: b[14],
            payload_type: b[15],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_through_bytes() {
        let h = HeaderData::new(2048, 0xDEAD_BEEF, PayloadType::AppFirmware);
        let bytes = h.to_bytes();
        let back = HeaderData::from_bytes(&bytes);
        assert_eq!(h, back);
        assert_eq!(back.payload_type(), Some(PayloadType::AppFirmware));
    }

    #[test]
    fn packet_type_round_trips() {
        for t in [
            PacketType::Command,
            PacketType::Data,
            PacketType::Header,
            PacketType::Response,
        ] {
            assert_eq!(PacketType::from_byte(t.as_byte()), Some(t));
        }
        assert_eq!(PacketType::from_byte(4), None);
    }

    #[test]
    fn command_round_trips() {
        for c in [Command::Start, Command::End, Command::Abort] {
            assert_eq!(Command::from_byte(c.as_byte()), Some(c));
        }
        assert_eq!(Command::from_byte(3), None);
    }

    #[test]
    fn payload_type_round_trips() {
        for p in [
            PayloadType::AppFirmware,
            PayloadType::BootloaderFirmware,
            PayloadType::CustomData,
        ] {
            assert_eq!(PayloadType::from_byte(p.as_byte()), Some(p));
        }
        assert_eq!(PayloadType::from_byte(3), None);
    }
}
