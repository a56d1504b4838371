// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Packet envelope codec.
//!
//! `encode` produces a complete frame in a caller-provided buffer. `decode`
//! reads a frame field-by-field straight off a [`Transport`], never
//! assuming the whole frame is already buffered. A real UART hands bytes
//! over one at a time, and the decoder's timeout discipline must apply to
//! each read.
//!
//! The Data-state rule that a packet's length must be a multiple of 4
//! *unless it is the final chunk* depends on how many bytes the receiver
//! has already accepted, so it is enforced by [`crate::receiver`], not
//! here; this layer only rejects the context-free case of `data_len == 0`.

use crate::crc::crc32;
use crate::error::FrameError;
use crate::protocol::{PacketType, EOF, FRAME_OVERHEAD, MAX_DATA_LEN, SOF};
use crate::transport::Transport;

/// A decoded packet: its type and a reference to the already-validated
/// `data` bytes (owned by the caller's scratch buffer).
pub struct Packet<'a> {
    pub packet_type: PacketType,
    pub data: &'a [u8],
}

/// Encode `data` as a `packet_type` frame into `out`, returning the number
/// of bytes written. `out` must be at least `data.len() + FRAME_OVERHEAD`.
pub fn encode(packet_type: PacketType, data: &[u8], out: &mut [u8]) -> Result<usize, FrameError> {
    if data.len() > MAX_DATA_LEN {
        return Err(FrameError::BadLength);
    }
    let total = data.len() + FRAME_OVERHEAD;
    if out.len() < total {
        return Err(FrameError::BadLength);
    }

    out[0] = SOF;
    out[1] = packet_type.as_byte();
    out[2..4].copy_from_slice(&(data.len() as u16).to_le_bytes());
    out[4..4 + data.len()].copy_from_slice(data);
    let crc = crc32(data);
    let crc_off = 4 + data.len();
    out[crc_off..crc_off + 4].copy_from_slice(&crc.to_le_bytes());
    out[crc_off + 4] = EOF;

    Ok(total)
}

/// Read one frame from `transport`, validating every field, and placing its
/// `data` bytes into `scratch`. Returns a [`Packet`] borrowing `scratch`.
pub fn decode<'a, T: Transport>(
    transport: &mut T,
    scratch: &'a mut [u8; MAX_DATA_LEN],
    timeout_ms: u32,
) -> Result<Packet<'a>, FrameError> {
    let mut sof = [0u8; 1];
    transport.recv(&mut sof, timeout_ms)?;
    if sof[0] != SOF {
        return Err(FrameError::BadFraming);
    }

    let mut type_byte = [0u8; 1];
    transport.recv(&mut type_byte, timeout_ms)?;
    let packet_type = PacketType::from_byte(type_byte[0]).ok_or(FrameError::BadType)?;

    let mut len_bytes = [0u8; 2];
    transport.recv(&mut len_bytes, timeout_ms)?;
    let data_len = u16::from_le_bytes(len_bytes) as usize;
    if data_len == 0 || data_len > MAX_DATA_LEN {
        return Err(FrameError::BadLength);
    }

    let data = &mut scratch[..data_len];
    transport.recv(data, timeout_ms)?;

    let mut crc_bytes = [0u8; 4];
    transport.recv(&mut crc_bytes, timeout_ms)?;
    let crc = u32::from_le_bytes(crc_bytes);

    let mut eof = [0u8; 1];
    transport.recv(&mut eof, timeout_ms)?;
    if eof[0] != EOF {
        return Err(FrameError::BadFraming);
    }

    if crc32(data) != crc {
        return Err(FrameError::CrcMismatch);
    }

    Ok(Packet { packet_type, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeTransport;
    use crate::protocol::MAX_DATA_LEN;

    #[test]
    fn encode_decode_round_trips_for_valid_packet() {
        let mut buf = [0u8; 64];
        let data = [1u8, 2, 3, 4];
        let n = encode(PacketType::Data, &data, &mut buf).unwrap();

        let mut transport = FakeTransport::new();
        transport.push_inbound(&buf[..n]);

        let mut scratch = [0u8; MAX_DATA_LEN];
        let packet = decode(&mut transport, &mut scratch, 0).unwrap();
        assert_eq!(packet.packet_type, PacketType::Data);
        assert_eq!(packet.data, &data);
    }

    #[test]
    fn decode_rejects_bad_sof() {
        let mut buf = [0u8; 64];
        let n = encode(PacketType::Command, &[0], &mut buf).unwrap();
        buf[0] = 0x00;

        let mut transport = FakeTransport::new();
        transport.push_inbound(&buf[..n]);
        let mut scratch = [0u8; MAX_DATA_LEN];
        assert_eq!(
            decode(&mut transport, &mut scratch, 0),
            Err(FrameError::BadFraming)
        );
    }

    #[test]
    fn decode_rejects_bad_eof() {
        let mut buf = [0u8; 64];
        let n = encode(PacketType::Command, &[0], &mut buf).unwrap();
        buf[n - 1] = 0x00;

        let mut transport = FakeTransport::new();
        transport.push_inbound(&buf[..n]);
        let mut scratch = [0u8; MAX_DATA_LEN];
        assert_eq!(
            decode(&mut transport, &mut scratch, 0),
            Err(FrameError::BadFraming)
        );
    }

    #[test]
    fn decode_rejects_unknown_packet_type() {
        let mut buf = [0u8; 64];
        let n = encode(PacketType::Command, &[0], &mut buf).unwrap();
        buf[1] = 7;
        let crc = crc32(&[0]);
        buf[4..8].copy_from_slice(&crc.to_le_bytes());

        let mut transport = FakeTransport::new();
        transport.push_inbound(&buf[..n]);
        let mut scratch = [0u8; MAX_DATA_LEN];
        assert_eq!(
            decode(&mut transport, &mut scratch, 0),
            Err(FrameError::BadType)
        );
    }

    #[test]
    fn decode_rejects_crc_mismatch() {
        let mut buf = [0u8; 64];
        let n = encode(PacketType::Data, &[1, 2, 3, 4], &mut buf).unwrap();
        buf[4] ^= 0xFF;

        let mut transport = FakeTransport::new();
        transport.push_inbound(&buf[..n]);
        let mut scratch = [0u8; MAX_DATA_LEN];
        assert_eq!(
            decode(&mut transport, &mut scratch, 0),
            Err(FrameError::CrcMismatch)
        );
    }

    #[test]
    fn decode_rejects_zero_length_data() {
        let mut buf = [0u8; 64];
        // Hand-build a zero-length frame; `encode` itself won't produce one.
        buf[0] = SOF;
        buf[1] = PacketType::Data.as_byte();
        buf[2..4].copy_from_slice(&0u16.to_le_bytes());
        let crc = crc32(&[]);
        buf[4..8].copy_from_slice(&crc.to_le_bytes());
        buf[8] = EOF;

        let mut transport = FakeTransport::new();
        transport.push_inbound(&buf[..9]);
        let mut scratch = [0u8; MAX_DATA_LEN];
        assert_eq!(
            decode(&mut transport, &mut scratch, 0),
            Err(FrameError::BadLength)
        );
    }

    #[test]
    fn decode_times_out_as_no_response_mid_frame() {
        let mut buf = [0u8; 64];
        let n = encode(PacketType::Command, &[0], &mut buf).unwrap();

        let mut transport = FakeTransport::new();
        transport.push_inbound(&buf[..n - 2]);
        let mut scratch = [0u8; MAX_DATA_LEN];
        assert!(matches!(
            decode(&mut transport, &mut scratch, 0),
            Err(FrameError::Truncated)
        ));
    }

    #[test]
    fn embedded_sof_or_eof_bytes_inside_data_are_accepted() {
        let mut buf = [0u8; 64];
        let data = [SOF, EOF, SOF, EOF];
        let n = encode(PacketType::Data, &data, &mut buf).unwrap();

        let mut transport = FakeTransport::new();
        transport.push_inbound(&buf[..n]);
        let mut scratch = [0u8; MAX_DATA_LEN];
        let packet = decode(&mut transport, &mut scratch, 0).unwrap();
        assert_eq!(packet.data, &data);
    }
}
