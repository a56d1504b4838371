// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Host-Side Sender: orchestrates
//! `Abort → Start → Header → Data* → End` over a [`Transport`], with a
//! one-shot whole-transaction retry on a failed `Start`/`Header` step.
//!
//! Byte-level pacing (`SEND_PACKET_BYTES_DELAY`) is the concrete host
//! transport's job, not this driver's. Keeping it out of here means the
//! unit tests below run at full speed against [`crate::fakes::FakeTransport`]
//! instead of sleeping for real. Poll pacing and the whole-transaction retry
//! sleep, by contrast, are timing *the driver itself* is responsible for, so
//! they're threaded in as caller-supplied delay closures (mirroring
//! [`crate::fucs::FirmUpdConfStore::init`]), keeping `std::thread::sleep`
//! out of this crate entirely.

use crate::crc::crc32;
use crate::error::{EtxOtaStatus, FrameError};
use crate::frame;
use crate::protocol::{
    AckStatus, Command, HeaderData, PacketType, PayloadType, FRAME_OVERHEAD, MAX_DATA_LEN,
};
use crate::transport::Transport;

/// How many times the Data/End steps poll for a response before declaring
/// `NoResponse`.
const DATA_END_POLL_ATTEMPTS: u32 = 2;
const START_HEADER_POLL_ATTEMPTS: u32 = 1;

/// Upper bound on how many times the sender will repeat the leading Abort
/// command while waiting for an ACK. Nothing requires a cap here, but one
/// exists so a permanently unresponsive device yields `NoResponse` rather
/// than an infinite loop.
pub const MAX_ABORT_ATTEMPTS: u32 = 5;

/// Non-pacing-sensitive timeout/attempt configuration for one sender run.
/// The byte- and poll-level pacing constants live on the concrete host
/// transport and the `poll_delay`/`retry_delay` closures passed to
/// [`send_transaction`], not here.
#[derive(Debug, Clone, Copy)]
pub struct SenderConfig {
    pub timeout_ms: u32,
}

/// Run one full ETX OTA transaction: Abort, Start, Header, every Data
/// chunk, End, retrying the whole transaction once if `Start` or `Header`
/// fails on the first attempt.
pub fn send_transaction<T: Transport>(
    transport: &mut T,
    config: &SenderConfig,
    payload_type: PayloadType,
    payload: &[u8],
    mut poll_delay: impl FnMut(),
    mut retry_delay: impl FnMut(),
) -> EtxOtaStatus {
    if !send_abort_until_ack(transport, config, &mut poll_delay) {
        return EtxOtaStatus::NoResponse;
    }

    let crc = crc32(payload);
    let first = run_once(transport, config, payload_type, payload, crc, &mut poll_delay);
    if matches!(first, EtxOtaStatus::Ok) {
        return first;
    }

    transport.reset().ok();
    retry_delay();
    run_once(transport, config, payload_type, payload, crc, &mut poll_delay)
}

fn send_abort_until_ack<T: Transport>(
    transport: &mut T,
    config: &SenderConfig,
    poll_delay: &mut impl FnMut(),
) -> bool {
    for attempt in 0..MAX_ABORT_ATTEMPTS {
        if attempt > 0 {
            poll_delay();
        }
        if let Ok(AckStatus::Ack) =
            send_packet_and_await(transport, config, PacketType::Command, &[Command::Abort.as_byte()], START_HEADER_POLL_ATTEMPTS, poll_delay)
        {
            return true;
        }
    }
    false
}

fn run_once<T: Transport>(
    transport: &mut T,
    config: &SenderConfig,
    payload_type: PayloadType,
    payload: &[u8],
    crc: u32,
    poll_delay: &mut impl FnMut(),
) -> EtxOtaStatus {
    match send_packet_and_await(
        transport,
        config,
        PacketType::Command,
        &[Command::Start.as_byte()],
        START_HEADER_POLL_ATTEMPTS,
        poll_delay,
    ) {
        Ok(AckStatus::Ack) => {}
        Ok(AckStatus::Nack) => return EtxOtaStatus::Error,
        Err(status) => return status,
    }

    let header = HeaderData::new(payload.len() as u32, crc, payload_type);
    match send_packet_and_await(
        transport,
        config,
        PacketType::Header,
        &header.to_bytes(),
        START_HEADER_POLL_ATTEMPTS,
        poll_delay,
    ) {
        Ok(AckStatus::Ack) => {}
        Ok(AckStatus::Nack) => return EtxOtaStatus::Error,
        Err(status) => return status,
    }

    let mut offset = 0usize;
    while offset < payload.len() {
        let end = core::cmp::min(offset + MAX_DATA_LEN, payload.len());
        match send_packet_and_await(
            transport,
            config,
            PacketType::Data,
            &payload[offset..end],
            DATA_END_POLL_ATTEMPTS,
            poll_delay,
        ) {
            Ok(AckStatus::Ack) => {}
            Ok(AckStatus::Nack) => return EtxOtaStatus::Error,
            Err(status) => return status,
        }
        offset = end;
    }

    match send_packet_and_await(
        transport,
        config,
        PacketType::Command,
        &[Command::End.as_byte()],
        DATA_END_POLL_ATTEMPTS,
        poll_delay,
    ) {
        Ok(AckStatus::Ack) => EtxOtaStatus::Ok,
        Ok(AckStatus::Nack) => EtxOtaStatus::Error,
        Err(status) => status,
    }
}

fn send_packet_and_await<T: Transport>(
    transport: &mut T,
    config: &SenderConfig,
    packet_type: PacketType,
    data: &[u8],
    poll_attempts: u32,
    poll_delay: &mut impl FnMut(),
) -> Result<AckStatus, EtxOtaStatus> {
    let mut buf = [0u8; MAX_DATA_LEN + FRAME_OVERHEAD];
    let n = frame::encode(packet_type, data, &mut buf).map_err(|_| EtxOtaStatus::Error)?;
    transport
        .send(&buf[..n], config.timeout_ms)
        .map_err(|_| EtxOtaStatus::NoResponse)?;
    await_response(transport, config, poll_attempts, poll_delay)
}

fn await_response<T: Transport>(
    transport: &mut T,
    config: &SenderConfig,
    poll_attempts: u32,
    poll_delay: &mut impl FnMut(),
) -> Result<AckStatus, EtxOtaStatus> {
    for attempt in 0..poll_attempts {
        if attempt > 0 {
            poll_delay();
        }
        let mut scratch = [0u8; MAX_DATA_LEN];
        match frame::decode(transport, &mut scratch, config.timeout_ms) {
            Ok(packet) if packet.packet_type == PacketType::Response && packet.data.len() == 1 => {
                return AckStatus::from_byte(packet.data[0]).ok_or(EtxOtaStatus::Error);
            }
            Ok(_) => return Err(EtxOtaStatus::Error),
            Err(FrameError::Truncated) | Err(FrameError::Transport(_)) => continue,
            Err(_) => return Err(EtxOtaStatus::Error),
        }
    }
    Err(EtxOtaStatus::NoResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeTransport;

    fn respond(transport: &mut FakeTransport, status: AckStatus) {
        let mut buf = [0u8; 16];
        let n = frame::encode(PacketType::Response, &[status.as_byte()], &mut buf).unwrap();
        transport.push_inbound(&buf[..n]);
    }

    fn sent_packet_types(transport: &mut FakeTransport) -> heapless::Vec<PacketType, 16> {
        let out = transport.drain_outbound();
        let mut types = heapless::Vec::new();
        let mut i = 0;
        while i < out.len() {
            let pt = PacketType::from_byte(out[i + 1]).unwrap();
            let len = u16::from_le_bytes([out[i + 2], out[i + 3]]) as usize;
            types.push(pt).unwrap();
            i += FRAME_OVERHEAD + len;
        }
        types
    }

    #[test]
    fn happy_path_sends_abort_start_header_data_end_in_order() {
        let mut transport = FakeTransport::new();
        let config = SenderConfig { timeout_ms: 0 };
        let payload = [0x42u8; 1500];

        // One ACK per step: abort, start, header, 2 data chunks, end.
        for _ in 0..6 {
            respond(&mut transport, AckStatus::Ack);
        }

        let status = send_transaction(
            &mut transport,
            &config,
            PayloadType::AppFirmware,
            &payload,
            || {},
            || {},
        );
        assert_eq!(status, EtxOtaStatus::Ok);
    }

    #[test]
    fn nack_on_start_surfaces_as_error_after_retry_exhausted() {
        let mut transport = FakeTransport::new();
        let config = SenderConfig { timeout_ms: 0 };

        respond(&mut transport, AckStatus::Ack); // abort ack
        respond(&mut transport, AckStatus::Nack); // start nack, first attempt
        respond(&mut transport, AckStatus::Nack); // start nack, retried attempt

        let status = send_transaction(
            &mut transport,
            &config,
            PayloadType::AppFirmware,
            &[1, 2, 3, 4],
            || {},
            || {},
        );
        assert_eq!(status, EtxOtaStatus::Error);
    }

    #[test]
    fn retry_recovers_after_no_response_on_start() {
        let mut transport = FakeTransport::new();
        let config = SenderConfig { timeout_ms: 0 };

        respond(&mut transport, AckStatus::Ack); // abort ack
        // no response queued for the first Start -> NoResponse on that attempt
        transport.fail_next_recv = true;

        // queue the retried attempt's full success sequence
        respond(&mut transport, AckStatus::Ack); // start ack (retry)
        respond(&mut transport, AckStatus::Ack); // header ack
        respond(&mut transport, AckStatus::Ack); // data ack
        respond(&mut transport, AckStatus::Ack); // end ack

        let mut retries = 0;
        let status = send_transaction(
            &mut transport,
            &config,
            PayloadType::AppFirmware,
            &[1, 2, 3, 4],
            || {},
            || retries += 1,
        );
        assert_eq!(status, EtxOtaStatus::Ok);
        assert_eq!(retries, 1);
        assert_eq!(transport.reset_count, 1);
    }

    #[test]
    fn packet_order_is_abort_start_header_then_data_chunks_then_end() {
        let mut transport = FakeTransport::new();
        let config = SenderConfig { timeout_ms: 0 };
        let payload = [0u8; 1024];

        // abort, start, header, one data chunk, end.
        for _ in 0..5 {
            respond(&mut transport, AckStatus::Ack);
        }

        let status = send_transaction(
            &mut transport,
            &config,
            PayloadType::AppFirmware,
            &payload,
            || {},
            || {},
        );
        assert_eq!(status, EtxOtaStatus::Ok);

        let types = sent_packet_types(&mut transport);
        assert_eq!(
            &types[..],
            &[
                PacketType::Command, // abort
                PacketType::Command, // start
                PacketType::Header,
                PacketType::Data,
                PacketType::Command, // end
            ]
        );
    }
}
