// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error and status taxonomy shared by the device-side receiver and the
//! host-side sender.

/// Terminal status of an ETX OTA transaction, as observed by either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtxOtaStatus {
    /// The step, or the whole transaction, succeeded.
    Ok,
    /// An Abort command was received and acknowledged.
    Stopped,
    /// A transport read timed out; no state change occurred.
    NoResponse,
    /// A semantically valid request the device cannot serve right now.
    NotApplicable,
    /// Framing, CRC, type, state, or flash failure.
    Error,
}

impl EtxOtaStatus {
    /// The host CLI's process exit code for this status: 0 for `Ok`,
    /// otherwise a small nonzero value identifying which status ended the
    /// transaction.
    pub fn exit_code(self) -> i32 {
        match self {
            EtxOtaStatus::Ok => 0,
            EtxOtaStatus::Stopped => 1,
            EtxOtaStatus::NoResponse => 2,
            EtxOtaStatus::NotApplicable => 3,
            EtxOtaStatus::Error => 4,
        }
    }
}

/// Failure modes of the byte-oriented transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Timeout or busy condition on the peer.
    NoResponse,
    /// Lower-level transport failure (framing at the byte-stream layer,
    /// device disconnected, etc).
    Failure,
}

/// Failure modes of the frame codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// SOF or EOF byte did not match the expected literal.
    BadFraming,
    /// `packet_type` was not one of the four known values.
    BadType,
    /// `data_len` violated a length invariant (too large, or not a multiple
    /// of 4 while in the Data state).
    BadLength,
    /// The computed CRC over `data` did not match the packet's `crc` field.
    CrcMismatch,
    /// The transport closed or timed out mid-frame.
    Truncated,
    /// The underlying transport failed while reading a field.
    Transport(TransportError),
}

impl From<TransportError> for FrameError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::NoResponse => FrameError::Truncated,
            TransportError::Failure => FrameError::Transport(e),
        }
    }
}

/// Failure modes of a single flash operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// The flash controller reported busy/in-progress.
    Busy,
    /// A program (write) operation failed.
    Program,
    /// An erase operation failed.
    Erase,
    /// The flash could not be unlocked for writing.
    Unlock,
}

/// Failure modes of the Firmware-Update Config Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmUpdConfError {
    FlashBusy,
    FlashError,
    UnlockFailed,
    NotInitialized,
}

impl From<FlashError> for FirmUpdConfError {
    fn from(e: FlashError) -> Self {
        match e {
            FlashError::Busy => FirmUpdConfError::FlashBusy,
            FlashError::Unlock => FirmUpdConfError::UnlockFailed,
            FlashError::Program | FlashError::Erase => FirmUpdConfError::FlashError,
        }
    }
}
