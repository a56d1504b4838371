// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Drives one ETX OTA transaction end to end: read the payload file, open
//! the comport, hand both to [`etx_ota_common::sender::send_transaction`],
//! and report the terminal status.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use etx_ota_common::config::{
    DEFAULT_BAUD_RATE, ETX_CUSTOM_HAL_TIMEOUT_MS, TEUNIZ_LIB_POLL_COMPORT_DELAY_MS,
    TRY_AGAIN_SENDING_FWI_DELAY_MS,
};
use etx_ota_common::error::EtxOtaStatus;
use etx_ota_common::protocol::PayloadType;
use etx_ota_common::sender::{send_transaction, SenderConfig};

use crate::cli::resolve_port;
use crate::transport::SerialTransport;

/// Five-severity structured logging. `Debug` lines are suppressed unless the
/// `verbose` feature is enabled, mirroring `ETX_OTA_VERBOSE` in the original
/// tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Done,
    Warning,
    Error,
}

pub fn log(severity: Severity, message: impl AsRef<str>) {
    if severity == Severity::Debug && !cfg!(feature = "verbose") {
        return;
    }
    let tag = match severity {
        Severity::Debug => "DEBUG",
        Severity::Info => "INFO",
        Severity::Done => "DONE",
        Severity::Warning => "WARN",
        Severity::Error => "ERROR",
    };
    eprintln!("[{tag}] {}", message.as_ref());
}

pub fn payload_type_from_u8(value: u8) -> Result<PayloadType> {
    PayloadType::from_byte(value)
        .with_context(|| format!("payload type must be 0, 1 or 2, got {value}"))
}

/// Read `file`, open `comport`, and run one ETX OTA transaction carrying
/// its bytes as `payload_type`. Returns the transaction's terminal status
/// rather than an `Err` for anything the protocol itself reports; only I/O
/// failures that happen before a transaction can even start (unreadable
/// file, unopenable port) become `Err`.
pub fn run_upload(comport: u32, file: &Path, payload_type: PayloadType) -> Result<EtxOtaStatus> {
    let payload = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    log(
        Severity::Info,
        format!("loaded {} bytes from {}", payload.len(), file.display()),
    );

    let port_name = resolve_port(comport);
    log(Severity::Debug, format!("opening {port_name}"));
    let mut transport = SerialTransport::open(&port_name, DEFAULT_BAUD_RATE)?;

    let config = SenderConfig {
        timeout_ms: ETX_CUSTOM_HAL_TIMEOUT_MS,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message(format!("sending over {port_name}"));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let status = send_transaction(
        &mut transport,
        &config,
        payload_type,
        &payload,
        || std::thread::sleep(Duration::from_millis(TEUNIZ_LIB_POLL_COMPORT_DELAY_MS as u64)),
        || std::thread::sleep(Duration::from_millis(TRY_AGAIN_SENDING_FWI_DELAY_MS as u64)),
    );
    spinner.finish_and_clear();

    match status {
        EtxOtaStatus::Ok => log(Severity::Done, "transaction completed"),
        EtxOtaStatus::Stopped => log(Severity::Warning, "transaction stopped (abort acknowledged)"),
        EtxOtaStatus::NoResponse => log(Severity::Error, "device did not respond"),
        EtxOtaStatus::NotApplicable => log(Severity::Error, "device rejected this request"),
        EtxOtaStatus::Error => log(Severity::Error, "transaction failed"),
    }

    Ok(status)
}
