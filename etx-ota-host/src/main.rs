// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware/custom-data upload tool for the ETX OTA protocol.
//!
//! Usage: `etx-ota-host <comport> <file> <payload-type>`
//! (payload-type: 0 = AppFirmware, 1 = BootloaderFirmware, 2 = CustomData)

mod cli;
mod commands;
mod transport;

use clap::Parser;

use commands::Severity;

fn main() {
    let args = cli::Cli::parse();

    let payload_type = match commands::payload_type_from_u8(args.payload_type) {
        Ok(pt) => pt,
        Err(e) => {
            commands::log(Severity::Error, e.to_string());
            std::process::exit(etx_ota_common::error::EtxOtaStatus::Error.exit_code());
        }
    };

    match commands::run_upload(args.comport, &args.file, payload_type) {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            commands::log(Severity::Error, format!("{e:#}"));
            std::process::exit(etx_ota_common::error::EtxOtaStatus::Error.exit_code());
        }
    }
}
