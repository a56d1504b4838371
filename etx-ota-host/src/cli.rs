// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Positional argv contract: `argv[1]` comport id, `argv[2]` payload file,
//! `argv[3]` payload type. `clap` still does the parsing and `--help`/usage
//! generation; the arguments themselves are positional, not subcommands, to
//! match the reference shape exactly.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "etx-ota-host", about = "ETX OTA firmware/custom-data uploader")]
pub struct Cli {
    /// Integer comport identifier (e.g. 3 selects COM3 on Windows or
    /// /dev/ttyUSB3 elsewhere).
    pub comport: u32,
    /// Path to the payload file. Still required when the payload type is
    /// CustomData, even though its bytes are what get sent either way.
    pub file: PathBuf,
    /// 0 = AppFirmware, 1 = BootloaderFirmware, 2 = CustomData.
    pub payload_type: u8,
}

/// Map an integer comport identifier to a platform device path. Not part of
/// the wire protocol, purely a host convenience so the CLI can stay
/// positional-integer instead of demanding a raw OS path.
pub fn resolve_port(id: u32) -> String {
    if cfg!(windows) {
        format!("COM{id}")
    } else if cfg!(target_os = "macos") {
        format!("/dev/tty.usbserial-{id}")
    } else {
        format!("/dev/ttyUSB{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_three_positional_arguments() {
        let cli = Cli::parse_from(["etx-ota-host", "3", "firmware.bin", "0"]);
        assert_eq!(cli.comport, 3);
        assert_eq!(cli.file, PathBuf::from("firmware.bin"));
        assert_eq!(cli.payload_type, 0);
    }
}
