// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Build-time configuration constants for the ETX OTA protocol.
//!
//! These mirror the `#define`s collected in the original firmware's
//! `etx_ota_config.h` / `app_etx_ota_config.h` headers: flash geometry is a
//! property of the target device, pacing constants are a property of the
//! host sender, and both are fixed at build time rather than negotiated on
//! the wire.

/// Maximum number of bytes ("Data" field) carried by a single Data/Header/
/// Command/Response packet.
pub const ETX_OTA_DATA_MAX_SIZE: usize = 1024;

/// Default variable-length custom-data area reserved inside a Firmware-Update
/// Config Record, as received on the device.
pub const CUSTOM_DATA_MAX_SIZE: usize = 2048;

/// Default variable-length custom-data area as synthesized on the host.
pub const HOST_CUSTOM_DATA_MAX_SIZE: usize = 1024;

/// Device flash geometry (example target: 1 KiB pages).
pub const FLASH_PAGE_SIZE_IN_BYTES: u32 = 1024;

/// Bootloader slot size in pages.
pub const ETX_BL_PAGE_SIZE: u32 = 34;

/// Application slot size in pages.
pub const ETX_APP_PAGE_SIZE: u32 = 86;

/// Pacing delay between consecutive bytes emitted on the wire by the host
/// sender (milliseconds). Named after `SEND_PACKET_BYTES_DELAY` in the
/// original PC tool.
pub const SEND_PACKET_BYTES_DELAY_MS: u32 = 1;

/// Pacing delay between consecutive polls of the comport while waiting for a
/// response (milliseconds). Named after `TEUNIZ_LIB_POLL_COMPORT_DELAY`.
pub const TEUNIZ_LIB_POLL_COMPORT_DELAY_MS: u32 = 500;

/// Delay before the host retries an entire transaction after a NACK/timeout
/// on its first attempt (milliseconds). Named after
/// `TRY_AGAIN_SENDING_FWI_DELAY`.
pub const TRY_AGAIN_SENDING_FWI_DELAY_MS: u32 = 9_000;

/// Upper bound every device-side `Transport::recv` call is allowed to block
/// for, named after `ETX_CUSTOM_HAL_TIMEOUT` in the original bootloader.
pub const ETX_CUSTOM_HAL_TIMEOUT_MS: u32 = 5_000;

/// Default baud rate for both direct UART and BT-serial transports.
/// BT-serial may be configured for 9600 on some devices; baud is a
/// collaborator parameter, not a protocol parameter.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Number of FUCS init attempts before declaring the store unusable.
pub const FUCS_INIT_MAX_ATTEMPTS: u8 = 3;

/// Wait before each FUCS init attempt (milliseconds).
pub const FUCS_INIT_RETRY_DELAY_MS: u32 = 500;

/// Reference device flash layout, shared by the bootloader, the
/// pre-bootloader, and their tests so the three never disagree about where
/// a slot begins. A real deployment fixes these via the target's linker
/// script instead; this is the layout assumed when none is provided.
pub const FLASH_XIP_BASE: u32 = 0x1000_0000;
pub const BL_SLOT_LEN: u32 = ETX_BL_PAGE_SIZE * FLASH_PAGE_SIZE_IN_BYTES;
pub const APP_SLOT_BASE: u32 = FLASH_XIP_BASE + BL_SLOT_LEN;
pub const APP_SLOT_LEN: u32 = ETX_APP_PAGE_SIZE * FLASH_PAGE_SIZE_IN_BYTES;
/// Erase granularity of the FUCS pages (the RP2040's flash sector size).
pub const FUCS_SECTOR_LEN: u32 = 4096;
pub const FUCS_PAGE0_ADDR: u32 = APP_SLOT_BASE + APP_SLOT_LEN;
pub const FUCS_PAGE1_ADDR: u32 = FUCS_PAGE0_ADDR + FUCS_SECTOR_LEN;
