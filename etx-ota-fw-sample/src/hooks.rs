// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Application-Side Integration Hooks: this sample registers a custom-data
//! buffer so a `payload_type=CustomData` Header is accepted rather than
//! bounced, counts pre-transaction invocations, and reacts to a
//! bootloader-image request arriving at the application firmware by asking
//! the caller to reset into DFU on the next boot.

use etx_ota_common::config::CUSTOM_DATA_MAX_SIZE;
use etx_ota_common::error::EtxOtaStatus;
use etx_ota_common::hooks::ReceiverHooks;

/// Application-level view of how a transaction concluded, collapsing the
/// wire-level status into what the sample's main loop actually needs to
/// act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    None,
    /// A bootloader-image request arrived while we are the application
    /// firmware; the caller should software-reset so the next boot's
    /// bootloader can serve it.
    ResetIntoDfu,
    /// A custom-data payload was captured into the buffer exposed through
    /// [`AppHooks::custom_data_buffer`]; the caller already knows how many
    /// bytes it declared in its own Header, since it is the same device
    /// that requested the transfer.
    CustomDataReady,
}

pub struct AppHooks {
    pre_transaction_count: u32,
    custom_buf: [u8; CUSTOM_DATA_MAX_SIZE],
    custom_data_requested: bool,
    last_action: AppAction,
}

impl AppHooks {
    pub fn new() -> Self {
        Self {
            pre_transaction_count: 0,
            custom_buf: [0u8; CUSTOM_DATA_MAX_SIZE],
            custom_data_requested: false,
            last_action: AppAction::None,
        }
    }

    /// The raw custom-data buffer this sample exposes to the receiver. Its
    /// leading bytes hold whatever a `CustomData` transaction last wrote;
    /// trailing bytes are untouched from the previous transaction.
    pub fn custom_data_buffer(&self) -> &[u8; CUSTOM_DATA_MAX_SIZE] {
        &self.custom_buf
    }

    /// What the main loop should do in response to the last transaction.
    pub fn take_action(&mut self) -> AppAction {
        core::mem::replace(&mut self.last_action, AppAction::None)
    }
}

impl Default for AppHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiverHooks for AppHooks {
    fn on_pre_transaction(&mut self) {
        self.pre_transaction_count += 1;
        defmt::println!(
            "ETX OTA: transaction #{} starting, quiescing application work",
            self.pre_transaction_count
        );
        // Real integrators pause whatever background work would otherwise
        // contend with flash writes here (sensor polling, a USB stack,
        // etc). This sample has nothing to quiesce.
    }

    fn on_status(&mut self, status: EtxOtaStatus) {
        match status {
            EtxOtaStatus::NotApplicable => {
                // Oversized firmware and an unhandled CustomData request also
                // surface as NotApplicable; neither warrants a reset, so this
                // arm only logs. `on_bootloader_image_rejected` handles the
                // one case that does.
                defmt::println!("ETX OTA: request not applicable here");
            }
            EtxOtaStatus::Ok if self.custom_data_requested => {
                self.custom_data_requested = false;
                self.last_action = AppAction::CustomDataReady;
            }
            _ => {}
        }
    }

    fn on_bootloader_image_rejected(&mut self) {
        defmt::println!("ETX OTA: bootloader image requested here, requesting DFU reset");
        self.last_action = AppAction::ResetIntoDfu;
    }

    fn expose_custom_data_buffer(&mut self) -> Option<&mut [u8]> {
        self.custom_data_requested = true;
        Some(&mut self.custom_buf)
    }
}
