// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Application-Side Integration Hooks.
//!
//! The original firmware resolved these as link-time symbol overrides
//! (`etx_ota_pre_transaction_handler`, `etx_ota_status_resp_handler`); here
//! they are an explicit capability the caller plugs into [`crate::Receiver`].

use crate::error::EtxOtaStatus;

/// The callback points an application registers with the receiver.
pub trait ReceiverHooks {
    /// Invoked once when the receiver first observes `Command(Start)`. The
    /// application may use this to quiesce background work before flash
    /// writes begin.
    fn on_pre_transaction(&mut self) {}

    /// Invoked with the transaction's terminal status once it concludes.
    ///
    /// `NotApplicable` here covers several distinct causes (an oversized
    /// firmware image, a `CustomData` request with no registered handler,
    /// a bootloader-image request this receiver can't serve); callers that
    /// need to react specifically to the bootloader-image case should use
    /// [`ReceiverHooks::on_bootloader_image_rejected`] instead.
    fn on_status(&mut self, status: EtxOtaStatus);

    /// Invoked when a `BootloaderFirmware` Header arrives at a receiver
    /// running `ReceiverRole::Application`. The application cannot stage a
    /// bootloader image into its own flash region, so the right response is
    /// to software-reset and let the next boot's pre-bootloader promotion
    /// path (or the bootloader itself) serve the request. The receiver also
    /// reports this case through `on_status(NotApplicable)`.
    fn on_bootloader_image_rejected(&mut self) {}

    /// Exposes a mutable buffer for a `CustomData` payload, if this
    /// application registers a handler for one. Returning `None` causes the
    /// receiver to answer the request with `NotApplicable`.
    fn expose_custom_data_buffer(&mut self) -> Option<&mut [u8]> {
        None
    }
}

/// A hook set with no custom-data handler and no side effects, for
/// integration points that only care about firmware updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHooks;

impl ReceiverHooks for NullHooks {
    fn on_status(&mut self, _status: EtxOtaStatus) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_hooks_expose_no_custom_data_buffer() {
        let mut hooks = NullHooks;
        assert!(hooks.expose_custom_data_buffer().is_none());
    }
}
