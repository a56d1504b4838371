// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Bootloader-side [`ReceiverHooks`]: the bootloader has no application
//! work to quiesce and no custom-data handler of its own, so this only
//! wires the fault LED to `Error`/`NotApplicable` terminal statuses.

use embedded_hal::digital::OutputPin;
use etx_ota_common::error::EtxOtaStatus;
use etx_ota_common::hooks::ReceiverHooks;

pub struct DeviceHooks<L> {
    fault_led: L,
}

impl<L: OutputPin> DeviceHooks<L> {
    pub fn new(fault_led: L) -> Self {
        Self { fault_led }
    }
}

impl<L: OutputPin> ReceiverHooks for DeviceHooks<L> {
    fn on_status(&mut self, status: EtxOtaStatus) {
        etx_ota_common::set_fault(
            &mut self.fault_led,
            matches!(status, EtxOtaStatus::Error | EtxOtaStatus::NotApplicable),
        );
    }
}
