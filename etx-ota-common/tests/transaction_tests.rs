// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! End-to-end ETX OTA transactions: a real [`send_transaction`] driver on
//! one thread talking to a real [`Receiver`] on another, over a pair of
//! channel-backed transports standing in for a serial link. Unlike the
//! inline unit tests in `receiver.rs`/`sender.rs`, which each drive their
//! side against a canned byte stream, this exercises both halves of the
//! protocol in lockstep, exercising the end-to-end scenarios a canned byte
//! stream can't reach.

use std::sync::mpsc::{Receiver as ChanRx, Sender as ChanTx, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use etx_ota_common::error::{EtxOtaStatus, TransportError};
use etx_ota_common::fakes::FakeFlash;
use etx_ota_common::fucs::FirmUpdConfStore;
use etx_ota_common::hooks::{NullHooks, ReceiverHooks};
use etx_ota_common::protocol::PayloadType;
use etx_ota_common::receiver::{Receiver, ReceiverConfig, ReceiverRole};
use etx_ota_common::sender::{send_transaction, SenderConfig};
use etx_ota_common::transport::Transport;

/// One direction of a simulated serial link: bytes pushed with `send`
/// become available to the peer's `recv`, blocking (with a real sleep, so
/// two real threads can hand off) until enough bytes arrive or the
/// timeout-ish retry budget is exhausted.
struct ChannelTransport {
    tx: ChanTx<u8>,
    rx: ChanRx<u8>,
}

impl Transport for ChannelTransport {
    fn recv(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<(), TransportError> {
        let deadline = Instant::now() + Duration::from_millis(200);
        for slot in buf.iter_mut() {
            loop {
                match self.rx.try_recv() {
                    Ok(byte) => {
                        *slot = byte;
                        break;
                    }
                    Err(TryRecvError::Empty) => {
                        if Instant::now() > deadline {
                            return Err(TransportError::NoResponse);
                        }
                        thread::sleep(Duration::from_micros(200));
                    }
                    Err(TryRecvError::Disconnected) => return Err(TransportError::Failure),
                }
            }
        }
        Ok(())
    }

    fn send(&mut self, buf: &[u8], _timeout_ms: u32) -> Result<(), TransportError> {
        for &byte in buf {
            self.tx.send(byte).map_err(|_| TransportError::Failure)?;
        }
        Ok(())
    }
}

/// Build a connected pair: `.0` is the host's end, `.1` is the device's end.
fn channel_pair() -> (ChannelTransport, ChannelTransport) {
    let (host_to_device_tx, host_to_device_rx) = std::sync::mpsc::channel();
    let (device_to_host_tx, device_to_host_rx) = std::sync::mpsc::channel();
    (
        ChannelTransport {
            tx: host_to_device_tx,
            rx: device_to_host_rx,
        },
        ChannelTransport {
            tx: device_to_host_tx,
            rx: host_to_device_rx,
        },
    )
}

const APP_BASE: u32 = 0x1000;
const APP_LEN: u32 = 8192;
const BL_LEN: u32 = 4096;
const PAGE0: u32 = APP_BASE + APP_LEN;
const FUCS_PAGE_LEN: u32 = 4096;
const PAGE1: u32 = PAGE0 + FUCS_PAGE_LEN;

fn make_receiver<H: ReceiverHooks>(hooks: H) -> Receiver<FakeFlash, H> {
    let flash = FakeFlash::new(APP_BASE, (PAGE1 + FUCS_PAGE_LEN - APP_BASE) as usize);
    let store = FirmUpdConfStore::new(flash, PAGE0, PAGE1, FUCS_PAGE_LEN);
    let config = ReceiverConfig {
        role: ReceiverRole::Bootloader,
        app_slot_base: APP_BASE,
        app_slot_len: APP_LEN,
        bl_slot_len: BL_LEN,
        timeout_ms: 50,
    };
    Receiver::new(config, store, hooks, || {}).unwrap()
}

/// Drives `receiver.step` the way `etx-ota-device/src/main.rs` does: a
/// transaction's terminal status doesn't end the loop by itself. Every
/// `send_transaction` call leads with a `Command(Abort)`, which the
/// receiver answers with `Done(Stopped)` before the real transaction even
/// starts, and a timed-out read surfaces as `Done(NoResponse)` without
/// advancing state either. Only `Ok`, `Error`, or `NotApplicable` actually
/// conclude the transaction this test is waiting on.
fn run_receiver_until_done<H: ReceiverHooks>(
    receiver: &mut Receiver<FakeFlash, H>,
    transport: &mut ChannelTransport,
) -> EtxOtaStatus {
    loop {
        match receiver.step(transport) {
            etx_ota_common::receiver::StepOutcome::Continue => continue,
            etx_ota_common::receiver::StepOutcome::Done(EtxOtaStatus::Stopped)
            | etx_ota_common::receiver::StepOutcome::Done(EtxOtaStatus::NoResponse) => continue,
            etx_ota_common::receiver::StepOutcome::Done(status) => return status,
        }
    }
}

#[test]
fn happy_path_app_update_round_trips_over_channel_transport() {
    let (mut host_transport, mut device_transport) = channel_pair();
    let payload: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();

    let device = thread::spawn(move || {
        let mut receiver = make_receiver(NullHooks);
        run_receiver_until_done(&mut receiver, &mut device_transport)
    });

    let config = SenderConfig { timeout_ms: 50 };
    let host_status = send_transaction(
        &mut host_transport,
        &config,
        PayloadType::AppFirmware,
        &payload,
        || {},
        || {},
    );

    assert_eq!(host_status, EtxOtaStatus::Ok);
    assert_eq!(device.join().unwrap(), EtxOtaStatus::Ok);
}

#[test]
fn custom_data_transaction_delivers_exact_bytes_to_application_buffer() {
    struct CapturingHooks {
        buf: [u8; 512],
        last_status: Option<EtxOtaStatus>,
    }
    impl ReceiverHooks for CapturingHooks {
        fn on_status(&mut self, status: EtxOtaStatus) {
            self.last_status = Some(status);
        }
        fn expose_custom_data_buffer(&mut self) -> Option<&mut [u8]> {
            Some(&mut self.buf)
        }
    }

    let (mut host_transport, mut device_transport) = channel_pair();
    let payload: Vec<u8> = (0..512u32).map(|i| (i % 256) as u8).collect();
    let expected = payload.clone();

    let device = thread::spawn(move || {
        let hooks = CapturingHooks {
            buf: [0u8; 512],
            last_status: None,
        };
        let mut receiver = make_receiver(hooks);
        let status = run_receiver_until_done(&mut receiver, &mut device_transport);
        (status, receiver)
    });

    let config = SenderConfig { timeout_ms: 50 };
    let host_status = send_transaction(
        &mut host_transport,
        &config,
        PayloadType::CustomData,
        &payload,
        || {},
        || {},
    );
    assert_eq!(host_status, EtxOtaStatus::Ok);

    let (device_status, receiver) = device.join().unwrap();
    assert_eq!(device_status, EtxOtaStatus::Ok);
    assert_eq!(&receiver.into_hooks().buf[..], &expected[..]);
}
