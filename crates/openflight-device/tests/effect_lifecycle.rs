//! End-to-end effect lifecycle over a mock device: dispenser-shared effects,
//! allocation, parameter traffic, pool exhaustion and reclamation.

use hid_rhino_protocol::{
    AXIS_ENABLE_DIR, HID_REPORT_ID_BLOCK_FREE, HID_REPORT_ID_EFFECT_OPERATION,
    HID_REPORT_ID_PID_BLOCK_LOAD, HID_REPORT_ID_SET_CONDITION, HID_REPORT_ID_SET_EFFECT,
    HID_REPORT_ID_SET_PERIODIC, PRODUCT_ID, VENDOR_ID,
};
use openflight_device::{EffectDispenser, HapticEffect, Periodic, RhinoDevice};
use openflight_hid_common::mock::MockBackend;
use std::sync::Arc;

fn device_with_mock() -> (Arc<RhinoDevice>, MockBackend) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mock = MockBackend::new(VENDOR_ID, PRODUCT_ID);
    let device = RhinoDevice::from_backend(Box::new(mock.clone()));
    (device, mock)
}

fn queue_allocation(mock: &MockBackend, id: u8) {
    mock.queue_feature(vec![HID_REPORT_ID_PID_BLOCK_LOAD, id, 1, 0, 0]);
}

fn queue_pool_full(mock: &MockBackend) {
    mock.queue_feature(vec![HID_REPORT_ID_PID_BLOCK_LOAD, 0, 2, 0, 0]);
}

#[test]
fn periodic_effect_reaches_the_wire_through_a_dispenser() {
    let (device, mock) = device_with_mock();
    queue_allocation(&mock, 1);

    let effects = EffectDispenser::new();
    let rumble = effects.get("engine_rumble", || {
        HapticEffect::named(Arc::clone(&device), "engine_rumble")
    });
    rumble
        .lock()
        .periodic(Periodic::new(10.0, 0.5, 90.0))
        .expect("update")
        .start()
        .expect("start");

    // 10 Hz -> 100 ms period, 0.5 -> 2048, 90 deg -> direction byte 64
    let periodics = mock.writes_with_id(HID_REPORT_ID_SET_PERIODIC);
    assert_eq!(periodics.len(), 1);
    assert_eq!(&periodics[0][2..4], &2048u16.to_le_bytes());
    assert_eq!(&periodics[0][7..9], &100u16.to_le_bytes());

    let effects_reports = mock.writes_with_id(HID_REPORT_ID_SET_EFFECT);
    assert_eq!(effects_reports[0][12], AXIS_ENABLE_DIR);
    assert_eq!(effects_reports[0][13], 64);

    let ops = mock.writes_with_id(HID_REPORT_ID_EFFECT_OPERATION);
    assert_eq!(ops, vec![vec![HID_REPORT_ID_EFFECT_OPERATION, 1, 1, 1]]);
}

#[test]
fn repeated_identical_updates_write_once() {
    let (device, mock) = device_with_mock();
    queue_allocation(&mock, 1);

    let effects = EffectDispenser::new();
    let rumble = effects.get("rumble", || HapticEffect::new(Arc::clone(&device)));
    for _ in 0..5 {
        rumble
            .lock()
            .periodic(Periodic::new(25.0, 0.2, 0.0))
            .expect("update")
            .start()
            .expect("start");
    }

    assert_eq!(mock.writes_with_id(HID_REPORT_ID_SET_PERIODIC).len(), 1);
    assert_eq!(mock.writes_with_id(HID_REPORT_ID_SET_EFFECT).len(), 1);
    assert_eq!(mock.writes_with_id(HID_REPORT_ID_EFFECT_OPERATION).len(), 1);
}

#[test]
fn pool_exhaustion_is_a_silent_noop_until_a_slot_frees() {
    let (device, mock) = device_with_mock();
    let effects = EffectDispenser::new();

    queue_pool_full(&mock);
    let stall = effects.get("stall_buffet", || HapticEffect::new(Arc::clone(&device)));
    stall
        .lock()
        .periodic(Periodic::new(13.0, 1.0, 0.0))
        .expect("update")
        .start()
        .expect("start");
    assert!(!stall.lock().started());
    assert!(mock.write_history().is_empty());

    // A slot opens up; the same named effect comes alive on the next frame.
    queue_allocation(&mock, 2);
    stall
        .lock()
        .periodic(Periodic::new(13.0, 1.0, 0.0))
        .expect("update")
        .start()
        .expect("start");
    assert!(stall.lock().started());
    assert_eq!(mock.writes_with_id(HID_REPORT_ID_SET_PERIODIC).len(), 1);
}

#[test]
fn spring_updates_always_reach_the_wire_even_when_clamped_identically() {
    let (device, mock) = device_with_mock();
    queue_allocation(&mock, 3);

    let effects = EffectDispenser::new();
    let spring = effects.get("trim_spring", || HapticEffect::new(Arc::clone(&device)));
    spring.lock().spring(Some(4096.0), None).expect("update");
    spring.lock().spring(Some(8000.0), None).expect("update");

    let conds = mock.writes_with_id(HID_REPORT_ID_SET_CONDITION);
    assert_eq!(conds.len(), 2);
    assert_eq!(conds[0], conds[1]);
    assert_eq!(&conds[0][5..7], &4096i16.to_le_bytes());
}

#[test]
fn dispenser_clear_frees_every_allocated_slot() {
    let (device, mock) = device_with_mock();
    let effects = EffectDispenser::new();

    queue_allocation(&mock, 1);
    queue_allocation(&mock, 2);
    effects
        .get("a", || HapticEffect::new(Arc::clone(&device)))
        .lock()
        .constant(0.5, 0.0)
        .expect("update");
    effects
        .get("b", || HapticEffect::new(Arc::clone(&device)))
        .lock()
        .constant(0.25, 180.0)
        .expect("update");
    assert_eq!(effects.len(), 2);

    effects.clear();
    assert!(effects.is_empty());

    let mut freed: Vec<u8> = mock
        .writes_with_id(HID_REPORT_ID_BLOCK_FREE)
        .iter()
        .map(|r| r[1])
        .collect();
    freed.sort_unstable();
    assert_eq!(freed, vec![1, 2]);
}

#[test]
fn disposing_a_never_registered_effect_is_a_noop() {
    let effects = EffectDispenser::new();
    effects.dispose("never_created");
    assert!(effects.is_empty());
}
