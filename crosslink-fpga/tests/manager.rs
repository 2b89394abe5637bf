//! Loading through the FPGA manager interface.
mod common;

use common::{BUSY, MockBus, driver};
use crosslink_fpga::{CROSSLINK_IDCODE, Command, FpgaManager, FpgaManagerOps, FpgaManagerState};
use embedded_hal::i2c::ErrorKind;

#[test]
fn driver_always_reports_operating() {
    let fpga = driver(MockBus::new());
    assert_eq!(fpga.state(), FpgaManagerState::Operating);
    let manager = FpgaManager::new(fpga);
    assert_eq!(manager.state(), FpgaManagerState::Operating);
}

/// write_init runs the reset (with retry) and the erase before any data.
#[test]
fn load_runs_all_steps() {
    let bus = MockBus::new().with_idcodes(&[u32::MAX, CROSSLINK_IDCODE]);
    let mut manager = FpgaManager::new(driver(bus));
    manager.load(&[0u8; 1024]).unwrap();
    assert_eq!(manager.state(), FpgaManagerState::Operating);
    assert!(manager.ops().bitstream_loaded());

    let bus = manager.into_inner().release().0;
    assert_eq!(
        bus.commands(),
        [
            Command::Activate,
            Command::IscEnable,
            Command::ReadIdcode,
            Command::Activate,
            Command::IscEnable,
            Command::ReadIdcode,
            Command::IscEnable,
            Command::IscErase,
            Command::LscInit,
            Command::LscBitstreamBurst,
            Command::LscReadStatus,
            Command::IscDisable,
        ]
    );
}

#[test]
fn each_segment_is_its_own_burst() {
    let mut manager = FpgaManager::new(driver(MockBus::new()));
    manager
        .load_segments([&[1u8, 2][..], &[3u8, 4, 5][..]])
        .unwrap();
    let bus = manager.into_inner().release().0;
    let bursts: Vec<Vec<u8>> = bus
        .transfers
        .iter()
        .filter(|t| t.command() == Some(Command::LscBitstreamBurst))
        .map(|t| t.written())
        .collect();
    assert_eq!(
        bursts,
        [
            vec![0x7A, 0, 0, 0, 1, 2],
            vec![0x7A, 0, 0, 0, 3, 4, 5]
        ]
    );
}

#[test]
fn no_segments_leaves_device_alone() {
    let mut manager = FpgaManager::new(driver(MockBus::new()));
    manager.load_segments(std::iter::empty::<&[u8]>()).unwrap();
    assert_eq!(manager.state(), FpgaManagerState::Operating);
    assert!(!manager.ops().bitstream_loaded());
    assert!(manager.into_inner().release().0.transfers.is_empty());
}

#[test]
fn wrong_device_fails_write_init() {
    let bus = MockBus::new().with_idcodes(&[0, 0]);
    let mut manager = FpgaManager::new(driver(bus));
    let err = manager.load(&[0; 16]).unwrap_err();
    assert!(err.is_identity_mismatch());
    assert_eq!(manager.state(), FpgaManagerState::WriteInitError);
    assert!(
        !manager
            .into_inner()
            .release()
            .0
            .commands()
            .contains(&Command::IscErase)
    );
}

#[test]
fn incomplete_upload_fails_write() {
    let mut manager = FpgaManager::new(driver(MockBus::new().with_status(BUSY)));
    assert!(manager.load(&[0; 16]).is_err());
    assert_eq!(manager.state(), FpgaManagerState::WriteError);
    assert!(manager.state().is_error());
    assert!(!manager.ops().bitstream_loaded());
}

#[test]
fn disable_failure_fails_write_complete() {
    let bus = MockBus::new().failing(Command::IscDisable, ErrorKind::Bus);
    let mut manager = FpgaManager::new(driver(bus));
    assert!(manager.load(&[0; 16]).unwrap_err().is_transport());
    assert_eq!(manager.state(), FpgaManagerState::WriteCompleteError);
}
