// Partition catalog tests.

mod common;

use std::cell::RefCell;

use fwdl::{DeviceInfo, PartitionCatalog, PartitionClass};
use simflash::{styles, table};

use common::{rig, SimDevice, OTA0_BASE, OTA1_BASE, SLOT_SIZE};

#[test]
fn parses_standard_table() {
    let r = rig();
    let catalog = &r.catalog;

    assert_eq!(catalog.len(), 6);

    let ota0 = catalog
        .find_by_label(PartitionClass::App, "ota_0")
        .unwrap();
    assert_eq!(ota0.base, OTA0_BASE);
    assert_eq!(ota0.size, SLOT_SIZE);
    assert_eq!(ota0.subtype, 0x10);

    let nvs = catalog.find_by_label(PartitionClass::Data, "nvs").unwrap();
    assert_eq!(nvs.base, 0x9000);

    // Class filters apply: no data partition called ota_0, no app nvs.
    assert!(catalog.find_by_label(PartitionClass::Data, "ota_0").is_none());
    assert!(catalog.find_by_label(PartitionClass::App, "nvs").is_none());

    let ota1 = catalog.find_by_subtype(PartitionClass::App, 0x11).unwrap();
    assert_eq!(ota1.label.as_str(), "ota_1");

    assert!(catalog.find_by_label(PartitionClass::App, "missing").is_none());
}

#[test]
fn resolve_prefers_application_class() {
    let mut flash = styles::ESP32_4MB.build().unwrap();
    table::TableBuilder::new()
        .data("shared", 0x81, 0x300000, 0x10000)
        .unwrap()
        .app("shared", 0x10, 0x10000, 0x100000)
        .unwrap()
        .write_to(&mut flash)
        .unwrap();
    let flash = RefCell::new(flash);
    let catalog = PartitionCatalog::from_flash(&flash).unwrap();

    let hit = catalog.resolve("shared").unwrap();
    assert_eq!(hit.class, PartitionClass::App);
}

#[test]
fn running_and_other_slot() {
    let r = rig();
    let running = r.catalog.running(&r.device).unwrap();
    assert_eq!(running.label.as_str(), "ota_0");

    let other = r.catalog.other_app(running).unwrap();
    assert_eq!(other.base, OTA1_BASE);

    // From the second slot the lookup flips.
    let device = SimDevice::new(r.device.flash_size, OTA1_BASE);
    let running = r.catalog.running(&device).unwrap();
    assert_eq!(running.label.as_str(), "ota_1");
    assert_eq!(r.catalog.other_app(running).unwrap().base, OTA0_BASE);
}

#[test]
fn other_slot_follows_enumeration_order() {
    // With three application slots the first differing entry in table order
    // wins, regardless of which slot is running.
    let mut flash = styles::ESP32_4MB.build().unwrap();
    table::TableBuilder::new()
        .app("ota_0", 0x10, 0x10000, 0x100000)
        .unwrap()
        .app("ota_1", 0x11, 0x110000, 0x100000)
        .unwrap()
        .app("ota_2", 0x12, 0x210000, 0x100000)
        .unwrap()
        .write_to(&mut flash)
        .unwrap();
    let flash = RefCell::new(flash);
    let catalog = PartitionCatalog::from_flash(&flash).unwrap();

    let device = SimDevice::new(0x400000, 0x110000);
    let running = catalog.running(&device).unwrap();
    assert_eq!(running.label.as_str(), "ota_1");
    assert_eq!(catalog.other_app(running).unwrap().label.as_str(), "ota_0");

    let device = SimDevice::new(0x400000, 0x10000);
    let running = catalog.running(&device).unwrap();
    assert_eq!(catalog.other_app(running).unwrap().label.as_str(), "ota_1");
}

#[test]
fn device_info_gathers_identification() {
    let r = rig();
    let info = DeviceInfo::gather(&r.device);
    assert_eq!(info.chip_model, "SIM32-D0");
    assert_eq!(info.chip_revision, 3);
    assert_eq!(info.flash_size, 0x400000);
    assert_eq!(info.cpu_freq_mhz, 240);
}
