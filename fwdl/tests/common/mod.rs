//! Shared test rig: a simulated 4 MB device carrying the stock dual-OTA
//! partition table, with a generated image installed in the first slot.

#![allow(dead_code)]

use std::cell::RefCell;

use fwdl::{Device, PartitionCatalog, SessionSlot};
use simflash::gen::GenBuilder;
use simflash::{styles, table, SimFlash};

pub const OTA0_BASE: u32 = 0x10000;
pub const OTA1_BASE: u32 = 0x190000;
pub const SLOT_SIZE: u32 = 0x180000;
pub const USERDATA_BASE: u32 = 0x380000;
pub const USERDATA_SIZE: u32 = 0x80000;
pub const IMAGE_SIZE: usize = 0x20000;

pub struct SimDevice {
    pub flash_size: u32,
    pub running: u32,
    pub boot_target: u32,
    pub restarts: Vec<u32>,
    pub watchdog_feeds: usize,
    pub boot_store_broken: bool,
}

impl SimDevice {
    pub fn new(flash_size: u32, running: u32) -> SimDevice {
        SimDevice {
            flash_size,
            running,
            boot_target: running,
            restarts: Vec::new(),
            watchdog_feeds: 0,
            boot_store_broken: false,
        }
    }
}

impl Device for SimDevice {
    fn flash_size(&self) -> u32 {
        self.flash_size
    }

    fn running_app_base(&self) -> u32 {
        self.running
    }

    fn boot_target(&self) -> u32 {
        self.boot_target
    }

    fn set_boot_target(&mut self, base: u32) -> storage::Result<()> {
        if self.boot_store_broken {
            return Err(storage::Error::Failed);
        }
        self.boot_target = base;
        Ok(())
    }

    fn feed_watchdog(&mut self) {
        self.watchdog_feeds += 1;
    }

    fn schedule_restart(&mut self, delay_ms: u32) {
        self.restarts.push(delay_ms);
    }

    fn chip_model(&self) -> &str {
        "SIM32-D0"
    }

    fn chip_revision(&self) -> u32 {
        3
    }

    fn cpu_freq_mhz(&self) -> u32 {
        240
    }
}

pub struct Rig {
    pub flash: RefCell<SimFlash>,
    pub catalog: PartitionCatalog,
    pub device: SimDevice,
    pub slot: SessionSlot,
    pub image: Vec<u8>,
}

/// Stock rig: dual-OTA table, image in `ota_0`, device running from it.
pub fn rig() -> Rig {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut flash = styles::ESP32_4MB.build().unwrap();
    table::standard_two_ota()
        .unwrap()
        .write_to(&mut flash)
        .unwrap();

    let image = GenBuilder::default()
        .size(IMAGE_SIZE)
        .seed(1)
        .build()
        .unwrap()
        .data;
    flash.install(&image, OTA0_BASE as usize).unwrap();

    let flash = RefCell::new(flash);
    let catalog = PartitionCatalog::from_flash(&flash).unwrap();
    let device = SimDevice::new(styles::ESP32_4MB.size() as u32, OTA0_BASE);

    Rig {
        flash,
        catalog,
        device,
        slot: SessionSlot::new(),
        image,
    }
}

/// Read `len` bytes at an absolute device address.
pub fn read_at(flash: &RefCell<SimFlash>, offset: usize, len: usize) -> Vec<u8> {
    use storage::ReadFlash;

    let mut buf = vec![0u8; len];
    flash.borrow_mut().read(offset, &mut buf).unwrap();
    buf
}
