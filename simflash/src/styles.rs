//! Flash styles
//!
//! Geometries for the SPI NOR parts the engine is deployed against, plus a
//! small layout for tests that do not need a full partition table.

use crate::SimFlash;
use anyhow::Result;

/// The configuration of a simulated device.
pub struct DeviceLayout {
    pub read_size: usize,
    pub write_size: usize,
    pub erase_size: usize,
    pub sectors: usize,
}

impl DeviceLayout {
    pub fn build(&self) -> Result<SimFlash> {
        SimFlash::new(
            self.read_size,
            self.write_size,
            self.erase_size,
            self.sectors,
        )
    }

    pub const fn size(&self) -> usize {
        self.erase_size * self.sectors
    }
}

/// 4 MB SPI NOR, the common module size.  Writes are byte-granular; the
/// controller buffers partial pages, so the engine never sees page alignment.
pub static ESP32_4MB: DeviceLayout = DeviceLayout {
    read_size: 1,
    write_size: 1,
    erase_size: 4 * 1024,
    sectors: 1024,
};

/// 8 MB variant.
pub static ESP32_8MB: DeviceLayout = DeviceLayout {
    read_size: 1,
    write_size: 1,
    erase_size: 4 * 1024,
    sectors: 2048,
};

/// 64 KB toy device for exercising raw flash semantics quickly.
pub static SMALL: DeviceLayout = DeviceLayout {
    read_size: 1,
    write_size: 1,
    erase_size: 4 * 1024,
    sectors: 16,
};
