//! Device services.
//!
//! Everything the engine needs from the platform that is not the flash medium
//! itself goes through this trait: which slot the device booted from, the
//! persistent boot pointer, the liveness watchdog, the restart primitive, and
//! the identification strings shown on the status page.

pub trait Device {
    /// Total size of the flash device in bytes.
    fn flash_size(&self) -> u32;

    /// Base address of the application partition the device booted from.
    /// Fixed until the next restart.
    fn running_app_base(&self) -> u32;

    /// Base address the boot pointer currently selects.
    fn boot_target(&self) -> u32;

    /// Persist the boot pointer.  Survives restarts.
    fn set_boot_target(&mut self, base: u32) -> storage::Result<()>;

    /// Service the liveness watchdog.  Long-running loops must call this
    /// between chunks or the device resets.
    fn feed_watchdog(&mut self);

    /// Reboot the device after `delay_ms`, giving the transport time to
    /// flush a success response first.
    fn schedule_restart(&mut self, delay_ms: u32);

    fn chip_model(&self) -> &str;
    fn chip_revision(&self) -> u32;
    fn cpu_freq_mhz(&self) -> u32;
}

/// Human-readable device identification, for status reporting only.
#[derive(Debug, Copy, Clone)]
pub struct DeviceInfo<'d> {
    pub chip_model: &'d str,
    pub chip_revision: u32,
    pub flash_size: u32,
    pub cpu_freq_mhz: u32,
}

impl<'d> DeviceInfo<'d> {
    pub fn gather<D: Device>(device: &'d D) -> DeviceInfo<'d> {
        DeviceInfo {
            chip_model: device.chip_model(),
            chip_revision: device.chip_revision(),
            flash_size: device.flash_size(),
            cpu_freq_mhz: device.cpu_freq_mhz(),
        }
    }
}
