//! Boot activation.
//!
//! Validates a candidate partition and commits it as the next boot target.
//! Validation is the original contract's shallow check: the first byte must
//! be the image-header marker.  That proves an image was written there, not
//! that it boots; the full image is never hashed here.

use core::cell::RefCell;

use log::info;
use storage::ReadFlash;

use crate::{
    Device, Error, PartitionCatalog, PartitionClass, PartitionDescriptor, Result, IMAGE_MAGIC,
    RESTART_DELAY_MS,
};

/// Whether the partition's first byte carries the image-header marker.
pub fn image_present<F: ReadFlash>(
    flash: &RefCell<F>,
    part: &PartitionDescriptor,
) -> Result<bool> {
    let mut magic = [0u8; 1];
    flash.borrow_mut().read(part.base as usize, &mut magic)?;
    Ok(magic[0] == IMAGE_MAGIC)
}

/// Point the boot pointer at `target`.  Does not restart; callers decide
/// whether and when to.
pub fn activate<F: ReadFlash, D: Device>(
    flash: &RefCell<F>,
    catalog: &PartitionCatalog,
    device: &mut D,
    target: &PartitionDescriptor,
) -> Result<()> {
    let running = catalog.running(device)?;
    if target.base == running.base {
        return Err(Error::ActivePartitionProtected);
    }
    if !image_present(flash, target)? {
        return Err(Error::PartitionUnavailable);
    }
    device.set_boot_target(target.base)?;
    info!(
        "boot target set to '{}' at {:#010x}",
        target.label, target.base
    );
    Ok(())
}

/// The activation request entry point: resolve an application partition by
/// label, or fall back to the other slot when no label is given, activate it
/// and schedule a restart.
pub fn activate_by_label<F: ReadFlash, D: Device>(
    flash: &RefCell<F>,
    catalog: &PartitionCatalog,
    device: &mut D,
    label: Option<&str>,
) -> Result<()> {
    let target = match label {
        Some(label) => catalog
            .find_by_label(PartitionClass::App, label)
            .ok_or(Error::NotFound)?,
        None => {
            let running = catalog.running(device)?;
            catalog.other_app(running).ok_or(Error::NotFound)?
        }
    };
    activate(flash, catalog, device, target)?;
    device.schedule_restart(RESTART_DELAY_MS);
    Ok(())
}
