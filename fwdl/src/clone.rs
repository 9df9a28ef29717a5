//! Active slot cloning.
//!
//! Copies the running application partition into the other slot through a
//! write session, then repoints the boot target.  The direction is always
//! running to other; the running partition is never the target of a write
//! session here.  A failure part way leaves the other slot partially written
//! and the boot pointer untouched, so the device stays bootable from the
//! running slot.

use core::cell::RefCell;

use log::{debug, info};
use storage::Flash;

use crate::session::{SessionKind, SessionSlot};
use crate::{
    activate, Device, Error, PartitionCatalog, PartitionDescriptor, Result, CHUNK_SIZE,
    PROGRESS_INTERVAL,
};

pub fn clone_active_slot<F: Flash, D: Device>(
    flash: &RefCell<F>,
    catalog: &PartitionCatalog,
    device: &mut D,
    slot: &mut SessionSlot,
) -> Result<()> {
    let running = catalog.running(device)?;
    let target = catalog.other_app(running).ok_or(Error::NotFound)?;

    // Informational peek only: the clone proceeds over whatever is there.
    if activate::image_present(flash, target)? {
        info!("slot '{}' holds an image; cloning over it", target.label);
    } else {
        info!("slot '{}' looks empty; cloning", target.label);
    }

    slot.open(flash, target, SessionKind::App)?;
    if let Err(e) = copy_running(flash, device, slot, running) {
        slot.abort();
        return Err(e);
    }
    // Committed; free the slot before activation.
    slot.take();

    activate::activate(flash, catalog, device, target)?;
    info!("clone complete; '{}' is the next boot target", target.label);
    Ok(())
}

fn copy_running<F: Flash, D: Device>(
    flash: &RefCell<F>,
    device: &mut D,
    slot: &mut SessionSlot,
    running: &PartitionDescriptor,
) -> Result<()> {
    let session = slot.current_mut().ok_or(Error::SessionConflict)?;
    let total = running.size as usize;
    info!(
        "cloning {} bytes from {:#010x} to {:#010x}",
        total,
        running.base,
        session.target().base
    );

    let mut buffer = [0u8; CHUNK_SIZE];
    let mut done = 0;
    while done < total {
        let todo = (total - done).min(CHUNK_SIZE);
        flash
            .borrow_mut()
            .read(running.base as usize + done, &mut buffer[..todo])?;
        session.write(flash, &buffer[..todo])?;
        done += todo;
        if done % PROGRESS_INTERVAL == 0 {
            debug!("cloned {}/{} bytes", done, total);
        }
        device.feed_watchdog();
    }
    session.finalize()
}
