//! Chunked upload state machine.
//!
//! The transport delivers upload chunks in order; this module turns them into
//! a write session against the resolved target partition.  Data partitions
//! are erased once and written sequentially; application partitions run the
//! full begin/write/finalize sequence and end in a boot-target switch and a
//! scheduled restart.  The running application partition is never a valid
//! target.

use core::cell::RefCell;

use log::{debug, info};
use storage::Flash;

use crate::session::{SessionKind, SessionSlot, WritePhase};
use crate::{
    activate, Device, Error, PartitionCatalog, PartitionClass, Result, RESTART_DELAY_MS,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UploadOutcome {
    /// Chunk written; more expected.
    Accepted,
    /// Duplicate first chunk of an upload already in progress; dropped.
    Ignored,
    /// Final chunk of a data partition upload; contents committed.
    DataComplete,
    /// Final chunk of an application upload; boot target switched and a
    /// restart scheduled.
    AppComplete,
}

/// Feed one upload chunk to the engine.  `offset == 0` marks the first chunk
/// of a logical upload; delivery is contiguous, so the session's own counter
/// decides where bytes land.
#[allow(clippy::too_many_arguments)]
pub fn handle_chunk<F: Flash, D: Device>(
    flash: &RefCell<F>,
    catalog: &PartitionCatalog,
    device: &mut D,
    slot: &mut SessionSlot,
    label: &str,
    offset: usize,
    data: &[u8],
    is_final: bool,
) -> Result<UploadOutcome> {
    let target = catalog.resolve(label).ok_or(Error::NotFound)?;

    // The running image may never be overwritten in place, first chunk or
    // later.
    if target.class == PartitionClass::App {
        let running = catalog.running(device)?;
        if target.base == running.base {
            return Err(Error::ActivePartitionProtected);
        }
    }
    let kind = match target.class {
        PartitionClass::App => SessionKind::App,
        PartitionClass::Data => SessionKind::Data,
    };

    if offset == 0 {
        match slot.current() {
            Some(session)
                if kind == SessionKind::App
                    && session.kind() == SessionKind::App
                    && session.target().base == target.base
                    && session.phase() == WritePhase::Writing =>
            {
                debug!(
                    "upload to '{}' already started; ignoring duplicate first chunk",
                    label
                );
                return Ok(UploadOutcome::Ignored);
            }
            Some(_) => return Err(Error::SessionConflict),
            None => {
                info!(
                    "upload to '{}' started ({} bytes available)",
                    label, target.size
                );
                slot.open(flash, target, kind)?;
            }
        }
    }

    let session = slot.current_mut().ok_or(Error::SessionConflict)?;
    if session.target().base != target.base {
        return Err(Error::SessionConflict);
    }
    session.write(flash, data)?;

    if !is_final {
        return Ok(UploadOutcome::Accepted);
    }

    match kind {
        SessionKind::Data => {
            let committed = session.finalize();
            match committed {
                Ok(()) => {
                    slot.take();
                    info!("data upload to '{}' complete", label);
                    Ok(UploadOutcome::DataComplete)
                }
                Err(e) => {
                    slot.abort();
                    Err(e)
                }
            }
        }
        SessionKind::App => {
            if let Err(e) = session.finalize() {
                slot.abort();
                return Err(e);
            }
            slot.take();
            activate::activate(flash, catalog, device, target)?;
            device.schedule_restart(RESTART_DELAY_MS);
            info!(
                "application upload to '{}' complete; restart scheduled",
                label
            );
            Ok(UploadOutcome::AppComplete)
        }
    }
}
