//! Write sessions.
//!
//! A write session is the only path that mutates a partition: begin erases
//! the target, writes append at a tracked offset, and an explicit finalize
//! commits.  At most one session exists system-wide; `SessionSlot` is the
//! single-slot guard that enforces it and answers `SessionConflict` to a
//! second request instead of interleaving.

use core::cell::RefCell;

use log::{info, warn};
use storage::Flash;

use crate::{Error, PartitionDescriptor, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WritePhase {
    Writing,
    Finalizing,
    Committed,
    Aborted,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SessionKind {
    /// Application slot: begin/write/finalize, then activation.
    App,
    /// Data partition: erase, sequential writes, committed on final chunk.
    Data,
}

#[derive(Debug)]
pub struct WriteSession {
    target: PartitionDescriptor,
    kind: SessionKind,
    written: u32,
    phase: WritePhase,
}

impl WriteSession {
    /// Erase the full target range and enter the Writing phase.
    fn begin<F: Flash>(
        flash: &RefCell<F>,
        target: &PartitionDescriptor,
        kind: SessionKind,
    ) -> Result<WriteSession> {
        let from = target.base as usize;
        let to = from + target.size as usize;
        info!(
            "write session opened on '{}': erasing {:#010x}..{:#010x}",
            target.label, from, to
        );
        flash.borrow_mut().erase(from, to)?;
        Ok(WriteSession {
            target: target.clone(),
            kind,
            written: 0,
            phase: WritePhase::Writing,
        })
    }

    pub fn target(&self) -> &PartitionDescriptor {
        &self.target
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn phase(&self) -> WritePhase {
        self.phase
    }

    pub fn written(&self) -> u32 {
        self.written
    }

    /// Append `data` at the tracked offset.  A flash failure leaves the
    /// session in Writing so the chunk can be retried or the session
    /// explicitly aborted; the offset only advances on success.
    pub fn write<F: Flash>(&mut self, flash: &RefCell<F>, data: &[u8]) -> Result<()> {
        if self.phase != WritePhase::Writing {
            return Err(Error::SessionConflict);
        }
        let end = self.written as usize + data.len();
        if end > self.target.size as usize {
            return Err(Error::Flash(storage::Error::OutOfBounds));
        }
        flash
            .borrow_mut()
            .write(self.target.base as usize + self.written as usize, data)?;
        self.written = end as u32;
        Ok(())
    }

    /// Commit the session.  An empty session cannot be committed.
    pub fn finalize(&mut self) -> Result<()> {
        if self.phase != WritePhase::Writing {
            return Err(Error::SessionConflict);
        }
        self.phase = WritePhase::Finalizing;
        if self.written == 0 {
            self.phase = WritePhase::Aborted;
            return Err(Error::Flash(storage::Error::NotWritten));
        }
        self.phase = WritePhase::Committed;
        info!(
            "write session on '{}' committed ({} bytes)",
            self.target.label, self.written
        );
        Ok(())
    }
}

/// The one write session the system allows, or nothing.
#[derive(Debug, Default)]
pub struct SessionSlot {
    current: Option<WriteSession>,
}

impl SessionSlot {
    pub const fn new() -> SessionSlot {
        SessionSlot { current: None }
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&WriteSession> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut WriteSession> {
        self.current.as_mut()
    }

    /// Open a session against `target` if the slot is free.
    pub fn open<F: Flash>(
        &mut self,
        flash: &RefCell<F>,
        target: &PartitionDescriptor,
        kind: SessionKind,
    ) -> Result<&mut WriteSession> {
        if self.current.is_some() {
            return Err(Error::SessionConflict);
        }
        let session = WriteSession::begin(flash, target, kind)?;
        Ok(self.current.insert(session))
    }

    /// Remove the session from the slot, e.g. once it is committed.
    pub fn take(&mut self) -> Option<WriteSession> {
        self.current.take()
    }

    /// Mark whatever is open as aborted and free the slot.  The target is
    /// left partially written; no rollback is attempted.  Also the escape
    /// hatch the transport uses to clear a stale interrupted upload.
    pub fn abort(&mut self) {
        if let Some(mut session) = self.current.take() {
            session.phase = WritePhase::Aborted;
            warn!(
                "write session on '{}' aborted after {} bytes",
                session.target.label, session.written
            );
        }
    }
}
