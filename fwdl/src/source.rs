//! Chunked transfer sources.
//!
//! Pull-based byte producers the transport drives to serve downloads.  A
//! source is a pure function of `(index, buffer length)` over an immutable
//! window: the transport may re-request any chunk after a transient failure
//! and will get identical bytes back.  `Ok(0)` means end-of-stream and is
//! only returned once `index` reaches the window length; a device read
//! failure is a distinct `Err`, never an empty read.

use core::cell::RefCell;

use log::debug;
use storage::ReadFlash;

use crate::{
    Device, PartitionDescriptor, Result, BOOTLOADER_OFFSET, BOOTLOADER_SIZE, CHUNK_SIZE,
    PROGRESS_INTERVAL,
};
use crate::redact::RegionSet;

/// The absolute device range a download session streams.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TransferWindow {
    pub base: u32,
    pub len: u32,
}

impl TransferWindow {
    pub fn whole_device(device: &impl Device) -> TransferWindow {
        TransferWindow {
            base: 0,
            len: device.flash_size(),
        }
    }

    pub fn partition(part: &PartitionDescriptor) -> TransferWindow {
        TransferWindow {
            base: part.base,
            len: part.size,
        }
    }

    pub const fn bootloader() -> TransferWindow {
        TransferWindow {
            base: BOOTLOADER_OFFSET,
            len: BOOTLOADER_SIZE,
        }
    }
}

/// Plain variant: copies straight from the device into the caller's buffer.
pub struct ChunkedSource<'f, F> {
    flash: &'f RefCell<F>,
    window: TransferWindow,
}

impl<'f, F: ReadFlash> ChunkedSource<'f, F> {
    pub fn new(flash: &'f RefCell<F>, window: TransferWindow) -> ChunkedSource<'f, F> {
        ChunkedSource { flash, window }
    }

    pub fn window(&self) -> TransferWindow {
        self.window
    }

    /// Read up to `buf.len()` bytes at window-relative offset `index`.
    pub fn read(&self, index: usize, buf: &mut [u8]) -> Result<usize> {
        let total = self.window.len as usize;
        if index >= total {
            return Ok(0);
        }
        let todo = buf.len().min(total - index);
        self.flash
            .borrow_mut()
            .read(self.window.base as usize + index, &mut buf[..todo])?;
        if index % PROGRESS_INTERVAL == 0 {
            debug!("streamed {}/{} bytes", index + todo, total);
        }
        Ok(todo)
    }
}

/// Secure variant: reads through a bounded scratch buffer and applies the
/// redaction overlay before the bytes leave the engine.  Never returns more
/// than [`CHUNK_SIZE`] bytes per call, whatever the caller's buffer size.
pub struct SecureChunkedSource<'f, 'r, F> {
    inner: ChunkedSource<'f, F>,
    regions: &'r RegionSet,
}

impl<'f, 'r, F: ReadFlash> SecureChunkedSource<'f, 'r, F> {
    pub fn new(
        flash: &'f RefCell<F>,
        window: TransferWindow,
        regions: &'r RegionSet,
    ) -> SecureChunkedSource<'f, 'r, F> {
        SecureChunkedSource {
            inner: ChunkedSource::new(flash, window),
            regions,
        }
    }

    pub fn window(&self) -> TransferWindow {
        self.inner.window
    }

    pub fn read(&self, index: usize, buf: &mut [u8]) -> Result<usize> {
        let window = self.inner.window;
        let total = window.len as usize;
        if index >= total {
            return Ok(0);
        }
        let todo = buf.len().min(total - index).min(CHUNK_SIZE);
        let mut scratch = [0u8; CHUNK_SIZE];
        self.inner
            .flash
            .borrow_mut()
            .read(window.base as usize + index, &mut scratch[..todo])?;
        self.regions
            .apply(window.base + index as u32, &mut scratch[..todo]);
        buf[..todo].copy_from_slice(&scratch[..todo]);
        if index % PROGRESS_INTERVAL == 0 {
            debug!("streamed {}/{} bytes (secure)", index + todo, total);
        }
        Ok(todo)
    }
}
