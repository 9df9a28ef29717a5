//! Dumping a window to a byte sink.
//!
//! The download path normally streams chunks straight to the transport, but a
//! dump can instead be pushed whole into an alternate sink, e.g. a file on
//! secondary storage.  The dump is digested as it is written so the receiver
//! can verify what landed.

use core::cell::RefCell;

use sha2::{Digest, Sha256};
use storage::ReadFlash;

use crate::redact::RegionSet;
use crate::source::{ChunkedSource, SecureChunkedSource, TransferWindow};
use crate::{Device, Result, CHUNK_SIZE};

/// Where dumped bytes go.
pub trait Sink {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
}

#[cfg(any(feature = "std", test))]
impl<W: std::io::Write> Sink for W {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        std::io::Write::write_all(self, bytes).map_err(|_| crate::Error::Sink)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DumpSummary {
    /// Bytes written to the sink.
    pub bytes: usize,
    /// SHA-256 of exactly those bytes.
    pub digest: [u8; 32],
}

/// Stream `window` into `sink`.  With `regions` given this is a secure dump:
/// redaction is applied before any byte reaches the sink.
pub fn dump_to_sink<F: ReadFlash, D: Device, S: Sink>(
    flash: &RefCell<F>,
    window: TransferWindow,
    regions: Option<&RegionSet>,
    device: &mut D,
    sink: &mut S,
) -> Result<DumpSummary> {
    match regions {
        Some(regions) => {
            let source = SecureChunkedSource::new(flash, window, regions);
            pump(|index, buf| source.read(index, buf), device, sink)
        }
        None => {
            let source = ChunkedSource::new(flash, window);
            pump(|index, buf| source.read(index, buf), device, sink)
        }
    }
}

fn pump<D, S, R>(read: R, device: &mut D, sink: &mut S) -> Result<DumpSummary>
where
    D: Device,
    S: Sink,
    R: Fn(usize, &mut [u8]) -> Result<usize>,
{
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut index = 0;
    loop {
        let n = read(index, &mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        sink.write_all(&buffer[..n])?;
        index += n;
        device.feed_watchdog();
    }
    let mut digest = [0u8; 32];
    digest.copy_from_slice(hasher.finalize().as_slice());
    Ok(DumpSummary {
        bytes: index,
        digest,
    })
}
