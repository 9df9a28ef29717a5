//! Flash transfer and dual-slot update engine.
//!
//! Streams the contents of a partitioned flash device out through a chunked
//! transport, optionally redacting sensitive regions, and re-flashes
//! application or data partitions from chunked uploads, including cloning the
//! running slot to the inactive one and switching the boot target.  The
//! transport itself (sockets, framing, HTML) lives elsewhere; this crate
//! supplies the callbacks and owns the byte-range arithmetic.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod activate;
pub mod clone;
pub mod device;
pub mod dump;
pub mod partition;
pub mod redact;
pub mod session;
pub mod source;
pub mod upload;

pub use device::{Device, DeviceInfo};
pub use dump::{DumpSummary, Sink};
pub use partition::{PartitionCatalog, PartitionClass, PartitionDescriptor};
pub use redact::{RedactRegion, RegionSet};
pub use session::{SessionKind, SessionSlot, WritePhase, WriteSession};
pub use source::{ChunkedSource, SecureChunkedSource, TransferWindow};
pub use upload::UploadOutcome;

pub type Result<T> = core::result::Result<T, Error>;

/// Transfer and clone chunk granularity, and the cap on one secure chunk.
pub const CHUNK_SIZE: usize = 4096;

/// First byte of a bootable application image.
pub const IMAGE_MAGIC: u8 = 0xE9;

/// The second-stage bootloader region, fixed by the ROM.
pub const BOOTLOADER_OFFSET: u32 = 0x1000;
pub const BOOTLOADER_SIZE: u32 = 0x7000;

/// Delay before a scheduled restart, long enough for the success response to
/// flush.
pub const RESTART_DELAY_MS: u32 = 2000;

/// Progress is logged at most once per this many streamed bytes.
pub(crate) const PROGRESS_INTERVAL: usize = CHUNK_SIZE * 10;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// Unknown partition label or subtype.
    NotFound,
    /// Attempted write or activation of the running partition.
    ActivePartitionProtected,
    /// A write session is already open.
    SessionConflict,
    /// Image-header marker missing at activation time.
    PartitionUnavailable,
    /// Redaction region table is full.
    CapacityExceeded,
    /// Read, write, or erase failure against the medium.
    Flash(storage::Error),
    /// The byte sink rejected a write.
    Sink,
}

impl From<storage::Error> for Error {
    fn from(e: storage::Error) -> Self {
        Error::Flash(e)
    }
}

impl Error {
    /// The HTTP-equivalent status the transport reports for this failure.
    pub fn status(&self) -> u16 {
        match self {
            Error::NotFound => 404,
            Error::ActivePartitionProtected
            | Error::PartitionUnavailable
            | Error::CapacityExceeded => 400,
            Error::SessionConflict | Error::Flash(_) | Error::Sink => 500,
        }
    }

    /// Plain-text message for the transport's response body.
    pub fn message(&self) -> &'static str {
        match self {
            Error::NotFound => "Partition not found",
            Error::ActivePartitionProtected => "Cannot update active partition",
            Error::SessionConflict => "Another write session is in progress",
            Error::PartitionUnavailable => "Partition appears empty/unavailable",
            Error::CapacityExceeded => "Maximum blank regions reached",
            Error::Flash(_) => "Flash operation failed",
            Error::Sink => "Writing to the dump sink failed",
        }
    }
}
