//! Simulated flash
//!
//! An in-RAM stand-in for the external SPI NOR flash the engine runs against
//! on real hardware.  The simulator keeps NOR semantics honest: erase works on
//! whole sectors and leaves them reading as 0xFF, a byte must be erased before
//! it can be written, and space that was never written reads back as the
//! erased value.  Reads have byte granularity.
//!
//! On top of the plain device the simulator offers two test affordances:
//!
//! - an erase-operation counter, so tests can assert how often a range was
//!   erased (the upload path must erase a data partition exactly once);
//! - injectable read/write faults at a chosen address, surfacing
//!   `storage::Error::Failed` the way a flaky medium would.

use anyhow::{bail, Result};
use storage::{check_erase, check_read, check_write, Flash, ReadFlash, ERASED};

pub mod gen;
pub mod styles;
pub mod table;

pub struct SimFlash {
    data: Vec<u8>,
    written: Vec<bool>,
    write_size: usize,
    erase_size: usize,
    erase_ops: usize,
    read_fault: Option<usize>,
    write_fault: Option<usize>,
}

impl SimFlash {
    /// Build a device of `sectors` erase sectors.  Read granularity is always
    /// a single byte.
    pub fn new(read_size: usize, write_size: usize, erase_size: usize, sectors: usize) -> Result<SimFlash> {
        if read_size != 1 {
            bail!("only byte-granular reads are simulated");
        }
        if write_size == 0 || erase_size == 0 || sectors == 0 {
            bail!("degenerate flash geometry");
        }
        if erase_size % write_size != 0 {
            bail!("erase size must be a multiple of the write size");
        }
        let size = erase_size * sectors;
        Ok(SimFlash {
            data: vec![ERASED; size],
            written: vec![false; size],
            write_size,
            erase_size,
            erase_ops: 0,
            read_fault: None,
            write_fault: None,
        })
    }

    /// Erase the covering sectors and write `data` at `offset`, as a
    /// provisioning tool would.
    pub fn install(&mut self, data: &[u8], offset: usize) -> storage::Result<()> {
        let (from, to) = storage::erase_containing(self, offset, data.len())?;
        self.erase(from, to)?;
        self.write(offset, data)
    }

    /// How many erase operations have been performed.
    pub fn erase_ops(&self) -> usize {
        self.erase_ops
    }

    /// Fail any read whose range covers `offset`.
    pub fn fail_read_at(&mut self, offset: usize) {
        self.read_fault = Some(offset);
    }

    /// Fail any write whose range covers `offset`.
    pub fn fail_write_at(&mut self, offset: usize) {
        self.write_fault = Some(offset);
    }

    pub fn clear_faults(&mut self) {
        self.read_fault = None;
        self.write_fault = None;
    }

    fn faulted(fault: Option<usize>, offset: usize, len: usize) -> bool {
        match fault {
            Some(at) => offset <= at && at < offset + len,
            None => false,
        }
    }
}

impl ReadFlash for SimFlash {
    fn read_size(&self) -> usize {
        1
    }

    fn read(&mut self, offset: usize, bytes: &mut [u8]) -> storage::Result<()> {
        check_read(self, offset, bytes.len())?;
        if Self::faulted(self.read_fault, offset, bytes.len()) {
            return Err(storage::Error::Failed);
        }
        bytes.copy_from_slice(&self.data[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl Flash for SimFlash {
    fn write_size(&self) -> usize {
        self.write_size
    }

    fn erase_size(&self) -> usize {
        self.erase_size
    }

    fn erase(&mut self, from: usize, to: usize) -> storage::Result<()> {
        check_erase(self, from, to)?;
        self.data[from..to].fill(ERASED);
        self.written[from..to].fill(false);
        self.erase_ops += 1;
        Ok(())
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) -> storage::Result<()> {
        check_write(self, offset, bytes.len())?;
        if Self::faulted(self.write_fault, offset, bytes.len()) {
            return Err(storage::Error::Failed);
        }
        if self.written[offset..offset + bytes.len()].iter().any(|&w| w) {
            return Err(storage::Error::NotErased);
        }
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.written[offset..offset + bytes.len()].fill(true);
        Ok(())
    }
}
