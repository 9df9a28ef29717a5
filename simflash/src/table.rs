//! Partition table provisioning.
//!
//! Builds the on-flash partition table the engine's catalog parses: 32-byte
//! little-endian entries at device offset 0x8000, terminated by erased space.
//! The builder also emits the checksum entry a real provisioning tool writes
//! after the last partition, so catalog parsing is exercised against the full
//! format.

use anyhow::{bail, Result};

use crate::SimFlash;

/// Where the partition table lives on the device.
pub const TABLE_OFFSET: usize = 0x8000;

/// One table sector holds at most this many 32-byte entries.
pub const MAX_ENTRIES: usize = 95;

const ENTRY_SIZE: usize = 32;
const ENTRY_MAGIC: [u8; 2] = [0xAA, 0x50];
const CHECKSUM_MAGIC: [u8; 2] = [0xEB, 0xEB];

const CLASS_APP: u8 = 0x00;
const CLASS_DATA: u8 = 0x01;

pub struct TableBuilder {
    entries: Vec<[u8; ENTRY_SIZE]>,
}

impl TableBuilder {
    pub fn new() -> TableBuilder {
        TableBuilder { entries: Vec::new() }
    }

    /// Append an application partition entry.
    pub fn app(self, label: &str, subtype: u8, offset: u32, size: u32) -> Result<Self> {
        self.push(CLASS_APP, label, subtype, offset, size)
    }

    /// Append a data partition entry.
    pub fn data(self, label: &str, subtype: u8, offset: u32, size: u32) -> Result<Self> {
        self.push(CLASS_DATA, label, subtype, offset, size)
    }

    fn push(mut self, class: u8, label: &str, subtype: u8, offset: u32, size: u32) -> Result<Self> {
        if self.entries.len() == MAX_ENTRIES {
            bail!("partition table full");
        }
        if label.len() > 16 {
            bail!("label {:?} longer than 16 bytes", label);
        }
        let mut entry = [0u8; ENTRY_SIZE];
        entry[0..2].copy_from_slice(&ENTRY_MAGIC);
        entry[2] = class;
        entry[3] = subtype;
        entry[4..8].copy_from_slice(&offset.to_le_bytes());
        entry[8..12].copy_from_slice(&size.to_le_bytes());
        entry[12..12 + label.len()].copy_from_slice(label.as_bytes());
        // Bytes 12+len..28 stay NUL padding; 28..32 are flags, unused here.
        self.entries.push(entry);
        Ok(self)
    }

    /// Erase the table sector and write the entries plus a checksum entry.
    pub fn write_to(&self, flash: &mut SimFlash) -> storage::Result<()> {
        use storage::Flash;

        let (from, to) = storage::erase_containing(flash, TABLE_OFFSET, 0x1000)?;
        flash.erase(from, to)?;
        let mut pos = TABLE_OFFSET;
        for entry in &self.entries {
            flash.write(pos, entry)?;
            pos += ENTRY_SIZE;
        }
        // Checksum entry: marker, pad, then the digest slot.  The catalog
        // skips it by magic, so the digest itself can stay zeroed.
        let mut check = [0u8; ENTRY_SIZE];
        check[0..2].copy_from_slice(&CHECKSUM_MAGIC);
        check[2..16].fill(0xFF);
        flash.write(pos, &check)?;
        Ok(())
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        TableBuilder::new()
    }
}

/// The stock 4 MB dual-OTA layout: two equal application slots plus the usual
/// data partitions, including a `userdata` region for redaction tests.
pub fn standard_two_ota() -> Result<TableBuilder> {
    TableBuilder::new()
        .data("nvs", 0x02, 0x9000, 0x5000)?
        .data("otadata", 0x00, 0xE000, 0x2000)?
        .app("ota_0", 0x10, 0x10000, 0x180000)?
        .app("ota_1", 0x11, 0x190000, 0x180000)?
        .data("spiffs", 0x82, 0x310000, 0x70000)?
        .data("userdata", 0x81, 0x380000, 0x80000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styles;
    use storage::ReadFlash;

    #[test]
    fn entries_land_at_table_offset() {
        let mut flash = styles::ESP32_4MB.build().unwrap();
        standard_two_ota().unwrap().write_to(&mut flash).unwrap();

        let mut entry = [0u8; ENTRY_SIZE];
        flash.read(TABLE_OFFSET, &mut entry).unwrap();
        assert_eq!(&entry[0..2], &ENTRY_MAGIC);
        assert_eq!(entry[2], CLASS_DATA);
        assert_eq!(&entry[12..15], b"nvs");

        // Six partitions, then the checksum entry, then erased space.
        flash.read(TABLE_OFFSET + 6 * ENTRY_SIZE, &mut entry).unwrap();
        assert_eq!(&entry[0..2], &CHECKSUM_MAGIC);
        flash.read(TABLE_OFFSET + 7 * ENTRY_SIZE, &mut entry).unwrap();
        assert!(entry.iter().all(|&b| b == storage::ERASED));
    }
}
