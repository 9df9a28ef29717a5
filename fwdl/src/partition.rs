//! Partition catalog.
//!
//! Built once by scanning the on-flash partition table, then queried as a
//! pure lookup layer.  Entries are 32 bytes, little-endian, starting at
//! `TABLE_OFFSET`: a magic word, class and subtype bytes, base address, size,
//! and a NUL-padded 16-byte label.  A checksum entry is skipped; erased space
//! ends the scan.

use core::cell::RefCell;

use heapless::{String, Vec};
use log::warn;
use storage::ReadFlash;

use crate::{Device, Error, Result};

/// Where the partition table lives on the device.
pub const TABLE_OFFSET: usize = 0x8000;

/// Longest label the table format allows.
pub const LABEL_MAX: usize = 16;

/// Catalog capacity.  Device tables top out well below this.
pub const MAX_PARTITIONS: usize = 16;

const ENTRY_SIZE: usize = 32;
const TABLE_MAX_ENTRIES: usize = 95;
const ENTRY_MAGIC: u16 = 0x50AA;
const CHECKSUM_MAGIC: u16 = 0xEBEB;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PartitionClass {
    App,
    Data,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PartitionDescriptor {
    pub class: PartitionClass,
    pub subtype: u8,
    pub label: String<LABEL_MAX>,
    /// Absolute base address on the device.
    pub base: u32,
    pub size: u32,
}

pub struct PartitionCatalog {
    parts: Vec<PartitionDescriptor, MAX_PARTITIONS>,
}

impl PartitionCatalog {
    /// Scan the partition table.  Entries with an unknown class byte or a
    /// non-UTF-8 label are skipped with a warning rather than failing the
    /// whole catalog.
    pub fn from_flash<F: ReadFlash>(flash: &RefCell<F>) -> Result<PartitionCatalog> {
        let mut parts = Vec::new();
        let mut entry = [0u8; ENTRY_SIZE];
        for i in 0..TABLE_MAX_ENTRIES {
            flash
                .borrow_mut()
                .read(TABLE_OFFSET + i * ENTRY_SIZE, &mut entry)?;
            let magic = u16::from_le_bytes([entry[0], entry[1]]);
            if magic == CHECKSUM_MAGIC {
                continue;
            }
            if magic != ENTRY_MAGIC {
                break;
            }
            let class = match entry[2] {
                0x00 => PartitionClass::App,
                0x01 => PartitionClass::Data,
                other => {
                    warn!("partition entry {} has unknown class {:#04x}", i, other);
                    continue;
                }
            };
            let base = u32::from_le_bytes([entry[4], entry[5], entry[6], entry[7]]);
            let size = u32::from_le_bytes([entry[8], entry[9], entry[10], entry[11]]);
            let raw_label = &entry[12..12 + LABEL_MAX];
            let end = raw_label.iter().position(|&b| b == 0).unwrap_or(LABEL_MAX);
            let text = match core::str::from_utf8(&raw_label[..end]) {
                Ok(text) => text,
                Err(_) => {
                    warn!("partition entry {} has a malformed label", i);
                    continue;
                }
            };
            let mut label = String::new();
            // Cannot overflow: the slice is at most LABEL_MAX bytes.
            let _ = label.push_str(text);
            parts
                .push(PartitionDescriptor {
                    class,
                    subtype: entry[3],
                    label,
                    base,
                    size,
                })
                .map_err(|_| Error::CapacityExceeded)?;
        }
        Ok(PartitionCatalog { parts })
    }

    pub fn iter(&self) -> core::slice::Iter<'_, PartitionDescriptor> {
        self.parts.iter()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// First entry of `class` with this label.
    pub fn find_by_label(&self, class: PartitionClass, label: &str) -> Option<&PartitionDescriptor> {
        self.parts
            .iter()
            .find(|p| p.class == class && p.label.as_str() == label)
    }

    /// First entry of `class` with this subtype.
    pub fn find_by_subtype(&self, class: PartitionClass, subtype: u8) -> Option<&PartitionDescriptor> {
        self.parts
            .iter()
            .find(|p| p.class == class && p.subtype == subtype)
    }

    /// Upload/download target resolution: application partitions shadow data
    /// partitions with the same label.
    pub fn resolve(&self, label: &str) -> Option<&PartitionDescriptor> {
        self.find_by_label(PartitionClass::App, label)
            .or_else(|| self.find_by_label(PartitionClass::Data, label))
    }

    /// The application partition the device booted from.
    pub fn running(&self, device: &impl Device) -> Result<&PartitionDescriptor> {
        let base = device.running_app_base();
        self.parts
            .iter()
            .find(|p| p.class == PartitionClass::App && p.base == base)
            .ok_or(Error::NotFound)
    }

    /// The other application slot: the first application entry, in table
    /// enumeration order, whose base differs from `running`.  With more than
    /// two application partitions the table order alone decides.
    pub fn other_app(&self, running: &PartitionDescriptor) -> Option<&PartitionDescriptor> {
        self.parts
            .iter()
            .find(|p| p.class == PartitionClass::App && p.base != running.base)
    }
}
