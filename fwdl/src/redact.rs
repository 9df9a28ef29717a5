//! Redaction overlay.
//!
//! A bounded set of absolute address ranges whose bytes are replaced with the
//! erased-flash value in secure dumps.  Regions are applied independently in
//! insertion order; overlapping regions simply blank the shared bytes more
//! than once, which is idempotent.

use log::{debug, info};
use storage::ERASED;

use crate::{Error, PartitionCatalog, PartitionClass, Result};

/// Capacity of the region table.
pub const MAX_REGIONS: usize = 4;

/// Data partition labels blanked by [`RegionSet::auto_userdata_all`].
const AUTO_LABELS: [&str; 3] = ["nvs", "spiffs", "littlefs"];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RedactRegion {
    /// Absolute device address.
    pub offset: u32,
    pub len: u32,
    pub description: &'static str,
}

#[derive(Debug, Default, Clone)]
pub struct RegionSet {
    regions: heapless::Vec<RedactRegion, MAX_REGIONS>,
}

impl RegionSet {
    pub const fn new() -> RegionSet {
        RegionSet {
            regions: heapless::Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn iter(&self) -> core::slice::Iter<'_, RedactRegion> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Append a region.
    pub fn add(&mut self, offset: u32, len: u32, description: &'static str) -> Result<()> {
        let region = RedactRegion {
            offset,
            len,
            description,
        };
        self.regions
            .push(region)
            .map_err(|_| Error::CapacityExceeded)?;
        info!(
            "blank region added: {:#010x}..{:#010x} ({})",
            offset,
            offset as u64 + len as u64,
            description
        );
        Ok(())
    }

    /// Replace the whole set with a single caller-chosen region.
    pub fn set_manual(&mut self, offset: u32, len: u32) -> Result<()> {
        self.clear();
        self.add(offset, len, "manual")
    }

    /// Replace the whole set with the `userdata` partition's range.
    pub fn auto_userdata(&mut self, catalog: &PartitionCatalog) -> Result<()> {
        let part = catalog
            .find_by_label(PartitionClass::Data, "userdata")
            .ok_or(Error::NotFound)?;
        self.clear();
        self.add(part.base, part.size, "userdata")
    }

    /// Append a region for each well-known user data partition present.
    /// Returns how many were added; `NotFound` if none of the labels exist.
    pub fn auto_userdata_all(&mut self, catalog: &PartitionCatalog) -> Result<usize> {
        let mut added = 0;
        for label in AUTO_LABELS {
            if let Some(part) = catalog.find_by_label(PartitionClass::Data, label) {
                self.add(part.base, part.size, label)?;
                added += 1;
            }
        }
        if added == 0 {
            return Err(Error::NotFound);
        }
        Ok(added)
    }

    /// Blank every byte of `buf` that falls inside a region, where `buf`
    /// covers the absolute device range starting at `chunk_start`.  Returns a
    /// bitmask of the regions that overlapped the chunk.
    pub fn apply(&self, chunk_start: u32, buf: &mut [u8]) -> u8 {
        let chunk_start = chunk_start as u64;
        let chunk_end = chunk_start + buf.len() as u64;
        let mut fired = 0u8;
        for (i, region) in self.regions.iter().enumerate() {
            let region_start = region.offset as u64;
            let region_end = region_start + region.len as u64;
            let overlap_start = region_start.max(chunk_start);
            let overlap_end = region_end.min(chunk_end);
            if overlap_start < overlap_end {
                let from = (overlap_start - chunk_start) as usize;
                let to = (overlap_end - chunk_start) as usize;
                buf[from..to].fill(ERASED);
                fired |= 1 << i;
                debug!(
                    "blanked {} ({:#010x}..{:#010x}) in chunk at {:#010x}",
                    region.description, region_start, region_end, chunk_start
                );
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ranges: &[(u32, u32)]) -> RegionSet {
        let mut s = RegionSet::new();
        for &(offset, len) in ranges {
            s.add(offset, len, "test").unwrap();
        }
        s
    }

    #[test]
    fn non_overlapping_chunk_untouched() {
        let s = set(&[(9000, 100)]);
        let mut buf = [0xAAu8; 4096];
        assert_eq!(s.apply(0, &mut buf), 0);
        assert!(buf.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn partial_contained_and_containing_overlaps() {
        // Region hanging off the front of the chunk.
        let s = set(&[(0, 110)]);
        let mut buf = [0xAAu8; 100];
        assert_eq!(s.apply(100, &mut buf), 1);
        assert!(buf[..10].iter().all(|&b| b == ERASED));
        assert!(buf[10..].iter().all(|&b| b == 0xAA));

        // Region fully inside the chunk.
        let s = set(&[(120, 30)]);
        let mut buf = [0xAAu8; 100];
        assert_eq!(s.apply(100, &mut buf), 1);
        assert!(buf[..20].iter().all(|&b| b == 0xAA));
        assert!(buf[20..50].iter().all(|&b| b == ERASED));
        assert!(buf[50..].iter().all(|&b| b == 0xAA));

        // Region containing the whole chunk.
        let s = set(&[(0, 1000)]);
        let mut buf = [0xAAu8; 100];
        assert_eq!(s.apply(100, &mut buf), 1);
        assert!(buf.iter().all(|&b| b == ERASED));
    }

    #[test]
    fn abutting_region_does_not_bleed() {
        // Region ends exactly where the chunk starts.
        let s = set(&[(0, 100)]);
        let mut buf = [0xAAu8; 100];
        assert_eq!(s.apply(100, &mut buf), 0);
        assert!(buf.iter().all(|&b| b == 0xAA));

        // Region starts exactly where the chunk ends.
        let s = set(&[(200, 100)]);
        let mut buf = [0xAAu8; 100];
        assert_eq!(s.apply(100, &mut buf), 0);
        assert!(buf.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn overlapping_regions_blank_their_union() {
        let s = set(&[(100, 50), (140, 60), (9000, 100)]);
        let mut buf = [0xAAu8; 4096];
        assert_eq!(s.apply(0, &mut buf), 0b011);
        assert!(buf[..100].iter().all(|&b| b == 0xAA));
        assert!(buf[100..200].iter().all(|&b| b == ERASED));
        assert!(buf[200..].iter().all(|&b| b == 0xAA));

        // The same set against the chunk at 8192 hits only the third region,
        // mapped to local offsets.
        let mut buf = [0xAAu8; 4096];
        assert_eq!(s.apply(8192, &mut buf), 0b100);
        assert!(buf[..808].iter().all(|&b| b == 0xAA));
        assert!(buf[808..908].iter().all(|&b| b == ERASED));
        assert!(buf[908..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn capacity_is_bounded() {
        let mut s = set(&[(0, 1), (1, 1), (2, 1), (3, 1)]);
        assert_eq!(s.add(4, 1, "extra"), Err(Error::CapacityExceeded));
        assert_eq!(s.len(), MAX_REGIONS);
    }

    #[test]
    fn set_manual_resets() {
        let mut s = set(&[(0, 1), (1, 1)]);
        s.set_manual(0x100, 0x10).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s.iter().next().unwrap().description, "manual");
    }
}
