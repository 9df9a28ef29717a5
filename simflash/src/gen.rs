//! Image generation.
//!
//! Produces seeded pseudo-random application images carrying the one-byte
//! image-header marker the engine's activation check looks for.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use anyhow::{bail, Result};

/// First byte of a bootable application image.
pub const IMAGE_MAGIC: u8 = 0xE9;

pub struct GeneratedImage {
    pub data: Vec<u8>,
}

pub struct GenBuilder {
    /// Total size of the image.
    size: usize,
    /// Seed for the PRNG.
    seed: u64,
    /// Whether the image carries the header marker.  Disabled to produce a
    /// deliberately unbootable image.
    bootable: bool,
}

impl Default for GenBuilder {
    fn default() -> Self {
        GenBuilder {
            size: 76_137,
            seed: 1,
            bootable: true,
        }
    }
}

impl GenBuilder {
    pub fn size(&mut self, size: usize) -> &mut Self {
        self.size = size;
        self
    }

    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    pub fn bootable(&mut self, bootable: bool) -> &mut Self {
        self.bootable = bootable;
        self
    }

    pub fn build(&self) -> Result<GeneratedImage> {
        if self.size == 0 {
            bail!("empty image");
        }
        let mut rng = Xoshiro256Plus::seed_from_u64(self.seed);
        let mut data = vec![0u8; self.size];
        rng.fill_bytes(&mut data);

        data[0] = if self.bootable { IMAGE_MAGIC } else { 0x00 };

        Ok(GeneratedImage { data })
    }
}
