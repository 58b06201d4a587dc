//! FAT variant of a volume, derived from its count of data clusters.
//!
//! Only FAT32 volumes are browsed. Strict validation uses the variant to name what it rejects.

use std::fmt;

/// Largest cluster count of a FAT12 volume, plus one.
const FAT16_MIN_CLUSTERS: u32 = 4085;
/// Largest cluster count of a FAT16 volume, plus one.
const FAT32_MIN_CLUSTERS: u32 = 65525;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FATType {
    FAT12,
    FAT16,
    FAT32,
}

impl FATType {
    /// The count of data clusters is the only thing deciding the variant of a volume.
    pub fn from_cluster_count(clusters: u32) -> Self {
        match clusters {
            0..FAT16_MIN_CLUSTERS => FATType::FAT12,
            FAT16_MIN_CLUSTERS..FAT32_MIN_CLUSTERS => FATType::FAT16,
            _ => FATType::FAT32,
        }
    }

    /// Width in bits of a FAT entry.
    pub fn entry_bits(self) -> u8 {
        match self {
            FATType::FAT12 => 12,
            FATType::FAT16 => 16,
            FATType::FAT32 => 32,
        }
    }
}

impl fmt::Display for FATType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FAT{}", self.entry_bits())
    }
}
