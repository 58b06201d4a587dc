//! Short-name directory entries.
//!
//! A directory is a run of 32-byte slots spread over a cluster chain. Slots may be free, deleted,
//! VFAT long-name fragments or regular entries; only the last kind is decoded into a [`DirEntry`].

use binread::{BinRead, BinReaderExt};
use getset::CopyGetters;
use std::fmt;
use std::io;

use super::fat_error::FATError;
use super::short_name;

/// Size in bytes of a directory entry.
pub const DIR_ENTRY_SIZE: usize = 32;

/// First name byte of a deleted entry.
pub const DELETED_MARKER: u8 = 0xE5;
/// First name byte of a slot that was never used.
pub const FREE_MARKER: u8 = 0x00;

pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_HIDDEN: u8 = 0x02;
pub const ATTR_SYSTEM: u8 = 0x04;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
/// Combination marking a VFAT long-name slot.
pub const ATTR_LONG_NAME: u8 = ATTR_READ_ONLY | ATTR_HIDDEN | ATTR_SYSTEM | ATTR_VOLUME_ID;

/// One 32-byte record of a directory cluster.
///
/// Only the short name, the attributes, the first cluster and the size are exposed; the
/// timestamps are read to keep the layout and then ignored.
#[derive(BinRead, Debug, Clone, PartialEq, Eq, CopyGetters)]
#[br(little)]
pub struct DirEntry {
    /// Space padded, no dot: `REPORT  TXT`
    #[get_copy = "pub"]
    name: [u8; 11],
    #[get_copy = "pub"]
    attr: u8,
    _nt_reserved: u8,
    _created_tenths: u8,
    _created_time: u16,
    _created_date: u16,
    _accessed_date: u16,
    #[get_copy = "pub"]
    fst_clus_hi: u16,
    _modified_time: u16,
    _modified_date: u16,
    #[get_copy = "pub"]
    fst_clus_lo: u16,
    /// 0 for directories
    #[get_copy = "pub"]
    file_size: u32,
}

impl DirEntry {
    /// Decodes the first 32 bytes of `buf`.
    ///
    /// # Errors
    /// - `FATError::IOError` if the slice is shorter than 32 bytes
    pub fn from_slice(buf: &[u8]) -> Result<Self, FATError> {
        let mut reader = io::Cursor::new(buf);
        reader.read_le().map_err(FATError::from)
    }

    /// Tells whether a raw 32-byte slot holds an entry worth listing.
    ///
    /// Deleted slots, never-used slots and VFAT long-name slots are skipped.
    pub fn is_listable(raw: &[u8]) -> bool {
        match raw.first() {
            None | Some(&FREE_MARKER) | Some(&DELETED_MARKER) => false,
            Some(_) => raw
                .get(11)
                .is_some_and(|attr| attr & ATTR_LONG_NAME != ATTR_LONG_NAME),
        }
    }

    /// First cluster, with both halves joined.
    pub fn cluster_number(&self) -> u32 {
        ((self.fst_clus_hi as u32) << 16) | self.fst_clus_lo as u32
    }

    /// Checks if the directory attribute bit (0x10) is set.
    pub fn is_dir(&self) -> bool {
        self.attr & ATTR_DIRECTORY != 0
    }

    /// Checks if this entry holds the volume label rather than a file.
    pub fn is_volume_label(&self) -> bool {
        self.attr & ATTR_VOLUME_ID != 0 && self.attr & ATTR_LONG_NAME != ATTR_LONG_NAME
    }

    /// Checks if the raw name equals the 8.3 key of `name` (case-insensitive).
    pub fn same_short_name(&self, name: &str) -> bool {
        short_name::to_8_3_name(name) == self.name
    }

    /// Returns the name in its usual `NAME.EXT` form.
    pub fn display_name(&self) -> String {
        short_name::from_8_3_name(&self.name)
    }
}

impl fmt::Display for DirEntry {
    /// Formats the directory entry as its name followed by its size, or `<DIR>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dir() {
            write!(f, "{:<12} <DIR>", self.display_name())
        } else {
            write!(f, "{:<12} {}B", self.display_name(), self.file_size)
        }
    }
}
