//! Error types for FAT32 navigation.
//!
//! Every failure the navigator can report is a [`FATError`]. The variants are grouped by
//! [`ErrorKind`] so that callers can tell I/O and format failures apart from the expected
//! "not found" and "out of range" outcomes.

use std::io;
use thiserror::Error;

/// Coarse classification of a [`FATError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The image could not be read (missing file, short read, read past the end).
    Io,
    /// The on-disk structures are inconsistent (BPB, FAT entries, cluster chains).
    Format,
    /// A name does not resolve in the current directory.
    NotFound,
    /// A name resolves, but not to a directory.
    NotADirectory,
    /// A name resolves to a directory where a file is expected.
    IsADirectory,
    /// A byte range starts at or beyond the end of a file.
    OutOfRange,
}

/// Errors that can occur while reading a FAT32 volume.
#[derive(Error, Debug)]
pub enum FATError {
    /// Underlying I/O errors that occur while reading the image.
    #[error("IO Error: `{0}`")]
    IOError(io::Error),

    /// Parsing error occured during structure initialization
    #[error("BinRead Error: `{0}`")]
    BinReadError(binread::Error),

    /// The first three bytes of a FAT volume must contain a valid x86 jump instruction.
    #[error("Invalid jump instruction `{0}`")]
    InvalidJmp(String),

    /// Bytes per sector must be a non-zero power of two (512, 1024, 2048 or 4096 in strict mode).
    #[error("Invalid count of bytes per sector: `{0}`. It must be a non-zero power of two")]
    InvalidBytesPerSec(u16),

    /// Sectors per cluster must be a power of 2: 1, 2, 4, 8, 16, 32, 64, or 128.
    #[error(
        "Invalid number of sector per cluster: `{0}`. Legal values: 1, 2, 4, 8, 16, 32, 64, 128"
    )]
    InvalidSecPerClus(u8),

    /// Total cluster size (bytes per sector × sectors per cluster) must not exceed 32 KiB.
    #[error("Invalid cluster size: `{0}`. Any value greater than 32K is invalid.")]
    InvalidClusSz(u32),

    /// The count of reserved sectors must be greater than 0.
    #[error("Invalid count of reserved sectors: `{0}`. Any value greater than 0 is valid.")]
    InvalidRsvdSecCnt(u16),

    /// At least one File Allocation Table is required.
    #[error("Invalid number of FATs on this volume: `{0}`.")]
    InvalidNumFat(u8),

    /// For FAT32 volumes, the root directory entries count must be 0.
    #[error(
        "Invalid count of directory entries in the root directory: `{0}`. It should be 0 for a FAT32 volume. "
    )]
    InvalidRootEntCnt(u16),

    /// The total sector count must be valid for the volume size.
    #[error("Invalid total count of sectors on the volume: `{0}`")]
    InvalidTotSec(String),

    /// The FAT size in sectors must be valid and consistent with the volume layout.
    #[error("Invalid FAT size:`{0}`")]
    InvalidFatSz(String),

    /// The root directory's first cluster number must be at least 2.
    #[error(
        "Invalid cluster number of the first cluster of the root directory: `{0}`. This value should be at least 2."
    )]
    InvalidRootClus(u32),

    /// The boot sector signature must be 0x55AA.
    #[error("Invalid BPB signature: `{0}`. Expected signature: 0x55AA")]
    InvalidSignature(String),

    /// The detected FAT type is not supported (only FAT32 is supported).
    #[error("Unsupported FAT type: `{0}`")]
    UnsupportedFATType(String),

    /// The regions described by the BPB do not fit in the image.
    #[error("Inconsistent volume geometry: {0}")]
    InconsistentGeometry(String),

    /// The cluster number is reserved or lies outside the FAT.
    #[error("Invalid cluster number: `{0}`")]
    InvalidCluster(u32),

    /// The FAT marks this cluster as bad.
    #[error("Cluster chain reaches a bad cluster after cluster `{0}`")]
    BadCluster(u32),

    /// The FAT entry of a cluster holds a free or reserved value.
    #[error("Malformed FAT entry `0x{value:08X}` for cluster `{cluster}`")]
    MalformedFatEntry { cluster: u32, value: u32 },

    /// A cluster chain visits the same cluster twice.
    #[error("Cluster chain loops back to cluster `{0}`")]
    ClusterCycle(u32),

    /// A file's cluster chain ends before its declared size is covered.
    #[error("Cluster chain of a {size}-byte file ends after {clusters} clusters")]
    ChainTooShort { size: u32, clusters: u32 },

    /// The file was not found
    #[error("File not found: `{0}`")]
    FileNotFound(String),

    /// The entry exists but is not a directory.
    #[error("Not a directory: `{0}`")]
    NotADirectory(String),

    /// The entry is a directory, its content cannot be read as a file.
    #[error("Is a directory: `{0}`")]
    IsADirectory(String),

    /// The requested offset starts at or past the end of the file.
    #[error("Offset `{offset}` is out of range for a {size}-byte file")]
    OutOfRange { offset: u64, size: u32 },
}

impl FATError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FATError::IOError(_) => ErrorKind::Io,
            FATError::FileNotFound(_) => ErrorKind::NotFound,
            FATError::NotADirectory(_) => ErrorKind::NotADirectory,
            FATError::IsADirectory(_) => ErrorKind::IsADirectory,
            FATError::OutOfRange { .. } => ErrorKind::OutOfRange,
            _ => ErrorKind::Format,
        }
    }
}

/// Converts standard I/O errors into FATError.
impl From<io::Error> for FATError {
    fn from(err: io::Error) -> Self {
        FATError::IOError(err)
    }
}

/// Converts BinRead errors into FATError.
///
/// Running out of bytes while decoding is an I/O condition, everything else is a format error.
impl From<binread::Error> for FATError {
    fn from(err: binread::Error) -> Self {
        match err {
            binread::Error::Io(io_err) => FATError::IOError(io_err),
            other => FATError::BinReadError(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_conditions_have_their_own_kinds() {
        assert_eq!(
            FATError::FileNotFound("A.TXT".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            FATError::OutOfRange { offset: 4, size: 4 }.kind(),
            ErrorKind::OutOfRange
        );
        assert_eq!(
            FATError::NotADirectory("A.TXT".into()).kind(),
            ErrorKind::NotADirectory
        );
        assert_eq!(
            FATError::IsADirectory("DOCS".into()).kind(),
            ErrorKind::IsADirectory
        );
    }

    #[test]
    fn structural_errors_are_format_errors() {
        assert_eq!(FATError::ClusterCycle(5).kind(), ErrorKind::Format);
        assert_eq!(FATError::BadCluster(5).kind(), ErrorKind::Format);
        assert_eq!(FATError::InvalidNumFat(0).kind(), ErrorKind::Format);
    }

    #[test]
    fn binread_errors_split_between_io_and_format() {
        let err: FATError =
            binread::Error::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "short")).into();
        assert!(matches!(err, FATError::IOError(_)));
        assert_eq!(err.kind(), ErrorKind::Io);

        let err: FATError = binread::Error::AssertFail {
            pos: 510,
            message: "bad signature".into(),
        }
        .into();
        assert!(matches!(err, FATError::BinReadError(_)));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn io_errors_convert() {
        let err: FATError = io::Error::new(io::ErrorKind::UnexpectedEof, "short").into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
