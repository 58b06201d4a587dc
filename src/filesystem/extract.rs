//! File content extraction.
//!
//! Files are read along their cluster chain, never past their declared size. A chain that ends
//! before the declared size is covered is an error: missing bytes are never zero-filled.

use std::io::{Read, Seek};

use log::debug;

use super::dir_entry::DirEntry;
use super::fat::ChainWalker;
use super::fat_error::FATError;
use super::volume::VolumeDescriptor;
use crate::image::ImageReader;

/// Reads up to `length` bytes of `file` starting at byte `offset`.
///
/// `length` is clamped so that the read stops at the end of the file.
///
/// # Errors
/// - `FATError::OutOfRange` if `offset` is not below the file size
/// - `FATError::InvalidCluster` if the file has content but no first cluster
/// - `FATError::ChainTooShort` if the chain ends before the requested bytes
/// - the errors of the chain walk (`ClusterCycle`, `BadCluster`, ...) and of the image reads
pub fn read_range<R: Read + Seek>(
    reader: &mut ImageReader<R>,
    vol: &VolumeDescriptor,
    file: &DirEntry,
    offset: u64,
    length: u64,
) -> Result<Vec<u8>, FATError> {
    let size = file.file_size();
    if offset >= size as u64 {
        return Err(FATError::OutOfRange { offset, size });
    }

    let first = file.cluster_number();
    if first < 2 {
        return Err(FATError::InvalidCluster(first));
    }

    let length = length.min(size as u64 - offset);
    let cluster_size = vol.cluster_size();
    debug!(
        "reading {length} bytes at offset {offset} of {} (first cluster {first})",
        file.display_name()
    );

    let mut walker = ChainWalker::new(first);
    let too_short = |walker: &ChainWalker| FATError::ChainTooShort {
        size,
        clusters: walker.steps(),
    };

    // Walk to the cluster holding `offset`.
    let mut cluster = walker.advance(reader, vol)?.ok_or_else(|| too_short(&walker))?;
    for _ in 0..offset / cluster_size {
        cluster = walker.advance(reader, vol)?.ok_or_else(|| too_short(&walker))?;
    }

    let mut data = vec![0u8; length as usize];
    let mut in_cluster = offset % cluster_size;
    let mut filled = 0usize;

    loop {
        let chunk = (cluster_size - in_cluster).min((length as usize - filled) as u64) as usize;
        let start = vol.cluster_to_byte_offset(cluster)? + in_cluster;
        reader.read_into(start, &mut data[filled..filled + chunk])?;
        filled += chunk;

        if filled == data.len() {
            return Ok(data);
        }

        in_cluster = 0;
        cluster = walker.advance(reader, vol)?.ok_or_else(|| too_short(&walker))?;
    }
}

/// Reads the whole content of `file`.
pub fn extract_whole<R: Read + Seek>(
    reader: &mut ImageReader<R>,
    vol: &VolumeDescriptor,
    file: &DirEntry,
) -> Result<Vec<u8>, FATError> {
    match file.file_size() {
        0 => Ok(vec![]),
        size => read_range(reader, vol, file, 0, size as u64),
    }
}
