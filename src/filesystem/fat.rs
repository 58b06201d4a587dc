//! File Allocation Table access.
//!
//! This module implements the cluster-level primitives shared by directories and files:
//! - Reading and classifying FAT32 entries
//! - Walking cluster chains with a guard against cycles
//! - Reading the bytes of a cluster

use std::collections::HashSet;
use std::io::{Read, Seek};

use log::trace;

use super::fat_error::FATError;
use super::volume::VolumeDescriptor;
use crate::image::ImageReader;

/// The top 4 bits of a FAT32 entry are reserved.
pub const FAT32_MASK: u32 = 0x0FFF_FFFF;
/// Values from this one upward mark the end of a chain.
pub const FAT32_EOC: u32 = 0x0FFF_FFF8;
/// Marks a cluster containing bad sectors.
pub const FAT32_BAD: u32 = 0x0FFF_FFF7;
/// First reserved value; reserved values are never valid successors.
const FAT32_RESERVED: u32 = 0x0FFF_FFF0;

/// Reads the FAT entry of `cluster` and returns the next cluster of the chain.
///
/// # Returns
/// - `Ok(Some(next))`: The chain continues at `next`
/// - `Ok(None)`: `cluster` is the last cluster of its chain
///
/// # Errors
/// - `FATError::InvalidCluster` if `cluster` has no entry in the FAT
/// - `FATError::BadCluster` if the chain continues on a cluster marked as bad
/// - `FATError::MalformedFatEntry` if the entry is free, holds a reserved value or points past
///   the last cluster of the image
/// - `FATError::IOError` if the entry cannot be read
pub fn next_cluster<R: Read + Seek>(
    reader: &mut ImageReader<R>,
    vol: &VolumeDescriptor,
    cluster: u32,
) -> Result<Option<u32>, FATError> {
    let mut buf = [0u8; 4];
    reader.read_into(vol.fat_entry_offset(cluster)?, &mut buf)?;

    let value = u32::from_le_bytes(buf) & FAT32_MASK;
    trace!("FAT[{cluster}] = 0x{value:08X}");

    match value {
        FAT32_EOC..=FAT32_MASK => Ok(None),
        FAT32_BAD => Err(FATError::BadCluster(cluster)),
        FAT32_RESERVED..FAT32_BAD => Err(FATError::MalformedFatEntry { cluster, value }),
        next if vol.is_data_cluster(next) => Ok(Some(next)),
        // Free (0), reserved (1) or past the last cluster of the image.
        _ => Err(FATError::MalformedFatEntry { cluster, value }),
    }
}

/// Reads the whole content of a cluster.
pub fn read_cluster<R: Read + Seek>(
    reader: &mut ImageReader<R>,
    vol: &VolumeDescriptor,
    cluster: u32,
) -> Result<Vec<u8>, FATError> {
    let offset = vol.cluster_to_byte_offset(cluster)?;
    Ok(reader.read_exact_at(offset, vol.cluster_size() as usize)?)
}

#[derive(Debug, Clone, Copy)]
enum WalkState {
    Start(u32),
    After(u32),
    Done,
}

/// Lazy walk along a cluster chain.
///
/// The walker does not hold the image, so the caller can read cluster data between two steps.
/// Every cluster is visited at most once: coming back to a visited cluster fails with
/// `FATError::ClusterCycle` and ends the walk.
#[derive(Debug)]
pub struct ChainWalker {
    state: WalkState,
    visited: HashSet<u32>,
}

impl ChainWalker {
    /// Starts a walk at `first`, which must be a data cluster held by the image.
    pub fn new(first: u32) -> Self {
        Self {
            state: WalkState::Start(first),
            visited: HashSet::new(),
        }
    }

    /// Returns the count of clusters yielded so far.
    pub fn steps(&self) -> u32 {
        self.visited.len() as u32
    }

    /// Moves to the next cluster of the chain.
    ///
    /// # Returns
    /// - `Ok(Some(cluster))`: The next cluster of the chain
    /// - `Ok(None)`: The chain is over
    ///
    /// # Errors
    /// The errors of [`next_cluster`], `FATError::InvalidCluster` for a first cluster that is
    /// not a data cluster and `FATError::ClusterCycle` when the chain loops. The walk is over after an error.
    pub fn advance<R: Read + Seek>(
        &mut self,
        reader: &mut ImageReader<R>,
        vol: &VolumeDescriptor,
    ) -> Result<Option<u32>, FATError> {
        let current = match std::mem::replace(&mut self.state, WalkState::Done) {
            WalkState::Start(first) if !vol.is_data_cluster(first) => {
                return Err(FATError::InvalidCluster(first));
            }
            WalkState::Start(first) => first,
            WalkState::After(prev) => match next_cluster(reader, vol, prev)? {
                Some(next) => next,
                None => return Ok(None),
            },
            WalkState::Done => return Ok(None),
        };

        if !self.visited.insert(current) {
            return Err(FATError::ClusterCycle(current));
        }

        self.state = WalkState::After(current);
        Ok(Some(current))
    }
}

/// Lists every cluster of the chain starting at `first`.
pub fn cluster_chain<R: Read + Seek>(
    reader: &mut ImageReader<R>,
    vol: &VolumeDescriptor,
    first: u32,
) -> Result<Vec<u32>, FATError> {
    let mut walker = ChainWalker::new(first);
    let mut clusters = vec![];

    while let Some(cluster) = walker.advance(reader, vol)? {
        clusters.push(cluster);
    }

    Ok(clusters)
}
