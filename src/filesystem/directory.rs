//! Directory enumeration and name lookup.
//!
//! A directory is a cluster chain filled with 32-byte records. [`list_entries`] walks the whole
//! chain lazily and [`resolve`] finds an entry by its 8.3 name.

use std::io::{Read, Seek};

use log::debug;

use super::dir_entry::{DIR_ENTRY_SIZE, DirEntry};
use super::fat::{ChainWalker, read_cluster};
use super::fat_error::FATError;
use super::volume::VolumeDescriptor;
use crate::image::ImageReader;

/// Lazy iterator over the entries of a directory.
///
/// Yields every listable entry of every cluster of the directory. A broken chain yields a
/// single error, after which the iterator is exhausted. Calling [`list_entries`] again
/// restarts the enumeration.
pub struct DirEntries<'a, R> {
    reader: &'a mut ImageReader<R>,
    vol: &'a VolumeDescriptor,
    walker: ChainWalker,
    cluster: Vec<u8>,
    pos: usize,
    done: bool,
}

/// Enumerates the directory whose chain starts at `start_cluster` (0 designates the root).
///
/// # Errors
/// - `FATError::InvalidCluster` for the reserved cluster 1
pub fn list_entries<'a, R: Read + Seek>(
    reader: &'a mut ImageReader<R>,
    vol: &'a VolumeDescriptor,
    start_cluster: u32,
) -> Result<DirEntries<'a, R>, FATError> {
    let start = vol.resolve_cluster(start_cluster)?;
    debug!("listing directory at cluster {start}");

    Ok(DirEntries {
        reader,
        vol,
        walker: ChainWalker::new(start),
        cluster: vec![],
        pos: 0,
        done: false,
    })
}

impl<R: Read + Seek> DirEntries<'_, R> {
    /// Loads the next cluster of the directory, returns false at the end of the chain.
    fn load_next_cluster(&mut self) -> Result<bool, FATError> {
        match self.walker.advance(self.reader, self.vol)? {
            Some(cluster) => {
                self.cluster = read_cluster(self.reader, self.vol, cluster)?;
                self.pos = 0;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<R: Read + Seek> Iterator for DirEntries<'_, R> {
    type Item = Result<DirEntry, FATError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if self.pos + DIR_ENTRY_SIZE > self.cluster.len() {
                match self.load_next_cluster() {
                    Ok(true) => continue,
                    Ok(false) => {
                        self.done = true;
                        return None;
                    }
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                }
            }

            let raw = &self.cluster[self.pos..self.pos + DIR_ENTRY_SIZE];
            self.pos += DIR_ENTRY_SIZE;

            if DirEntry::is_listable(raw) {
                return Some(DirEntry::from_slice(raw));
            }
        }
    }
}

/// Finds the first entry whose raw name matches `name` once converted to 8.3.
///
/// # Errors
/// - `FATError::FileNotFound` if no entry matches
/// - any error yielded by `entries` before a match is found
pub fn resolve<I>(entries: I, name: &str) -> Result<DirEntry, FATError>
where
    I: IntoIterator<Item = Result<DirEntry, FATError>>,
{
    for entry in entries {
        let entry = entry?;
        if entry.same_short_name(name) {
            return Ok(entry);
        }
    }

    Err(FATError::FileNotFound(name.to_string()))
}
