//! Browsing session over an open FAT32 image.
//!
//! A [`Session`] owns the image, the volume geometry read at open time and the current directory.
//! All operations take `&mut self`: a session is used by one caller at a time, and the seek-then-read
//! sequences of the image never interleave. Wrap it in a `Mutex` to share it between threads.
//!
//! Errors never close the session; the caller can keep browsing after any failure.

use getset::CopyGetters;
use log::{debug, info};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::filesystem::bpb::Bpb;
use crate::filesystem::dir_entry::DirEntry;
use crate::filesystem::directory::{DirEntries, list_entries, resolve};
use crate::filesystem::extract::{extract_whole, read_range};
use crate::filesystem::fat::cluster_chain;
use crate::filesystem::fat_error::FATError;
use crate::filesystem::volume::VolumeDescriptor;
use crate::image::ImageReader;

/// Options applied when opening an image.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Run the full FAT32 conformance checks on the boot sector, not only the ones navigation
    /// depends on.
    pub strict: bool,
}

impl SessionOptions {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Metadata of a directory entry, as reported by [`Session::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct StatInfo {
    /// Size in bytes, 0 for directories.
    size: u32,
    attr: u8,
    /// Complete first cluster number.
    cluster: u32,
    /// High 16 bits of the first cluster number, as stored on disk.
    cluster_high: u16,
}

impl From<&DirEntry> for StatInfo {
    fn from(entry: &DirEntry) -> Self {
        Self {
            size: entry.file_size(),
            attr: entry.attr(),
            cluster: entry.cluster_number(),
            cluster_high: entry.fst_clus_hi(),
        }
    }
}

/// An open FAT32 image and the directory being browsed.
pub struct Session<R> {
    reader: ImageReader<R>,
    vol: VolumeDescriptor,
    cwd: u32,
}

impl Session<File> {
    /// Opens the image file at `path`.
    ///
    /// # Errors
    /// - `FATError::IOError` if the file cannot be opened or is shorter than a boot sector
    /// - the validation errors of [`Bpb::from`]
    pub fn open(path: &Path, options: &SessionOptions) -> Result<Self, FATError> {
        let reader = ImageReader::open(path)?;
        let session = Self::with_reader(reader, options)?;
        info!("{} opened", path.display());
        Ok(session)
    }
}

impl<R: Read + Seek> Session<R> {
    /// Opens an image held by any seekable source.
    pub fn from_reader(inner: R, options: &SessionOptions) -> Result<Self, FATError> {
        Self::with_reader(ImageReader::new(inner)?, options)
    }

    fn with_reader(mut reader: ImageReader<R>, options: &SessionOptions) -> Result<Self, FATError> {
        let bpb = Bpb::from(&mut reader, options.strict)?;
        let vol = VolumeDescriptor::from_bpb(&bpb, reader.len());
        debug!(
            "volume {:?}: {} bytes per cluster, data region at 0x{:X}, root cluster {}",
            vol.label_str(),
            vol.cluster_size(),
            vol.data_start(),
            vol.root_cluster()
        );

        Ok(Self {
            reader,
            cwd: vol.root_cluster(),
            vol,
        })
    }

    /// Closes the session and hands back the underlying source.
    pub fn close(self) -> R {
        self.reader.close()
    }

    /// Returns the first cluster of the current directory.
    pub fn current_directory_cluster(&self) -> u32 {
        self.cwd
    }

    /// Tells whether the current directory is the root directory.
    pub fn at_root(&self) -> bool {
        self.cwd == self.vol.root_cluster()
    }

    /// Returns a lazy iterator over the entries of the current directory.
    pub fn entries(&mut self) -> Result<DirEntries<'_, R>, FATError> {
        list_entries(&mut self.reader, &self.vol, self.cwd)
    }

    /// Lists the entries of the current directory.
    pub fn list(&mut self) -> Result<Vec<DirEntry>, FATError> {
        self.entries()?.collect()
    }

    /// Finds `name` in the current directory.
    pub fn find(&mut self, name: &str) -> Result<DirEntry, FATError> {
        resolve(self.entries()?, name)
    }

    /// Finds `name` in the current directory and checks that it is not a directory.
    fn find_file(&mut self, name: &str) -> Result<DirEntry, FATError> {
        let entry = self.find(name)?;
        if entry.is_dir() {
            return Err(FATError::IsADirectory(name.to_string()));
        }
        Ok(entry)
    }

    /// Moves to the directory `name`, which can be `.` or `..`.
    ///
    /// `..` from the root directory leaves the session where it is.
    ///
    /// # Errors
    /// - `FATError::FileNotFound` if `name` is not in the current directory
    /// - `FATError::NotADirectory` if `name` designates a file
    pub fn change_directory(&mut self, name: &str) -> Result<(), FATError> {
        match name {
            "." => return Ok(()),
            ".." if self.at_root() => return Ok(()),
            _ => {}
        }

        let entry = self.find(name)?;
        if !entry.is_dir() {
            return Err(FATError::NotADirectory(name.to_string()));
        }

        self.cwd = self.vol.resolve_cluster(entry.cluster_number())?;
        debug!("current directory is now cluster {}", self.cwd);
        Ok(())
    }

    /// Returns the metadata of `name`.
    pub fn stat(&mut self, name: &str) -> Result<StatInfo, FATError> {
        self.find(name).map(|entry| StatInfo::from(&entry))
    }

    /// Lists the clusters holding `name`. Empty files own no cluster.
    pub fn clusters(&mut self, name: &str) -> Result<Vec<u32>, FATError> {
        let entry = self.find(name)?;
        match entry.cluster_number() {
            0 if !entry.is_dir() => Ok(vec![]),
            cluster => {
                let first = self.vol.resolve_cluster(cluster)?;
                cluster_chain(&mut self.reader, &self.vol, first)
            }
        }
    }

    /// Reads up to `length` bytes of the file `name`, starting at `offset`.
    ///
    /// # Errors
    /// - `FATError::FileNotFound` if `name` is not in the current directory
    /// - `FATError::IsADirectory` if `name` designates a directory
    /// - `FATError::OutOfRange` if `offset` is not below the file size
    pub fn read_file_range(
        &mut self,
        name: &str,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, FATError> {
        let entry = self.find_file(name)?;
        read_range(&mut self.reader, &self.vol, &entry, offset, length)
    }

    /// Reads the whole content of the file `name`.
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>, FATError> {
        let entry = self.find_file(name)?;
        extract_whole(&mut self.reader, &self.vol, &entry)
    }

    /// Returns the volume label stored in the boot sector.
    pub fn volume_label(&self) -> [u8; 11] {
        self.vol.volume_label()
    }

    /// Returns the geometry of the volume.
    pub fn volume_info(&self) -> VolumeDescriptor {
        self.vol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::dir_entry::{ATTR_ARCHIVE, ATTR_DIRECTORY};
    use crate::filesystem::fat_error::ErrorKind;
    use crate::test_utils::{ImageBuilder, ROOT_CLUS, raw_entry};
    use std::io::Cursor;

    /// Root holds REPORT.TXT and DOCS; DOCS holds `.`, `..` and NOTES.TXT.
    fn sample() -> Session<Cursor<Vec<u8>>> {
        let mut builder = ImageBuilder::new();
        builder
            .label(b"SAMPLE     ")
            .chain(&[5])
            .chain(&[3])
            .chain(&[4])
            .entry(ROOT_CLUS, 0, raw_entry(b"REPORT  TXT", ATTR_ARCHIVE, 5, 13))
            .entry(ROOT_CLUS, 1, raw_entry(b"DOCS       ", ATTR_DIRECTORY, 3, 0))
            .data(5, b"Hello, FAT32!")
            .entry(3, 0, raw_entry(b".          ", ATTR_DIRECTORY, 3, 0))
            .entry(3, 1, raw_entry(b"..         ", ATTR_DIRECTORY, 0, 0))
            .entry(3, 2, raw_entry(b"NOTES   TXT", ATTR_ARCHIVE, 4, 5))
            .data(4, b"notes");
        Session::from_reader(Cursor::new(builder.build()), &SessionOptions::default()).unwrap()
    }

    #[test]
    fn starts_at_the_root() {
        let session = sample();
        assert_eq!(session.current_directory_cluster(), ROOT_CLUS);
        assert!(session.at_root());
        assert_eq!(&session.volume_label(), b"SAMPLE     ");
        assert_eq!(session.volume_info().bytes_per_sector(), 512);
    }

    #[test]
    fn navigates_down_and_back() {
        let mut session = sample();
        let root_listing = session.list().unwrap();

        session.change_directory("docs").unwrap();
        assert_eq!(session.current_directory_cluster(), 3);
        assert_eq!(session.read_file("notes.txt").unwrap(), b"notes");

        session.change_directory(".").unwrap();
        assert_eq!(session.current_directory_cluster(), 3);

        session.change_directory("..").unwrap();
        assert_eq!(session.current_directory_cluster(), ROOT_CLUS);
        assert_eq!(session.list().unwrap(), root_listing);
    }

    #[test]
    fn dotdot_at_the_root_is_a_no_op() {
        let mut session = sample();
        session.change_directory("..").unwrap();
        assert_eq!(session.current_directory_cluster(), ROOT_CLUS);
    }

    #[test]
    fn cd_reports_missing_names_and_files() {
        let mut session = sample();
        let err = session.change_directory("nowhere").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = session.change_directory("report.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotADirectory);
        assert_eq!(session.current_directory_cluster(), ROOT_CLUS);
    }

    #[test]
    fn stat_matches_the_listing() {
        let mut session = sample();
        for entry in session.list().unwrap() {
            let stat = session.stat(&entry.display_name()).unwrap();
            assert_eq!(stat.size(), entry.file_size());
            assert_eq!(stat.cluster(), entry.cluster_number());
            assert_eq!(stat.attr(), entry.attr());
            assert_eq!(stat.cluster_high(), 0);
        }
    }

    #[test]
    fn reads_byte_ranges() {
        let mut session = sample();
        assert_eq!(
            session.read_file_range("REPORT.TXT", 0, 13).unwrap(),
            b"Hello, FAT32!"
        );
        assert_eq!(
            session.read_file_range("report.txt", 7, 100).unwrap(),
            b"FAT32!"
        );

        let err = session.read_file_range("REPORT.TXT", 13, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        let err = session.read_file_range("MISSING.TXT", 0, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn directories_cannot_be_read_as_files() {
        let mut session = sample();

        let err = session.read_file("DOCS").unwrap_err();
        assert!(matches!(err, FATError::IsADirectory(ref name) if name == "DOCS"));
        assert_eq!(err.kind(), ErrorKind::IsADirectory);
        let err = session.read_file_range("docs", 0, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IsADirectory);

        session.change_directory("DOCS").unwrap();
        assert_eq!(
            session.read_file("..").unwrap_err().kind(),
            ErrorKind::IsADirectory
        );
    }

    #[test]
    fn lists_clusters_of_entries() {
        let mut session = sample();
        assert_eq!(session.clusters("REPORT.TXT").unwrap(), vec![5]);
        assert_eq!(session.clusters("DOCS").unwrap(), vec![3]);
    }

    #[test]
    fn close_returns_the_image() {
        let session = sample();
        let image = session.close().into_inner();
        assert_eq!(image.len(), (4 + 2 + 16) * 512);
    }
}
