//! Boot sector decoding.
//!
//! Two levels of checks run on the BIOS Parameter Block (Bpb):
//! - the mandatory ones, without which cluster and FAT offsets cannot be computed
//! - the strict ones, which reject anything that is not a well-formed FAT32 volume

use binread::{BinRead, BinReaderExt};
use getset::CopyGetters;
use std::io::{self, Read, Seek};

use super::fat_error::FATError;
use super::fat_type::FATType;
use crate::image::ImageReader;

/// Size of the boot sector holding the Bpb, whatever the sector size of the volume.
pub const BOOT_SECTOR_SIZE: usize = 512;

/// First 512 bytes of a FAT32 volume: the BIOS Parameter Block and the boot sector around it.
///
/// Fields that navigation never reads are kept to preserve the on-disk layout.
#[derive(BinRead, Debug, CopyGetters)]
#[br(little)]
pub struct Bpb {
    /// `EB xx 90` or `E9 xx xx`
    jmp: [u8; 3],
    #[get_copy = "pub(crate)"]
    oem_name: [u8; 8],
    #[get_copy = "pub(crate)"]
    bytes_per_sec: u16,
    /// Power of two
    #[get_copy = "pub(crate)"]
    sec_per_clus: u8,
    /// Sectors before the first FAT
    #[get_copy = "pub(crate)"]
    rsvd_sec_cnt: u16,
    #[get_copy = "pub(crate)"]
    num_fat: u8,
    /// 0 on FAT32
    #[get_copy = "pub(crate)"]
    root_ent_cnt: u16,
    /// 0 on FAT32
    tot_sec_16: u16,
    _media: u8,
    /// 0 on FAT32
    fat_sz_16: u16,
    _sec_per_trk: u16,
    _num_heads: u16,
    _hidd_sec: u32,
    #[get_copy = "pub(crate)"]
    tot_sec_32: u32,

    // FAT32 extended boot record
    /// Sectors in one FAT copy
    #[get_copy = "pub(crate)"]
    fat_sz_32: u32,
    _ext_flags: u16,
    _fs_ver: u16,
    #[get_copy = "pub(crate)"]
    root_clus: u32,
    _fs_info: u16,
    _bk_boot_sec: u16,
    _reserved: [u8; 12],
    _drv_num: u8,
    _reserved_1: u8,
    _boot_sig: u8,
    #[get_copy = "pub(crate)"]
    vol_id: u32,
    /// Space padded
    #[get_copy = "pub(crate)"]
    vol_lab: [u8; 11],
    _fil_sys_type: [u8; 8],

    #[br(count = 420)]
    _boot_code: Vec<u8>,
    /// `55 AA`
    sig: [u8; 2],
}

impl Bpb {
    /// Reads and validates the Bpb at the start of an image.
    ///
    /// # Parameters
    /// - `reader`: The image containing the filesystem
    /// - `strict`: Whether to perform the full set of FAT32 conformance checks
    ///
    /// # Returns
    /// - `Ok(Bpb)`: The parsed and validated Bpb structure
    /// - `Err(FATError)`: If reading fails or validation fails
    ///
    /// # Errors
    /// - Returns `FATError::IOError` if the image is shorter than a boot sector
    /// - Returns various `FATError` variants if validation fails
    pub fn from<R: Read + Seek>(reader: &mut ImageReader<R>, strict: bool) -> Result<Bpb, FATError> {
        let buf = reader.read_exact_at(0, BOOT_SECTOR_SIZE)?;

        let mut cursor = io::Cursor::new(buf);
        let bpb: Bpb = cursor.read_le()?;

        bpb.validate(reader.len())?;
        if strict {
            bpb.validate_strict(reader.len())
        } else {
            Ok(bpb)
        }
    }

    /// Returns the FAT size in sectors, whichever field holds it.
    pub fn fat_sz(&self) -> u32 {
        if self.fat_sz_16 > 0 {
            self.fat_sz_16 as u32
        } else {
            self.fat_sz_32
        }
    }

    /// Returns the total count of sectors, whichever field holds it.
    pub fn tot_sec(&self) -> u32 {
        if self.tot_sec_16 != 0 {
            self.tot_sec_16 as u32
        } else {
            self.tot_sec_32
        }
    }

    /// Determines the number of clusters in the data section.
    ///
    /// # Returns
    /// - The number of data clusters, 0 if the metadata regions cover the whole volume.
    pub fn cluster_count(&self) -> u32 {
        let root_dir_sectors =
            (self.root_ent_cnt as u32 * 32).div_ceil(self.bytes_per_sec.max(1) as u32);
        let meta_sectors = self.rsvd_sec_cnt as u64
            + self.num_fat as u64 * self.fat_sz() as u64
            + root_dir_sectors as u64;

        let data_sec = (self.tot_sec() as u64).saturating_sub(meta_sectors);
        (data_sec / self.sec_per_clus.max(1) as u64) as u32
    }

    /// Variant of the volume, from its count of data clusters.
    pub fn fat_type(&self) -> FATType {
        FATType::from_cluster_count(self.cluster_count())
    }

    /// Checks the fields every navigation step relies on.
    ///
    /// # Errors
    /// - `FATError::InvalidBytesPerSec`: If bytes per sector is 0 or not a power of two
    /// - `FATError::InvalidSecPerClus`: If sectors per cluster is 0 or not a power of two
    /// - `FATError::InvalidNumFat`: If number of FATs is 0
    /// - `FATError::InvalidFatSz`: If the FAT32 size field is 0
    /// - `FATError::InvalidRootClus`: If root directory cluster is less than 2
    /// - `FATError::InconsistentGeometry`: If the data region starts past the end of the image, or
    ///   the root directory cluster lies past it
    fn validate(&self, image_len: u64) -> Result<(), FATError> {
        if !self.bytes_per_sec.is_power_of_two() {
            return Err(FATError::InvalidBytesPerSec(self.bytes_per_sec));
        }

        if !self.sec_per_clus.is_power_of_two() {
            return Err(FATError::InvalidSecPerClus(self.sec_per_clus));
        }

        if self.num_fat == 0 {
            return Err(FATError::InvalidNumFat(self.num_fat));
        }

        if self.fat_sz_32 == 0 {
            return Err(FATError::InvalidFatSz(String::from(
                "BPB_FATSz32 should be greater than 0 for a FAT32 volume.",
            )));
        }

        if self.root_clus < 2 {
            return Err(FATError::InvalidRootClus(self.root_clus));
        }

        let data_start = self.bytes_per_sec as u64
            * (self.rsvd_sec_cnt as u64 + self.num_fat as u64 * self.fat_sz_32 as u64);
        if data_start >= image_len {
            return Err(FATError::InconsistentGeometry(format!(
                "the data region starts at byte {data_start} but the image is {image_len} bytes long"
            )));
        }

        let cluster_size = self.bytes_per_sec as u64 * self.sec_per_clus as u64;
        let last_cluster = (image_len - data_start) / cluster_size + 1;
        if self.root_clus as u64 > last_cluster {
            return Err(FATError::InconsistentGeometry(format!(
                "the root directory starts at cluster {} but the image ends with cluster {last_cluster}",
                self.root_clus
            )));
        }

        Ok(())
    }

    /// Rejects anything that is not a well-formed FAT32 boot sector.
    ///
    /// # Errors
    /// - `FATError::InvalidJmp`: If the jump instruction is invalid
    /// - `FATError::InvalidBytesPerSec`: If bytes per sector is not a standard value
    /// - `FATError::InvalidClusSz`: If cluster size exceeds 32 KiB
    /// - `FATError::InvalidSignature`: If boot sector signature is not 0x55AA
    /// - `FATError::UnsupportedFATType`: If filesystem is not FAT32
    /// - the errors of [`Bpb::validate_fat32`]
    fn validate_strict(self, image_len: u64) -> Result<Self, FATError> {
        if !((self.jmp[0] == 0xEB && self.jmp[2] == 0x90) || self.jmp[0] == 0xE9) {
            return Err(FATError::InvalidJmp(format!(
                "0x{:02X}{:02X}{:02X}",
                self.jmp[0], self.jmp[1], self.jmp[2],
            )));
        }

        const VALID_BYTES_PER_SEC: [u16; 4] = [512, 1024, 2048, 4096];
        if !VALID_BYTES_PER_SEC.contains(&self.bytes_per_sec) {
            return Err(FATError::InvalidBytesPerSec(self.bytes_per_sec));
        }

        if self.bytes_per_sec as u32 * self.sec_per_clus as u32 > 32 * 1024 {
            return Err(FATError::InvalidClusSz(
                self.bytes_per_sec as u32 * self.sec_per_clus as u32,
            ));
        }

        const SIG: [u8; 2] = [0x55, 0xAA];
        if !self.sig.eq(&SIG) {
            return Err(FATError::InvalidSignature(format!(
                "0x{:02X}{:02X}",
                self.sig[0], self.sig[1]
            )));
        }

        match self.fat_type() {
            FATType::FAT32 => self.validate_fat32(image_len),
            fat_type => Err(FATError::UnsupportedFATType(fat_type.to_string())),
        }
    }

    /// Performs FAT32-specific validation checks.
    ///
    /// # Errors
    /// - `FATError::InvalidRsvdSecCnt`: If reserved sector count is 0
    /// - `FATError::InvalidRootEntCnt`: If root directory entries is not 0
    /// - `FATError::InvalidTotSec`: If total sector fields are invalid for FAT32
    /// - `FATError::InvalidFatSz`: If the 16-bit FAT size field is set
    fn validate_fat32(self, image_len: u64) -> Result<Self, FATError> {
        if self.rsvd_sec_cnt == 0 {
            return Err(FATError::InvalidRsvdSecCnt(self.rsvd_sec_cnt));
        }

        if self.root_ent_cnt != 0 {
            return Err(FATError::InvalidRootEntCnt(self.root_ent_cnt));
        }

        if self.tot_sec_16 != 0 {
            return Err(FATError::InvalidTotSec(String::from(
                "BPB_TotSec16 should be 0 for a FAT32 volume.",
            )));
        }
        if self.tot_sec_32 as u64 * self.bytes_per_sec as u64 > image_len {
            return Err(FATError::InvalidTotSec(format!(
                "BPB_TotSec32 describes {} sectors but the image holds {} bytes.",
                self.tot_sec_32, image_len
            )));
        }

        if self.fat_sz_16 != 0 {
            return Err(FATError::InvalidFatSz(String::from(
                "BPB_FATSz16 should be 0 for a FAT32 volume.",
            )));
        }

        Ok(self)
    }
}
