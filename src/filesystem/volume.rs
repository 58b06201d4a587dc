//! Typed description of an open FAT32 volume and its address arithmetic.
//!
//! [`VolumeDescriptor`] is the immutable snapshot taken from the Bpb when an image is opened.
//! It knows where each region starts and how to turn a cluster number into a byte offset.

use getset::CopyGetters;
use std::fmt::Write as FmtWrite;

use super::bpb::Bpb;
use super::fat_error::FATError;
use crate::traits::LayoutDisplay;

/// Size in bytes of a FAT32 table entry.
pub const FAT_ENTRY_SIZE: u64 = 4;

/// Geometry of a FAT32 volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct VolumeDescriptor {
    /// OEM identifier, space padded.
    oem_name: [u8; 8],
    bytes_per_sector: u16,
    sectors_per_cluster: u8,
    reserved_sectors: u16,
    num_fats: u8,
    /// Informational only, 0 on a FAT32 volume.
    root_entry_count: u16,
    /// Size of one FAT in sectors.
    fat_size: u32,
    root_cluster: u32,
    volume_id: u32,
    /// Volume label from the boot sector, space padded.
    volume_label: [u8; 11],
    /// Length of the image in bytes.
    image_len: u64,
}

impl VolumeDescriptor {
    /// Takes the snapshot of an already validated Bpb.
    pub fn from_bpb(bpb: &Bpb, image_len: u64) -> Self {
        Self {
            oem_name: bpb.oem_name(),
            bytes_per_sector: bpb.bytes_per_sec(),
            sectors_per_cluster: bpb.sec_per_clus(),
            reserved_sectors: bpb.rsvd_sec_cnt(),
            num_fats: bpb.num_fat(),
            root_entry_count: bpb.root_ent_cnt(),
            fat_size: bpb.fat_sz_32(),
            root_cluster: bpb.root_clus(),
            volume_id: bpb.vol_id(),
            volume_label: bpb.vol_lab(),
            image_len,
        }
    }

    /// Returns the size of a cluster in bytes.
    pub fn cluster_size(&self) -> u64 {
        self.bytes_per_sector as u64 * self.sectors_per_cluster as u64
    }

    /// Returns the byte offset of the first FAT.
    pub fn fat_start(&self) -> u64 {
        self.reserved_sectors as u64 * self.bytes_per_sector as u64
    }

    /// Returns the size of one FAT in bytes.
    pub fn fat_bytes(&self) -> u64 {
        self.fat_size as u64 * self.bytes_per_sector as u64
    }

    /// Returns the byte offset of the data region, where cluster 2 lives.
    pub fn data_start(&self) -> u64 {
        self.bytes_per_sector as u64
            * (self.reserved_sectors as u64 + self.num_fats as u64 * self.fat_size as u64)
    }

    /// Returns the number of clusters the image actually holds, whole clusters only.
    pub fn cluster_count(&self) -> u64 {
        self.image_len.saturating_sub(self.data_start()) / self.cluster_size()
    }

    /// Tells whether `cluster` is a data cluster held by the image.
    pub fn is_data_cluster(&self, cluster: u32) -> bool {
        cluster >= 2 && (cluster as u64) < self.cluster_count() + 2
    }

    /// Maps the directory alias 0 onto the root cluster.
    ///
    /// # Errors
    /// - `FATError::InvalidCluster` for the reserved cluster 1
    pub fn resolve_cluster(&self, cluster: u32) -> Result<u32, FATError> {
        match cluster {
            0 => Ok(self.root_cluster),
            1 => Err(FATError::InvalidCluster(1)),
            c => Ok(c),
        }
    }

    /// Converts a cluster number to the byte offset of its first byte.
    ///
    /// Cluster 0 designates the root directory, as the `..` entries of first-level directories
    /// do.
    ///
    /// # Errors
    /// - `FATError::InvalidCluster` for the reserved cluster 1
    pub fn cluster_to_byte_offset(&self, cluster: u32) -> Result<u64, FATError> {
        let cluster = self.resolve_cluster(cluster)?;
        Ok((cluster as u64 - 2) * self.cluster_size() + self.data_start())
    }

    /// Returns the byte offset of the FAT entry describing `cluster`.
    ///
    /// # Errors
    /// - `FATError::InvalidCluster` if the entry lies outside the first FAT
    pub fn fat_entry_offset(&self, cluster: u32) -> Result<u64, FATError> {
        let rel = cluster as u64 * FAT_ENTRY_SIZE;
        if rel + FAT_ENTRY_SIZE > self.fat_bytes() {
            return Err(FATError::InvalidCluster(cluster));
        }
        Ok(self.fat_start() + rel)
    }

    /// Returns the volume label without its padding.
    pub fn label_str(&self) -> String {
        String::from_utf8_lossy(&self.volume_label)
            .trim_end()
            .to_string()
    }
}

/// Draws the regions of the volume, in sectors.
impl LayoutDisplay for VolumeDescriptor {
    fn display_layout(&self, indent: u8) -> Result<String, std::fmt::Error> {
        let mut out = String::from("");
        let indent = " ".repeat(indent.into());
        let bps = self.bytes_per_sector as u64;

        let fat_start = self.fat_start() / bps;
        let data_start = self.data_start() / bps;
        let data_end = data_start + self.cluster_count() * self.sectors_per_cluster as u64;
        let image_end = self.image_len / bps;

        writeln!(out, "{}┌{:─^55}┐", indent, " FAT32 Volume Layout ")?;
        writeln!(
            out,
            "{}├{:^12}┬{:^12}┬{:^12}┬{:^16}┤",
            indent, "Region", "Start", "End", "Description"
        )?;
        writeln!(
            out,
            "{}├{:─<12}┼{:─<12}┼{:─<12}┼{:─<16}┤",
            indent, "", "", "", ""
        )?;

        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent, "Reserved", 0, fat_start, "Boot + Reserved"
        )?;
        for i in 0..self.num_fats as u64 {
            let fat_i_start = fat_start + i * self.fat_size as u64;
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent,
                format!("FAT #{}", i),
                fat_i_start,
                fat_i_start + self.fat_size as u64,
                "FAT Tables"
            )?;
        }
        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent, "Data", data_start, data_end, "Cluster Data"
        )?;
        if data_end < image_end {
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent, "", data_end, image_end, "Image Slack"
            )?;
        }

        writeln!(
            out,
            "{}└{:─<12}┴{:─<12}┴{:─<12}┴{:─<16}┘",
            indent, "", "", "", ""
        )?;

        Ok(out)
    }
}
