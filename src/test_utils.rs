//! Crafted FAT32 images for the tests.
//!
//! Only built for the tests of this crate, or with the `test-utils` feature.
//!
//! The images are tiny (a handful of clusters) so they never pass the FAT32 cluster-count check
//! of strict validation; everything else about them is well formed.

use std::io::Cursor;

use crate::image::ImageReader;

pub const BYTES_PER_SEC: usize = 512;
pub const RSVD_SEC_CNT: usize = 4;
pub const NUM_FAT: usize = 2;
pub const FAT_SZ: usize = 1;
pub const ROOT_CLUS: u32 = 2;
pub const EOC: u32 = 0x0FFF_FFFF;

/// Builds a raw FAT32 image in memory.
pub struct ImageBuilder {
    image: Vec<u8>,
    sec_per_clus: usize,
}

impl ImageBuilder {
    /// One sector per cluster, 16 data clusters.
    pub fn new() -> Self {
        Self::with_geometry(1, 16)
    }

    pub fn with_geometry(sec_per_clus: u8, clusters: u32) -> Self {
        let data_sectors = clusters as usize * sec_per_clus as usize;
        let tot_sec = RSVD_SEC_CNT + NUM_FAT * FAT_SZ + data_sectors;
        let mut builder = Self {
            image: vec![0; tot_sec * BYTES_PER_SEC],
            sec_per_clus: sec_per_clus as usize,
        };

        builder
            .patch(0, &[0xEB, 0x58, 0x90])
            .patch(3, b"MSWIN4.1")
            .patch(11, &(BYTES_PER_SEC as u16).to_le_bytes())
            .patch(13, &[sec_per_clus])
            .patch(14, &(RSVD_SEC_CNT as u16).to_le_bytes())
            .patch(16, &[NUM_FAT as u8])
            .patch(21, &[0xF8])
            .patch(32, &(tot_sec as u32).to_le_bytes())
            .patch(36, &(FAT_SZ as u32).to_le_bytes())
            .patch(44, &ROOT_CLUS.to_le_bytes())
            .patch(48, &1u16.to_le_bytes())
            .patch(50, &6u16.to_le_bytes())
            .patch(64, &[0x80])
            .patch(66, &[0x29])
            .patch(67, &0x1234_5678u32.to_le_bytes())
            .patch(71, b"NO NAME    ")
            .patch(82, b"FAT32   ")
            .patch(510, &[0x55, 0xAA])
            .fat(0, 0x0FFF_FFF8)
            .fat(1, EOC)
            .fat(ROOT_CLUS, EOC);
        builder
    }

    pub fn cluster_size(&self) -> usize {
        self.sec_per_clus * BYTES_PER_SEC
    }

    /// Overwrites raw bytes of the image.
    pub fn patch(&mut self, offset: usize, bytes: &[u8]) -> &mut Self {
        self.image[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn label(&mut self, label: &[u8; 11]) -> &mut Self {
        self.patch(71, label)
    }

    /// Sets the FAT entry of `cluster` in every FAT copy.
    pub fn fat(&mut self, cluster: u32, value: u32) -> &mut Self {
        for i in 0..NUM_FAT {
            let off = (RSVD_SEC_CNT + i * FAT_SZ) * BYTES_PER_SEC + cluster as usize * 4;
            self.patch(off, &value.to_le_bytes());
        }
        self
    }

    /// Links `clusters` in order and terminates the chain.
    pub fn chain(&mut self, clusters: &[u32]) -> &mut Self {
        for pair in clusters.windows(2) {
            self.fat(pair[0], pair[1]);
        }
        if let Some(last) = clusters.last() {
            self.fat(*last, EOC);
        }
        self
    }

    pub fn cluster_offset(&self, cluster: u32) -> usize {
        (RSVD_SEC_CNT + NUM_FAT * FAT_SZ) * BYTES_PER_SEC
            + (cluster as usize - 2) * self.cluster_size()
    }

    /// Writes `data` at the start of `cluster`, spilling over the following clusters on disk.
    pub fn data(&mut self, cluster: u32, data: &[u8]) -> &mut Self {
        let off = self.cluster_offset(cluster);
        self.patch(off, data)
    }

    /// Writes a 32-byte directory record in slot `slot` of `dir_cluster`.
    pub fn entry(&mut self, dir_cluster: u32, slot: usize, record: [u8; 32]) -> &mut Self {
        let off = self.cluster_offset(dir_cluster) + slot * 32;
        self.patch(off, &record)
    }

    pub fn build(&self) -> Vec<u8> {
        self.image.clone()
    }

    pub fn reader(&self) -> ImageReader<Cursor<Vec<u8>>> {
        ImageReader::new(Cursor::new(self.build())).unwrap()
    }
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes a short directory record.
pub fn raw_entry(name: &[u8; 11], attr: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut record = [0u8; 32];
    record[..11].copy_from_slice(name);
    record[11] = attr;
    record[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    record[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    record[28..32].copy_from_slice(&size.to_le_bytes());
    record
}
