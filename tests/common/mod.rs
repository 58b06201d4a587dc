//! Crafted FAT32 images for the integration tests.
//!
//! Geometry: 512 bytes per sector, one sector per cluster, 4 reserved sectors, two one-sector
//! FATs and 32 data clusters. The root directory lives in cluster 2.
#![allow(dead_code)]

use std::io::{Cursor, Write};

use fat_navigator::test_utils::ImageBuilder;
use fat_navigator::{Session, SessionOptions};
use tempfile::NamedTempFile;

pub use fat_navigator::filesystem::dir_entry::{ATTR_ARCHIVE, ATTR_DIRECTORY};
pub use fat_navigator::test_utils::{EOC, ROOT_CLUS as ROOT, raw_entry};

pub fn test_image() -> ImageBuilder {
    let mut image = ImageBuilder::with_geometry(1, 32);
    image.label(b"TESTVOL    ");
    image
}

pub fn open_session(image: &ImageBuilder) -> Session<Cursor<Vec<u8>>> {
    Session::from_reader(Cursor::new(image.build()), &SessionOptions::default()).unwrap()
}

/// Writes the image to a temporary file, deleted when the returned handle drops.
pub fn temp_file(image: &ImageBuilder) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&image.build()).unwrap();
    file.flush().unwrap();
    file
}
