//! FAT32 on-disk structures and the read paths built on them.

pub mod bpb;
pub mod dir_entry;
pub mod directory;
pub mod extract;
pub mod fat;
pub mod fat_error;
pub mod fat_type;
pub mod short_name;
pub mod volume;
