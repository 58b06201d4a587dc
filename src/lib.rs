//!
//! fat_navigator: A library and CLI for browsing FAT32 disk images.
//!
//! This crate provides tools for:
//! - Parsing and validating the BIOS Parameter Block of a FAT32 volume
//! - Following cluster chains through the File Allocation Table
//! - Listing directories and resolving 8.3 names
//! - Extracting whole files or byte ranges
//!
//! The library is read-only. [`Session`] is its entry point; the `main` binary wraps it in an
//! interactive shell.
//!
//! # Re-exports
//! - [`Session`]: An open image and its current directory
//! - [`FATError`]: The error type of every operation

pub mod commands;
pub mod filesystem;
pub mod image;
pub mod session;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// Error type of the crate (see [`filesystem::fat_error::FATError`]).
pub use crate::filesystem::fat_error::{ErrorKind, FATError};
/// Directory entry (see [`filesystem::dir_entry::DirEntry`]).
pub use crate::filesystem::dir_entry::DirEntry;
/// Volume geometry (see [`filesystem::volume::VolumeDescriptor`]).
pub use crate::filesystem::volume::VolumeDescriptor;
/// Browsing session (see [`session::Session`]).
pub use crate::session::{Session, SessionOptions, StatInfo};
