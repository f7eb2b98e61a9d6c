//! Read-only walker over the metadata of an ext2 image.
//!
//! [`Ext2Image::open`] decodes the superblock and the group descriptor table;
//! [`Scanner`] then enumerates free blocks, free inodes, inodes, directory
//! entries and indirect block references as [`record::Record`]s.

pub mod bitmap;
pub mod device;
pub mod dirent;
pub mod emit;
pub mod error;
pub mod group;
pub mod image;
pub mod indirect;
pub mod inode;
pub mod record;
pub mod scan;
pub mod superblock;

#[cfg(test)]
pub(crate) mod testing;

pub use emit::CsvEmitter;
pub use error::ScanError;
pub use image::Ext2Image;
pub use record::RecordKind;
pub use scan::Scanner;

// vim:ts=2 sw=2
