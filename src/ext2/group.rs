use tracing::debug;

use crate::util::{read_u16_le, read_u32_le};

use super::device::RawReader;
use super::error::ScanError;
use super::superblock::Superblock;

pub const GROUP_DESCRIPTOR_SIZE: usize = 32;

/// One entry of the block group descriptor table.
///
/// Values are taken as they are on disk; a damaged descriptor simply
/// produces damaged numbers further down.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GroupDescriptor {
  pub block_bitmap: u32,
  pub inode_bitmap: u32,
  pub inode_table: u32,
  pub free_blocks_count: u16,
  pub free_inodes_count: u16,
  pub used_dirs_count: u16,
}

impl GroupDescriptor {
  pub fn parse(bytes: &[u8]) -> Self {
    Self {
      block_bitmap: read_u32_le(bytes, 0),
      inode_bitmap: read_u32_le(bytes, 4),
      inode_table: read_u32_le(bytes, 8),
      free_blocks_count: read_u16_le(bytes, 12),
      free_inodes_count: read_u16_le(bytes, 14),
      used_dirs_count: read_u16_le(bytes, 16),
    }
  }

  pub fn read_table<R: RawReader>(
    reader: &mut R,
    superblock: &Superblock,
  ) -> Result<Vec<Self>, ScanError> {
    let count = superblock.group_count() as usize;
    let offset = superblock.group_descriptor_offset();
    let bytes = reader.read_vec_at(offset, count * GROUP_DESCRIPTOR_SIZE)?;

    let groups: Vec<Self> = bytes
      .chunks_exact(GROUP_DESCRIPTOR_SIZE)
      .map(Self::parse)
      .collect();

    for (number, group) in groups.iter().enumerate() {
      debug!(
        group = number,
        block_bitmap = group.block_bitmap,
        inode_bitmap = group.inode_bitmap,
        inode_table = group.inode_table,
        "decoded group descriptor"
      );
    }

    Ok(groups)
  }
}


// vim:ts=2 sw=2
