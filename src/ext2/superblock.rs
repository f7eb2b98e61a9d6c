use tracing::debug;

use crate::util::{read_u16_le, read_u32_le};

use super::device::RawReader;
use super::error::ScanError;

pub const SUPERBLOCK_OFFSET: u64 = 1024;
pub const SUPERBLOCK_SIZE: usize = 1024;
pub const EXT2_SUPER_MAGIC: u16 = 0xEF53;
pub const EXT2_MIN_BLOCK_SIZE: u32 = 1024;
pub const EXT2_MAX_LOG_BLOCK_SIZE: u32 = 6; // 64 KiB

// Revision 0 images predate the dynamic inode fields
const EXT2_GOOD_OLD_REV: u32 = 0;
const EXT2_GOOD_OLD_FIRST_INO: u32 = 11;
const EXT2_GOOD_OLD_INODE_SIZE: u16 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
  pub inodes_count: u32,
  pub blocks_count: u32,
  pub free_blocks_count: u32,
  pub free_inodes_count: u32,
  pub first_data_block: u32,
  pub log_block_size: u32,
  pub blocks_per_group: u32,
  pub inodes_per_group: u32,
  pub magic: u16,
  pub rev_level: u32,
  pub first_ino: u32,
  pub inode_size: u16,
  block_size: u32,
}

impl Superblock {
  pub fn read<R: RawReader>(reader: &mut R) -> Result<Self, ScanError> {
    let bytes = reader.read_vec_at(SUPERBLOCK_OFFSET, SUPERBLOCK_SIZE)?;
    let superblock = Self::parse(&bytes)?;

    debug!(
      blocks = superblock.blocks_count,
      inodes = superblock.inodes_count,
      free_blocks = superblock.free_blocks_count,
      free_inodes = superblock.free_inodes_count,
      block_size = superblock.block_size,
      revision = superblock.rev_level,
      groups = superblock.group_count(),
      "decoded superblock"
    );

    Ok(superblock)
  }

  /// Decode and validate the 1024-byte superblock record.
  pub fn parse(bytes: &[u8]) -> Result<Self, ScanError> {
    if bytes.len() < SUPERBLOCK_SIZE {
      return Err(ScanError::InvalidImage(format!(
        "superblock truncated to {} bytes",
        bytes.len()
      )));
    }

    let magic = read_u16_le(bytes, 56);
    if magic != EXT2_SUPER_MAGIC {
      return Err(ScanError::InvalidImage(format!(
        "bad superblock magic {magic:#06x}"
      )));
    }

    let log_block_size = read_u32_le(bytes, 24);
    if log_block_size > EXT2_MAX_LOG_BLOCK_SIZE {
      return Err(ScanError::InvalidImage(format!(
        "unsupported log block size {log_block_size}"
      )));
    }

    let rev_level = read_u32_le(bytes, 76);
    let (first_ino, inode_size) = if rev_level == EXT2_GOOD_OLD_REV {
      (EXT2_GOOD_OLD_FIRST_INO, EXT2_GOOD_OLD_INODE_SIZE)
    } else {
      (read_u32_le(bytes, 84), read_u16_le(bytes, 88))
    };

    let superblock = Self {
      inodes_count: read_u32_le(bytes, 0),
      blocks_count: read_u32_le(bytes, 4),
      free_blocks_count: read_u32_le(bytes, 12),
      free_inodes_count: read_u32_le(bytes, 16),
      first_data_block: read_u32_le(bytes, 20),
      log_block_size,
      blocks_per_group: read_u32_le(bytes, 32),
      inodes_per_group: read_u32_le(bytes, 40),
      magic,
      rev_level,
      first_ino,
      inode_size,
      block_size: EXT2_MIN_BLOCK_SIZE << log_block_size,
    };

    if superblock.blocks_per_group == 0 || superblock.inodes_per_group == 0 {
      return Err(ScanError::InvalidImage(
        "zero blocks or inodes per group".to_owned(),
      ));
    }
    // Each group has a single block for each of its bitmaps
    let bitmap_bits = superblock.block_size * 8;
    if superblock.blocks_per_group > bitmap_bits || superblock.inodes_per_group > bitmap_bits {
      return Err(ScanError::InvalidImage(format!(
        "{} blocks and {} inodes per group exceed a {bitmap_bits}-bit bitmap",
        superblock.blocks_per_group, superblock.inodes_per_group
      )));
    }
    if superblock.inode_size < EXT2_GOOD_OLD_INODE_SIZE
      || !superblock.inode_size.is_power_of_two()
      || u32::from(superblock.inode_size) > superblock.block_size
    {
      return Err(ScanError::InvalidImage(format!(
        "bad inode size {}",
        superblock.inode_size
      )));
    }

    Ok(superblock)
  }

  /// `1024 << log_block_size`, fixed at decode time.
  pub fn block_size(&self) -> u32 {
    self.block_size
  }

  pub fn group_count(&self) -> u32 {
    ceil_div(self.blocks_count, self.blocks_per_group)
  }

  /// Blocks covered by group `group`; the last group holds the remainder.
  pub fn blocks_in_group(&self, group: u32) -> u32 {
    let before = group.saturating_mul(self.blocks_per_group);
    self
      .blocks_count
      .saturating_sub(before)
      .min(self.blocks_per_group)
  }

  pub fn inodes_in_group(&self, group: u32) -> u32 {
    let before = group.saturating_mul(self.inodes_per_group);
    self
      .inodes_count
      .saturating_sub(before)
      .min(self.inodes_per_group)
  }

  /// Block number described by bit `index` of group `group`'s block bitmap.
  pub fn block_number(&self, group: u32, index: u32) -> u32 {
    self.first_data_block + group * self.blocks_per_group + index
  }

  /// Inode number described by bit `index` of group `group`'s inode bitmap.
  pub fn inode_number(&self, group: u32, index: u32) -> u32 {
    group * self.inodes_per_group + index + 1
  }

  /// The descriptor table lives in the block right after the superblock's.
  pub fn group_descriptor_offset(&self) -> u64 {
    (u64::from(self.first_data_block) + 1) * u64::from(self.block_size)
  }
}

fn ceil_div(a: u32, b: u32) -> u32 {
  a / b + u32::from(a % b != 0)
}


// vim:ts=2 sw=2
