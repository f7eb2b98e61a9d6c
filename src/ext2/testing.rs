//! Synthetic ext2 images for tests.
//!
//! Both layouts use 1 KiB blocks, 64 blocks and 32 inodes, with the superblock
//! in block 1 and the descriptor table in block 2.
//!
//! [`ImageBuilder::new`], one group: 3 block bitmap, 4 inode bitmap,
//! 5..=8 inode table, 9.. free for data.
//!
//! [`ImageBuilder::two_groups`], 32 blocks and 16 inodes per group:
//! group 0 has 3 block bitmap, 4 inode bitmap, 5..=6 inode table;
//! group 1 has 33 block bitmap, 34 inode bitmap, 35..=36 inode table.

use super::inode::EXT2_GOOD_OLD_INODE_SIZE;
use super::superblock::EXT2_SUPER_MAGIC;

pub const BLOCK_SIZE: usize = 1024;
pub const BLOCKS: u32 = 64;
pub const INODES: u32 = 32;

const RESERVED_INODES: u32 = 10;
const DESCRIPTOR_TABLE: usize = 2 * BLOCK_SIZE;
const DESCRIPTOR_SIZE: usize = 32;

#[derive(Debug, Clone, Copy)]
struct GroupLayout {
  block_bitmap: u32,
  inode_bitmap: u32,
  inode_table: u32,
  table_blocks: u32,
}

#[derive(Debug, Clone, Default)]
pub struct InodeSpec {
  mode: u16,
  uid: u32,
  gid: u32,
  links: u16,
  size: u64,
  blocks: u32,
  times: (u32, u32, u32),
  pointers: Vec<(usize, u32)>,
}

impl InodeSpec {
  pub fn new(mode: u16) -> Self {
    Self {
      mode,
      links: 1,
      ..Self::default()
    }
  }

  pub fn owner(mut self, uid: u32, gid: u32) -> Self {
    self.uid = uid;
    self.gid = gid;
    self
  }

  pub fn links(mut self, links: u16) -> Self {
    self.links = links;
    self
  }

  pub fn size(mut self, size: u64) -> Self {
    self.size = size;
    self
  }

  pub fn blocks(mut self, blocks: u32) -> Self {
    self.blocks = blocks;
    self
  }

  /// change, modify, access
  pub fn times(mut self, ctime: u32, mtime: u32, atime: u32) -> Self {
    self.times = (ctime, mtime, atime);
    self
  }

  pub fn pointer(mut self, slot: usize, block: u32) -> Self {
    self.pointers.push((slot, block));
    self
  }
}

pub struct ImageBuilder {
  bytes: Vec<u8>,
  blocks_per_group: u32,
  inodes_per_group: u32,
  groups: Vec<GroupLayout>,
}

impl ImageBuilder {
  pub fn new() -> Self {
    Self::with_groups(8192, INODES, vec![GroupLayout {
      block_bitmap: 3,
      inode_bitmap: 4,
      inode_table: 5,
      table_blocks: 4,
    }])
  }

  pub fn two_groups() -> Self {
    Self::with_groups(32, 16, vec![
      GroupLayout {
        block_bitmap: 3,
        inode_bitmap: 4,
        inode_table: 5,
        table_blocks: 2,
      },
      GroupLayout {
        block_bitmap: 33,
        inode_bitmap: 34,
        inode_table: 35,
        table_blocks: 2,
      },
    ])
  }

  fn with_groups(blocks_per_group: u32, inodes_per_group: u32, groups: Vec<GroupLayout>) -> Self {
    let mut builder = Self {
      bytes: vec![0u8; BLOCKS as usize * BLOCK_SIZE],
      blocks_per_group,
      inodes_per_group,
      groups,
    };

    let sb = BLOCK_SIZE;
    builder.write_u32(sb, INODES);
    builder.write_u32(sb + 4, BLOCKS);
    builder.write_u32(sb + 20, 1); // first data block
    builder.write_u32(sb + 24, 0); // 1 KiB blocks
    builder.write_u32(sb + 32, blocks_per_group);
    builder.write_u32(sb + 40, inodes_per_group);
    builder.write_bytes(sb + 56, &EXT2_SUPER_MAGIC.to_le_bytes());
    builder.write_u32(sb + 76, 1); // dynamic revision
    builder.write_u32(sb + 84, RESERVED_INODES + 1);
    builder.write_bytes(sb + 88, &(EXT2_GOOD_OLD_INODE_SIZE as u16).to_le_bytes());

    builder.mark_block_used(1);
    builder.mark_block_used(2);
    for (number, layout) in builder.groups.clone().into_iter().enumerate() {
      let gd = DESCRIPTOR_TABLE + number * DESCRIPTOR_SIZE;
      builder.write_u32(gd, layout.block_bitmap);
      builder.write_u32(gd + 4, layout.inode_bitmap);
      builder.write_u32(gd + 8, layout.inode_table);

      builder.mark_block_used(layout.block_bitmap);
      builder.mark_block_used(layout.inode_bitmap);
      for block in layout.inode_table..layout.inode_table + layout.table_blocks {
        builder.mark_block_used(block);
      }
    }
    // mke2fs pads the bitmap past the last block
    builder.mark_block_used(BLOCKS);

    for inode in 1..=RESERVED_INODES {
      builder.mark_inode_used(inode);
    }

    builder
  }

  pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) {
    self.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
  }

  fn write_u32(&mut self, offset: usize, value: u32) {
    self.write_bytes(offset, &value.to_le_bytes());
  }

  fn write_u16(&mut self, offset: usize, value: u16) {
    self.write_bytes(offset, &value.to_le_bytes());
  }

  fn set_bit(&mut self, bitmap_block: u32, index: u32) {
    let byte = bitmap_block as usize * BLOCK_SIZE + index as usize / 8;
    self.bytes[byte] |= 1 << (index % 8);
  }

  fn inode_slot(&self, inode: u32) -> (GroupLayout, u32) {
    let group = (inode - 1) / self.inodes_per_group;
    (self.groups[group as usize], (inode - 1) % self.inodes_per_group)
  }

  pub fn mark_block_used(&mut self, block: u32) {
    let group = (block - 1) / self.blocks_per_group;
    let bitmap = self.groups[group as usize].block_bitmap;
    self.set_bit(bitmap, (block - 1) % self.blocks_per_group);
  }

  pub fn mark_inode_used(&mut self, inode: u32) {
    let (layout, index) = self.inode_slot(inode);
    self.set_bit(layout.inode_bitmap, index);
  }

  /// Free counts recorded in group 0's descriptor.
  pub fn set_free_counts(&mut self, blocks: u16, inodes: u16) {
    self.write_u16(DESCRIPTOR_TABLE + 12, blocks);
    self.write_u16(DESCRIPTOR_TABLE + 14, inodes);
  }

  /// Repoint group 0's inode table without moving any inode bytes.
  pub fn set_inode_table(&mut self, block: u32) {
    self.write_u32(DESCRIPTOR_TABLE + 8, block);
  }

  /// Write inode `number` into its group's table and mark it used.
  pub fn write_inode(&mut self, number: u32, spec: InodeSpec) {
    let (layout, index) = self.inode_slot(number);
    let base = layout.inode_table as usize * BLOCK_SIZE + index as usize * EXT2_GOOD_OLD_INODE_SIZE;
    let (ctime, mtime, atime) = spec.times;

    self.write_u16(base, spec.mode);
    self.write_u16(base + 2, spec.uid as u16);
    self.write_u32(base + 4, spec.size as u32);
    self.write_u32(base + 8, atime);
    self.write_u32(base + 12, ctime);
    self.write_u32(base + 16, mtime);
    self.write_u16(base + 24, spec.gid as u16);
    self.write_u16(base + 26, spec.links);
    self.write_u32(base + 28, spec.blocks);
    for (slot, block) in spec.pointers {
      self.write_u32(base + 40 + slot * 4, block);
    }
    self.write_u32(base + 108, (spec.size >> 32) as u32);
    self.write_u16(base + 120, (spec.uid >> 16) as u16);
    self.write_u16(base + 122, (spec.gid >> 16) as u16);

    self.mark_inode_used(number);
  }

  /// Fill `block` with pointer slots; unspecified slots stay zero.
  pub fn write_pointers(&mut self, block: u32, slots: &[(usize, u32)]) {
    let base = block as usize * BLOCK_SIZE;
    for &(slot, pointer) in slots {
      self.write_u32(base + slot * 4, pointer);
    }
  }

  pub fn write_dirents(&mut self, block: u32, entries: &[(u32, &str, u16)]) {
    let base = block as usize * BLOCK_SIZE;
    let bytes = dirent_block(BLOCK_SIZE, entries);
    self.write_bytes(base, &bytes);
  }

  pub fn build(self) -> Vec<u8> {
    self.bytes
  }
}

/// Lay out `(inode, name, rec_len)` records back to back in a zeroed block.
pub fn dirent_block(block_size: usize, entries: &[(u32, &str, u16)]) -> Vec<u8> {
  let mut bytes = vec![0u8; block_size];
  let mut cursor = 0;

  for &(inode, name, rec_len) in entries {
    bytes[cursor..cursor + 4].copy_from_slice(&inode.to_le_bytes());
    bytes[cursor + 4..cursor + 6].copy_from_slice(&rec_len.to_le_bytes());
    bytes[cursor + 6] = name.len() as u8;
    bytes[cursor + 8..cursor + 8 + name.len()].copy_from_slice(name.as_bytes());
    cursor += rec_len as usize;
  }

  bytes
}

// vim:ts=2 sw=2
