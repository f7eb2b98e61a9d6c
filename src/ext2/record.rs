use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::util::format_time;

use super::dirent::DirectoryEntry;
use super::group::GroupDescriptor;
use super::indirect::IndirectReference;
use super::inode::Inode;
use super::superblock::Superblock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
  Superblock,
  Group,
  Bfree,
  Ifree,
  Inode,
  Dirent,
  Indirect,
}

impl RecordKind {
  pub const ALL: [RecordKind; 7] = [
    RecordKind::Superblock,
    RecordKind::Group,
    RecordKind::Bfree,
    RecordKind::Ifree,
    RecordKind::Inode,
    RecordKind::Dirent,
    RecordKind::Indirect,
  ];
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
  Superblock(Superblock),
  Group {
    number: u32,
    blocks: u32,
    inodes: u32,
    descriptor: GroupDescriptor,
  },
  BlockFree(u32),
  InodeFree(u32),
  Inode(Inode),
  Dirent {
    parent: u32,
    /// Byte offset of the entry in the directory's logical address space.
    offset: u64,
    entry: DirectoryEntry,
  },
  Indirect(IndirectReference),
}

impl Record {
  pub fn kind(&self) -> RecordKind {
    match self {
      Record::Superblock(_) => RecordKind::Superblock,
      Record::Group { .. } => RecordKind::Group,
      Record::BlockFree(_) => RecordKind::Bfree,
      Record::InodeFree(_) => RecordKind::Ifree,
      Record::Inode(_) => RecordKind::Inode,
      Record::Dirent { .. } => RecordKind::Dirent,
      Record::Indirect(_) => RecordKind::Indirect,
    }
  }
}

impl fmt::Display for Record {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Record::Superblock(superblock) => write!(
        f,
        "SUPERBLOCK,{},{},{},{},{},{},{}",
        superblock.blocks_count,
        superblock.inodes_count,
        superblock.block_size(),
        superblock.inode_size,
        superblock.blocks_per_group,
        superblock.inodes_per_group,
        superblock.first_ino,
      ),
      Record::Group {
        number,
        blocks,
        inodes,
        descriptor,
      } => write!(
        f,
        "GROUP,{number},{blocks},{inodes},{},{},{},{},{}",
        descriptor.free_blocks_count,
        descriptor.free_inodes_count,
        descriptor.block_bitmap,
        descriptor.inode_bitmap,
        descriptor.inode_table,
      ),
      Record::BlockFree(block) => write!(f, "BFREE,{block}"),
      Record::InodeFree(inode) => write!(f, "IFREE,{inode}"),
      Record::Inode(inode) => {
        write!(
          f,
          "INODE,{},{},{:o},{},{},{},{},{},{},{},{}",
          inode.number,
          inode.file_type.type_char(),
          inode.permissions(),
          inode.uid,
          inode.gid,
          inode.links_count,
          format_time(inode.ctime),
          format_time(inode.mtime),
          format_time(inode.atime),
          inode.size,
          inode.blocks,
        )?;

        let blocks = inode.reported_blocks();
        if !blocks.is_empty() {
          write!(f, ",{}", blocks.iter().join(","))?;
        }

        Ok(())
      },
      Record::Dirent {
        parent,
        offset,
        entry,
      } => write!(
        f,
        "DIRENT,{parent},{offset},{},{},{},'{}'",
        entry.inode, entry.rec_len, entry.name_len, entry.name,
      ),
      Record::Indirect(reference) => write!(
        f,
        "INDIRECT,{},{},{},{},{}",
        reference.inode,
        reference.level,
        reference.logical_offset,
        reference.indirect_block,
        reference.referenced_block,
      ),
    }
  }
}


// vim:ts=2 sw=2
