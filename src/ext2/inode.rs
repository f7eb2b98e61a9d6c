use tracing::trace;

use crate::util::{read_u16_le, read_u32_le};

use super::device::RawReader;
use super::error::ScanError;
use super::image::Ext2Image;

pub const EXT2_GOOD_OLD_INODE_SIZE: usize = 128;
pub const EXT2_NDIR_BLOCKS: usize = 12;
pub const EXT2_IND_BLOCK: usize = EXT2_NDIR_BLOCKS;
pub const EXT2_DIND_BLOCK: usize = EXT2_IND_BLOCK + 1;
pub const EXT2_TIND_BLOCK: usize = EXT2_DIND_BLOCK + 1;
pub const EXT2_N_BLOCKS: usize = EXT2_TIND_BLOCK + 1;

/// Symlink targets up to this length live inside the block array.
pub const FAST_SYMLINK_MAX_SIZE: u64 = 60;

const S_IFMT: u16 = 0o170000;
const S_IFREG: u16 = 0o100000;
const S_IFDIR: u16 = 0o040000;
const S_IFLNK: u16 = 0o120000;

///   type  suid/sgid/sticky  user group others
///   |     |                 |    |     |
///   tttt  sss               rwx  rwx   rwx
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
  RegularFile,
  Directory,
  SymbolicLink,
  /// All type bits zero: the slot is not in use.
  Unused,
  Other,
}

impl FileType {
  pub fn from_mode(mode: u16) -> Self {
    match mode & S_IFMT {
      0 => FileType::Unused,
      S_IFREG => FileType::RegularFile,
      S_IFDIR => FileType::Directory,
      S_IFLNK => FileType::SymbolicLink,
      _ => FileType::Other,
    }
  }

  pub fn type_char(self) -> char {
    match self {
      FileType::RegularFile => 'f',
      FileType::Directory => 'd',
      FileType::SymbolicLink => 's',
      FileType::Unused | FileType::Other => '?',
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
  pub number: u32,
  pub mode: u16,
  pub file_type: FileType,
  pub uid: u32,
  pub gid: u32,
  pub links_count: u16,
  pub ctime: u32,
  pub mtime: u32,
  pub atime: u32,
  pub size: u64,
  /// Usage in 512-byte units, not filesystem blocks.
  pub blocks: u32,
  pub block: [u32; EXT2_N_BLOCKS],
}

impl Inode {
  /// Read inode `number` from its group's inode table.
  ///
  /// Returns `None` for an inode whose type bits are clear, whatever the
  /// bitmap claims about it.
  pub fn read<R: RawReader>(
    image: &mut Ext2Image<R>,
    number: u32,
  ) -> Result<Option<Self>, ScanError> {
    let offset = Self::offset(image, number)?;
    let mut bytes = [0u8; EXT2_GOOD_OLD_INODE_SIZE];
    image.read_at(offset, &mut bytes)?;

    let inode = Self::parse(number, &bytes);
    if inode.file_type == FileType::Unused {
      trace!(inode = number, "type bits clear, not in use");
      return Ok(None);
    }

    trace!(inode = number, mode = inode.mode, size = inode.size, "decoded inode");
    Ok(Some(inode))
  }

  /// Byte offset of inode `number`, checked against the filesystem size.
  pub fn offset<R: RawReader>(image: &Ext2Image<R>, number: u32) -> Result<u64, ScanError> {
    let superblock = image.superblock();
    if number == 0 || number > superblock.inodes_count {
      return Err(ScanError::InvalidImage(format!(
        "inode {number} outside 1..={}",
        superblock.inodes_count
      )));
    }

    let group = (number - 1) / superblock.inodes_per_group;
    let index = u64::from((number - 1) % superblock.inodes_per_group);
    let inode_table = image
      .group(group)
      .map(|descriptor| descriptor.inode_table)
      .ok_or_else(|| ScanError::InvalidImage(format!("inode {number} has no group {group}")))?;

    let byte_in_table = index * u64::from(superblock.inode_size);
    let block_size = u64::from(image.block_size());
    let block = u64::from(inode_table) + byte_in_table / block_size;

    Ok(image.block_offset(block)? + byte_in_table % block_size)
  }

  pub fn parse(number: u32, bytes: &[u8]) -> Self {
    let mode = read_u16_le(bytes, 0);
    let file_type = FileType::from_mode(mode);

    // Linux keeps the high halves of the ids in osd2
    let uid = u32::from(read_u16_le(bytes, 2)) | u32::from(read_u16_le(bytes, 120)) << 16;
    let gid = u32::from(read_u16_le(bytes, 24)) | u32::from(read_u16_le(bytes, 122)) << 16;

    let mut size = u64::from(read_u32_le(bytes, 4));
    if file_type == FileType::RegularFile {
      size |= u64::from(read_u32_le(bytes, 108)) << 32;
    }

    let mut block = [0u32; EXT2_N_BLOCKS];
    for (slot, pointer) in block.iter_mut().enumerate() {
      *pointer = read_u32_le(bytes, 40 + slot * 4);
    }

    Self {
      number,
      mode,
      file_type,
      uid,
      gid,
      links_count: read_u16_le(bytes, 26),
      atime: read_u32_le(bytes, 8),
      ctime: read_u32_le(bytes, 12),
      mtime: read_u32_le(bytes, 16),
      size,
      blocks: read_u32_le(bytes, 28),
      block,
    }
  }

  /// Permission and set-id bits, without the type.
  pub fn permissions(&self) -> u16 {
    self.mode & !S_IFMT
  }

  pub fn is_directory(&self) -> bool {
    self.file_type == FileType::Directory
  }

  pub fn is_fast_symlink(&self) -> bool {
    self.file_type == FileType::SymbolicLink && self.size <= FAST_SYMLINK_MAX_SIZE
  }

  /// Whether the block array holds block pointers rather than inline data.
  pub fn has_block_map(&self) -> bool {
    !self.is_fast_symlink()
  }

  /// The block pointers worth printing for this inode.
  pub fn reported_blocks(&self) -> &[u32] {
    match self.file_type {
      FileType::RegularFile | FileType::Directory => &self.block,
      FileType::SymbolicLink if !self.is_fast_symlink() => &self.block,
      _ => &[],
    }
  }

  pub fn direct_blocks(&self) -> &[u32] {
    &self.block[..EXT2_NDIR_BLOCKS]
  }
}


// vim:ts=2 sw=2
