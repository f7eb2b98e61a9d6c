use super::device::RawReader;
use super::error::ScanError;
use super::group::GroupDescriptor;
use super::superblock::Superblock;

/// An opened image: the reader plus the structural tables every other
/// decoder needs to turn block numbers into byte offsets.
///
/// Read-only after `open`; each image gets its own.
#[derive(Debug)]
pub struct Ext2Image<R> {
  reader: R,
  superblock: Superblock,
  groups: Vec<GroupDescriptor>,
}

impl<R: RawReader> Ext2Image<R> {
  /// Decode the superblock and group descriptor table. Both are fatal on failure.
  pub fn open(mut reader: R) -> Result<Self, ScanError> {
    let superblock = Superblock::read(&mut reader)?;
    let groups = GroupDescriptor::read_table(&mut reader, &superblock)?;

    Ok(Self::from_parts(reader, superblock, groups))
  }

  pub fn from_parts(reader: R, superblock: Superblock, groups: Vec<GroupDescriptor>) -> Self {
    Self {
      reader,
      superblock,
      groups,
    }
  }

  pub fn superblock(&self) -> &Superblock {
    &self.superblock
  }

  pub fn groups(&self) -> &[GroupDescriptor] {
    &self.groups
  }

  pub fn group(&self, number: u32) -> Option<&GroupDescriptor> {
    self.groups.get(number as usize)
  }

  pub fn block_size(&self) -> u32 {
    self.superblock.block_size()
  }

  /// Byte offset of `block`, refusing blocks the filesystem does not have.
  pub fn block_offset(&self, block: u64) -> Result<u64, ScanError> {
    let total = self.superblock.blocks_count;
    if block >= u64::from(total) {
      return Err(ScanError::BlockOutOfRange { block, total });
    }

    Ok(block * u64::from(self.block_size()))
  }

  pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), ScanError> {
    self.reader.read_at(offset, buf)?;
    Ok(())
  }

  pub fn read_block(&mut self, block: u32) -> Result<Vec<u8>, ScanError> {
    let offset = self.block_offset(u64::from(block))?;
    let bytes = self.reader.read_vec_at(offset, self.block_size() as usize)?;
    Ok(bytes)
  }

  /// Read `block` as an array of 32-bit block pointers.
  pub fn read_pointers(&mut self, block: u32) -> Result<Vec<u32>, ScanError> {
    let bytes = self.read_block(block)?;
    Ok(
      bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect(),
    )
  }
}


// vim:ts=2 sw=2
