use crate::util::get_bit_at;

use super::device::RawReader;
use super::error::ScanError;
use super::image::Ext2Image;

/// One block of a block or inode bitmap. Bit `k` stands for the group's
/// `k`-th entity, which is entity number `k + 1` for 1-indexed inodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
  bytes: Vec<u8>,
}

impl Bitmap {
  pub fn load<R: RawReader>(image: &mut Ext2Image<R>, block: u32) -> Result<Self, ScanError> {
    Ok(Self::from_bytes(image.read_block(block)?))
  }

  pub fn from_bytes(bytes: Vec<u8>) -> Self {
    Self { bytes }
  }

  /// Number of bits the bitmap can answer for.
  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.bytes.len() * 8
  }

  /// Indices past the end of the buffer read as free.
  pub fn is_used(&self, index: usize) -> bool {
    match self.bytes.get(index / 8) {
      Some(&byte) => get_bit_at(byte, (index % 8) as u8),
      None => false,
    }
  }
}


// vim:ts=2 sw=2
