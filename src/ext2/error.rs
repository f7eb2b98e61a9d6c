use thiserror::Error;

/// Everything that can go wrong while walking an image.
///
/// Structural failures (superblock, group descriptor table, bitmaps) abort
/// the scan. Failures confined to one inode or one directory block are
/// reported as diagnostics and the walk moves on, see [`ScanError::is_fatal`].
#[derive(Debug, Error)]
pub enum ScanError {
  /// The superblock does not describe an ext2 filesystem we can walk.
  #[error("invalid ext2 image: {0}")]
  InvalidImage(String),

  /// Directory record lengths do not partition a block exactly.
  #[error("corrupt directory block {block} of inode {inode} at byte {offset}: {detail}")]
  CorruptDirectory {
    inode: u32,
    block: u32,
    offset: u32,
    detail: String,
  },

  /// An on-disk pointer names a block past the end of the filesystem.
  #[error("block {block} is outside the filesystem ({total} blocks)")]
  BlockOutOfRange { block: u64, total: u32 },

  /// Read error or short read on the image.
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  /// The record sink refused a write.
  #[error("cannot write report: {0}")]
  Output(std::io::Error),

  #[error("invalid configuration: {0}")]
  Config(String),
}

impl ScanError {
  /// Whether the whole scan has to stop, regardless of strictness.
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      ScanError::InvalidImage(_) | ScanError::Output(_) | ScanError::Config(_)
    )
  }
}


// vim:ts=2 sw=2
