//! Walks the single, double and triple indirect pointer trees of an inode.
//!
//! Every non-zero pointer found at any level becomes one
//! [`IndirectReference`] tagged with the logical block offset of the first
//! file block it leads to. With `N = block_size / 4` pointers per block:
//!
//! | tree   | root covers logical blocks from | slot `i` spans |
//! |--------|---------------------------------|----------------|
//! | single | `12`                            | `1`            |
//! | double | `12 + N`                        | `N`            |
//! | triple | `12 + N + N^2`                  | `N^2`          |
//!
//! A nested block covers its parent slot's range with the next smaller span.
//! A zero pointer is a hole: nothing below it is read or reported. A pointer
//! block that cannot be read is recorded as a failure and its siblings are
//! still walked.

use super::device::RawReader;
use super::error::ScanError;
use super::image::Ext2Image;
use super::inode::{Inode, EXT2_DIND_BLOCK, EXT2_IND_BLOCK, EXT2_NDIR_BLOCKS, EXT2_TIND_BLOCK};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndirectReference {
  pub inode: u32,
  /// Depth of the pointer block the reference was read from: 1, 2 or 3.
  pub level: u8,
  pub logical_offset: u64,
  /// The pointer block the reference was read from.
  pub indirect_block: u32,
  pub referenced_block: u32,
}

/// Everything found under an inode's indirect slots.
#[derive(Debug, Default)]
pub struct Resolution {
  pub references: Vec<IndirectReference>,
  /// One error per pointer block that could not be read.
  pub failures: Vec<ScanError>,
}

pub struct IndirectResolver<'a, R> {
  image: &'a mut Ext2Image<R>,
  inode: u32,
  per_block: u64,
  resolution: Resolution,
}

impl<'a, R: RawReader> IndirectResolver<'a, R> {
  pub fn new(image: &'a mut Ext2Image<R>, inode: u32) -> Self {
    let per_block = u64::from(image.block_size() / 4);
    Self {
      image,
      inode,
      per_block,
      resolution: Resolution::default(),
    }
  }

  /// Resolve all three trees of `inode`, in slot order, depth first.
  pub fn resolve(image: &'a mut Ext2Image<R>, inode: &Inode) -> Resolution {
    let mut resolver = Self::new(image, inode.number);
    for (slot, level) in [(EXT2_IND_BLOCK, 1), (EXT2_DIND_BLOCK, 2), (EXT2_TIND_BLOCK, 3)] {
      let root = inode.block[slot];
      if root != 0 {
        let base = resolver.first_logical_block(level);
        resolver.walk(level, root, base);
      }
    }

    resolver.resolution
  }

  /// First logical block reachable through the tree of the given depth.
  pub fn first_logical_block(&self, level: u8) -> u64 {
    let n = self.per_block;
    let direct = EXT2_NDIR_BLOCKS as u64;
    match level {
      1 => direct,
      2 => direct + n,
      _ => direct + n + n * n,
    }
  }

  /// Logical blocks covered by one pointer of a block at `level`.
  fn span(&self, level: u8) -> u64 {
    self.per_block.pow(u32::from(level) - 1)
  }

  fn walk(&mut self, level: u8, block: u32, base: u64) {
    let pointers = match self.image.read_pointers(block) {
      Ok(pointers) => pointers,
      Err(err) => {
        self.resolution.failures.push(err);
        return;
      },
    };
    let span = self.span(level);

    for (index, &pointer) in pointers.iter().enumerate() {
      if pointer == 0 {
        continue;
      }

      let logical_offset = base + index as u64 * span;
      self.resolution.references.push(IndirectReference {
        inode: self.inode,
        level,
        logical_offset,
        indirect_block: block,
        referenced_block: pointer,
      });

      if level > 1 {
        self.walk(level - 1, pointer, logical_offset);
      }
    }
  }
}


// vim:ts=2 sw=2
