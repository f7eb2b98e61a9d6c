use tracing::{debug, info, trace, warn};

use super::bitmap::Bitmap;
use super::device::RawReader;
use super::dirent::DirectoryEntries;
use super::emit::Emitter;
use super::error::ScanError;
use super::image::Ext2Image;
use super::indirect::IndirectResolver;
use super::inode::Inode;
use super::record::Record;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
  /// Records produced, before any filtering by the emitter.
  pub records: u64,
  pub inodes: u32,
  /// Damaged inodes or directory blocks that were skipped.
  pub diagnostics: u32,
}

/// Depth-first walk over an opened image, feeding every record to an [`Emitter`].
pub struct Scanner<'a, R, E> {
  image: &'a mut Ext2Image<R>,
  emitter: &'a mut E,
  strict: bool,
  summary: ScanSummary,
}

impl<'a, R: RawReader, E: Emitter> Scanner<'a, R, E> {
  pub fn new(image: &'a mut Ext2Image<R>, emitter: &'a mut E) -> Self {
    Self {
      image,
      emitter,
      strict: false,
      summary: ScanSummary::default(),
    }
  }

  /// Stop at the first damaged inode or directory block instead of skipping it.
  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  pub fn run(mut self) -> Result<ScanSummary, ScanError> {
    let superblock = *self.image.superblock();
    self.emit(Record::Superblock(superblock))?;
    self.emit_groups()?;
    self.scan_free_blocks()?;
    self.scan_free_inodes()?;
    self.scan_inodes()?;

    info!(
      records = self.summary.records,
      inodes = self.summary.inodes,
      diagnostics = self.summary.diagnostics,
      "scan finished"
    );

    Ok(self.summary)
  }

  fn emit(&mut self, record: Record) -> Result<(), ScanError> {
    self.emitter.emit(&record)?;
    self.summary.records += 1;
    Ok(())
  }

  fn diagnostic(&mut self, inode: u32, err: ScanError) -> Result<(), ScanError> {
    if self.strict || err.is_fatal() {
      return Err(err);
    }

    warn!(inode, error = %err, "skipping damaged metadata");
    self.summary.diagnostics += 1;
    Ok(())
  }

  fn group_count(&self) -> u32 {
    self.image.groups().len() as u32
  }

  fn emit_groups(&mut self) -> Result<(), ScanError> {
    let superblock = *self.image.superblock();
    let groups = self.image.groups().to_vec();

    for (number, descriptor) in (0u32..).zip(groups) {
      self.emit(Record::Group {
        number,
        blocks: superblock.blocks_in_group(number),
        inodes: superblock.inodes_in_group(number),
        descriptor,
      })?;
    }

    Ok(())
  }

  fn group_bitmaps(&self, group: u32) -> Result<(u32, u32), ScanError> {
    self
      .image
      .group(group)
      .map(|descriptor| (descriptor.block_bitmap, descriptor.inode_bitmap))
      .ok_or_else(|| ScanError::InvalidImage(format!("missing descriptor for group {group}")))
  }

  fn scan_free_blocks(&mut self) -> Result<(), ScanError> {
    let superblock = *self.image.superblock();

    for group in 0..self.group_count() {
      let (block_bitmap, _) = self.group_bitmaps(group)?;
      let bitmap = Bitmap::load(self.image, block_bitmap)?;
      debug!(group, block_bitmap, "scanning block bitmap");

      for index in 0..superblock.blocks_in_group(group) {
        if !bitmap.is_used(index as usize) {
          self.emit(Record::BlockFree(superblock.block_number(group, index)))?;
        }
      }
    }

    Ok(())
  }

  fn scan_free_inodes(&mut self) -> Result<(), ScanError> {
    let superblock = *self.image.superblock();

    for group in 0..self.group_count() {
      let (_, inode_bitmap) = self.group_bitmaps(group)?;
      let bitmap = Bitmap::load(self.image, inode_bitmap)?;
      debug!(group, inode_bitmap, "scanning inode bitmap for free inodes");

      for index in 0..superblock.inodes_in_group(group) {
        if !bitmap.is_used(index as usize) {
          self.emit(Record::InodeFree(superblock.inode_number(group, index)))?;
        }
      }
    }

    Ok(())
  }

  fn scan_inodes(&mut self) -> Result<(), ScanError> {
    let superblock = *self.image.superblock();

    for group in 0..self.group_count() {
      let (_, inode_bitmap) = self.group_bitmaps(group)?;
      let bitmap = Bitmap::load(self.image, inode_bitmap)?;
      debug!(group, inode_bitmap, "scanning inode bitmap for used inodes");

      for index in 0..superblock.inodes_in_group(group) {
        if !bitmap.is_used(index as usize) {
          continue;
        }

        let number = superblock.inode_number(group, index);
        if let Err(err) = self.scan_inode(number) {
          self.diagnostic(number, err)?;
        }
      }
    }

    Ok(())
  }

  fn scan_inode(&mut self, number: u32) -> Result<(), ScanError> {
    let inode = match Inode::read(self.image, number)? {
      Some(inode) => inode,
      None => return Ok(()),
    };

    self.emit(Record::Inode(inode.clone()))?;
    self.summary.inodes += 1;

    if inode.is_directory() {
      for (logical_block, &block) in (0u64..).zip(inode.direct_blocks()) {
        if block != 0 {
          self.scan_directory_block(number, logical_block, block)?;
        }
      }
    }

    if !inode.has_block_map() {
      return Ok(());
    }

    let resolution = IndirectResolver::resolve(self.image, &inode);
    trace!(
      inode = number,
      references = resolution.references.len(),
      failures = resolution.failures.len(),
      "resolved indirect blocks"
    );

    for reference in resolution.references {
      self.emit(Record::Indirect(reference))?;

      // Level-1 pointers of a directory name its data blocks
      if inode.is_directory() && reference.level == 1 {
        self.scan_directory_block(number, reference.logical_offset, reference.referenced_block)?;
      }
    }

    for err in resolution.failures {
      self.diagnostic(number, err)?;
    }

    Ok(())
  }

  /// Emit the entries of one directory block. A block that cannot be read
  /// or parsed costs one diagnostic and the owner's other blocks still get
  /// scanned.
  fn scan_directory_block(&mut self, owner: u32, logical_block: u64, block: u32) -> Result<(), ScanError> {
    let bytes = match self.image.read_block(block) {
      Ok(bytes) => bytes,
      Err(err) => return self.diagnostic(owner, err),
    };
    let base = logical_block * u64::from(self.image.block_size());

    for entry in DirectoryEntries::new(&bytes, owner, block) {
      match entry {
        Ok(entry) => {
          self.emit(Record::Dirent {
            parent: owner,
            offset: base + u64::from(entry.offset),
            entry,
          })?;
        },
        Err(err) => {
          self.diagnostic(owner, err)?;
          break;
        },
      }
    }

    Ok(())
  }
}


// vim:ts=2 sw=2
