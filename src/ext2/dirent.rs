use crate::util::{read_u16_le, read_u32_le};

use super::error::ScanError;

pub const DIRENT_HEADER_SIZE: usize = 8;

/// A live record from a directory block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
  pub inode: u32,
  pub rec_len: u16,
  pub name_len: u8,
  pub file_type: u8,
  pub name: String,
  /// Byte position of the record inside its block.
  pub offset: u32,
}

/// Iterates the live records of one directory block.
///
/// Deleted slots (inode 0) are stepped over by their record length and not
/// yielded. The first malformed record yields a `CorruptDirectory` error
/// and ends the iteration; nothing past it is trusted.
pub struct DirectoryEntries<'a> {
  bytes: &'a [u8],
  owner: u32,
  block: u32,
  cursor: usize,
  done: bool,
}

impl<'a> DirectoryEntries<'a> {
  pub fn new(bytes: &'a [u8], owner: u32, block: u32) -> Self {
    Self {
      bytes,
      owner,
      block,
      cursor: 0,
      done: false,
    }
  }

  fn corrupt(&mut self, detail: String) -> Option<Result<DirectoryEntry, ScanError>> {
    self.done = true;
    Some(Err(ScanError::CorruptDirectory {
      inode: self.owner,
      block: self.block,
      offset: self.cursor as u32,
      detail,
    }))
  }
}

impl<'a> Iterator for DirectoryEntries<'a> {
  type Item = Result<DirectoryEntry, ScanError>;

  fn next(&mut self) -> Option<Self::Item> {
    let bytes = self.bytes;
    while !self.done && self.cursor < bytes.len() {
      let remaining = bytes.len() - self.cursor;
      if remaining < DIRENT_HEADER_SIZE {
        return self.corrupt(format!("{remaining} trailing bytes"));
      }

      let record = &bytes[self.cursor..];
      let inode = read_u32_le(record, 0);
      let rec_len = read_u16_le(record, 4);
      let name_len = record[6];
      let file_type = record[7];

      let length = rec_len as usize;
      if length < DIRENT_HEADER_SIZE || length % 4 != 0 {
        return self.corrupt(format!("record length {rec_len}"));
      }
      if length > remaining {
        return self.corrupt(format!("record length {rec_len} overruns block"));
      }
      if DIRENT_HEADER_SIZE + name_len as usize > length {
        return self.corrupt(format!("name length {name_len} exceeds record length {rec_len}"));
      }

      let offset = self.cursor as u32;
      self.cursor += length;

      if inode == 0 {
        continue;
      }

      let name_bytes = &record[DIRENT_HEADER_SIZE..DIRENT_HEADER_SIZE + name_len as usize];
      return Some(Ok(DirectoryEntry {
        inode,
        rec_len,
        name_len,
        file_type,
        name: String::from_utf8_lossy(name_bytes).into_owned(),
        offset,
      }));
    }

    None
  }
}


// vim:ts=2 sw=2
