use std::io::{self, Read, Seek, SeekFrom};

/// Random-access byte source backing an image.
///
/// Everything the scanner knows about the filesystem comes through
/// `read_at`, so a fabricated buffer is as good as a block device.
pub trait RawReader {
  /// Fill `buf` completely from absolute byte `offset`. A short read is an error.
  fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

  fn read_vec_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    self.read_at(offset, &mut buf)?;
    Ok(buf)
  }
}

impl<T: Read + Seek> RawReader for T {
  fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
    self.seek(SeekFrom::Start(offset))?;
    self.read_exact(buf)
  }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;

  #[test]
  fn read_at_absolute_offset() {
    let mut cursor = Cursor::new((0u8..=255).collect::<Vec<u8>>());
    let mut buf = [0u8; 4];

    cursor.read_at(10, &mut buf).unwrap();
    assert_eq!(buf, [10, 11, 12, 13]);

    // Seeking backwards works too
    cursor.read_at(2, &mut buf).unwrap();
    assert_eq!(buf, [2, 3, 4, 5]);
  }

  #[test]
  fn short_read_is_error() {
    let mut cursor = Cursor::new(vec![0u8; 16]);
    let err = cursor.read_vec_at(12, 8).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
  }
}

// vim:ts=2 sw=2
