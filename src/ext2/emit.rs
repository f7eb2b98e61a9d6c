use std::collections::BTreeSet;
use std::io::Write;

use sha2::{Digest, Sha256};

use super::error::ScanError;
use super::record::{Record, RecordKind};

/// Where scanned records go.
pub trait Emitter {
  fn emit(&mut self, record: &Record) -> Result<(), ScanError>;
}

impl Emitter for Vec<Record> {
  fn emit(&mut self, record: &Record) -> Result<(), ScanError> {
    self.push(record.clone());
    Ok(())
  }
}

/// Writes one comma-separated line per record and fingerprints what it wrote.
///
/// The SHA-256 of the report makes re-runs on the same image comparable at a glance.
pub struct CsvEmitter<W: Write> {
  writer: W,
  records: BTreeSet<RecordKind>,
  hasher: Sha256,
  lines: u64,
}

impl<W: Write> CsvEmitter<W> {
  pub fn new(writer: W) -> Self {
    Self {
      writer,
      records: RecordKind::ALL.into_iter().collect(),
      hasher: Sha256::new(),
      lines: 0,
    }
  }

  /// Only write the given kinds, drop the rest.
  pub fn with_records(mut self, records: BTreeSet<RecordKind>) -> Self {
    self.records = records;
    self
  }

  pub fn lines(&self) -> u64 {
    self.lines
  }

  /// Flush and return the hex digest of everything written.
  pub fn finish(mut self) -> Result<String, ScanError> {
    self.writer.flush().map_err(ScanError::Output)?;
    Ok(hex::encode(self.hasher.finalize()))
  }
}

impl<W: Write> Emitter for CsvEmitter<W> {
  fn emit(&mut self, record: &Record) -> Result<(), ScanError> {
    if !self.records.contains(&record.kind()) {
      return Ok(());
    }

    let line = format!("{record}\n");
    self.hasher.update(line.as_bytes());
    self.writer.write_all(line.as_bytes()).map_err(ScanError::Output)?;
    self.lines += 1;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::io;

  use super::*;

  // sha256 of the empty string
  const EMPTY_DIGEST: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

  #[test]
  fn writes_lines() {
    let mut out = Vec::new();
    let mut emitter = CsvEmitter::new(&mut out);
    emitter.emit(&Record::BlockFree(13)).unwrap();
    emitter.emit(&Record::InodeFree(20)).unwrap();
    assert_eq!(emitter.lines(), 2);
    emitter.finish().unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "BFREE,13\nIFREE,20\n");
  }

  #[test]
  fn filters_kinds() {
    let mut out = Vec::new();
    let mut emitter =
      CsvEmitter::new(&mut out).with_records([RecordKind::Ifree].into_iter().collect());
    emitter.emit(&Record::BlockFree(13)).unwrap();
    emitter.emit(&Record::InodeFree(20)).unwrap();
    emitter.finish().unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "IFREE,20\n");
  }

  #[test]
  fn digest_tracks_output() {
    assert_eq!(CsvEmitter::new(io::sink()).finish().unwrap(), EMPTY_DIGEST);

    let digest = |records: &[Record]| {
      let mut emitter = CsvEmitter::new(io::sink());
      for record in records {
        emitter.emit(record).unwrap();
      }
      emitter.finish().unwrap()
    };

    let first = digest(&[Record::BlockFree(13), Record::BlockFree(14)]);
    assert_eq!(first, digest(&[Record::BlockFree(13), Record::BlockFree(14)]));
    assert_ne!(first, digest(&[Record::BlockFree(14), Record::BlockFree(13)]));
  }

  #[test]
  fn collects_into_vec() {
    let mut records: Vec<Record> = Vec::new();
    records.emit(&Record::InodeFree(3)).unwrap();
    assert_eq!(records, vec![Record::InodeFree(3)]);
  }

  struct BrokenPipe;

  impl Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
      Err(io::ErrorKind::BrokenPipe.into())
    }
    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn write_failure_is_output_error() {
    let mut emitter = CsvEmitter::new(BrokenPipe);
    assert!(matches!(emitter.emit(&Record::BlockFree(1)), Err(ScanError::Output(_))));
  }
}

// vim:ts=2 sw=2
