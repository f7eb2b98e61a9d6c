mod config;
mod ext2;
mod util;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, Level};

use crate::config::ScanConfig;
use crate::ext2::{CsvEmitter, Ext2Image, ScanError, Scanner};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_BAD_ARGUMENTS: i32 = 1;
pub const EXIT_CORRUPTION: i32 = 2;

/// Summarize the metadata of an ext2 image as CSV records.
#[derive(Debug, Parser)]
#[clap(name = "ext2walk", version)]
struct Args {
  /// Image file or block device, opened read-only
  image: PathBuf,

  /// YAML file selecting record kinds and strictness
  #[clap(short, long)]
  config: Option<PathBuf>,

  /// Write the report here instead of stdout
  #[clap(short, long)]
  output: Option<PathBuf>,

  /// Log more (-v debug, -vv trace)
  #[clap(short, long, parse(from_occurrences))]
  verbose: u64,

  /// Print the SHA-256 of the report to stderr
  #[clap(long)]
  digest: bool,
}

pub fn main() {
  std::process::exit(run());
}

fn init_logging(verbose: u64) {
  let level = match verbose {
    0 => Level::WARN,
    1 => Level::DEBUG,
    _ => Level::TRACE,
  };

  tracing_subscriber::fmt()
    .with_max_level(level)
    .with_writer(io::stderr)
    .with_target(false)
    .init();
}

fn run() -> i32 {
  let args = match Args::try_parse() {
    Ok(args) => args,
    Err(err) => {
      let _ = err.print();
      return if err.use_stderr() { EXIT_BAD_ARGUMENTS } else { EXIT_SUCCESS };
    },
  };

  init_logging(args.verbose);

  let config = match &args.config {
    Some(path) => match ScanConfig::load(path) {
      Ok(config) => config,
      Err(err) => {
        eprintln!("ext2walk: {err}");
        return EXIT_BAD_ARGUMENTS;
      },
    },
    None => ScanConfig::default(),
  };
  debug!(?config, "configuration");

  let device = match File::open(&args.image) {
    Ok(device) => device,
    Err(err) => {
      eprintln!("ext2walk: {}: {err}", args.image.display());
      return EXIT_BAD_ARGUMENTS;
    },
  };

  let mut image = match Ext2Image::open(device) {
    Ok(image) => image,
    Err(err) => {
      eprintln!("ext2walk: {}: {err}", args.image.display());
      return EXIT_CORRUPTION;
    },
  };

  let writer: Box<dyn Write> = match &args.output {
    Some(path) => match File::create(path) {
      Ok(file) => Box::new(BufWriter::new(file)),
      Err(err) => {
        eprintln!("ext2walk: {}: {err}", path.display());
        return EXIT_BAD_ARGUMENTS;
      },
    },
    None => Box::new(BufWriter::new(io::stdout())),
  };

  let mut emitter = CsvEmitter::new(writer).with_records(config.records.clone());
  let result = Scanner::new(&mut image, &mut emitter).strict(config.strict).run();

  // Whatever made it into the report gets flushed, even after a failure
  debug!(lines = emitter.lines(), "report written");
  let digest = emitter.finish();

  match (result, digest) {
    (Ok(summary), Ok(digest)) => {
      if args.digest {
        eprintln!("sha256 {digest}");
      }
      if summary.diagnostics > 0 {
        eprintln!(
          "ext2walk: {}: {} damaged structures skipped",
          args.image.display(),
          summary.diagnostics
        );
        EXIT_CORRUPTION
      } else {
        EXIT_SUCCESS
      }
    },
    (Err(err), _) | (Ok(_), Err(err)) => report_failure(&args, err),
  }
}

fn report_failure(args: &Args, err: ScanError) -> i32 {
  eprintln!("ext2walk: {}: {err}", args.image.display());
  match err {
    ScanError::Output(_) | ScanError::Config(_) => EXIT_BAD_ARGUMENTS,
    _ => EXIT_CORRUPTION,
  }
}

// vim:ts=2 sw=2
