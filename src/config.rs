use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ext2::{RecordKind, ScanError};

/// On-disk shape of the `--config` file:
///
/// ```yaml
/// scan:
///   records: [superblock, group, bfree, ifree, inode, dirent, indirect]
///   strict: false
/// ```
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
  #[serde(default)]
  pub scan: ScanConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
  /// Record kinds written to the report.
  pub records: BTreeSet<RecordKind>,
  /// Abort on the first damaged inode or directory block.
  pub strict: bool,
}

impl Default for ScanConfig {
  fn default() -> Self {
    Self {
      records: RecordKind::ALL.into_iter().collect(),
      strict: false,
    }
  }
}

impl ScanConfig {
  pub fn load(path: &Path) -> Result<Self, ScanError> {
    let contents = std::fs::read_to_string(path)
      .map_err(|err| ScanError::Config(format!("{}: {err}", path.display())))?;

    Self::from_yaml(&contents)
      .map_err(|err| ScanError::Config(format!("{}: {err}", path.display())))
  }

  pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }

    let schema = serde_yaml::from_str::<ConfigSchema>(contents)?;
    Ok(schema.scan)
  }
}


// vim:ts=2 sw=2
