use chrono::{TimeZone, Utc};

/// Layout used for every timestamp in the report: `mm/dd/yy hh:mm:ss`, UTC.
pub const TIME_FORMAT: &str = "%m/%d/%y %H:%M:%S";

/// gets the bit at position `n`. Bits are numbered from 0 (least significant) to 7 (most significant).
pub fn get_bit_at(input: u8, n: u8) -> bool {
  if n < 8 {
    input & (1 << n) != 0
  } else {
    false
  }
}

// All on-disk integers are little endian. Callers hand in buffers that
// were sized for the structure, so out-of-range offsets are a bug here.

pub fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
  u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

pub fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
  u32::from_le_bytes([
    bytes[offset],
    bytes[offset + 1],
    bytes[offset + 2],
    bytes[offset + 3],
  ])
}

/// Render a 32-bit POSIX timestamp the way the report prints it.
pub fn format_time(seconds: u32) -> String {
  Utc
    .timestamp_opt(i64::from(seconds), 0)
    .single()
    .map(|datetime| datetime.format(TIME_FORMAT).to_string())
    .unwrap_or_default()
}


// vim:ts=2 sw=2
