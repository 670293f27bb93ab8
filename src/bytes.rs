use crate::error::{CochranError, Result};

/// Little-endian field readers over an untrusted byte slice.
///
/// Every call site is expected to have already bounds-checked the enclosing
/// region (dive slice, header region, etc.) against a `Truncated` error; these
/// helpers only guard the specific field being read.
pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    let end = offset + 2;
    if end > data.len() {
        return Err(CochranError::Truncated {
            needed: end,
            have: data.len(),
        });
    }
    Ok(u16::from_le_bytes([data[offset], data[offset + 1]]))
}

pub fn read_u24_le(data: &[u8], offset: usize) -> Result<u32> {
    let end = offset + 3;
    if end > data.len() {
        return Err(CochranError::Truncated {
            needed: end,
            have: data.len(),
        });
    }
    Ok(u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        0,
    ]))
}

pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    let end = offset + 4;
    if end > data.len() {
        return Err(CochranError::Truncated {
            needed: end,
            have: data.len(),
        });
    }
    Ok(u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]))
}

/// Same as [`read_u16_le`] but returns 0 instead of erroring on a short slice.
/// Used inside the profile parser, which tolerates a truncated trailing record.
pub fn read_u16_le_lossy(data: &[u8], offset: usize) -> u16 {
    read_u16_le(data, offset).unwrap_or(0)
}

/// Same as [`read_u32_le`] but returns 0 instead of erroring on a short slice.
pub fn read_u32_le_lossy(data: &[u8], offset: usize) -> u32 {
    read_u32_le(data, offset).unwrap_or(0)
}

/// Single-byte read that returns 0 past the end of the slice rather than
/// panicking, for the profile parser's best-effort tail handling.
pub fn byte_lossy(data: &[u8], offset: usize) -> u8 {
    data.get(offset).copied().unwrap_or(0)
}

/// Copy out `data[start..end]`, clamped to the slice's actual bounds, for
/// capturing the raw bytes a profile sample was decoded from.
pub fn raw_slice(data: &[u8], start: usize, end: usize) -> Vec<u8> {
    let end = end.min(data.len());
    if start >= end {
        return Vec::new();
    }
    data[start..end].to_vec()
}
