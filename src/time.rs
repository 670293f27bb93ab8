use chrono::{NaiveDate, NaiveDateTime};

/// Main source epoch used by every family except Nemesis: roughly
/// 1992-01-01 UTC, discovered by comparing decoded dive timestamps against
/// known log dates.
pub const COCHRAN_EPOCH: i64 = 694_242_000;

/// Nemesis uses its own, already-negative offset instead of the main epoch.
pub const NEMESIS_EPOCH: i64 = -2_461_431_600;

fn from_epoch_seconds(epoch: i64, ticks: u32) -> NaiveDateTime {
    let secs = epoch + ticks as i64;
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(1992, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
}

/// Reconstruct a wall-clock time from a raw tick count relative to the main
/// Cochran epoch (Commander II, Gemini's pre-clock variant via its own raw
/// tick, Commander III/EMC's `timestamp_start`/`timestamp_pre` fields).
pub fn from_cochran_epoch(ticks: u32) -> NaiveDateTime {
    from_epoch_seconds(COCHRAN_EPOCH, ticks)
}

/// Nemesis's alternate epoch.
pub fn from_nemesis_epoch(ticks: u32) -> NaiveDateTime {
    from_epoch_seconds(NEMESIS_EPOCH, ticks)
}

/// Century-rollover rule for the Commander III / EMC split broken-down clock
/// year byte: a value below 92 is a post-2000 year recorded as its two-digit
/// form, 92 and above is a literal 1900-based year (matches the firmware's
/// own read of the adjacent byte when the primary byte looks out of range).
pub fn broken_down_year(primary: u8, secondary: u8) -> i32 {
    if primary < 92 {
        secondary as i32 + 100 + 1900
    } else {
        primary as i32 + 1900
    }
}

/// Build a `NaiveDateTime` from the split broken-down clock fields used by
/// the Commander III and EMC logbook headers. Falls back to the epoch origin
/// on an out-of-range field rather than panicking, since these bytes come
/// directly from decrypted but otherwise untrusted device memory.
pub fn from_broken_down(
    year: i32,
    month_1based: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month_1based as u32, day as u32)
        .and_then(|d| d.and_hms_opt(hour as u32, minute as u32, second as u32))
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(1992, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
}

pub mod serde_naive_datetime {
    use chrono::NaiveDateTime;
    use serde::{self, Serializer};

    pub fn serialize<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.format("%Y-%m-%dT%H:%M:%S").to_string();
        serializer.serialize_str(&s)
    }
}
