//! Reader for Cochran dive computer `.can`/`.wan`/`.ana` container files.
//!
//! The three operations a caller composes are [`decode_file`] (header layout
//! and the decrypted-but-still-dive-encrypted image), [`for_each_dive`] (walk
//! the pointer table, yielding one decrypted dive blob at a time) and
//! [`parse_samples`] (turn a dive's profile region into a stream of
//! [`Sample`]s). [`dive_logbook`] and [`dive_profile_bytes`] slice a decrypted
//! dive blob into the two regions those operations need.

pub mod bytes;
pub mod cipher;
pub mod container;
pub mod dive;
pub mod error;
pub mod events;
pub mod header;
pub mod logbook;
pub mod model;
pub mod profile;
pub mod time;
pub mod types;

use std::ops::ControlFlow;

pub use container::{ContainerDescriptor, FileFormat};
pub use error::{CochranError, Result};
pub use model::{family_for_model, model_name, Family, FileVariant};
pub use types::{DiveSummary, GasMix, Logbook, Sample, SampleRaw};

/// Peek the container's layout and decrypt its fixed header region.
///
/// The returned image has a legible pointer table and header fields, but
/// dive blobs past the header are still ciphertext — [`for_each_dive`]
/// decrypts each one as it's visited. The 256-byte key is zeroed out of the
/// returned image before it's handed back.
///
/// The model id (and everything keyed off it: family, log size, the
/// logbook/profile offsets and the per-dive segment table) lives inside the
/// encrypted header region, so it only becomes legible once the header has
/// actually been decrypted -- the descriptor is therefore built in two
/// passes, [`ContainerDescriptor::from_raw_header`] then
/// [`ContainerDescriptor::complete`].
pub fn decode_file(variant: FileVariant, cipher: &[u8]) -> Result<(ContainerDescriptor, Vec<u8>)> {
    let mut descriptor = header::peek_descriptor(variant, cipher)?;
    let mut image = header::decode_header(cipher, &descriptor)?;
    descriptor.complete(&image)?;
    header::scrub_key(&mut image, &descriptor);
    Ok((descriptor, image))
}

/// Walk the dive pointer table, decrypting and yielding one dive blob at a
/// time. See [`dive::for_each_dive`] for the exact callback contract.
pub fn for_each_dive(
    image: &[u8],
    descriptor: &ContainerDescriptor,
    callback: impl FnMut(&ContainerDescriptor, &[u8], usize, bool) -> ControlFlow<()>,
    on_corrupt: impl FnMut(CochranError),
) -> Result<()> {
    dive::for_each_dive(image, descriptor, callback, on_corrupt)
}

/// Parse a dive's logbook header out of its decrypted blob.
pub fn dive_logbook(descriptor: &ContainerDescriptor, dive: &[u8]) -> Result<Logbook> {
    let end = descriptor.log_offset + descriptor.log_size;
    if end > dive.len() {
        return Err(CochranError::Truncated {
            needed: end,
            have: dive.len(),
        });
    }
    logbook::parse_logbook(descriptor.family, descriptor.model, &dive[descriptor.log_offset..end])
}

/// Slice out a dive's profile (sample stream) region.
///
/// The logbook's `profile_end`/`profile_pre` fields bound the effective
/// sample length to `min(profile_end - profile_pre, dive_size -
/// profile_offset)`; the sentinels `0xFFFFFFFF` and `0` mean "corrupt or
/// unset", in which case the whole remaining slice is used instead.
pub fn dive_profile_bytes<'a>(descriptor: &ContainerDescriptor, dive: &'a [u8], logbook: &Logbook) -> &'a [u8] {
    if descriptor.profile_offset >= dive.len() {
        return &[];
    }
    let remaining = &dive[descriptor.profile_offset..];
    let remaining_len = remaining.len();

    if logbook.profile_end == 0xFFFFFFFF || logbook.profile_end == 0 {
        return remaining;
    }

    let Some(span) = logbook.profile_end.checked_sub(logbook.profile_pre) else {
        return remaining;
    };
    let len = (span as usize).min(remaining_len);
    &remaining[..len]
}

/// Decode one dive's profile into a stream of [`Sample`]s, given its already
/// parsed logbook. See [`profile::parse_samples`] for the per-family layouts.
///
/// The callback's third argument is the raw bytes consumed to produce that
/// emission (empty for logbook-derived priming values and for `Sample::End`).
pub fn parse_samples(
    family: Family,
    logbook: &Logbook,
    samples: &[u8],
    callback: impl FnMut(u32, Sample, SampleRaw),
) -> Result<()> {
    profile::parse_samples(family, logbook, samples, callback)
}
