use std::ops::ControlFlow;

use crate::bytes::{read_u24_le, read_u32_le};
use crate::cipher::{apply_segment, SegmentMode};
use crate::container::ContainerDescriptor;
use crate::error::{CochranError, Result};

const ABSENT_POINTER: u32 = 0xFF0000;

fn read_pointer(image: &[u8], descriptor: &ContainerDescriptor, index: usize) -> Result<u32> {
    let offset = index * descriptor.pointer_width;
    if descriptor.pointer_width == 3 {
        read_u24_le(image, offset)
    } else {
        read_u32_le(image, offset)
    }
}

/// Decrypt one dive's bytes in place using the container's segment table,
/// with an implicit final `Decrypt { key_offset: 0 }` run covering anything
/// past the last listed boundary through the end of the dive.
fn decrypt_dive(cipher: &[u8], out: &mut [u8], descriptor: &ContainerDescriptor, dive_len: usize) {
    let mut start = 0usize;
    for &(end, mode) in &descriptor.segment_table {
        let end = end.min(dive_len);
        if end > start {
            apply_segment(cipher, out, start, end, &descriptor.key, mode, descriptor.modulus);
        }
        start = end;
    }
    if dive_len > start {
        apply_segment(
            cipher,
            out,
            start,
            dive_len,
            &descriptor.key,
            SegmentMode::Decrypt { key_offset: 0 },
            descriptor.modulus,
        );
    }
}

/// Decrypt the inter-dive tail: a single unsegmented run at key offset 0
/// over the whole blob, unlike a normal dive's per-format segment table.
fn decrypt_tail(cipher: &[u8], out: &mut [u8], descriptor: &ContainerDescriptor, len: usize) {
    apply_segment(
        cipher,
        out,
        0,
        len,
        &descriptor.key,
        SegmentMode::Decrypt { key_offset: 0 },
        descriptor.modulus,
    );
}

/// Walk the pointer table, decrypting and yielding one dive blob at a time.
///
/// `callback(descriptor, dive_bytes, dive_index, is_inter_dive_tail)` may
/// return `ControlFlow::Break(())` to stop early; that is not an error, it
/// simply ends iteration with the dives already produced intact.
///
/// A reversed or out-of-range `dive_end` stops iteration (`CorruptDive` is
/// not propagated as an `Err`; the dives already yielded remain valid per
/// the container's documented error policy) after invoking `on_corrupt`.
pub fn for_each_dive(
    image: &[u8],
    descriptor: &ContainerDescriptor,
    mut callback: impl FnMut(&ContainerDescriptor, &[u8], usize, bool) -> ControlFlow<()>,
    mut on_corrupt: impl FnMut(CochranError),
) -> Result<()> {
    if descriptor.pointer_count < 2 {
        return Ok(());
    }

    let mut last_processed_end = 0usize;
    let mut i = 0usize;
    while i < descriptor.pointer_count.saturating_sub(2) {
        let pointer = read_pointer(image, descriptor, i)?;
        if pointer == 0 {
            break;
        }
        if pointer == ABSENT_POINTER {
            i += 1;
            continue;
        }

        let dive_start = pointer as usize;

        // The next table entry may itself be an absent-dive sentinel; the
        // true end of this dive is the next entry that isn't one.
        let mut end_index = i + 1;
        let dive_end = loop {
            if end_index >= descriptor.pointer_count.saturating_sub(1) {
                break 0usize;
            }
            let candidate = read_pointer(image, descriptor, end_index)?;
            if candidate == ABSENT_POINTER {
                end_index += 1;
                continue;
            }
            break candidate as usize;
        };

        if dive_end < dive_start || dive_end > image.len() {
            on_corrupt(CochranError::CorruptDive {
                index: i,
                reason: format!("dive_end {dive_end} out of range for dive_start {dive_start}"),
            });
            break;
        }

        let dive_len = dive_end - dive_start;
        let mut plain = vec![0u8; dive_len];
        decrypt_dive(&image[dive_start..dive_end], &mut plain, descriptor, dive_len);

        last_processed_end = dive_end;

        if callback(descriptor, &plain, i, false).is_break() {
            return Ok(());
        }

        i += 1;
    }

    let last_index = descriptor.pointer_count.saturating_sub(2);
    let tail_end_pointer = read_pointer(image, descriptor, last_index)? as usize;
    if tail_end_pointer > last_processed_end && tail_end_pointer <= image.len() {
        let tail_len = tail_end_pointer - last_processed_end;
        let mut plain = vec![0u8; tail_len];
        decrypt_tail(
            &image[last_processed_end..tail_end_pointer],
            &mut plain,
            descriptor,
            tail_len,
        );
        let _ = callback(descriptor, &plain, last_index, true);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::FileFormat;
    use crate::model::{Family, FileVariant};

    fn stub_descriptor(pointer_width: usize, pointer_count: usize) -> ContainerDescriptor {
        ContainerDescriptor {
            variant: FileVariant::Ana,
            format: FileFormat::WanAlt,
            header_offset: pointer_width * pointer_count,
            pointer_width,
            pointer_count,
            modulus: 256,
            key: [0u8; 256],
            segment_table: Vec::new(),
            header_schedule: Vec::new(),
            header_key_base: 0,
            log_offset: 0,
            profile_offset: 0,
            model: *b"114",
            family: Family::Nemesis,
            log_size: 108,
        }
    }

    fn put_u24(image: &mut [u8], index: usize, value: u32) {
        let off = index * 3;
        image[off] = (value & 0xFF) as u8;
        image[off + 1] = ((value >> 8) & 0xFF) as u8;
        image[off + 2] = ((value >> 16) & 0xFF) as u8;
    }

    #[test]
    fn all_zero_pointer_table_yields_zero_dives() {
        let descriptor = stub_descriptor(3, 4);
        let image = vec![0u8; descriptor.header_offset + 16];
        let mut seen = 0;
        for_each_dive(&image, &descriptor, |_, _, _, _| { seen += 1; ControlFlow::Continue(()) }, |_| {}).unwrap();
        assert_eq!(seen, 0);
    }

    #[test]
    fn absent_dive_sentinel_is_skipped_not_treated_as_end() {
        // Pointer table: [0x100, ABSENT, 0x200, 0] over 4 slots (pointer_count=4).
        let descriptor = stub_descriptor(3, 4);
        let header_offset = descriptor.header_offset;
        let mut image = vec![0u8; header_offset + 0x300];
        put_u24(&mut image, 0, 0x100);
        put_u24(&mut image, 1, ABSENT_POINTER);
        put_u24(&mut image, 2, 0x200);
        put_u24(&mut image, 3, 0);

        let mut dives = Vec::new();
        for_each_dive(
            &image,
            &descriptor,
            |_, dive, index, is_tail| {
                dives.push((index, dive.len(), is_tail));
                ControlFlow::Continue(())
            },
            |_| {},
        )
        .unwrap();

        assert_eq!(dives.len(), 1);
        assert_eq!(dives[0], (0, 0x100, false));
    }

    #[test]
    fn corrupt_dive_range_stops_iteration_without_error() {
        let descriptor = stub_descriptor(3, 4);
        let header_offset = descriptor.header_offset;
        let mut image = vec![0u8; header_offset + 0x50];
        put_u24(&mut image, 0, 0x100); // starts past the image end -> corrupt
        put_u24(&mut image, 1, 0x40);
        put_u24(&mut image, 2, 0);

        let mut corrupt_seen = 0;
        let mut dives_seen = 0;
        for_each_dive(
            &image,
            &descriptor,
            |_, _, _, _| { dives_seen += 1; ControlFlow::Continue(()) },
            |_| corrupt_seen += 1,
        )
        .unwrap();

        assert_eq!(dives_seen, 0);
        assert_eq!(corrupt_seen, 1);
    }

    #[test]
    fn cipher_roundtrip_zeroes_out_when_ciphertext_is_negated_key() {
        // Scenario: a synthesized dive whose ciphertext byte i is
        // `-key[i] mod 256`; decrypting with key offset 0 over the whole
        // segment should produce all-zero plaintext.
        let mut descriptor = stub_descriptor(4, 4);
        descriptor.segment_table = vec![(0, SegmentMode::Decrypt { key_offset: 0 })];
        let mut key = [0u8; 256];
        for (i, k) in key.iter_mut().enumerate() {
            *k = i as u8;
        }
        descriptor.key = key;
        descriptor.modulus = 256;

        let dive_len = 64;
        let cipher: Vec<u8> = (0..dive_len).map(|i| (256 - (i % 256)) as u8).collect();
        let mut out = vec![0xFFu8; dive_len];
        decrypt_dive(&cipher, &mut out, &descriptor, dive_len);
        assert!(out.iter().all(|&b| b == 0));
    }
}
