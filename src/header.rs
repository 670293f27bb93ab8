use zeroize::Zeroize;

use crate::bytes::{read_u24_le, read_u32_le};
use crate::container::ContainerDescriptor;
use crate::error::{CochranError, Result};

/// Decrypt the fixed header region (pointer table, key block and the
/// encrypted header fields beyond it) so the pointer table and model id
/// become legible. Everything before `header_key_base` (the pointer table
/// plus the raw key bytes) is copied verbatim; the schedule beyond it is
/// decrypted block by block, each block restarting at key offset 0, through
/// to the first dive's offset (the dive pointer table's own entry 0, itself
/// plaintext) — the reference decoder's final header block runs up to that
/// same dynamic boundary rather than a fixed one.
pub fn decode_header(cipher: &[u8], descriptor: &ContainerDescriptor) -> Result<Vec<u8>> {
    let min_len = descriptor.header_key_base;
    if cipher.len() < min_len {
        return Err(CochranError::Truncated {
            needed: min_len,
            have: cipher.len(),
        });
    }

    let mut out = vec![0u8; cipher.len()];
    out[..descriptor.header_key_base].copy_from_slice(&cipher[..descriptor.header_key_base]);

    let header_end = first_dive_offset(cipher, descriptor)?.min(cipher.len());

    let mut start = 0usize;
    for &boundary in &descriptor.header_schedule {
        let abs_start = descriptor.header_key_base + start;
        let abs_end = (descriptor.header_key_base + boundary).min(header_end);
        if abs_end > abs_start {
            crate::cipher::decode(cipher, &mut out, abs_start, abs_end, &descriptor.key, 0, descriptor.modulus);
        }
        start = boundary;
    }
    let tail_start = descriptor.header_key_base + start;
    if header_end > tail_start {
        crate::cipher::decode(cipher, &mut out, tail_start, header_end, &descriptor.key, 0, descriptor.modulus);
    }

    Ok(out)
}

/// The byte offset of dive #0, read straight out of the (never encrypted)
/// pointer table. The reference decoder uses this same value as the end
/// bound of its last header decrypt block.
fn first_dive_offset(cipher: &[u8], descriptor: &ContainerDescriptor) -> Result<usize> {
    let pointer = if descriptor.pointer_width == 3 {
        read_u24_le(cipher, 0)?
    } else {
        read_u32_le(cipher, 0)?
    };
    Ok(pointer as usize)
}

/// Peek the format/key/modulus bytes needed to decrypt the header, without
/// decrypting anything yet. These precede the encrypted header region in
/// every variant and are therefore already legible in the raw ciphertext; the
/// model id is not (see [`ContainerDescriptor::complete`]).
pub fn peek_descriptor(
    variant: crate::model::FileVariant,
    cipher: &[u8],
) -> Result<ContainerDescriptor> {
    ContainerDescriptor::from_raw_header(variant, cipher)
}

/// Scrub the 256-byte key out of the plaintext image after decoding, per
/// the container's documented resource policy. Not a security boundary (the
/// key is derivable again from the ciphertext), just protocol hygiene that
/// matches the zeroize idiom the wider ecosystem uses for key material.
pub fn scrub_key(image: &mut [u8], descriptor: &ContainerDescriptor) {
    let key_start = descriptor.header_offset + 1;
    let key_end = key_start + 256;
    if key_end <= image.len() {
        image[key_start..key_end].zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::FileFormat;
    use crate::model::{Family, FileVariant};

    fn stub_descriptor(header_key_base: usize, header_schedule: Vec<usize>) -> ContainerDescriptor {
        let mut key = [0u8; 256];
        for (i, k) in key.iter_mut().enumerate() {
            *k = i as u8;
        }
        ContainerDescriptor {
            variant: FileVariant::Can,
            format: FileFormat::Can,
            header_offset: 0,
            pointer_width: 4,
            pointer_count: 1,
            modulus: 256,
            key,
            segment_table: Vec::new(),
            header_schedule,
            header_key_base,
            log_offset: 0,
            profile_offset: 0,
            model: *b"213",
            family: Family::CommanderII,
            log_size: 256,
        }
    }

    #[test]
    fn decrypts_past_the_last_scheduled_boundary_up_to_the_first_dive_offset() {
        // header_key_base = 8, schedule has one boundary at 4, first dive
        // starts at cipher offset 20 (read from the pointer table at index
        // 0). The tail run [8+4, 20) must still be decrypted, not left as
        // ciphertext, matching the reference decoder's final `decode()` call
        // that runs to `hend` rather than stopping at the last fixed block.
        let descriptor = stub_descriptor(8, vec![4]);
        let mut cipher = vec![0u8; 32];
        cipher[0..4].copy_from_slice(&20u32.to_le_bytes());
        for b in cipher[8..].iter_mut() {
            *b = 0x55;
        }

        let out = decode_header(&cipher, &descriptor).unwrap();

        // Bytes in [8, 12) decrypted under the schedule's single boundary.
        assert_eq!(out[8], cipher[8].wrapping_add(descriptor.key[0]));
        // Bytes in [12, 20) -- past the schedule's last boundary -- must
        // still be decrypted rather than copied verbatim.
        assert_eq!(out[12], cipher[12].wrapping_add(descriptor.key[0]));
        assert_eq!(out[19], cipher[19].wrapping_add(descriptor.key[7]));
        // Bytes at/after the first dive offset are untouched (still raw).
        assert_eq!(out[20], cipher[20]);
    }
}
