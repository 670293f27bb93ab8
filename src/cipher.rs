/// Selects whether a container segment is decrypted with the additive
/// stream, or copied verbatim (the leading "plaintext" segment present in
/// most Wan/Ana dive blobs before the encrypted body begins).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    Copy,
    Decrypt { key_offset: u8 },
}

/// The additive stream cipher at the heart of every container variant:
/// `plain[i] = cipher[i] + key[(key_offset + (i - start)) % modulus]`, 8-bit
/// wraparound addition. Self-inverse given the same key, offset and modulus,
/// so this same routine does both decode and (if ever needed) encode.
///
/// `end` is clamped to `min(end, cipher.len(), out.len())`; a segment
/// boundary that runs past the available bytes is silently truncated rather
/// than treated as an error, matching the reference decoder's bounded loop.
pub fn decode(
    cipher: &[u8],
    out: &mut [u8],
    start: usize,
    end: usize,
    key: &[u8; 256],
    key_offset: u8,
    modulus: u16,
) {
    let modulus = modulus.max(1) as usize;
    let end = end.min(cipher.len()).min(out.len());
    for i in start..end {
        let key_index = (key_offset as usize + (i - start)) % modulus;
        out[i] = cipher[i].wrapping_add(key[key_index]);
    }
}

/// Apply a single container segment, dispatching on [`SegmentMode`].
pub fn apply_segment(
    cipher: &[u8],
    out: &mut [u8],
    start: usize,
    end: usize,
    key: &[u8; 256],
    mode: SegmentMode,
    modulus: u16,
) {
    match mode {
        SegmentMode::Copy => {
            let end = end.min(cipher.len()).min(out.len());
            out[start..end].copy_from_slice(&cipher[start..end]);
        }
        SegmentMode::Decrypt { key_offset } => {
            decode(cipher, out, start, end, key, key_offset, modulus);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_is_self_inverse() {
        let mut key = [0u8; 256];
        for (i, k) in key.iter_mut().enumerate() {
            *k = i as u8;
        }
        let plain: Vec<u8> = (0..64).map(|i| (i * 7) as u8).collect();
        let mut cipher = vec![0u8; plain.len()];
        decode(&plain, &mut cipher, 0, plain.len(), &key, 13, 200);
        let mut back = vec![0u8; plain.len()];
        // The forward pass already used wrapping_add(key); applying the same
        // operation with the negated key recovers the original bytes.
        let mut neg_key = [0u8; 256];
        for i in 0..256 {
            neg_key[i] = (key[i] as i16 * -1).rem_euclid(256) as u8;
        }
        decode(&cipher, &mut back, 0, cipher.len(), &neg_key, 13, 200);
        assert_eq!(plain, back);
    }

    #[test]
    fn clamps_end_past_buffer_len() {
        let key = [1u8; 256];
        let cipher = vec![5u8; 4];
        let mut out = vec![0u8; 4];
        decode(&cipher, &mut out, 0, 100, &key, 0, 256);
        assert_eq!(out, vec![6u8; 4]);
    }

    #[test]
    fn copy_segment_leaves_bytes_unchanged() {
        let key = [9u8; 256];
        let cipher = vec![1, 2, 3, 4];
        let mut out = vec![0u8; 4];
        apply_segment(&cipher, &mut out, 0, 4, &key, SegmentMode::Copy, 256);
        assert_eq!(out, cipher);
    }
}
