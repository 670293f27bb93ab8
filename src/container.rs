use crate::cipher::SegmentMode;
use crate::error::{CochranError, Result};
use crate::model::{family_for_model, Family, FileVariant};

/// The single byte that selects pointer width and per-dive segment layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// 0x43 - old Wan.
    OldWan,
    /// 0x45
    Wan,
    /// 0x46 - Can main format.
    Can,
    /// 0x4F
    WanAlt,
}

impl FileFormat {
    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0x43 => Ok(FileFormat::OldWan),
            0x45 => Ok(FileFormat::Wan),
            0x46 => Ok(FileFormat::Can),
            0x4F => Ok(FileFormat::WanAlt),
            other => Err(CochranError::UnknownFormat(other)),
        }
    }

    fn byte(self) -> u8 {
        match self {
            FileFormat::OldWan => 0x43,
            FileFormat::Wan => 0x45,
            FileFormat::Can => 0x46,
            FileFormat::WanAlt => 0x4F,
        }
    }
}

/// Derived layout constants for one container file, produced once from the
/// file variant and the decoded header bytes.
#[derive(Debug, Clone)]
pub struct ContainerDescriptor {
    pub variant: FileVariant,
    pub format: FileFormat,
    pub header_offset: usize,
    pub pointer_width: usize,
    pub pointer_count: usize,
    pub modulus: u16,
    pub key: [u8; 256],
    pub segment_table: Vec<(usize, SegmentMode)>,
    pub header_schedule: Vec<usize>,
    pub header_key_base: usize,
    pub log_offset: usize,
    pub profile_offset: usize,
    pub model: [u8; 3],
    pub family: Family,
    pub log_size: usize,
}

impl ContainerDescriptor {
    /// Parse everything needed to decrypt the header from the still-encrypted
    /// ciphertext: the format byte, the key and the modulus precede the
    /// encrypted header region (`header_offset + 0x102` onward) in every
    /// variant and are therefore legible without decrypting anything. The
    /// model id lives *inside* that encrypted region (`+0x31` past its
    /// start), so it — and everything derived from it (family, log size,
    /// logbook/profile offsets, the per-dive segment table) — is left at a
    /// placeholder value here; call [`Self::complete`] once
    /// [`crate::header::decode_header`] has produced the plaintext.
    pub fn from_raw_header(variant: FileVariant, cipher: &[u8]) -> Result<Self> {
        let header_offset = match variant {
            FileVariant::Wan | FileVariant::Ana => 0x30000,
            FileVariant::Can => 0x40000,
        };

        if cipher.len() <= header_offset {
            return Err(CochranError::Truncated {
                needed: header_offset + 1,
                have: cipher.len(),
            });
        }

        let (modulus, key, pointer_width) = match variant {
            FileVariant::Ana => {
                let modulus_byte = cipher[header_offset];
                let key_start = header_offset + 1;
                let key = read_key(cipher, key_start)?;
                (modulus_byte as u16 + 1, key, 3usize)
            }
            _ => {
                let format = FileFormat::from_byte(cipher[header_offset])?;
                let key_start = header_offset + 1;
                let key = read_key(cipher, key_start)?;
                let modulus_byte = cipher[header_offset + 0x101];
                let pointer_width = match format {
                    FileFormat::Wan | FileFormat::Can => 4,
                    FileFormat::OldWan | FileFormat::WanAlt => 3,
                };
                (modulus_byte as u16 + 1, key, pointer_width)
            }
        };

        let format = if variant == FileVariant::Ana {
            // Ana's own format byte does not gate pointer width; it is still
            // read so the segment table can branch on the GemPNox sub-variant
            // test, reusing `WanAlt` as the closest analogue.
            FileFormat::WanAlt
        } else {
            FileFormat::from_byte(cipher[header_offset])?
        };

        let (header_schedule, header_key_base) = header_schedule_for(variant, header_offset, modulus as usize);
        let pointer_count = header_offset / pointer_width;

        Ok(ContainerDescriptor {
            variant,
            format,
            header_offset,
            pointer_width,
            pointer_count,
            modulus,
            key,
            segment_table: Vec::new(),
            header_schedule,
            header_key_base,
            log_offset: 0,
            profile_offset: 0,
            model: [0u8; 3],
            family: Family::CommanderI,
            log_size: 0,
        })
    }

    /// Second pass, run against the now-decrypted header image: reads the
    /// model id and fills in everything that is keyed off it. Grounded on
    /// `cochran_can.c::cochran_can_meta`, which likewise only runs after its
    /// caller has already produced `cleartext`.
    pub fn complete(&mut self, decrypted: &[u8]) -> Result<()> {
        let model_off = match self.variant {
            FileVariant::Ana => self.header_offset + 1 + 256 + 38,
            _ => self.header_offset + 0x102 + 0x31,
        };
        let model = read_model(decrypted, model_off, 3)?;
        let family = family_for_model(&model)?;
        let log_size = family.log_size();

        let (log_offset, profile_offset) = match (self.variant, self.format) {
            (FileVariant::Ana, _) => (0x4D8, 0x4D8 + log_size),
            (_, FileFormat::Can) => (0x4914, 0x4914 + log_size),
            (_, _) => {
                let log_offset = 0x5F1;
                let profile_offset = if log_size == 90 { 0x6B9 } else { 0x6F1 };
                (log_offset, profile_offset)
            }
        };

        self.segment_table = segment_table_for(self.variant, self.format, decrypted, self.header_offset, log_size);
        self.model = model;
        self.family = family;
        self.log_size = log_size;
        self.log_offset = log_offset;
        self.profile_offset = profile_offset;
        Ok(())
    }
}

fn read_key(header: &[u8], start: usize) -> Result<[u8; 256]> {
    if start + 256 > header.len() {
        return Err(CochranError::Truncated {
            needed: start + 256,
            have: header.len(),
        });
    }
    let mut key = [0u8; 256];
    key.copy_from_slice(&header[start..start + 256]);
    Ok(key)
}

fn read_model(header: &[u8], offset: usize, len: usize) -> Result<[u8; 3]> {
    if offset + len > header.len() {
        return Err(CochranError::Truncated {
            needed: offset + len,
            have: header.len(),
        });
    }
    let mut model = [0u8; 3];
    model.copy_from_slice(&header[offset..offset + len]);
    Ok(model)
}

/// Per-dive decryption segments, relative to dive start. Each tuple is
/// `(segment_end, mode)`; the segment starts where the previous one ended
/// (0 for the first entry). Anything past the last listed `segment_end` is
/// decrypted by the dive iterator as one final `Decrypt { key_offset: 0 }`
/// run to the end of the dive, which is how the profile/sample region past
/// the last fixed boundary gets covered without needing the family's log
/// size threaded through this function.
fn segment_table_for(
    variant: FileVariant,
    format: FileFormat,
    header: &[u8],
    header_offset: usize,
    log_size: usize,
) -> Vec<(usize, SegmentMode)> {
    use SegmentMode::{Copy, Decrypt};

    if variant == FileVariant::Ana {
        return vec![
            (0x4C3, Copy),
            (0x502, Decrypt { key_offset: 0 }),
            (0x540, Decrypt { key_offset: 0x3F }),
        ];
    }

    match format {
        // The boundary at 0x4914+log_size is the profile offset: the key
        // cycle restarts there even though its key_offset (0) matches the
        // preceding segment's, so it must stay a distinct segment rather
        // than collapsing into the implicit to-end run.
        FileFormat::Can => vec![
            (0x0FFF, Decrypt { key_offset: 1 }),
            (0x1FFF, Decrypt { key_offset: 0 }),
            (0x2FFF, Decrypt { key_offset: 0 }),
            (0x48FF, Decrypt { key_offset: 0 }),
            (0x4914 + log_size, Decrypt { key_offset: 0 }),
        ],
        FileFormat::OldWan => vec![
            (0x5DC, Copy),
            (0x64A, Decrypt { key_offset: 0 }),
            (0x659, Decrypt { key_offset: 0 }),
            (0x6B9, Decrypt { key_offset: 0 }),
        ],
        FileFormat::WanAlt => {
            // The GemPNox test byte sits at +0x32 *inside* the encrypted
            // header region (base `header_offset + 0x102`), not at
            // `header_offset + 0x32` directly.
            let sub_variant_boundary = if header.get(header_offset + 0x102 + 0x32) == Some(&b'0') {
                0x6F1
            } else {
                0x6B9
            };
            vec![
                (0x5DC, Copy),
                (sub_variant_boundary, Decrypt { key_offset: 0 }),
            ]
        }
        FileFormat::Wan => vec![(0x5DC, Copy), (0x6F1, Decrypt { key_offset: 0 })],
    }
}

/// Header decryption block boundaries, relative to `header_key_base`
/// (`header_offset + 0x102` for Can/Wan, `header_offset + 1 + modulus` for
/// Ana). Every block starts at key offset 0.
fn header_schedule_for(variant: FileVariant, header_offset: usize, modulus: usize) -> (Vec<usize>, usize) {
    match variant {
        FileVariant::Can => (
            vec![0x000C, 0x0A12, 0x1A12, 0x2A12, 0x3A12, 0x5312, 0x5D00],
            header_offset + 0x102,
        ),
        FileVariant::Wan => (vec![0x000C, 0x048E], header_offset + 0x102),
        FileVariant::Ana => (vec![0x482], header_offset + 1 + modulus),
    }
}

impl FileFormat {
    /// Exposed for the demonstration binary's diagnostic output.
    pub fn tag_byte(self) -> u8 {
        self.byte()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_segment_table_has_a_boundary_at_profile_offset() {
        // The key cycle must restart at the profile offset even though its
        // key_offset (0) matches the preceding logbook segment's, so the two
        // may not collapse into a single run.
        let log_size = Family::CommanderIII.log_size();
        let header = [0u8; 1];
        let table = segment_table_for(FileVariant::Can, FileFormat::Can, &header, 0, log_size);
        let profile_offset = 0x4914 + log_size;
        assert!(
            table.iter().any(|&(end, _)| end == profile_offset),
            "expected a segment boundary at the profile offset {profile_offset:#x}, got {table:?}"
        );
    }

    #[test]
    fn ana_segment_table_matches_fixed_schedule() {
        let header = [0u8; 1];
        let table = segment_table_for(FileVariant::Ana, FileFormat::WanAlt, &header, 0, 0);
        assert_eq!(
            table,
            vec![
                (0x4C3, SegmentMode::Copy),
                (0x502, SegmentMode::Decrypt { key_offset: 0 }),
                (0x540, SegmentMode::Decrypt { key_offset: 0x3F }),
            ]
        );
    }

    #[test]
    fn model_is_not_legible_until_the_header_is_decrypted() {
        // The model id lives inside the encrypted header region. Build a
        // synthetic Can file whose model bytes decrypt to "213" and confirm
        // `from_raw_header` alone does not (and cannot) see it, while
        // `complete`, run against the actually-decrypted image, does.
        let header_offset = 0x40000usize;
        let mut key = [0u8; 256];
        for (i, k) in key.iter_mut().enumerate() {
            *k = (i as u8).wrapping_mul(7).wrapping_add(3);
        }
        let mut neg_key = [0u8; 256];
        for i in 0..256 {
            neg_key[i] = (key[i] as i16 * -1).rem_euclid(256) as u8;
        }

        let mut cipher = vec![0u8; header_offset + 0x6000];
        // Dive pointer #0, read straight out of the (never encrypted) table,
        // bounds how far `decode_header` will decrypt; set it to the end of
        // this synthetic header region so the model bytes actually get
        // decrypted rather than clamped away.
        cipher[0..4].copy_from_slice(&(header_offset as u32 + 0x6000).to_le_bytes());
        cipher[header_offset] = FileFormat::Can.tag_byte();
        cipher[header_offset + 1..header_offset + 1 + 256].copy_from_slice(&key);
        cipher[header_offset + 0x101] = 255; // modulus byte -> modulus 256

        let descriptor = ContainerDescriptor::from_raw_header(FileVariant::Can, &cipher).unwrap();
        assert_eq!(descriptor.model, [0u8; 3], "model must be unknown before decryption");

        // Plaintext of the encrypted header region, model id at +0x31.
        let mut plain_header = vec![0u8; 0x6000 - 0x102];
        plain_header[0x31..0x34].copy_from_slice(b"213");

        // Encrypt each scheduled block independently at key offset 0, same
        // as `decode_header` will later decrypt it block by block.
        let mut start = 0usize;
        for &boundary in &descriptor.header_schedule {
            crate::cipher::decode(
                &plain_header[start..boundary],
                &mut cipher[header_offset + 0x102 + start..header_offset + 0x102 + boundary],
                0,
                boundary - start,
                &neg_key,
                0,
                256,
            );
            start = boundary;
        }

        let image = crate::header::decode_header(&cipher, &descriptor).unwrap();
        let mut descriptor = descriptor;
        descriptor.complete(&image).unwrap();

        assert_eq!(&descriptor.model, b"213");
        assert_eq!(descriptor.family, Family::CommanderII);
    }
}
