use crate::bytes::{byte_lossy, raw_slice, read_u16_le_lossy, read_u32_le_lossy};
use crate::error::Result;
use crate::events::{describe_event, inter_dive_record_len};
use crate::model::Family;
use crate::time;
use crate::types::{Logbook, Sample, SampleRaw};

/// Dispatch to the family-specific sample walker, then flush a final
/// `Sample::End`. The walkers carry their own scalar state as locals rather
/// than statics, so two calls (even concurrent ones, on different threads)
/// never share state.
///
/// The callback's third argument is the raw bytes consumed for that
/// emission; it is empty for samples derived from the logbook rather than
/// the byte stream (priming values) and always empty for `Sample::End`.
pub fn parse_samples(
    family: Family,
    logbook: &Logbook,
    samples: &[u8],
    mut callback: impl FnMut(u32, Sample, SampleRaw),
) -> Result<()> {
    match family {
        Family::CommanderI => parse_commander_i(logbook, samples, &mut callback),
        Family::Nemesis => parse_nemesis(logbook, samples, &mut callback),
        Family::CommanderII | Family::CommanderIII => {
            parse_commander_ii_iii(family, logbook, samples, &mut callback)
        }
        Family::Gemini => parse_gemini(logbook, samples, &mut callback),
        Family::Emc => parse_emc(logbook, samples, &mut callback),
    }
    callback(0, Sample::End, SampleRaw::new());
    Ok(())
}

/// Walk the inter-dive event preamble shared by CommanderII/III, Gemini and
/// Emc. Returns the offset past the preamble, where the main sample loop
/// should begin. CommanderI and Nemesis never call this; they have no
/// inter-dive table and their streams start directly with priming bytes.
fn walk_inter_dive(family: Family, samples: &[u8], callback: &mut dyn FnMut(u32, Sample, SampleRaw)) -> usize {
    let mut offset = 0usize;
    while offset < samples.len() {
        let code = samples[offset];
        if code & 0x80 != 0 || code == 0x40 {
            break;
        }
        let Some(raw_len) = inter_dive_record_len(family, code) else {
            break;
        };
        let total = raw_len + 1;
        if total >= 6 {
            let ticks = read_u32_le_lossy(samples, offset + 1);
            let time = time::from_cochran_epoch(ticks);
            let payload_end = (offset + total).min(samples.len());
            let payload_start = (offset + 5).min(payload_end);
            let payload = samples[payload_start..payload_end].to_vec();
            let raw = raw_slice(samples, offset, payload_end);
            callback(0, Sample::Interdive { code, time, payload }, raw);
        }
        offset += total;
    }
    offset
}

/// Shared handling for the `0xAB`/`0xAD` deco-ceiling events in every family
/// but CommanderI: two little-endian u16 minute counts follow the event
/// byte, each off by one from the stored value.
fn emit_deco_pair(
    samples: &[u8],
    offset: usize,
    time: u32,
    deco_ceiling: i32,
    callback: &mut dyn FnMut(u32, Sample, SampleRaw),
) {
    if offset + 4 < samples.len() {
        let raw = raw_slice(samples, offset + 1, offset + 5);
        let first_stop = read_u16_le_lossy(samples, offset + 1) as u32 + 1;
        callback(
            time,
            Sample::DecoFirstStop {
                ceiling_ft: deco_ceiling,
                time_min: first_stop,
            },
            raw.clone(),
        );
        let total_stop = read_u16_le_lossy(samples, offset + 3) as u32 + 1;
        callback(
            time,
            Sample::Deco {
                ceiling_ft: deco_ceiling,
                time_min: total_stop,
            },
            raw,
        );
    }
}

/// CommanderI: single-byte samples, self-priming header, no inter-dive
/// events. An event is a byte with both 0x80 and 0x60 set; 0x80 alone (with
/// 0x60 clear) is a delta-temperature sample; otherwise the byte is a
/// delta-depth sample.
fn parse_commander_i(logbook: &Logbook, samples: &[u8], callback: &mut dyn FnMut(u32, Sample, SampleRaw)) {
    let mut temp = byte_lossy(samples, 0) as f64 / 2.0;
    let mut depth = byte_lossy(samples, 1) as f64 / 2.0;
    let mut deco_ceiling: i32 = 0;
    let mut deco_time: u32 = 0;
    let mut sample_index = 0u32;

    callback(0, Sample::Depth { ft: depth }, raw_slice(samples, 1, 2));
    callback(0, Sample::Temp { f: temp }, raw_slice(samples, 0, 1));

    let mut offset = 2usize;
    while offset < samples.len() {
        let b = samples[offset];
        let time = sample_index * logbook.profile_interval_seconds;
        let raw = raw_slice(samples, offset, offset + 1);

        if b & 0x80 != 0 && b & 0x60 != 0 {
            callback(
                time,
                Sample::Event {
                    code: b,
                    description: describe_event(b),
                },
                raw.clone(),
            );
            match b {
                0xAB => deco_ceiling += 10,
                0xAD => deco_ceiling -= 10,
                0xC5 => deco_time = 1,
                0xC8 => deco_time = 0,
                _ => {
                    offset += 1;
                    continue;
                }
            }
            callback(
                time,
                Sample::Deco {
                    ceiling_ft: deco_ceiling,
                    time_min: deco_time,
                },
                raw,
            );
        } else if b & 0x80 != 0 {
            if b & 0x10 != 0 {
                temp -= (b & 0x0F) as f64 / 2.0;
            } else {
                temp += (b & 0x0F) as f64 / 2.0;
            }
            callback(time, Sample::Temp { f: temp }, raw);
        } else {
            if b & 0x40 != 0 {
                depth -= (b & 0x3F) as f64 / 2.0;
            } else {
                depth += (b & 0x3F) as f64 / 2.0;
            }
            sample_index += 1;
            callback(
                sample_index * logbook.profile_interval_seconds,
                Sample::Depth { ft: depth },
                raw,
            );
        }
        offset += 1;
    }
}

/// Nemesis: also self-priming and event-disambiguated by bit 0x60 like
/// CommanderI (half-foot depth delta), but each sample is a depth/tank
/// pressure pair rather than a single byte, and there is no inter-dive
/// preamble. Grounded directly in `cochran_sample.c`, the only source that
/// implements this family — the canonical `cochran_sample_parse.c` never
/// wires Nemesis in.
fn parse_nemesis(logbook: &Logbook, samples: &[u8], callback: &mut dyn FnMut(u32, Sample, SampleRaw)) {
    let mut temp = byte_lossy(samples, 0) as f64 / 2.0;
    let mut depth = byte_lossy(samples, 1) as f64 / 2.0;
    let mut tank_pressure = logbook.tank_pressure_start_psi as f64;
    let mut deco_ceiling: i32 = 0;
    let mut deco_time: u32 = 0;
    let mut sample_index = 0u32;

    callback(0, Sample::Temp { f: temp }, raw_slice(samples, 0, 1));
    callback(0, Sample::Depth { ft: depth }, raw_slice(samples, 1, 2));
    callback(0, Sample::TankPressure { psi: tank_pressure }, SampleRaw::new());

    let mut offset = 2usize;
    while offset < samples.len() {
        let b = samples[offset];
        let time = sample_index * logbook.profile_interval_seconds;
        let raw = raw_slice(samples, offset, offset + 1);

        if b & 0x80 != 0 && b & 0x60 != 0 {
            callback(
                time,
                Sample::Event {
                    code: b,
                    description: describe_event(b),
                },
                raw.clone(),
            );
            match b {
                0xAB => deco_ceiling += 10,
                0xAD => deco_ceiling -= 10,
                0xC5 => deco_time = 1,
                0xC8 => deco_time = 0,
                _ => {
                    offset += 1;
                    continue;
                }
            }
            callback(
                time,
                Sample::Deco {
                    ceiling_ft: deco_ceiling,
                    time_min: deco_time,
                },
                raw,
            );
            offset += 1;
        } else if b & 0x80 != 0 {
            if b & 0x10 != 0 {
                temp -= (b & 0x0F) as f64 / 2.0;
            } else {
                temp += (b & 0x0F) as f64 / 2.0;
            }
            callback(time, Sample::Temp { f: temp }, raw);
            offset += 1;
        } else {
            if b & 0x40 != 0 {
                depth -= (b & 0x3F) as f64 / 2.0;
            } else {
                depth += (b & 0x3F) as f64 / 2.0;
            }
            sample_index += 1;
            let depth_time = sample_index * logbook.profile_interval_seconds;
            callback(depth_time, Sample::Depth { ft: depth }, raw);

            // The source's own doc comment claims 2psi increments over 7
            // magnitude bits, but the arithmetic it actually runs masks only
            // the low nibble and applies no multiplier; ported literally.
            let t = byte_lossy(samples, offset + 1);
            if t & 0x80 != 0 {
                tank_pressure -= (t & 0x0F) as f64;
            } else {
                tank_pressure += (t & 0x0F) as f64;
            }
            callback(
                depth_time,
                Sample::TankPressure { psi: tank_pressure },
                raw_slice(samples, offset + 1, offset + 2),
            );
            offset += 2;
        }
    }
}

/// CommanderII/III: two-byte samples. First byte is depth delta, second
/// alternates ascent rate (even sample index) and temperature (odd). Both
/// models are dispatched through the same reference routine, which unlike
/// Gemini/Emc has no 4-byte deco-minutes payload on `0xAB`/`0xAD` — it
/// synthesizes a single Deco sample from a running `deco_time` flag exactly
/// like CommanderI/Nemesis do, and advances the cursor by `sample_size`
/// uniformly at the bottom of the loop regardless of branch.
fn parse_commander_ii_iii(
    family: Family,
    logbook: &Logbook,
    samples: &[u8],
    callback: &mut dyn FnMut(u32, Sample, SampleRaw),
) {
    let mut offset = walk_inter_dive(family, samples, callback);
    let mut depth = logbook.start_depth_ft;
    let temp = logbook.start_temp_f;
    let mut deco_ceiling: i32 = 0;
    let mut deco_time: u32 = 0;
    let mut sample_index = 0u32;

    callback(0, Sample::Depth { ft: depth }, SampleRaw::new());
    callback(0, Sample::Temp { f: temp }, SampleRaw::new());

    while offset < samples.len() {
        let b = samples[offset];
        let time = sample_index * logbook.profile_interval_seconds;

        if b & 0x80 != 0 {
            let raw = raw_slice(samples, offset, offset + 1);
            callback(
                time,
                Sample::Event {
                    code: b,
                    description: describe_event(b),
                },
                raw.clone(),
            );
            match b {
                0xAB => deco_ceiling += 10,
                0xAD => deco_ceiling -= 10,
                0xC5 => deco_time = 1,
                0xC8 => deco_time = 0,
                _ => {
                    offset += 1;
                    continue;
                }
            }
            callback(
                time,
                Sample::Deco {
                    ceiling_ft: deco_ceiling,
                    time_min: deco_time,
                },
                raw,
            );
        } else {
            sample_index += 1;
            if b & 0x40 != 0 {
                depth -= (b & 0x3F) as f64 / 4.0;
            } else {
                depth += (b & 0x3F) as f64 / 4.0;
            }
            let depth_time = sample_index * logbook.profile_interval_seconds;
            callback(depth_time, Sample::Depth { ft: depth }, raw_slice(samples, offset, offset + 1));

            let second = byte_lossy(samples, offset + 1);
            let second_raw = raw_slice(samples, offset + 1, offset + 2);
            if (sample_index - 1) % 2 == 0 {
                let ascent = if second & 0x80 != 0 {
                    (second & 0x7F) as f64 / 4.0
                } else {
                    -((second & 0x7F) as f64) / 4.0
                };
                callback(depth_time, Sample::AscentRate { ft_per_min: ascent }, second_raw);
            } else {
                let t = (second & 0x7F) as f64 / 2.0 + 20.0;
                callback(depth_time, Sample::Temp { f: t }, second_raw);
            }
        }
        offset += 2;
    }
}

/// Gemini: two-byte samples with a four-sample secondary-channel rotation
/// (ascent rate, gas consumption rate, tank pressure, temperature) and an
/// initial tank-pressure priming sample the other unit-2 families don't have.
fn parse_gemini(logbook: &Logbook, samples: &[u8], callback: &mut dyn FnMut(u32, Sample, SampleRaw)) {
    let mut offset = walk_inter_dive(Family::Gemini, samples, callback);
    let mut depth = logbook.start_depth_ft;
    let temp = logbook.start_temp_f;
    let mut tank_pressure = logbook.tank_pressure_start_psi as f64;
    let mut gas_consumption_rate = 0f64;
    let mut deco_ceiling: i32 = 0;
    let mut deco_flag = false;
    let mut sample_index = 0u32;

    callback(0, Sample::Depth { ft: depth }, SampleRaw::new());
    callback(0, Sample::Temp { f: temp }, SampleRaw::new());
    callback(0, Sample::TankPressure { psi: tank_pressure }, SampleRaw::new());

    while offset < samples.len() {
        let b = samples[offset];

        if b & 0x80 != 0 {
            let time = sample_index * logbook.profile_interval_seconds;
            let raw = raw_slice(samples, offset, offset + 1);
            callback(
                time,
                Sample::Event {
                    code: b,
                    description: describe_event(b),
                },
                raw,
            );
            match b {
                0xAB => {
                    deco_ceiling += 10;
                    emit_deco_pair(samples, offset, time, deco_ceiling, callback);
                    offset += 4;
                }
                0xAD => {
                    deco_ceiling -= 10;
                    emit_deco_pair(samples, offset, time, deco_ceiling, callback);
                    offset += 4;
                }
                0xC5 => deco_flag = true,
                0xC8 => deco_flag = false,
                _ => {
                    offset += 1;
                    continue;
                }
            }
            offset += 1;
        } else {
            sample_index += 1;
            if b & 0x40 != 0 {
                depth -= (b & 0x3F) as f64 / 4.0;
            } else {
                depth += (b & 0x3F) as f64 / 4.0;
            }
            let time = sample_index * logbook.profile_interval_seconds;
            callback(time, Sample::Depth { ft: depth }, raw_slice(samples, offset, offset + 1));

            let second = byte_lossy(samples, offset + 1);
            let second_raw = raw_slice(samples, offset + 1, offset + 2);
            match (sample_index - 1) % 4 {
                0 => {
                    let ascent = if second & 0x80 != 0 {
                        (second & 0x7F) as f64 / 4.0
                    } else {
                        -((second & 0x7F) as f64) / 4.0
                    };
                    callback(time, Sample::AscentRate { ft_per_min: ascent }, second_raw);
                }
                1 => {
                    if second & 0x80 != 0 {
                        gas_consumption_rate -= (second & 0x7F) as f64 / 4.0;
                    } else {
                        gas_consumption_rate += (second & 0x7F) as f64 / 4.0;
                    }
                    callback(
                        time,
                        Sample::GasConsumptionRate {
                            psi_per_min: gas_consumption_rate,
                        },
                        second_raw,
                    );
                }
                2 => {
                    if second & 0x80 != 0 {
                        tank_pressure -= (second & 0x7F) as f64 / 4.0;
                    } else {
                        tank_pressure += (second & 0x7F) as f64 / 4.0;
                    }
                    callback(time, Sample::TankPressure { psi: tank_pressure }, second_raw);
                }
                _ => {
                    let t = (second & 0x7F) as f64 / 2.0 + 20.0;
                    callback(time, Sample::Temp { f: t }, second_raw);
                }
            }
            offset += 2;
        }
    }
}

/// Third-byte sub-stream for Emc, independent of the depth/ascent/temp
/// channel and cycling mod 24. `mod == 19` falls through into `mod == 20`'s
/// logic (no `break` in the reference switch), so both can fire on the same
/// sample.
///
/// `offset` is the current sample's start (the depth byte); the tissue
/// vector is read directly out of the raw sample bytes at
/// `offset + 2 - (19 - i) * sample_unit`, i.e. the third byte of each of the
/// 20 most recent samples, not computed from a delta off the current byte.
fn emc_third_byte(
    samples: &[u8],
    offset: usize,
    sub: u32,
    third: u8,
    fifth: u8,
    sample_unit: usize,
    deco_ceiling: i32,
    deco_flag: bool,
    time: u32,
    callback: &mut dyn FnMut(u32, Sample, SampleRaw),
) {
    let third_byte_raw = raw_slice(samples, offset + 2, offset + 3);
    if sub == 19 {
        let mut tissues = [0u8; 20];
        for (i, slot) in tissues.iter_mut().enumerate() {
            let back = (19 - i) * sample_unit;
            *slot = (offset + 2).checked_sub(back).map(|p| byte_lossy(samples, p)).unwrap_or(0);
        }
        callback(time, Sample::Tissues { values: tissues }, third_byte_raw.clone());
    }
    if sub == 19 || sub == 20 {
        let value = third as u32 + ((fifth as u32) << 8) + 1;
        if deco_flag {
            callback(
                time,
                Sample::DecoFirstStop {
                    ceiling_ft: deco_ceiling,
                    time_min: value,
                },
                third_byte_raw,
            );
        } else {
            callback(time, Sample::Ndl { minutes: value }, third_byte_raw);
        }
    } else if sub == 22 && deco_flag {
        let value = third as u32 + ((fifth as u32) << 8) + 1;
        callback(
            time,
            Sample::Deco {
                ceiling_ft: deco_ceiling,
                time_min: value,
            },
            third_byte_raw,
        );
    }
}

/// Emc: three-byte samples. Second byte alternates ascent rate/temperature
/// like CommanderII; a third byte carries an independent mod-24 sub-stream
/// (tissues, NDL/first-stop, total-stop).
fn parse_emc(logbook: &Logbook, samples: &[u8], callback: &mut dyn FnMut(u32, Sample, SampleRaw)) {
    let mut offset = walk_inter_dive(Family::Emc, samples, callback);
    let mut depth = logbook.start_depth_ft;
    let temp = logbook.start_temp_f;
    let mut deco_ceiling: i32 = 0;
    let mut deco_flag = false;
    let mut sample_index = 0u32;
    let sample_unit = Family::Emc.sample_unit() as u8;

    callback(0, Sample::Depth { ft: depth }, SampleRaw::new());
    callback(0, Sample::Temp { f: temp }, SampleRaw::new());

    while offset < samples.len() {
        let b = samples[offset];

        if b & 0x80 != 0 {
            let time = sample_index * logbook.profile_interval_seconds;
            let raw = raw_slice(samples, offset, offset + 1);
            callback(
                time,
                Sample::Event {
                    code: b,
                    description: describe_event(b),
                },
                raw,
            );
            match b {
                0xAB => {
                    deco_ceiling += 10;
                    emit_deco_pair(samples, offset, time, deco_ceiling, callback);
                    offset += 4;
                }
                0xAD => {
                    deco_ceiling -= 10;
                    emit_deco_pair(samples, offset, time, deco_ceiling, callback);
                    offset += 4;
                }
                0xC5 => deco_flag = true,
                // 0xDB is an alternate deco-clear code seen in later firmware
                // dumps not present in the available reference decoder.
                0xC8 | 0xDB => deco_flag = false,
                _ => {
                    offset += 1;
                    continue;
                }
            }
            offset += 1;
        } else {
            sample_index += 1;
            if b & 0x40 != 0 {
                depth -= (b & 0x3F) as f64 / 4.0;
            } else {
                depth += (b & 0x3F) as f64 / 4.0;
            }
            let time = sample_index * logbook.profile_interval_seconds;
            callback(time, Sample::Depth { ft: depth }, raw_slice(samples, offset, offset + 1));

            let second = byte_lossy(samples, offset + 1);
            let second_raw = raw_slice(samples, offset + 1, offset + 2);
            if (sample_index - 1) % 2 == 0 {
                let ascent = if second & 0x80 != 0 {
                    (second & 0x7F) as f64 / 4.0
                } else {
                    -((second & 0x7F) as f64) / 4.0
                };
                callback(time, Sample::AscentRate { ft_per_min: ascent }, second_raw);
            } else {
                let t = (second & 0x7F) as f64 / 2.0 + 20.0;
                callback(time, Sample::Temp { f: t }, second_raw);
            }

            let third = byte_lossy(samples, offset + 2);
            let fifth = byte_lossy(samples, offset + 5);
            let sub = (sample_index - 1) % 24;
            emc_third_byte(
                samples,
                offset,
                sub,
                third,
                fifth,
                sample_unit as usize,
                deco_ceiling,
                deco_flag,
                time,
                callback,
            );

            offset += 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileVariant;

    fn stub_logbook(family: Family) -> Logbook {
        let model = match family {
            Family::CommanderI => *b"017",
            Family::CommanderII => *b"213",
            Family::CommanderIII => *b"221",
            Family::Gemini => *b"215",
            Family::Nemesis => *b"114",
            Family::Emc => *b"300",
        };
        let mut lb = crate::logbook::parse_logbook(family, model, &vec![0u8; family.log_size()]).unwrap();
        lb.profile_interval_seconds = 2;
        lb
    }

    #[test]
    fn commander_i_priming_then_one_depth_delta() {
        let lb = stub_logbook(Family::CommanderI);
        let samples = [0x28u8, 0x40, 0x03];
        let mut seen = Vec::new();
        parse_samples(Family::CommanderI, &lb, &samples, |t, s, r| seen.push((t, s, r))).unwrap();

        match &seen[0] {
            (0, Sample::Depth { ft }, raw) => {
                assert_eq!(*ft, 32.0);
                assert_eq!(raw, &[0x40]);
            }
            other => panic!("unexpected first sample: {other:?}"),
        }
        match &seen[1] {
            (0, Sample::Temp { f }, raw) => {
                assert_eq!(*f, 20.0);
                assert_eq!(raw, &[0x28]);
            }
            other => panic!("unexpected second sample: {other:?}"),
        }
        match &seen[2] {
            (2, Sample::Depth { ft }, raw) => {
                assert_eq!(*ft, 33.5);
                assert_eq!(raw, &[0x03]);
            }
            other => panic!("unexpected third sample: {other:?}"),
        }
        assert!(matches!(seen.last(), Some((_, Sample::End, raw)) if raw.is_empty()));
    }

    #[test]
    fn gemini_deco_ceiling_event_emits_first_stop_then_total() {
        let lb = stub_logbook(Family::Gemini);
        // Bit 0x80 set on the very first byte means the inter-dive walk
        // breaks immediately (not a dive-start sentinel, not a sample), so
        // the main loop sees this as the first top-level byte.
        let samples = vec![0xABu8, 0x02, 0x00, 0x05, 0x00];
        let mut seen = Vec::new();
        parse_samples(Family::Gemini, &lb, &samples, |t, s, r| seen.push((t, s, r))).unwrap();

        let first_stop = seen
            .iter()
            .find_map(|(t, s, _)| match s {
                Sample::DecoFirstStop { ceiling_ft, time_min } => Some((*t, *ceiling_ft, *time_min)),
                _ => None,
            })
            .expect("expected a DecoFirstStop sample");
        assert_eq!(first_stop, (0, 10, 3));

        let deco = seen
            .iter()
            .find_map(|(t, s, _)| match s {
                Sample::Deco { ceiling_ft, time_min } => Some((*t, *ceiling_ft, *time_min)),
                _ => None,
            })
            .expect("expected a Deco sample");
        assert_eq!(deco, (0, 10, 6));
    }

    #[test]
    fn emc_sub_20_no_deco_emits_ndl() {
        let samples = [0u8; 8];
        let mut seen = Vec::new();
        emc_third_byte(&samples, 0, 20, 0x05, 0x00, 3, 0, false, 42, |t, s, r| seen.push((t, s, r)));
        assert_eq!(seen.len(), 1);
        match &seen[0] {
            (42, Sample::Ndl { minutes }, raw) => {
                assert_eq!(*minutes, 6);
                assert_eq!(raw, &[samples[2]]);
            }
            other => panic!("unexpected sample: {other:?}"),
        }
    }

    #[test]
    fn emc_sub_19_falls_through_to_ndl() {
        let samples = [0u8; 8];
        let mut seen = Vec::new();
        emc_third_byte(&samples, 0, 19, 0x00, 0x00, 3, 0, false, 0, |t, s, r| seen.push((t, s, r)));
        assert!(matches!(seen[0], (0, Sample::Tissues { .. }, _)));
        assert!(matches!(seen[1], (0, Sample::Ndl { .. }, _)));
    }

    #[test]
    fn emc_deco_clear_accepts_both_c8_and_db() {
        let lb = stub_logbook(Family::Emc);
        for clear_code in [0xC8u8, 0xDBu8] {
            let samples = [0xC5u8, clear_code];
            let mut seen = Vec::new();
            parse_samples(Family::Emc, &lb, &samples, |t, s, r| seen.push((t, s, r))).unwrap();
            let events: Vec<_> = seen
                .iter()
                .filter_map(|(_, s, _)| match s {
                    Sample::Event { code, .. } => Some(*code),
                    _ => None,
                })
                .collect();
            assert_eq!(events, vec![0xC5, clear_code]);
        }
    }

    #[test]
    fn empty_stream_emits_only_priming_and_end() {
        let lb = stub_logbook(Family::Gemini);
        let mut seen = Vec::new();
        parse_samples(Family::Gemini, &lb, &[], |t, s, r| seen.push((t, s, r))).unwrap();
        assert_eq!(seen.len(), 4); // Depth, Temp, TankPressure, End
        assert!(matches!(seen[3], (_, Sample::End, _)));
    }

    #[test]
    fn nemesis_has_no_inter_dive_table_and_uses_half_foot_units() {
        let lb = stub_logbook(Family::Nemesis);
        // priming temp=samples[0]/2=20.0, depth=samples[1]/2=16.0, then a
        // +1.5ft depth delta (0x03 -> bits 0x3F=3 -> 1.5ft, no sign bit).
        let samples = [0x28u8, 0x20, 0x03, 0x00];
        let mut seen = Vec::new();
        parse_samples(Family::Nemesis, &lb, &samples, |t, s, r| seen.push((t, s, r))).unwrap();
        let depth_after_delta = seen.iter().find_map(|(t, s, _)| match s {
            Sample::Depth { ft } if *t != 0 => Some(*ft),
            _ => None,
        });
        assert_eq!(depth_after_delta, Some(17.5));
    }

    #[test]
    fn unknown_event_code_is_recoverable() {
        let lb = stub_logbook(Family::CommanderII);
        let samples = [0x90u8]; // 0x90 isn't in the event catalog
        let mut seen = Vec::new();
        parse_samples(Family::CommanderII, &lb, &samples, |t, s, r| seen.push((t, s, r))).unwrap();
        let desc = seen.iter().find_map(|(_, s, _)| match s {
            Sample::Event { description, .. } => Some(*description),
            _ => None,
        });
        assert_eq!(desc, Some(crate::events::UNKNOWN_EVENT));
    }

    #[test]
    fn file_variant_is_unused_here_but_family_dispatch_covers_all_six() {
        let _ = FileVariant::Can;
        for family in [
            Family::CommanderI,
            Family::CommanderII,
            Family::CommanderIII,
            Family::Gemini,
            Family::Nemesis,
            Family::Emc,
        ] {
            let lb = stub_logbook(family);
            let mut seen = Vec::new();
            parse_samples(family, &lb, &[0x40], |t, s, r| seen.push((t, s, r))).unwrap();
            assert!(matches!(seen.last(), Some((_, Sample::End, _))));
        }
    }
}
