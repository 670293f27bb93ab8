use crate::bytes::{read_u16_le, read_u24_le, read_u32_le};
use crate::error::{CochranError, Result};
use crate::model::Family;
use crate::time;
use crate::types::{GasMix, Logbook};

/// Early-model packed voltage byte: high nibble is whole volts, low 5 bits
/// over 32 give the fractional volts.
fn voltage_nibble(byte: u8) -> f64 {
    (byte >> 5) as f64 + (byte & 0x1F) as f64 / 32.0
}

fn voltage_u16(raw: u16) -> f64 {
    raw as f64 / 256.0
}

fn require(len: usize, need: usize) -> Result<()> {
    if len < need {
        Err(CochranError::Truncated { needed: need, have: len })
    } else {
        Ok(())
    }
}

/// Parse the fixed-offset logbook header for one dive, dispatching by
/// family. `log` is the logbook region slice (already sized to the
/// family's `log_size`).
pub fn parse_logbook(family: Family, model: [u8; 3], log: &[u8]) -> Result<Logbook> {
    require(log.len(), family.log_size())?;
    match family {
        Family::CommanderI => parse_commander_i(model, log),
        Family::CommanderII => parse_commander_ii(model, log),
        Family::CommanderIII => parse_commander_iii(model, log),
        Family::Gemini => parse_gemini(model, log),
        Family::Nemesis => parse_nemesis(model, log),
        Family::Emc => parse_emc(model, log),
    }
}

fn base_logbook(family: Family, model: [u8; 3]) -> Logbook {
    Logbook {
        family,
        model,
        dive_number: 0,
        repetitive_dive_number: 0,
        start_time: time::from_cochran_epoch(0),
        start_epoch_seconds: 0,
        pre_dive_epoch_seconds: None,
        surface_interval_seconds: 0,
        bottom_time_seconds: 0,
        max_depth_ft: 0.0,
        avg_depth_ft: 0.0,
        start_depth_ft: 0.0,
        min_temp_f: 0.0,
        avg_temp_f: 0.0,
        start_temp_f: 0.0,
        tank_pressure_start_psi: 0,
        tank_pressure_end_psi: 0,
        gas_consumption_start_psi_per_min: None,
        mixes: [GasMix::default(); 3],
        profile_pre: 0,
        profile_begin: 0,
        profile_end: 0,
        voltage_start_v: 0.0,
        voltage_end_v: 0.0,
        ndl_min_minutes: 0,
        deco_max_minutes: 0,
        ascent_rate_max: 0,
        alarm_depth_ft: None,
        alarm_po2: None,
        conservatism: 0.0,
        profile_interval_seconds: 0,
        altitude_kft: 0.0,
        water_conductivity: None,
        no_fly_start_minutes: None,
        no_fly_end_minutes: None,
        event_count: None,
        tissue_start: Vec::new(),
        tissue_end: Vec::new(),
    }
}

fn parse_commander_i(model: [u8; 3], in_: &[u8]) -> Result<Logbook> {
    let mut lb = base_logbook(Family::CommanderI, model);
    lb.profile_begin = read_u24_le(in_, 0)?;
    lb.tissue_start = in_[3..15].to_vec();
    let ticks = read_u32_le(in_, 15)?;
    lb.start_epoch_seconds = time::COCHRAN_EPOCH + ticks as i64;
    lb.start_time = time::from_cochran_epoch(ticks);
    lb.repetitive_dive_number = in_[19];
    lb.dive_number = read_u16_le(in_, 20)? as u32;
    lb.surface_interval_seconds = read_u16_le(in_, 24)? as u32;
    lb.no_fly_start_minutes = Some(in_[27] as u32 * 15);
    lb.voltage_start_v = voltage_nibble(in_[32]);
    lb.tissue_end = in_[35..47].to_vec();
    lb.bottom_time_seconds = read_u16_le(in_, 47)? as u32;
    lb.max_depth_ft = read_u16_le(in_, 49)? as f64 / 4.0;
    lb.avg_depth_ft = read_u16_le(in_, 51)? as f64 / 4.0;
    let deco_ceiling_missed = in_[55] as f64 / 2.0;
    if deco_ceiling_missed != 0.0 {
        lb.ndl_min_minutes = 0;
    } else {
        lb.ndl_min_minutes = read_u16_le(in_, 53)? as u32;
    }
    lb.deco_max_minutes = read_u16_le(in_, 57)? as u32;
    lb.ascent_rate_max = in_[59] as u32;
    lb.profile_interval_seconds = in_[72] as u32;
    lb.conservatism = in_[73] as f64 / 2.55;
    lb.mixes[0].o2_percent = read_u16_le(in_, 74)? as f64 / 256.0;
    lb.avg_temp_f = in_[81] as f64;
    lb.min_temp_f = in_[82] as f64;
    lb.start_temp_f = in_[83] as f64;
    lb.voltage_end_v = voltage_nibble(in_[84]);
    lb.no_fly_end_minutes = Some(in_[85] as u32 * 15);
    lb.event_count = Some(in_[89] as u32);
    Ok(lb)
}

fn parse_commander_ii(model: [u8; 3], in_: &[u8]) -> Result<Logbook> {
    let mut lb = base_logbook(Family::CommanderII, model);
    lb.profile_begin = read_u32_le(in_, 0)?;
    let ticks = read_u32_le(in_, 8)?;
    lb.start_epoch_seconds = time::COCHRAN_EPOCH + ticks as i64;
    lb.start_time = time::from_cochran_epoch(ticks);
    lb.water_conductivity = Some(in_[24]);
    lb.profile_pre = read_u32_le(in_, 28)?;
    lb.start_temp_f = in_[43] as f64;
    lb.start_depth_ft = read_u16_le(in_, 54)? as f64 / 4.0;
    lb.dive_number = read_u16_le(in_, 68)? as u32;
    lb.altitude_kft = in_[73] as f64 / 4.0;
    lb.tissue_start = in_[112..128].to_vec();
    lb.profile_end = read_u32_le(in_, 128)?;
    lb.bottom_time_seconds = read_u16_le(in_, 166)? as u32;
    lb.max_depth_ft = read_u16_le(in_, 168)? as f64 / 4.0;
    lb.avg_depth_ft = read_u16_le(in_, 170)? as f64 / 4.0;
    for i in 0..2 {
        lb.mixes[i].o2_percent = read_u16_le(in_, 210 + i * 2)? as f64 / 256.0;
    }
    lb.min_temp_f = in_[232] as f64;
    lb.avg_temp_f = in_[233] as f64;
    lb.tissue_end = in_[240..256].to_vec();
    Ok(lb)
}

fn parse_commander_iii(model: [u8; 3], in_: &[u8]) -> Result<Logbook> {
    let mut lb = base_logbook(Family::CommanderIII, model);
    let minute = in_[0];
    let second = in_[1];
    let mday = in_[2];
    let hour = in_[3];
    let year = time::broken_down_year(in_[4], in_[5]);
    // tm_mon is stored as in[5] - 1 (0-based); the 1-based calendar month is
    // therefore in[5] itself, not in[5] + 1.
    let month = in_[5];
    lb.start_time = time::from_broken_down(year, month, mday, hour as u8, minute as u8, second as u8);
    lb.profile_begin = read_u32_le(in_, 6)?;
    let ticks = read_u32_le(in_, 10)?;
    lb.start_epoch_seconds = time::COCHRAN_EPOCH + ticks as i64;
    let pre_ticks = read_u32_le(in_, 14)?;
    lb.pre_dive_epoch_seconds = Some(time::COCHRAN_EPOCH + pre_ticks as i64);
    lb.water_conductivity = Some(in_[24]);
    lb.profile_pre = read_u32_le(in_, 30)?;
    lb.voltage_start_v = voltage_u16(read_u16_le(in_, 38)?);
    lb.gas_consumption_start_psi_per_min = Some(read_u16_le(in_, 42)? as f64 / 2.0);
    lb.start_temp_f = in_[45] as f64;
    lb.start_depth_ft = read_u16_le(in_, 56)? as f64 / 4.0;
    lb.tank_pressure_start_psi = read_u16_le(in_, 62)? as u32;
    lb.surface_interval_seconds = read_u16_le(in_, 68)? as u32;
    lb.dive_number = read_u16_le(in_, 70)? as u32;
    lb.altitude_kft = in_[73] as f64 / 4.0;
    lb.alarm_depth_ft = Some(in_[102] as u32);
    lb.repetitive_dive_number = in_[108];
    lb.tissue_start = in_[112..128].to_vec();
    lb.profile_end = read_u32_le(in_, 128)?;
    lb.min_temp_f = in_[153] as f64;
    lb.bottom_time_seconds = read_u16_le(in_, 166)? as u32;
    lb.max_depth_ft = read_u16_le(in_, 168)? as f64 / 4.0;
    lb.avg_depth_ft = read_u16_le(in_, 170)? as f64 / 4.0;
    for i in 0..2 {
        lb.mixes[i].o2_percent = read_u16_le(in_, 210 + i * 2)? as f64 / 256.0;
    }
    lb.mixes[2].o2_percent = read_u16_le(in_, 214)? as f64 / 256.0;
    lb.profile_interval_seconds = in_[237] as u32;
    lb.tissue_end = in_[240..256].to_vec();
    Ok(lb)
}

fn parse_gemini(model: [u8; 3], in_: &[u8]) -> Result<Logbook> {
    let mut lb = base_logbook(Family::Gemini, model);
    lb.profile_begin = read_u32_le(in_, 0)?;
    let ticks = read_u32_le(in_, 8)?;
    // Early Gemini's raw tick is already Unix-relative, no epoch add.
    lb.start_epoch_seconds = ticks as i64;
    lb.start_time = chrono::DateTime::from_timestamp(ticks as i64, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_else(|| time::from_cochran_epoch(0));
    lb.start_depth_ft = in_[14] as f64;
    lb.dive_number = read_u16_le(in_, 54)? as u32;
    lb.voltage_start_v = voltage_u16(read_u16_le(in_, 68)?);
    lb.repetitive_dive_number = in_[78];
    lb.tissue_start = in_[80..92].to_vec();
    lb.profile_end = read_u32_le(in_, 128)?;
    lb.bottom_time_seconds = read_u16_le(in_, 156)? as u32;
    lb.max_depth_ft = read_u16_le(in_, 158)? as f64 / 4.0;
    lb.deco_max_minutes = read_u16_le(in_, 166)? as u32;
    lb.tank_pressure_start_psi = read_u16_le(in_, 194)? as u32;
    for i in 0..2 {
        lb.mixes[i].o2_percent = read_u16_le(in_, 196 + i * 2)? as f64 / 256.0;
    }
    lb.avg_depth_ft = in_[205] as f64;
    lb.min_temp_f = in_[208] as f64 / 2.0 + 20.0;
    lb.start_temp_f = in_[209] as f64 / 2.0 + 20.0;
    lb.profile_interval_seconds = in_[213] as u32;
    lb.tissue_end = in_[216..228].to_vec();
    Ok(lb)
}

fn parse_nemesis(model: [u8; 3], in_: &[u8]) -> Result<Logbook> {
    let mut lb = base_logbook(Family::Nemesis, model);
    lb.profile_begin = read_u24_le(in_, 0)?;
    lb.tissue_start = in_[3..15].to_vec();
    let ticks = read_u32_le(in_, 15)?;
    lb.start_epoch_seconds = time::NEMESIS_EPOCH + ticks as i64;
    lb.start_time = time::from_nemesis_epoch(ticks);
    lb.repetitive_dive_number = in_[19];
    lb.dive_number = read_u16_le(in_, 20)? as u32;
    lb.tank_pressure_start_psi = read_u16_le(in_, 26)? as u32;
    lb.voltage_start_v = voltage_nibble(in_[39]);
    lb.bottom_time_seconds = read_u16_le(in_, 54)? as u32;
    lb.max_depth_ft = read_u16_le(in_, 56)? as f64 / 4.0;
    lb.avg_depth_ft = read_u16_le(in_, 51)? as f64 / 4.0;
    lb.tank_pressure_end_psi = read_u16_le(in_, 60)? as u32;
    lb.ndl_min_minutes = read_u16_le(in_, 64)? as u32;
    lb.deco_max_minutes = in_[68] as u32;
    lb.ascent_rate_max = in_[67] as u32;
    lb.profile_interval_seconds = in_[84] as u32;
    lb.conservatism = in_[85] as f64 / 2.55;
    for i in 0..2 {
        lb.mixes[i].o2_percent = read_u16_le(in_, 86 + i * 2)? as f64 / 256.0;
    }
    lb.voltage_end_v = voltage_nibble(in_[92]);
    // The reference decoder reuses the voltage nibble-split formula for this
    // field rather than the `* 15` minute scaling Commander I/EMC use;
    // ported as-is rather than "corrected".
    lb.no_fly_end_minutes = Some(voltage_nibble(in_[93]) as u32);
    lb.avg_temp_f = in_[95] as f64;
    lb.min_temp_f = in_[96] as f64;
    lb.start_temp_f = in_[97] as f64;
    lb.event_count = Some(in_[102] as u32);
    Ok(lb)
}

fn parse_emc(model: [u8; 3], in_: &[u8]) -> Result<Logbook> {
    let mut lb = base_logbook(Family::Emc, model);
    let second = in_[0];
    let minute = in_[1];
    let hour = in_[2];
    let mday = in_[3];
    // tm_mon is stored as in[4] - 1 (0-based); the 1-based calendar month is
    // in[4] itself. The year rollover test and both its branches key off
    // in[5] alone (unlike CommanderIII's two-byte form), so the same byte is
    // passed as both arguments below.
    let month = in_[4];
    let year = time::broken_down_year(in_[5], in_[5]);
    lb.start_time = time::from_broken_down(year, month, mday, hour as u8, minute as u8, second as u8);
    lb.profile_begin = read_u32_le(in_, 6)?;
    let ticks = read_u32_le(in_, 10)?;
    lb.start_epoch_seconds = time::COCHRAN_EPOCH + ticks as i64;
    let pre_ticks = read_u32_le(in_, 14)?;
    lb.pre_dive_epoch_seconds = Some(time::COCHRAN_EPOCH + pre_ticks as i64);
    lb.water_conductivity = Some(in_[24]);
    lb.profile_pre = read_u32_le(in_, 30)?;
    lb.start_depth_ft = read_u16_le(in_, 42)? as f64 / 256.0;
    lb.voltage_start_v = voltage_u16(read_u16_le(in_, 46)?);
    lb.start_temp_f = in_[55] as f64;
    lb.surface_interval_seconds = read_u16_le(in_, 84)? as u32;
    lb.dive_number = read_u16_le(in_, 86)? as u32;
    lb.altitude_kft = in_[89] as f64 / 4.0;
    lb.no_fly_start_minutes = Some(read_u16_le(in_, 90)? as u32);
    lb.alarm_po2 = Some(read_u16_le(in_, 142)? as f64 / 256.0);
    for i in 0..3 {
        lb.mixes[i].o2_percent = read_u16_le(in_, 144 + i * 2)? as f64 / 256.0;
        lb.mixes[i].he_percent = read_u16_le(in_, 164 + i * 2)? as f64 / 256.0;
    }
    lb.alarm_depth_ft = Some(read_u16_le(in_, 184)? as u32);
    lb.conservatism = in_[200] as f64 / 2.55;
    lb.repetitive_dive_number = in_[203];
    lb.tissue_start = in_[216..256].to_vec();
    lb.profile_end = read_u32_le(in_, 256)?;
    lb.min_temp_f = in_[283] as f64;
    lb.bottom_time_seconds = read_u16_le(in_, 304)? as u32;
    lb.max_depth_ft = read_u16_le(in_, 306)? as f64 / 4.0;
    lb.avg_depth_ft = read_u16_le(in_, 310)? as f64 / 4.0;
    lb.ndl_min_minutes = read_u16_le(in_, 312)? as u32;
    lb.deco_max_minutes = read_u16_le(in_, 316)? as u32;
    lb.ascent_rate_max = in_[334] as u32;
    lb.voltage_end_v = voltage_u16(read_u16_le(in_, 394)?);
    lb.no_fly_end_minutes = Some(read_u16_le(in_, 428)? as u32);
    lb.event_count = Some(read_u16_le(in_, 430)? as u32);
    lb.profile_interval_seconds = in_[435] as u32;
    // The EMC log layout only keeps one resting-tissue snapshot; expose it
    // under both field names rather than inventing a distinct end value.
    lb.tissue_end = lb.tissue_start.clone();
    Ok(lb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commander_i_reads_dive_number_and_depth() {
        let mut buf = vec![0u8; 90];
        buf[20] = 0x2A; // dive_number low byte = 42
        buf[49] = 0x80; // max_depth raw = 128 -> 32.0 ft
        let lb = parse_logbook(Family::CommanderI, *b"017", &buf).unwrap();
        assert_eq!(lb.dive_number, 42);
        assert_eq!(lb.max_depth_ft, 32.0);
    }

    #[test]
    fn emc_tissue_end_mirrors_tissue_start() {
        let mut buf = vec![0u8; 512];
        for (i, b) in buf[216..256].iter_mut().enumerate() {
            *b = i as u8;
        }
        let lb = parse_logbook(Family::Emc, *b"300", &buf).unwrap();
        assert_eq!(lb.tissue_start, lb.tissue_end);
    }
}
