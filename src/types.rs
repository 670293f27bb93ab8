use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::Family;

/// A single gas mix: oxygen and helium fractions as percentages. Zero on
/// both fields for an unused mix slot.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GasMix {
    pub o2_percent: f64,
    pub he_percent: f64,
}

/// Normalized logbook record shared by every family. Fields a given
/// family's parser does not populate are left at their type's default
/// rather than omitted, since the struct shape itself is family-agnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Logbook {
    pub family: Family,
    pub model: [u8; 3],
    pub dive_number: u32,
    pub repetitive_dive_number: u8,
    #[serde(with = "crate::time::serde_naive_datetime")]
    pub start_time: NaiveDateTime,
    pub start_epoch_seconds: i64,
    pub pre_dive_epoch_seconds: Option<i64>,
    pub surface_interval_seconds: u32,
    pub bottom_time_seconds: u32,
    pub max_depth_ft: f64,
    pub avg_depth_ft: f64,
    pub start_depth_ft: f64,
    pub min_temp_f: f64,
    pub avg_temp_f: f64,
    pub start_temp_f: f64,
    pub tank_pressure_start_psi: u32,
    pub tank_pressure_end_psi: u32,
    pub gas_consumption_start_psi_per_min: Option<f64>,
    pub mixes: [GasMix; 3],
    pub profile_pre: u32,
    pub profile_begin: u32,
    pub profile_end: u32,
    pub voltage_start_v: f64,
    pub voltage_end_v: f64,
    pub ndl_min_minutes: u32,
    pub deco_max_minutes: u32,
    pub ascent_rate_max: u32,
    pub alarm_depth_ft: Option<u32>,
    pub alarm_po2: Option<f64>,
    pub conservatism: f64,
    pub profile_interval_seconds: u32,
    pub altitude_kft: f64,
    pub water_conductivity: Option<u8>,
    pub no_fly_start_minutes: Option<u32>,
    pub no_fly_end_minutes: Option<u32>,
    pub event_count: Option<u32>,
    pub tissue_start: Vec<u8>,
    pub tissue_end: Vec<u8>,
}

/// The source bytes a single sample emission was decoded from, for
/// diagnostics and round-trip testing. Empty for emissions with no
/// corresponding source range (logbook-derived priming values, `End`).
pub type SampleRaw = Vec<u8>;

/// One emitted profile sample, tagged by kind. `End` is a sentinel flush
/// marker carrying no measurement.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sample {
    Depth { ft: f64 },
    Temp { f: f64 },
    AscentRate { ft_per_min: f64 },
    TankPressure { psi: f64 },
    GasConsumptionRate { psi_per_min: f64 },
    Ndl { minutes: u32 },
    Deco { ceiling_ft: i32, time_min: u32 },
    DecoFirstStop { ceiling_ft: i32, time_min: u32 },
    Tissues { values: [u8; 20] },
    Event { code: u8, description: &'static str },
    Interdive {
        code: u8,
        #[serde(with = "crate::time::serde_naive_datetime")]
        time: NaiveDateTime,
        payload: Vec<u8>,
    },
    End,
}

/// A summary row used by the demonstration binary's `summary` subcommand:
/// the logbook plus how many samples its profile stream produced.
#[derive(Debug, Clone, Serialize)]
pub struct DiveSummary {
    pub dive_index: usize,
    pub logbook: Logbook,
    pub sample_count: usize,
}
